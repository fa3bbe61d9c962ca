//! Error types and the end-of-search control signal.

use thiserror::Error;

/// Errors raised while building a model.
///
/// Invariant violations inside the engine (stale caches, corrupted hash
/// bookkeeping, reading an undefined view) are deliberately *not* covered
/// here: those are programmer errors and panic with a diagnostic dump.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An integer domain with no bounds, or bounds out of order.
    #[error("Invalid integer domain: {0}")]
    InvalidIntDomain(String),

    /// A size attribute whose minimum exceeds its maximum.
    #[error("Invalid size attribute: min {min} > max {max}")]
    InvalidSizeAttr { min: u64, max: u64 },

    /// A structurally invalid domain (zero-arity tuple, empty enum, ...).
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    /// Error in model construction.
    #[error("Model error: {0}")]
    Model(String),
}

/// Result type alias for model-construction operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Control signal that ends the search.
///
/// This is not an error: it is raised by resource limits, exhausted
/// neighbourhoods or an external stop request, and is consumed only by the
/// top-level search loop. Intermediate layers must propagate it with `?`
/// and never convert or swallow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfSearch;

impl std::fmt::Display for EndOfSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "end of search")
    }
}

/// Result type alias for operations that may end the search.
pub type SearchResult<T> = std::result::Result<T, EndOfSearch>;
