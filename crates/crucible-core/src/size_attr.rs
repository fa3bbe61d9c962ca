//! Size attributes for variable-cardinality domains.

use crate::error::{CoreError, Result};

/// Declared cardinality bounds for a container domain.
///
/// Neighbourhood generation is gated by these: an `Exact` size disables
/// add/remove generators entirely, and bounded sizes gate them at the
/// limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeAttr {
    /// No declared bound.
    None,
    /// Exactly this many members.
    Exact(u64),
    /// At least this many members.
    Min(u64),
    /// At most this many members.
    Max(u64),
    /// Between `min` and `max` members inclusive.
    Range { min: u64, max: u64 },
}

impl SizeAttr {
    /// Builds a `Range`, validating the bounds.
    pub fn range(min: u64, max: u64) -> Result<SizeAttr> {
        if min > max {
            return Err(CoreError::InvalidSizeAttr { min, max });
        }
        Ok(SizeAttr::Range { min, max })
    }

    /// Smallest admissible cardinality.
    pub fn min_size(&self) -> u64 {
        match *self {
            SizeAttr::None | SizeAttr::Max(_) => 0,
            SizeAttr::Exact(n) | SizeAttr::Min(n) => n,
            SizeAttr::Range { min, .. } => min,
        }
    }

    /// Largest admissible cardinality.
    pub fn max_size(&self) -> u64 {
        match *self {
            SizeAttr::None | SizeAttr::Min(_) => u64::MAX,
            SizeAttr::Exact(n) | SizeAttr::Max(n) => n,
            SizeAttr::Range { max, .. } => max,
        }
    }

    /// True when the cardinality is pinned to a single size.
    pub fn is_exact(&self) -> bool {
        self.min_size() == self.max_size()
    }

    /// True when a container currently holding `size` members may grow.
    pub fn allows_grow(&self, size: u64) -> bool {
        size < self.max_size()
    }

    /// True when a container currently holding `size` members may shrink.
    pub fn allows_shrink(&self, size: u64) -> bool {
        size > self.min_size()
    }
}

impl std::fmt::Display for SizeAttr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            SizeAttr::None => write!(f, "noSize"),
            SizeAttr::Exact(n) => write!(f, "size {n}"),
            SizeAttr::Min(n) => write!(f, "minSize {n}"),
            SizeAttr::Max(n) => write!(f, "maxSize {n}"),
            SizeAttr::Range { min, max } => write!(f, "minSize {min}, maxSize {max}"),
        }
    }
}
