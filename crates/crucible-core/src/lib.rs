//! Crucible Core - domains, values and hashing for local-search solving
//!
//! This crate provides the fundamental abstractions shared by the rest of
//! the workspace:
//! - Domain descriptors for the legal value space of each variable
//! - Mutable Value assignments shaped by those domains
//! - Incrementally maintained structural hashes
//! - The seeded RNG handle threaded through all randomised code
//! - Error types and the end-of-search control signal

pub mod domain;
pub mod error;
pub mod hash;
pub mod rng;
pub mod size_attr;
pub mod value;

pub use domain::{
    Domain, EnumDomain, FunctionDomain, IntDomain, MultiSetDomain, PartitionDomain,
    SequenceDomain, SetDomain, TupleDomain,
};
pub use error::{CoreError, EndOfSearch, Result, SearchResult};
pub use hash::ValueHash;
pub use rng::SolverRng;
pub use size_attr::SizeAttr;
pub use value::{
    Container, FunctionValue, MultiSetValue, PartitionValue, SequenceValue, SetValue, TupleValue,
    Value,
};
