//! Crucible Engine - incremental evaluation over the expression graph.
//!
//! The expression graph is an arena of nodes addressed by stable integer
//! handles. Leaves are [`Value`](crucible_core::Value) assignments;
//! operators cache a [`View`] (evaluated payload, violation for boolean
//! nodes, definedness) that is patched incrementally as leaf mutations
//! propagate outward through subscriber lists. The cached state is always
//! equal to what a from-scratch recompute would produce; the debug
//! [`sanity`] pass enforces exactly that.

pub mod attribution;
pub mod event;
pub mod graph;
pub mod ops;
pub mod propagate;
pub mod sanity;
pub mod view;

pub use event::{Delta, Subscriber};
pub use graph::{Graph, Node, NodeId, NodeKind};
pub use view::View;
