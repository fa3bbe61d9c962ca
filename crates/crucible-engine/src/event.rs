//! Trigger events and subscriber records.

use crate::graph::NodeId;

/// A registered observer edge: `node` wants notifications from the node
/// holding this record. `member` scopes the subscription to one member of
/// a container source, so a single-member mutation notifies only the
/// ancestors interested in that member.
///
/// Subscribers never own the node they observe; both ends are arena
/// indices with no lifetime implication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscriber {
    pub node: NodeId,
    pub member: Option<usize>,
}

/// What changed at a source node during one propagation step.
///
/// Every mutation follows the shape *snapshot pass -> leaf mutation ->
/// delta notification walked outward*. The snapshot pass stores each
/// affected node's pre-change view, so a `Scalar` delta needs no payload:
/// the old view is the source's snapshot and the new view is its cache.
/// Member-scoped deltas carry the indices (and, for int members, the
/// payloads) ancestors need for O(1) patching of per-index caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delta {
    /// The source's whole view changed.
    Scalar,
    /// One member of a container source changed in place.
    MemberChanged {
        index: usize,
        old: Option<i64>,
        new: Option<i64>,
    },
    /// A member was inserted at `index`.
    MemberAdded { index: usize, value: Option<i64> },
    /// The member at `index` was removed. For unordered containers the
    /// former last member now occupies `index`; for sequences later
    /// members shifted down by one.
    MemberRemoved {
        index: usize,
        value: Option<i64>,
        shifted: bool,
    },
    /// Two members exchanged positions.
    MembersSwapped { i: usize, j: usize },
    /// The source flipped between defined and undefined. This travels a
    /// higher-priority path: once undefined, the source's cached value is
    /// meaningless and ancestors must not read it.
    DefinednessFlipped,
}

impl Delta {
    /// Whether a subscriber scoped to `member` should see this delta.
    /// Whole-view deltas pass every filter; member-scoped deltas pass only
    /// the matching index (swaps pass both ends).
    pub fn concerns_member(&self, member: usize) -> bool {
        match *self {
            Delta::Scalar | Delta::DefinednessFlipped => true,
            Delta::MemberChanged { index, .. }
            | Delta::MemberAdded { index, .. }
            | Delta::MemberRemoved { index, .. } => index == member,
            Delta::MembersSwapped { i, j } => i == member || j == member,
        }
    }
}
