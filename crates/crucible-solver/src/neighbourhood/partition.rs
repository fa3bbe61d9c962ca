//! Moves on partition variables.
//!
//! Parts are structural (no part may be emptied by search moves), so the
//! only generated move exchanges the parts of two elements, which keeps
//! every part size unchanged.

use crucible_core::{Domain, Value};
use crucible_engine::propagate;

use super::{Decision, MoveOutcome, NeighbourhoodParams};

pub(super) fn swap_parts(p: &mut NeighbourhoodParams) -> MoveOutcome {
    if !matches!(p.domain, Domain::Partition(_)) {
        panic!("partition move generated for a {:?} domain", p.domain);
    }
    for _ in 0..p.try_limit {
        let (a, b) = match pick_cross_part_pair(p) {
            Some(pair) => pair,
            None => return MoveOutcome::NotFound,
        };
        propagate::partition_swap(p.graph, p.var, a, b);
        match p.decide() {
            Decision::Keep => return MoveOutcome::Committed,
            Decision::Rejected => {
                propagate::partition_swap(p.graph, p.var, a, b);
                return MoveOutcome::Rejected;
            }
            Decision::ParentFailed => propagate::partition_swap(p.graph, p.var, a, b),
        }
    }
    MoveOutcome::NotFound
}

// Two elements in different parts, or None when the partition is too
// uniform to find one in a bounded number of draws.
fn pick_cross_part_pair(p: &mut NeighbourhoodParams) -> Option<(usize, usize)> {
    let partition = match p.graph.value(p.var) {
        Value::Partition(v) => v,
        other => panic!("partition move on a {} leaf", other.kind_name()),
    };
    let count = partition.element_count();
    if count < 2 || partition.num_parts() < 2 {
        return None;
    }
    let parts: Vec<usize> = (0..count).map(|e| partition.part_of(e)).collect();
    for _ in 0..32 {
        let a = p.rng.index(count);
        let b = p.rng.index(count);
        if parts[a] != parts[b] {
            return Some((a, b));
        }
    }
    None
}
