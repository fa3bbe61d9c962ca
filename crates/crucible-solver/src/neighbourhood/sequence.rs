//! Moves on sequence variables.

use crucible_core::Domain;
use crucible_engine::propagate;

use super::{int_inner, lift_int_member, Decision, MoveOutcome, NeighbourhoodParams};

fn seq_domain<'a>(p: &NeighbourhoodParams<'a>) -> &'a crucible_core::SequenceDomain {
    match p.domain {
        Domain::Sequence(d) => d,
        other => panic!("sequence move generated for a {other:?} domain"),
    }
}

/// Inserts a fresh member at a random position.
pub(super) fn add(p: &mut NeighbourhoodParams) -> MoveOutcome {
    let d = seq_domain(p);
    for _ in 0..p.try_limit {
        let len = p.member_count();
        if !d.size.allows_grow(len as u64) {
            return MoveOutcome::NotFound;
        }
        let index = p.rng.range(0..=len);
        let member = match p.random_member(&d.inner) {
            Some(m) => m,
            None => return MoveOutcome::NotFound,
        };
        // injectivity collisions cost one proposal
        if !propagate::seq_insert(p.graph, p.var, index, member) {
            continue;
        }
        match p.decide() {
            Decision::Keep => return MoveOutcome::Committed,
            Decision::Rejected => {
                propagate::seq_remove(p.graph, p.var, index);
                return MoveOutcome::Rejected;
            }
            Decision::ParentFailed => {
                propagate::seq_remove(p.graph, p.var, index);
            }
        }
    }
    MoveOutcome::NotFound
}

pub(super) fn remove(p: &mut NeighbourhoodParams) -> MoveOutcome {
    let d = seq_domain(p);
    for _ in 0..p.try_limit {
        let len = p.member_count();
        if len == 0 || !d.size.allows_shrink(len as u64) {
            return MoveOutcome::NotFound;
        }
        let index = p.rng.index(len);
        let removed = propagate::seq_remove(p.graph, p.var, index);
        match p.decide() {
            Decision::Keep => return MoveOutcome::Committed,
            Decision::Rejected => {
                restore(p, index, removed);
                return MoveOutcome::Rejected;
            }
            Decision::ParentFailed => restore(p, index, removed),
        }
    }
    MoveOutcome::NotFound
}

pub(super) fn swap_positions(p: &mut NeighbourhoodParams) -> MoveOutcome {
    for _ in 0..p.try_limit {
        let len = p.member_count();
        if len < 2 {
            return MoveOutcome::NotFound;
        }
        let i = p.rng.index(len);
        let mut j = p.rng.index(len);
        while j == i {
            j = p.rng.index(len);
        }
        propagate::seq_swap(p.graph, p.var, i, j);
        match p.decide() {
            Decision::Keep => return MoveOutcome::Committed,
            Decision::Rejected => {
                propagate::seq_swap(p.graph, p.var, i, j);
                return MoveOutcome::Rejected;
            }
            Decision::ParentFailed => propagate::seq_swap(p.graph, p.var, i, j),
        }
    }
    MoveOutcome::NotFound
}

pub(super) fn lift_single(p: &mut NeighbourhoodParams) -> MoveOutcome {
    let inner = int_inner(&seq_domain(p).inner);
    lift_int_member(p, inner, None)
}

fn restore(p: &mut NeighbourhoodParams, index: usize, removed: crucible_core::Value) {
    let restored = propagate::seq_insert(p.graph, p.var, index, removed);
    debug_assert!(restored, "revert re-inserted a member that was just removed");
}
