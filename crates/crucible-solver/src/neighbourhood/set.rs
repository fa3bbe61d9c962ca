//! Moves on set variables.

use crucible_core::Domain;
use crucible_engine::propagate;

use super::{Decision, MoveOutcome, NeighbourhoodParams};

fn set_domain<'a>(p: &NeighbourhoodParams<'a>) -> &'a crucible_core::SetDomain {
    match p.domain {
        Domain::Set(d) => d,
        other => panic!("set move generated for a {other:?} domain"),
    }
}

pub(super) fn add(p: &mut NeighbourhoodParams) -> MoveOutcome {
    let d = set_domain(p);
    for _ in 0..p.try_limit {
        let len = p.member_count() as u64;
        if !d.size.allows_grow(len) {
            return MoveOutcome::NotFound;
        }
        let member = match p.random_member(&d.inner) {
            Some(m) => m,
            None => return MoveOutcome::NotFound,
        };
        // a duplicate draw costs one proposal
        if !propagate::set_add(p.graph, p.var, member) {
            continue;
        }
        let added = p.member_count() - 1;
        match p.decide() {
            Decision::Keep => return MoveOutcome::Committed,
            Decision::Rejected => {
                propagate::set_remove(p.graph, p.var, added);
                return MoveOutcome::Rejected;
            }
            Decision::ParentFailed => {
                propagate::set_remove(p.graph, p.var, added);
            }
        }
    }
    MoveOutcome::NotFound
}

pub(super) fn remove(p: &mut NeighbourhoodParams) -> MoveOutcome {
    let d = set_domain(p);
    for _ in 0..p.try_limit {
        let len = p.member_count();
        if len == 0 || !d.size.allows_shrink(len as u64) {
            return MoveOutcome::NotFound;
        }
        let index = p.rng.index(len);
        let removed = propagate::set_remove(p.graph, p.var, index);
        match p.decide() {
            Decision::Keep => return MoveOutcome::Committed,
            Decision::Rejected => {
                restore(p, removed);
                return MoveOutcome::Rejected;
            }
            Decision::ParentFailed => restore(p, removed),
        }
    }
    MoveOutcome::NotFound
}

/// Exchanges one member for a freshly generated one (a remove plus an
/// add). Set membership is unordered, so the revert only has to restore
/// membership, not positions.
pub(super) fn swap_member(p: &mut NeighbourhoodParams) -> MoveOutcome {
    let d = set_domain(p);
    for _ in 0..p.try_limit {
        let len = p.member_count();
        if len == 0 {
            return MoveOutcome::NotFound;
        }
        let index = p.rng.index(len);
        let removed = propagate::set_remove(p.graph, p.var, index);
        let member = match p.random_member(&d.inner) {
            Some(m) => m,
            None => {
                restore(p, removed);
                return MoveOutcome::NotFound;
            }
        };
        if !propagate::set_add(p.graph, p.var, member) {
            // replacement collided with a remaining member
            restore(p, removed);
            continue;
        }
        match p.decide() {
            Decision::Keep => return MoveOutcome::Committed,
            Decision::Rejected => {
                let added = p.member_count() - 1;
                propagate::set_remove(p.graph, p.var, added);
                restore(p, removed);
                return MoveOutcome::Rejected;
            }
            Decision::ParentFailed => {
                let added = p.member_count() - 1;
                propagate::set_remove(p.graph, p.var, added);
                restore(p, removed);
            }
        }
    }
    MoveOutcome::NotFound
}

fn restore(p: &mut NeighbourhoodParams, removed: crucible_core::Value) {
    let restored = propagate::set_add(p.graph, p.var, removed);
    debug_assert!(restored, "revert re-added a member that was just removed");
}
