//! Moves on multiset variables.

use crucible_core::Domain;
use crucible_engine::propagate;

use super::{int_inner, lift_int_member, Decision, MoveOutcome, NeighbourhoodParams};

fn mset_domain<'a>(p: &NeighbourhoodParams<'a>) -> &'a crucible_core::MultiSetDomain {
    match p.domain {
        Domain::MultiSet(d) => d,
        other => panic!("multiset move generated for a {other:?} domain"),
    }
}

pub(super) fn add(p: &mut NeighbourhoodParams) -> MoveOutcome {
    let d = mset_domain(p);
    for _ in 0..p.try_limit {
        let len = p.member_count() as u64;
        if !d.size.allows_grow(len) {
            return MoveOutcome::NotFound;
        }
        let member = match p.random_member(&d.inner) {
            Some(m) => m,
            None => return MoveOutcome::NotFound,
        };
        propagate::mset_add(p.graph, p.var, member);
        let added = p.member_count() - 1;
        match p.decide() {
            Decision::Keep => return MoveOutcome::Committed,
            Decision::Rejected => {
                propagate::mset_remove(p.graph, p.var, added);
                return MoveOutcome::Rejected;
            }
            Decision::ParentFailed => {
                propagate::mset_remove(p.graph, p.var, added);
            }
        }
    }
    MoveOutcome::NotFound
}

pub(super) fn remove(p: &mut NeighbourhoodParams) -> MoveOutcome {
    let d = mset_domain(p);
    for _ in 0..p.try_limit {
        let len = p.member_count();
        if len == 0 || !d.size.allows_shrink(len as u64) {
            return MoveOutcome::NotFound;
        }
        let index = p.rng.index(len);
        let removed = propagate::mset_remove(p.graph, p.var, index);
        match p.decide() {
            Decision::Keep => return MoveOutcome::Committed,
            Decision::Rejected => {
                propagate::mset_add(p.graph, p.var, removed);
                return MoveOutcome::Rejected;
            }
            Decision::ParentFailed => propagate::mset_add(p.graph, p.var, removed),
        }
    }
    MoveOutcome::NotFound
}

pub(super) fn lift_single(p: &mut NeighbourhoodParams) -> MoveOutcome {
    let inner = int_inner(&mset_domain(p).inner);
    lift_int_member(p, inner, None)
}
