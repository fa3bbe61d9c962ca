//! Moves on tuple variables.
//!
//! Tuples have fixed arity: no structural move ever applies, only lifting
//! one of the int positions.

use crucible_core::Domain;

use super::{lift_int_member, MoveOutcome, NeighbourhoodParams};

pub(super) fn lift_single(p: &mut NeighbourhoodParams) -> MoveOutcome {
    let d = match p.domain {
        Domain::Tuple(d) => d,
        other => panic!("tuple move generated for a {other:?} domain"),
    };
    let positions: Vec<usize> = d
        .members
        .iter()
        .enumerate()
        .filter_map(|(i, m)| matches!(m, Domain::Int(_)).then_some(i))
        .collect();
    if positions.is_empty() {
        return MoveOutcome::NotFound;
    }
    // all int positions share a domain only by coincidence; pick the slot
    // first, then lift within that slot's own domain
    let slot = *p.rng.pick(&positions);
    let inner = match &d.members[slot] {
        Domain::Int(inner) => inner,
        _ => unreachable!(),
    };
    lift_int_member(p, inner, Some(&[slot]))
}
