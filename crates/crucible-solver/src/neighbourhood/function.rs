//! Moves on function variables.

use crucible_core::Domain;
use crucible_engine::propagate;

use super::{int_inner, lift_int_member, Decision, MoveOutcome, NeighbourhoodParams};

/// Reassigns the image of one point within the image domain.
pub(super) fn lift_image(p: &mut NeighbourhoodParams) -> MoveOutcome {
    let d = match p.domain {
        Domain::Function(d) => d,
        other => panic!("function move generated for a {other:?} domain"),
    };
    lift_int_member(p, int_inner(&d.image), None)
}

/// Exchanges the images of two points.
pub(super) fn swap_images(p: &mut NeighbourhoodParams) -> MoveOutcome {
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
        propagate::func_swap_images(p.graph, p.var, i, j);
        match p.decide() {
            Decision::Keep => return MoveOutcome::Committed,
            Decision::Rejected => {
                propagate::func_swap_images(p.graph, p.var, i, j);
                return MoveOutcome::Rejected;
            }
            Decision::ParentFailed => propagate::func_swap_images(p.graph, p.var, i, j),
        }
    }
    MoveOutcome::NotFound
}
