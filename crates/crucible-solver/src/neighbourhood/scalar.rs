//! Moves on bool, int and enum variables.

use crucible_core::{Domain, Value};
use crucible_engine::propagate;

use super::{repick, Decision, MoveOutcome, NeighbourhoodParams};

/// Random reassignment that never proposes the current value.
pub(super) fn assign_random(p: &mut NeighbourhoodParams) -> MoveOutcome {
    match p.domain {
        Domain::Bool => flip_bool(p),
        Domain::Int(_) | Domain::Enum(_) => repick_scalar(p),
        other => panic!("scalar assign generated for a {other:?} domain"),
    }
}

// A bool only has one other value, so assign-random is a flip.
fn flip_bool(p: &mut NeighbourhoodParams) -> MoveOutcome {
    for _ in 0..p.try_limit {
        let old = match p.graph.value(p.var) {
            Value::Bool(v) => v.value,
            other => panic!("bool move on a {} leaf", other.kind_name()),
        };
        propagate::set_bool(p.graph, p.var, !old);
        match p.decide() {
            Decision::Keep => return MoveOutcome::Committed,
            Decision::Rejected => {
                propagate::set_bool(p.graph, p.var, old);
                return MoveOutcome::Rejected;
            }
            Decision::ParentFailed => propagate::set_bool(p.graph, p.var, old),
        }
    }
    MoveOutcome::NotFound
}

fn repick_scalar(p: &mut NeighbourhoodParams) -> MoveOutcome {
    for _ in 0..p.try_limit {
        let outcome = match p.domain {
            Domain::Int(d) => {
                if d.size() < 2 {
                    return MoveOutcome::NotFound;
                }
                let old = int_payload(p);
                let new = repick(d, old, p.rng);
                apply_int(p, old, new)
            }
            Domain::Enum(d) => {
                if d.len() < 2 {
                    return MoveOutcome::NotFound;
                }
                let old = match p.graph.value(p.var) {
                    Value::Enum(v) => v.index,
                    other => panic!("enum move on a {} leaf", other.kind_name()),
                };
                let mut new = p.rng.index(d.len());
                while new == old {
                    new = p.rng.index(d.len());
                }
                propagate::set_enum(p.graph, p.var, new);
                match p.decide() {
                    Decision::Keep => Some(MoveOutcome::Committed),
                    Decision::Rejected => {
                        propagate::set_enum(p.graph, p.var, old);
                        Some(MoveOutcome::Rejected)
                    }
                    Decision::ParentFailed => {
                        propagate::set_enum(p.graph, p.var, old);
                        None
                    }
                }
            }
            other => panic!("scalar assign generated for a {other:?} domain"),
        };
        if let Some(outcome) = outcome {
            return outcome;
        }
    }
    MoveOutcome::NotFound
}

/// Reassignment within a window of `violation` around the current value;
/// a heavily violated variable roams further.
pub(super) fn assign_in_violation_window(p: &mut NeighbourhoodParams) -> MoveOutcome {
    let d = match p.domain {
        Domain::Int(d) => d,
        other => panic!("violation window generated for a {other:?} domain"),
    };
    if d.size() < 2 {
        return MoveOutcome::NotFound;
    }
    for _ in 0..p.try_limit {
        let old = int_payload(p);
        let window = p.violations.var_violation(p.graph.value(p.var).id()).max(1);
        let window = i64::try_from(window).unwrap_or(i64::MAX);
        let new = d.random_value_between(
            p.rng,
            old.saturating_sub(window),
            old.saturating_add(window),
        );
        if new == old {
            // the window collapsed onto the current value
            continue;
        }
        if let Some(outcome) = apply_int(p, old, new) {
            return outcome;
        }
    }
    MoveOutcome::NotFound
}

fn apply_int(p: &mut NeighbourhoodParams, old: i64, new: i64) -> Option<MoveOutcome> {
    propagate::set_int(p.graph, p.var, new);
    match p.decide() {
        Decision::Keep => Some(MoveOutcome::Committed),
        Decision::Rejected => {
            propagate::set_int(p.graph, p.var, old);
            Some(MoveOutcome::Rejected)
        }
        Decision::ParentFailed => {
            propagate::set_int(p.graph, p.var, old);
            None
        }
    }
}

fn int_payload(p: &NeighbourhoodParams) -> i64 {
    match p.graph.value(p.var).as_int() {
        Some(v) => v,
        None => panic!("int move on a {} leaf", p.graph.value(p.var).kind_name()),
    }
}
