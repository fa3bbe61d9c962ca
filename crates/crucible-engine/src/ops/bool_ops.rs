//! Violation-producing operators: comparisons, negation, conjunction,
//! disjunction and all-different.
//!
//! Every boolean node carries a violation count rather than a plain truth
//! value: zero means satisfied, and larger counts give search a gradient
//! towards satisfaction.

use std::collections::HashMap;

use crate::event::Delta;
use crate::graph::{Graph, NodeId, NodeKind};
use crate::view::View;

use super::{evaluate_local_into, AggSource};

pub(super) fn eval_cmp(g: &mut Graph, id: NodeId) -> View {
    let (lhs, rhs) = match g.kind(id) {
        NodeKind::Eq(op) | NodeKind::Neq(op) | NodeKind::Leq(op) => (op.lhs, op.rhs),
        _ => unreachable!(),
    };
    let (a, b) = match (g.view(lhs).as_int(), g.view(rhs).as_int()) {
        (Some(a), Some(b)) => (a, b),
        _ => return View::Undefined,
    };
    let violation = match g.kind(id) {
        NodeKind::Eq(_) => a.abs_diff(b),
        NodeKind::Neq(_) => u64::from(a == b),
        NodeKind::Leq(_) => (a - b).max(0) as u64,
        _ => unreachable!(),
    };
    View::Bool { violation }
}

pub(super) fn eval_not(g: &mut Graph, id: NodeId) -> View {
    let operand = match g.kind(id) {
        NodeKind::Not(op) => op.operand,
        _ => unreachable!(),
    };
    match g.view(operand) {
        View::Undefined => View::Undefined,
        v => View::Bool {
            violation: u64::from(v.is_satisfied()),
        },
    }
}

pub(super) fn eval_and(g: &mut Graph, id: NodeId) -> View {
    let operands = match g.kind(id) {
        NodeKind::And(op) => op.operands.clone(),
        _ => unreachable!(),
    };
    let mut total = 0u64;
    let mut undefined = 0usize;
    for &o in &operands {
        match g.view(o) {
            View::Undefined => undefined += 1,
            v => total += v.expect_violation(),
        }
    }
    if let NodeKind::And(op) = &mut g.node_mut(id).kind {
        op.undefined_operands = undefined;
    }
    if undefined > 0 {
        View::Undefined
    } else {
        View::Bool { violation: total }
    }
}

pub(super) fn delta_and(g: &mut Graph, id: NodeId, source: NodeId, delta: Delta) {
    match delta {
        Delta::Scalar => {
            if !g.view(id).is_defined() {
                return;
            }
            let old = g.node(source).snapshot.expect_violation();
            let new = g.view(source).expect_violation();
            let total = g.view(id).expect_violation() - old + new;
            g.node_mut(id).view = View::Bool { violation: total };
        }
        Delta::DefinednessFlipped => {
            let became_defined = g.view(source).is_defined();
            let recovered = match &mut g.node_mut(id).kind {
                NodeKind::And(op) => {
                    if became_defined {
                        op.undefined_operands -= 1;
                    } else {
                        op.undefined_operands += 1;
                    }
                    op.undefined_operands == 0
                }
                _ => unreachable!(),
            };
            if recovered {
                evaluate_local_into(g, id);
            } else {
                g.node_mut(id).view = View::Undefined;
            }
        }
        other => panic!("conjunction received member delta {other:?}"),
    }
}

pub(super) fn eval_or(g: &mut Graph, id: NodeId) -> View {
    let operands = match g.kind(id) {
        NodeKind::Or(op) => op.operands.clone(),
        _ => unreachable!(),
    };
    let mut min = u64::MAX;
    let mut undefined = 0usize;
    for &o in &operands {
        match g.view(o) {
            View::Undefined => undefined += 1,
            v => min = min.min(v.expect_violation()),
        }
    }
    if let NodeKind::Or(op) = &mut g.node_mut(id).kind {
        op.undefined_operands = undefined;
    }
    if undefined > 0 {
        View::Undefined
    } else {
        View::Bool { violation: min }
    }
}

/// A fall below the cached minimum patches in O(1); a rise at the operand
/// that held the minimum forces a rescan, since the runner-up is not
/// cached.
pub(super) fn delta_or(g: &mut Graph, id: NodeId, source: NodeId, delta: Delta) {
    match delta {
        Delta::Scalar => {
            if !g.view(id).is_defined() {
                return;
            }
            let old = g.node(source).snapshot.expect_violation();
            let new = g.view(source).expect_violation();
            let min = g.view(id).expect_violation();
            if new <= min {
                g.node_mut(id).view = View::Bool { violation: new };
            } else if old == min {
                evaluate_local_into(g, id);
            }
        }
        Delta::DefinednessFlipped => {
            let became_defined = g.view(source).is_defined();
            let recovered = match &mut g.node_mut(id).kind {
                NodeKind::Or(op) => {
                    if became_defined {
                        op.undefined_operands -= 1;
                    } else {
                        op.undefined_operands += 1;
                    }
                    op.undefined_operands == 0
                }
                _ => unreachable!(),
            };
            if recovered {
                evaluate_local_into(g, id);
            } else {
                g.node_mut(id).view = View::Undefined;
            }
        }
        other => panic!("disjunction received member delta {other:?}"),
    }
}

pub(super) fn eval_all_diff(g: &mut Graph, id: NodeId) -> View {
    let source = match g.kind(id) {
        NodeKind::AllDiff(op) => op.source.clone(),
        _ => unreachable!(),
    };
    let elements = source.element_views(g);
    let mut counts: HashMap<i64, u32> = HashMap::new();
    let mut undefined = 0usize;
    for v in &elements {
        match v {
            Some(v) => *counts.entry(*v).or_insert(0) += 1,
            None => undefined += 1,
        }
    }
    let view = if undefined > 0 {
        View::Undefined
    } else {
        View::Bool {
            violation: counts.values().map(|&c| (c - 1) as u64).sum(),
        }
    };
    if let NodeKind::AllDiff(op) = &mut g.node_mut(id).kind {
        op.counts = counts;
    }
    view
}

pub(super) fn delta_all_diff(g: &mut Graph, id: NodeId, source: NodeId, delta: Delta) {
    let is_container_source = matches!(
        g.kind(id),
        NodeKind::AllDiff(op) if matches!(op.source, AggSource::Container(_))
    );
    let (old, new) = match delta {
        Delta::DefinednessFlipped => {
            evaluate_local_into(g, id);
            return;
        }
        Delta::Scalar if is_container_source => {
            // whole container replaced
            evaluate_local_into(g, id);
            return;
        }
        Delta::Scalar => {
            if !g.view(id).is_defined() {
                evaluate_local_into(g, id);
                return;
            }
            (
                Some(g.node(source).snapshot.as_int()),
                Some(g.view(source).as_int()),
            )
        }
        Delta::MemberChanged { old, new, .. } => (Some(old), Some(new)),
        Delta::MemberAdded { value, .. } => (None, Some(value)),
        Delta::MemberRemoved { value, .. } => (Some(value), None),
        Delta::MembersSwapped { .. } => return,
    };
    let view = match &mut g.node_mut(id).kind {
        NodeKind::AllDiff(op) => {
            if let Some(old) = old {
                let old = old.unwrap_or_else(|| panic!("all-different over non-int elements"));
                match op.counts.get_mut(&old) {
                    Some(c) if *c > 1 => *c -= 1,
                    Some(_) => {
                        op.counts.remove(&old);
                    }
                    None => panic!("all-different count bucket missing for {old}"),
                }
            }
            if let Some(new) = new {
                let new = new.unwrap_or_else(|| panic!("all-different over non-int elements"));
                *op.counts.entry(new).or_insert(0) += 1;
            }
            View::Bool {
                violation: op.violation_of_counts(),
            }
        }
        _ => unreachable!(),
    };
    g.node_mut(id).view = view;
}
