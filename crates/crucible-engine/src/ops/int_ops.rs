//! Int-producing operators: sum, product, division, integer range.

use crate::event::Delta;
use crate::graph::{Graph, NodeId, NodeKind};
use crate::view::View;

use super::{container_ints, evaluate_local_into, AggSource};

pub(super) fn eval_sum(g: &mut Graph, id: NodeId) -> View {
    let source = match g.kind(id) {
        NodeKind::Sum(op) => op.source.clone(),
        _ => unreachable!(),
    };
    let (total, undefined) = match &source {
        AggSource::Operands(operands) => {
            let mut total = 0i64;
            let mut undefined = 0usize;
            for &o in operands {
                match g.view(o) {
                    View::Undefined => undefined += 1,
                    v => total = total.wrapping_add(v.expect_int()),
                }
            }
            (total, undefined)
        }
        AggSource::Container(c) => {
            let mut total = 0i64;
            for v in container_ints(g.value(*c)) {
                total = total.wrapping_add(expect_member_int(g, *c, v));
            }
            (total, 0)
        }
    };
    if let NodeKind::Sum(op) = &mut g.node_mut(id).kind {
        op.undefined_operands = undefined;
    }
    if undefined > 0 {
        View::Undefined
    } else {
        View::Int(total)
    }
}

pub(super) fn delta_sum(g: &mut Graph, id: NodeId, source: NodeId, delta: Delta) {
    let is_container_source = matches!(
        g.kind(id),
        NodeKind::Sum(op) if matches!(op.source, AggSource::Container(_))
    );
    match delta {
        Delta::Scalar if is_container_source => {
            // whole container replaced; bulk path
            evaluate_local_into(g, id);
        }
        Delta::Scalar => {
            if !g.view(id).is_defined() {
                return;
            }
            let old = g.node(source).snapshot.expect_int();
            let new = g.view(source).expect_int();
            let total = g.view(id).expect_int().wrapping_sub(old).wrapping_add(new);
            g.node_mut(id).view = View::Int(total);
        }
        Delta::DefinednessFlipped => {
            let became_defined = g.view(source).is_defined();
            let recovered = match &mut g.node_mut(id).kind {
                NodeKind::Sum(op) => {
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
        Delta::MemberChanged { old, new, .. } => {
            let old = member_int(g, id, old);
            let new = member_int(g, id, new);
            let total = g.view(id).expect_int().wrapping_sub(old).wrapping_add(new);
            g.node_mut(id).view = View::Int(total);
        }
        Delta::MemberAdded { value, .. } => {
            let v = member_int(g, id, value);
            let total = g.view(id).expect_int().wrapping_add(v);
            g.node_mut(id).view = View::Int(total);
        }
        Delta::MemberRemoved { value, .. } => {
            let v = member_int(g, id, value);
            let total = g.view(id).expect_int().wrapping_sub(v);
            g.node_mut(id).view = View::Int(total);
        }
        Delta::MembersSwapped { .. } => {}
    }
}

pub(super) fn eval_product(g: &mut Graph, id: NodeId) -> View {
    let operands = match g.kind(id) {
        NodeKind::Product(op) => op.operands.clone(),
        _ => unreachable!(),
    };
    let mut nonzero = 1i64;
    let mut zeros = 0usize;
    let mut undefined = 0usize;
    for &o in &operands {
        match g.view(o) {
            View::Undefined => undefined += 1,
            v => {
                let v = v.expect_int();
                if v == 0 {
                    zeros += 1;
                } else {
                    nonzero = nonzero.wrapping_mul(v);
                }
            }
        }
    }
    if let NodeKind::Product(op) = &mut g.node_mut(id).kind {
        op.nonzero_product = nonzero;
        op.zero_operands = zeros;
        op.undefined_operands = undefined;
    }
    product_view(undefined, zeros, nonzero)
}

fn product_view(undefined: usize, zeros: usize, nonzero: i64) -> View {
    if undefined > 0 {
        View::Undefined
    } else if zeros > 0 {
        View::Int(0)
    } else {
        View::Int(nonzero)
    }
}

pub(super) fn delta_product(g: &mut Graph, id: NodeId, source: NodeId, delta: Delta) {
    let (old, new) = match delta {
        Delta::Scalar => (
            Some(g.node(source).snapshot.expect_int()),
            Some(g.view(source).expect_int()),
        ),
        Delta::DefinednessFlipped => {
            if g.view(source).is_defined() {
                (None, Some(g.view(source).expect_int()))
            } else {
                (Some(g.node(source).snapshot.expect_int()), None)
            }
        }
        other => panic!("product over container source is unsupported: {other:?}"),
    };
    let view = match &mut g.node_mut(id).kind {
        NodeKind::Product(op) => {
            match old {
                Some(0) => op.zero_operands -= 1,
                Some(v) => op.nonzero_product /= v,
                None => op.undefined_operands -= 1,
            }
            match new {
                Some(0) => op.zero_operands += 1,
                Some(v) => op.nonzero_product = op.nonzero_product.wrapping_mul(v),
                None => op.undefined_operands += 1,
            }
            product_view(op.undefined_operands, op.zero_operands, op.nonzero_product)
        }
        _ => unreachable!(),
    };
    g.node_mut(id).view = view;
}

pub(super) fn eval_div(g: &mut Graph, id: NodeId) -> View {
    let (num, den) = match g.kind(id) {
        NodeKind::Div(op) => (op.num, op.den),
        _ => unreachable!(),
    };
    match (g.view(num).as_int(), g.view(den).as_int()) {
        (Some(_), Some(0)) => View::Undefined,
        (Some(n), Some(d)) => View::Int(n.div_euclid(d)),
        _ => View::Undefined,
    }
}

pub(super) fn eval_int_range(g: &mut Graph, id: NodeId) -> View {
    let (lo, hi) = match g.kind(id) {
        NodeKind::IntRange(op) => (op.lo, op.hi),
        _ => unreachable!(),
    };
    match (g.view(lo).as_int(), g.view(hi).as_int()) {
        (Some(lo), Some(hi)) => View::IntSeq(if lo <= hi {
            (lo..=hi).collect()
        } else {
            Vec::new()
        }),
        _ => View::Undefined,
    }
}

/// Patches only the ends of the materialised sequence: growing a bound
/// appends/prepends, shrinking truncates, and untouched positions keep
/// their slots without any rescan.
pub(super) fn delta_int_range(g: &mut Graph, id: NodeId, source: NodeId, delta: Delta) {
    if delta == Delta::DefinednessFlipped {
        evaluate_local_into(g, id);
        return;
    }
    debug_assert_eq!(delta, Delta::Scalar, "int range has scalar operands");
    let _ = source;
    let (lo_id, hi_id) = match g.kind(id) {
        NodeKind::IntRange(op) => (op.lo, op.hi),
        _ => unreachable!(),
    };
    if !g.view(id).is_defined() {
        evaluate_local_into(g, id);
        return;
    }
    let lo = g.view(lo_id).expect_int();
    let hi = g.view(hi_id).expect_int();
    let mut seq = match std::mem::replace(&mut g.node_mut(id).view, View::Undefined) {
        View::IntSeq(seq) => seq,
        other => panic!("int range cached non-sequence view {other:?}"),
    };
    while seq.last().is_some_and(|&v| v > hi) {
        seq.pop();
    }
    while seq.first().is_some_and(|&v| v < lo) {
        seq.remove(0);
    }
    if seq.is_empty() {
        if lo <= hi {
            seq.extend(lo..=hi);
        }
    } else {
        let first = seq[0];
        let last = seq[seq.len() - 1];
        for v in (lo..first).rev() {
            seq.insert(0, v);
        }
        // last == hi == i64::MAX would overflow the +1
        if last < hi {
            seq.extend(last + 1..=hi);
        }
    }
    g.node_mut(id).view = View::IntSeq(seq);
}

fn member_int(g: &Graph, id: NodeId, value: Option<i64>) -> i64 {
    match value {
        Some(v) => v,
        None => panic!(
            "aggregate over non-int container members: {}",
            g.dump_node(id)
        ),
    }
}

fn expect_member_int(g: &Graph, container: NodeId, value: Option<i64>) -> i64 {
    match value {
        Some(v) => v,
        None => panic!(
            "aggregate over non-int container members: {}",
            g.dump_node(container)
        ),
    }
}
