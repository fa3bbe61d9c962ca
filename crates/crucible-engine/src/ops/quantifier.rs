//! Quantifier unrolling.
//!
//! A universal quantifier holds a template body that is never wired and
//! never evaluated. One deep copy of the template is unrolled per current
//! container member, with the copy's iterator node bound to that member's
//! value; the quantifier then aggregates the instance roots exactly like a
//! conjunction. Container mutations add, remove, rebind or swap instances
//! without touching the untouched ones.

use std::collections::{HashMap, HashSet};

use crucible_core::Value;

use crate::event::{Delta, Subscriber};
use crate::graph::{Graph, NodeId, NodeKind};
use crate::view::View;

use super::{
    evaluate_local_into, AggSource, AllDiffOp, AndOp, CmpOp, DivOp, IntRangeOp, IterOp, NotOp,
    OrOp, ProductOp, QuantInstance, SumOp,
};

pub(super) fn eval_for_all(g: &mut Graph, id: NodeId) -> View {
    let instances = match g.kind(id) {
        NodeKind::ForAll(op) => op.instances.clone(),
        _ => unreachable!(),
    };
    let mut total = 0u64;
    let mut undefined = 0usize;
    for inst in &instances {
        match g.view(inst.root) {
            View::Undefined => undefined += 1,
            v => total += v.expect_violation(),
        }
    }
    if let NodeKind::ForAll(op) = &mut g.node_mut(id).kind {
        op.undefined_instances = undefined;
    }
    if undefined > 0 {
        View::Undefined
    } else {
        View::Bool { violation: total }
    }
}

/// Unrolls one instance per current container member. Detaches the
/// template's triggers first so the template never observes anything.
pub(crate) fn unroll_all(g: &mut Graph, id: NodeId) {
    let (container, template_root) = match g.kind(id) {
        NodeKind::ForAll(op) => (op.container, op.template_root),
        _ => unreachable!(),
    };
    stop_subgraph_triggers(g, template_root);
    let count = g.value(container).member_count();
    for slot in 0..count {
        add_instance(g, id, slot);
    }
}

/// Applies a delta to a quantifier. Returns `true` when the handler has
/// already propagated the change to the quantifier's subscribers itself
/// (member rebinding runs a nested notification through the instance
/// body), in which case the outer walk must not forward it again.
pub(super) fn delta_for_all(
    g: &mut Graph,
    id: NodeId,
    source: NodeId,
    _member_ctx: Option<usize>,
    delta: Delta,
) -> bool {
    let container = match g.kind(id) {
        NodeKind::ForAll(op) => op.container,
        _ => unreachable!(),
    };
    if source != container {
        instance_root_delta(g, id, source, delta);
        return false;
    }
    match delta {
        Delta::Scalar => {
            // whole container replaced; tear everything down and re-unroll
            let instances = match g.kind(id) {
                NodeKind::ForAll(op) => op.instances.clone(),
                _ => unreachable!(),
            };
            for inst in &instances {
                g.remove_trigger(inst.root, Subscriber { node: id, member: None });
                stop_subgraph_triggers(g, inst.root);
            }
            if let NodeKind::ForAll(op) = &mut g.node_mut(id).kind {
                op.instances.clear();
            }
            unroll_all(g, id);
            evaluate_local_into(g, id);
        }
        Delta::MemberChanged { index, new, .. } => {
            let iter = match g.kind(id) {
                NodeKind::ForAll(op) => op.instances[index].iter,
                _ => unreachable!(),
            };
            let new = expect_int_member(g, container, new);
            crate::propagate::snapshot_from(g, iter);
            g.node_mut(iter).view = View::Int(new);
            crate::propagate::notify(g, iter, Delta::Scalar);
            return true;
        }
        Delta::MemberAdded { index, .. } => {
            add_instance(g, id, index);
            evaluate_local_into(g, id);
        }
        Delta::MemberRemoved { index, shifted, .. } => {
            remove_instance(g, id, index, shifted);
            evaluate_local_into(g, id);
        }
        Delta::MembersSwapped { i, j } => {
            // bindings travel with the values, so the sum is untouched
            if let NodeKind::ForAll(op) = &mut g.node_mut(id).kind {
                op.instances.swap(i, j);
            }
        }
        Delta::DefinednessFlipped => {
            panic!("container leaf flipped definedness: {}", g.dump_node(source))
        }
    }
    false
}

fn instance_root_delta(g: &mut Graph, id: NodeId, source: NodeId, delta: Delta) {
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
                NodeKind::ForAll(op) => {
                    if became_defined {
                        op.undefined_instances -= 1;
                    } else {
                        op.undefined_instances += 1;
                    }
                    op.undefined_instances == 0
                }
                _ => unreachable!(),
            };
            if recovered {
                evaluate_local_into(g, id);
            } else {
                g.node_mut(id).view = View::Undefined;
            }
        }
        other => panic!("instance root reported member delta {other:?}"),
    }
}

/// Deep-copies the template, binds the fresh iterator to member `slot`'s
/// value, wires and evaluates the copy bottom-up, and inserts the
/// instance at `slot`.
pub(crate) fn add_instance(g: &mut Graph, forall: NodeId, slot: usize) {
    let (container, template_root, template_iter) = match g.kind(forall) {
        NodeKind::ForAll(op) => (op.container, op.template_root, op.template_iter),
        _ => unreachable!(),
    };
    let member = g.value(container).member(slot).and_then(Value::as_int);
    let member = expect_int_member(g, container, member);
    let iter = g.add_node(NodeKind::Iter(IterOp));
    g.node_mut(iter).view = View::Int(member);
    let mut map = HashMap::new();
    let mut created = Vec::new();
    let root = deep_copy(g, template_root, template_iter, iter, &mut map, &mut created);
    for &node in &created {
        g.start_triggering(node);
    }
    // postorder, so operand caches exist before each parent evaluates
    for &node in &created {
        evaluate_local_into(g, node);
    }
    g.add_trigger(root, Subscriber { node: forall, member: None });
    tracing::trace!(%forall, slot, %root, "unrolled quantifier instance");
    match &mut g.node_mut(forall).kind {
        NodeKind::ForAll(op) => op.instances.insert(slot, QuantInstance { root, iter }),
        _ => unreachable!(),
    }
}

fn remove_instance(g: &mut Graph, forall: NodeId, slot: usize, shifted: bool) {
    let inst = match g.kind(forall) {
        NodeKind::ForAll(op) => op.instances[slot],
        _ => unreachable!(),
    };
    g.remove_trigger(inst.root, Subscriber { node: forall, member: None });
    stop_subgraph_triggers(g, inst.root);
    match &mut g.node_mut(forall).kind {
        NodeKind::ForAll(op) => {
            if shifted {
                op.instances.remove(slot);
            } else {
                op.instances.swap_remove(slot);
            }
        }
        _ => unreachable!(),
    }
}

/// Unhooks every operator reachable from `root` from its operands. Leaves
/// are shared with the rest of the graph and are never entered. The nodes
/// themselves stay in the arena; the arena never frees.
fn stop_subgraph_triggers(g: &mut Graph, root: NodeId) {
    let mut seen = HashSet::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) || matches!(g.kind(id), NodeKind::Leaf(_)) {
            continue;
        }
        g.stop_triggering(id);
        stack.extend(g.operands(id));
    }
}

fn deep_copy(
    g: &mut Graph,
    id: NodeId,
    iter_old: NodeId,
    iter_new: NodeId,
    map: &mut HashMap<NodeId, NodeId>,
    created: &mut Vec<NodeId>,
) -> NodeId {
    if id == iter_old {
        return iter_new;
    }
    if matches!(g.kind(id), NodeKind::Leaf(_)) {
        return id;
    }
    if let Some(&copy) = map.get(&id) {
        return copy;
    }
    let kind = g.kind(id).clone();
    let copied = match kind {
        NodeKind::Leaf(_) => unreachable!(),
        NodeKind::Iter(_) => {
            panic!("iterator reference bound to no quantifier: {}", g.dump_node(id))
        }
        NodeKind::ForAll(_) => panic!("nested quantifiers are not supported"),
        NodeKind::Sum(op) => NodeKind::Sum(SumOp {
            source: copy_source(g, &op.source, iter_old, iter_new, map, created),
            undefined_operands: 0,
        }),
        NodeKind::Product(op) => NodeKind::Product(ProductOp {
            operands: op
                .operands
                .iter()
                .map(|&o| deep_copy(g, o, iter_old, iter_new, map, created))
                .collect(),
            zero_operands: 0,
            undefined_operands: 0,
            nonzero_product: 1,
        }),
        NodeKind::Div(op) => NodeKind::Div(DivOp {
            num: deep_copy(g, op.num, iter_old, iter_new, map, created),
            den: deep_copy(g, op.den, iter_old, iter_new, map, created),
        }),
        NodeKind::IntRange(op) => NodeKind::IntRange(IntRangeOp {
            lo: deep_copy(g, op.lo, iter_old, iter_new, map, created),
            hi: deep_copy(g, op.hi, iter_old, iter_new, map, created),
        }),
        NodeKind::Eq(op) => NodeKind::Eq(copy_cmp(g, op, iter_old, iter_new, map, created)),
        NodeKind::Neq(op) => NodeKind::Neq(copy_cmp(g, op, iter_old, iter_new, map, created)),
        NodeKind::Leq(op) => NodeKind::Leq(copy_cmp(g, op, iter_old, iter_new, map, created)),
        NodeKind::Not(op) => NodeKind::Not(NotOp {
            operand: deep_copy(g, op.operand, iter_old, iter_new, map, created),
        }),
        NodeKind::And(op) => NodeKind::And(AndOp {
            operands: op
                .operands
                .iter()
                .map(|&o| deep_copy(g, o, iter_old, iter_new, map, created))
                .collect(),
            undefined_operands: 0,
        }),
        NodeKind::Or(op) => NodeKind::Or(OrOp {
            operands: op
                .operands
                .iter()
                .map(|&o| deep_copy(g, o, iter_old, iter_new, map, created))
                .collect(),
            undefined_operands: 0,
        }),
        NodeKind::AllDiff(op) => NodeKind::AllDiff(AllDiffOp {
            source: copy_source(g, &op.source, iter_old, iter_new, map, created),
            counts: HashMap::new(),
        }),
    };
    let copy = g.add_node(copied);
    map.insert(id, copy);
    created.push(copy);
    copy
}

fn copy_cmp(
    g: &mut Graph,
    op: CmpOp,
    iter_old: NodeId,
    iter_new: NodeId,
    map: &mut HashMap<NodeId, NodeId>,
    created: &mut Vec<NodeId>,
) -> CmpOp {
    CmpOp {
        lhs: deep_copy(g, op.lhs, iter_old, iter_new, map, created),
        rhs: deep_copy(g, op.rhs, iter_old, iter_new, map, created),
    }
}

fn copy_source(
    g: &mut Graph,
    source: &AggSource,
    iter_old: NodeId,
    iter_new: NodeId,
    map: &mut HashMap<NodeId, NodeId>,
    created: &mut Vec<NodeId>,
) -> AggSource {
    match source {
        AggSource::Operands(ops) => AggSource::Operands(
            ops.iter()
                .map(|&o| deep_copy(g, o, iter_old, iter_new, map, created))
                .collect(),
        ),
        AggSource::Container(c) => AggSource::Container(*c),
    }
}

fn expect_int_member(g: &Graph, container: NodeId, value: Option<i64>) -> i64 {
    match value {
        Some(v) => v,
        None => panic!(
            "quantifier over non-int container members: {}",
            g.dump_node(container)
        ),
    }
}
