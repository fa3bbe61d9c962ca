//! Operator nodes: state structs, from-scratch evaluation and the
//! per-operator incremental delta handlers.
//!
//! Every operator supplies two entry points behind a common dispatch:
//! `evaluate_local_into` computes the node's view from its operands'
//! cached views (startup, post-unroll, definedness recovery), and
//! `apply_delta` patches the cached view in O(1) using the change
//! description plus the source's pre-change snapshot.

pub mod bool_ops;
pub mod int_ops;
pub mod quantifier;

use smallvec::SmallVec;
use std::collections::HashMap;

use crucible_core::Value;

use crate::event::Delta;
use crate::graph::{Graph, NodeId, NodeKind};
use crate::view::View;

/// Where an aggregate draws its operands from: an explicit operand list,
/// or every member of a container leaf.
#[derive(Debug, Clone)]
pub enum AggSource {
    Operands(SmallVec<[NodeId; 4]>),
    Container(NodeId),
}

impl AggSource {
    pub fn edges(&self) -> SmallVec<[NodeId; 4]> {
        match self {
            AggSource::Operands(ops) => ops.clone(),
            AggSource::Container(c) => [*c].into_iter().collect(),
        }
    }

    /// Current int payloads of the aggregated elements.
    pub fn element_views(&self, g: &Graph) -> Vec<Option<i64>> {
        match self {
            AggSource::Operands(ops) => ops.iter().map(|&o| g.view(o).as_int()).collect(),
            AggSource::Container(c) => container_ints(g.value(*c)),
        }
    }
}

pub(crate) fn container_ints(value: &Value) -> Vec<Option<i64>> {
    let n = value.member_count();
    (0..n)
        .map(|i| value.member(i).and_then(Value::as_int))
        .collect()
}

#[derive(Debug, Clone)]
pub struct SumOp {
    pub source: AggSource,
    pub(crate) undefined_operands: usize,
}

impl SumOp {
    pub fn over_operands(operands: Vec<NodeId>) -> SumOp {
        SumOp {
            source: AggSource::Operands(operands.into_iter().collect()),
            undefined_operands: 0,
        }
    }

    pub fn over_container(container: NodeId) -> SumOp {
        SumOp {
            source: AggSource::Container(container),
            undefined_operands: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProductOp {
    pub operands: SmallVec<[NodeId; 4]>,
    pub(crate) zero_operands: usize,
    pub(crate) undefined_operands: usize,
    /// Product of the non-zero operands; the view is derived from this
    /// and `zero_operands`, so removing a zero never needs a division by
    /// zero.
    pub(crate) nonzero_product: i64,
}

impl ProductOp {
    pub fn new(operands: Vec<NodeId>) -> ProductOp {
        ProductOp {
            operands: operands.into_iter().collect(),
            zero_operands: 0,
            undefined_operands: 0,
            nonzero_product: 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DivOp {
    pub num: NodeId,
    pub den: NodeId,
}

#[derive(Debug, Clone, Copy)]
pub struct IntRangeOp {
    pub lo: NodeId,
    pub hi: NodeId,
}

#[derive(Debug, Clone, Copy)]
pub struct CmpOp {
    pub lhs: NodeId,
    pub rhs: NodeId,
}

#[derive(Debug, Clone, Copy)]
pub struct NotOp {
    pub operand: NodeId,
}

#[derive(Debug, Clone)]
pub struct AndOp {
    pub operands: SmallVec<[NodeId; 4]>,
    pub(crate) undefined_operands: usize,
}

impl AndOp {
    pub fn new(operands: Vec<NodeId>) -> AndOp {
        AndOp {
            operands: operands.into_iter().collect(),
            undefined_operands: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrOp {
    pub operands: SmallVec<[NodeId; 4]>,
    pub(crate) undefined_operands: usize,
}

impl OrOp {
    pub fn new(operands: Vec<NodeId>) -> OrOp {
        OrOp {
            operands: operands.into_iter().collect(),
            undefined_operands: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AllDiffOp {
    pub source: AggSource,
    /// Occurrence count per element value; violation is
    /// `total - distinct`, patched as counts move between buckets.
    pub(crate) counts: HashMap<i64, u32>,
}

impl AllDiffOp {
    pub fn over_operands(operands: Vec<NodeId>) -> AllDiffOp {
        AllDiffOp {
            source: AggSource::Operands(operands.into_iter().collect()),
            counts: HashMap::new(),
        }
    }

    pub fn over_container(container: NodeId) -> AllDiffOp {
        AllDiffOp {
            source: AggSource::Container(container),
            counts: HashMap::new(),
        }
    }

    pub(crate) fn violation_of_counts(&self) -> u64 {
        self.counts
            .values()
            .map(|&c| (c.saturating_sub(1)) as u64)
            .sum()
    }

    /// Indices of aggregated elements currently involved in a duplicate.
    /// Derived on demand; the incremental state tracks only counts.
    pub fn violating_indices(&self, g: &Graph) -> Vec<usize> {
        self.source
            .element_views(g)
            .iter()
            .enumerate()
            .filter_map(|(i, v)| match v {
                Some(v) if self.counts.get(v).copied().unwrap_or(0) > 1 => Some(i),
                _ => None,
            })
            .collect()
    }
}

/// One unrolled copy of a quantifier body.
#[derive(Debug, Clone, Copy)]
pub struct QuantInstance {
    pub root: NodeId,
    pub iter: NodeId,
}

#[derive(Debug, Clone)]
pub struct ForAllOp {
    pub container: NodeId,
    /// Template body; never wired, never evaluated.
    pub template_root: NodeId,
    pub template_iter: NodeId,
    pub instances: Vec<QuantInstance>,
    pub(crate) undefined_instances: usize,
}

impl ForAllOp {
    pub fn new(container: NodeId, iter: NodeId, body: NodeId) -> ForAllOp {
        ForAllOp {
            container,
            template_root: body,
            template_iter: iter,
            instances: Vec::new(),
            undefined_instances: 0,
        }
    }
}

/// An iterator reference inside a quantifier body; bound per instance.
#[derive(Debug, Clone, Copy)]
pub struct IterOp;

/// What a delta handler reports back to the propagation driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// View unchanged; propagation stops along this edge.
    Unchanged,
    /// View payload changed while staying defined.
    Changed,
    /// Definedness flipped; travels the priority path.
    FlippedDefinedness,
}

/// The view of a leaf value.
pub fn leaf_view(value: &Value) -> View {
    match value {
        Value::Bool(b) => View::Bool {
            violation: b.violation(),
        },
        Value::Int(i) => View::Int(i.value),
        Value::Enum(e) => View::Int(e.index as i64),
        _ => View::Unit,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Leaf,
    Iter,
    Sum,
    Product,
    Div,
    IntRange,
    Cmp,
    Not,
    And,
    Or,
    AllDiff,
    ForAll,
}

fn tag_of(kind: &NodeKind) -> Tag {
    match kind {
        NodeKind::Leaf(_) => Tag::Leaf,
        NodeKind::Iter(_) => Tag::Iter,
        NodeKind::Sum(_) => Tag::Sum,
        NodeKind::Product(_) => Tag::Product,
        NodeKind::Div(_) => Tag::Div,
        NodeKind::IntRange(_) => Tag::IntRange,
        NodeKind::Eq(_) | NodeKind::Neq(_) | NodeKind::Leq(_) => Tag::Cmp,
        NodeKind::Not(_) => Tag::Not,
        NodeKind::And(_) => Tag::And,
        NodeKind::Or(_) => Tag::Or,
        NodeKind::AllDiff(_) => Tag::AllDiff,
        NodeKind::ForAll(_) => Tag::ForAll,
    }
}

/// Recomputes `id`'s view from its operands' cached views and overwrites
/// the cache. Bumps the node's evaluation counter.
pub fn evaluate_local_into(g: &mut Graph, id: NodeId) {
    g.total_evals += 1;
    g.node_mut(id).eval_count += 1;
    let view = match tag_of(g.kind(id)) {
        Tag::Leaf => leaf_view(g.value(id)),
        Tag::Iter => g.view(id).clone(),
        Tag::Sum => int_ops::eval_sum(g, id),
        Tag::Product => int_ops::eval_product(g, id),
        Tag::Div => int_ops::eval_div(g, id),
        Tag::IntRange => int_ops::eval_int_range(g, id),
        Tag::Cmp => bool_ops::eval_cmp(g, id),
        Tag::Not => bool_ops::eval_not(g, id),
        Tag::And => bool_ops::eval_and(g, id),
        Tag::Or => bool_ops::eval_or(g, id),
        Tag::AllDiff => bool_ops::eval_all_diff(g, id),
        Tag::ForAll => quantifier::eval_for_all(g, id),
    };
    g.node_mut(id).view = view;
}

/// Applies `delta` (originating at `source`) to the cached state of `id`.
///
/// `member_ctx` is the member index the subscription was scoped to, used
/// by quantifiers to identify which instance slot reported.
pub fn apply_delta(
    g: &mut Graph,
    id: NodeId,
    source: NodeId,
    member_ctx: Option<usize>,
    delta: Delta,
) -> Outcome {
    let before = g.view(id).clone();
    match tag_of(g.kind(id)) {
        Tag::Leaf | Tag::Iter => {
            panic!("leaf/iter node subscribed to {source}: {}", g.dump_node(id))
        }
        Tag::Sum => int_ops::delta_sum(g, id, source, delta),
        Tag::Product => int_ops::delta_product(g, id, source, delta),
        Tag::IntRange => int_ops::delta_int_range(g, id, source, delta),
        // O(1) recompute from the operand caches; no snapshot needed
        Tag::Div | Tag::Cmp | Tag::Not => evaluate_local_into(g, id),
        Tag::And => bool_ops::delta_and(g, id, source, delta),
        Tag::Or => bool_ops::delta_or(g, id, source, delta),
        Tag::AllDiff => bool_ops::delta_all_diff(g, id, source, delta),
        Tag::ForAll => {
            // a member rebinding runs its own nested notification; the
            // outer walk must not forward the change a second time
            if quantifier::delta_for_all(g, id, source, member_ctx, delta) {
                return Outcome::Unchanged;
            }
        }
    }
    outcome_of(&before, g.view(id))
}

pub(crate) fn outcome_of(before: &View, after: &View) -> Outcome {
    if before == after {
        Outcome::Unchanged
    } else if before.is_defined() != after.is_defined() {
        Outcome::FlippedDefinedness
    } else {
        Outcome::Changed
    }
}
