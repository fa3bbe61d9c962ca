//! The node arena.
//!
//! Nodes hold shared structure through plain arena indices: operator nodes
//! name their operands by [`NodeId`], observed nodes keep subscriber lists
//! of the same indices, and no edge implies ownership or lifetime.

use smallvec::SmallVec;

use crucible_core::value::Container;
use crucible_core::Value;

use crate::event::Subscriber;
use crate::ops::{
    AggSource, AllDiffOp, AndOp, CmpOp, DivOp, ForAllOp, IntRangeOp, IterOp, NotOp, OrOp,
    ProductOp, SumOp,
};
use crate::view::View;

/// Stable handle of one node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A node: either a leaf value or a derived operator.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Leaf(Value),
    Sum(SumOp),
    Product(ProductOp),
    Div(DivOp),
    IntRange(IntRangeOp),
    Eq(CmpOp),
    Neq(CmpOp),
    Leq(CmpOp),
    Not(NotOp),
    And(AndOp),
    Or(OrOp),
    AllDiff(AllDiffOp),
    ForAll(ForAllOp),
    Iter(IterOp),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Leaf(v) => v.kind_name(),
            NodeKind::Sum(_) => "sum",
            NodeKind::Product(_) => "product",
            NodeKind::Div(_) => "div",
            NodeKind::IntRange(_) => "intRange",
            NodeKind::Eq(_) => "eq",
            NodeKind::Neq(_) => "neq",
            NodeKind::Leq(_) => "leq",
            NodeKind::Not(_) => "not",
            NodeKind::And(_) => "and",
            NodeKind::Or(_) => "or",
            NodeKind::AllDiff(_) => "allDiff",
            NodeKind::ForAll(_) => "forAll",
            NodeKind::Iter(_) => "iter",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub view: View,
    pub subscribers: SmallVec<[Subscriber; 4]>,
    /// Pre-change view recorded by the snapshot pass of the current
    /// propagation epoch.
    pub snapshot: View,
    pub(crate) snapshot_epoch: u64,
    /// How many times this node's from-scratch evaluator has run; test
    /// instrumentation for "no spurious re-evaluation" assertions.
    pub eval_count: u64,
}

impl Node {
    fn new(kind: NodeKind) -> Node {
        Node {
            kind,
            view: View::Undefined,
            subscribers: SmallVec::new(),
            snapshot: View::Undefined,
            snapshot_epoch: 0,
            eval_count: 0,
        }
    }
}

/// Arena of expression nodes plus the id counters for leaf values.
///
/// Root variable values receive dense ids `0..n`; nested member values
/// draw from a disjoint high range so the two spaces never collide.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    pub(crate) epoch: u64,
    pub(crate) total_evals: u64,
    next_var_id: u64,
    next_member_id: u64,
}

pub(crate) const MEMBER_ID_BASE: u64 = 1 << 32;

impl Default for Graph {
    fn default() -> Graph {
        Graph::new()
    }
}

impl Graph {
    pub fn new() -> Graph {
        Graph {
            nodes: Vec::new(),
            epoch: 0,
            total_evals: 0,
            next_var_id: 0,
            next_member_id: MEMBER_ID_BASE,
        }
    }

    /// Total number of from-scratch node evaluations since construction;
    /// a cheap work proxy for search statistics.
    pub fn total_evals(&self) -> u64 {
        self.total_evals
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    /// The cached view; O(1), never recomputes.
    pub fn view(&self, id: NodeId) -> &View {
        &self.node(id).view
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    /// The leaf value at `id`. Panics when `id` is an operator node.
    pub fn value(&self, id: NodeId) -> &Value {
        match &self.node(id).kind {
            NodeKind::Leaf(v) => v,
            other => panic!("{id} is a {} operator, not a leaf", other.name()),
        }
    }

    pub(crate) fn value_mut(&mut self, id: NodeId) -> &mut Value {
        match &mut self.node_mut(id).kind {
            NodeKind::Leaf(v) => v,
            other => panic!("node is a {} operator, not a leaf", other.name()),
        }
    }

    pub(crate) fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(kind));
        id
    }

    /// Registers a root decision variable. The value receives the next
    /// dense variable id, its members receive ids from the member range,
    /// and the node's view is evaluated immediately.
    pub fn add_variable(&mut self, mut value: Value) -> NodeId {
        value.base_mut().id = self.next_var_id;
        value.base_mut().container = Container::Root;
        self.next_var_id += 1;
        let mut next = self.next_member_id;
        value.assign_member_ids(&mut next);
        self.next_member_id = next;
        let id = self.add_node(NodeKind::Leaf(value));
        self.node_mut(id).view = crate::ops::leaf_view(self.value(id));
        id
    }

    /// Number of registered root variables; var ids are `0..count`.
    pub fn variable_count(&self) -> u64 {
        self.next_var_id
    }

    /// Hands out member ids for values constructed outside the arena
    /// (generative assignment builds candidates detached, then commits).
    pub fn assign_member_ids(&mut self, value: &mut Value) {
        let mut next = self.next_member_id;
        value.assign_member_ids(&mut next);
        self.next_member_id = next;
    }

    /// Gives a detached value its own id (and its members theirs) from the
    /// member range, ready for insertion into a container leaf.
    pub fn register_member(&mut self, value: &mut Value) {
        let mut next = self.next_member_id;
        value.assign_ids(&mut next);
        self.next_member_id = next;
    }

    // ---- operator constructors -------------------------------------

    pub fn sum(&mut self, operands: Vec<NodeId>) -> NodeId {
        let kind = NodeKind::Sum(SumOp::over_operands(operands));
        self.finish_operator(kind)
    }

    pub fn sum_over(&mut self, container: NodeId) -> NodeId {
        let kind = NodeKind::Sum(SumOp::over_container(container));
        self.finish_operator(kind)
    }

    pub fn product(&mut self, operands: Vec<NodeId>) -> NodeId {
        let kind = NodeKind::Product(ProductOp::new(operands));
        self.finish_operator(kind)
    }

    pub fn div(&mut self, num: NodeId, den: NodeId) -> NodeId {
        self.finish_operator(NodeKind::Div(DivOp { num, den }))
    }

    pub fn int_range(&mut self, lo: NodeId, hi: NodeId) -> NodeId {
        self.finish_operator(NodeKind::IntRange(IntRangeOp { lo, hi }))
    }

    pub fn eq(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.finish_operator(NodeKind::Eq(CmpOp { lhs, rhs }))
    }

    pub fn neq(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.finish_operator(NodeKind::Neq(CmpOp { lhs, rhs }))
    }

    pub fn leq(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.finish_operator(NodeKind::Leq(CmpOp { lhs, rhs }))
    }

    pub fn not(&mut self, operand: NodeId) -> NodeId {
        self.finish_operator(NodeKind::Not(NotOp { operand }))
    }

    pub fn and(&mut self, operands: Vec<NodeId>) -> NodeId {
        let kind = NodeKind::And(AndOp::new(operands));
        self.finish_operator(kind)
    }

    pub fn or(&mut self, operands: Vec<NodeId>) -> NodeId {
        let kind = NodeKind::Or(OrOp::new(operands));
        self.finish_operator(kind)
    }

    pub fn all_diff(&mut self, operands: Vec<NodeId>) -> NodeId {
        let kind = NodeKind::AllDiff(AllDiffOp::over_operands(operands));
        self.finish_operator(kind)
    }

    pub fn all_diff_over(&mut self, container: NodeId) -> NodeId {
        let kind = NodeKind::AllDiff(AllDiffOp::over_container(container));
        self.finish_operator(kind)
    }

    /// Creates an unbound iterator reference for a quantifier body.
    pub fn iter_ref(&mut self) -> NodeId {
        self.add_node(NodeKind::Iter(IterOp))
    }

    /// Universal quantifier over an int-member container leaf. The body
    /// subgraph rooted at `body` must read the bound element through
    /// `iter`; one deep copy of the body is unrolled per current member.
    pub fn for_all(&mut self, container: NodeId, iter: NodeId, body: NodeId) -> NodeId {
        let id = self.add_node(NodeKind::ForAll(ForAllOp::new(container, iter, body)));
        self.add_trigger(container, Subscriber { node: id, member: None });
        crate::ops::quantifier::unroll_all(self, id);
        crate::ops::evaluate_local_into(self, id);
        id
    }

    fn finish_operator(&mut self, kind: NodeKind) -> NodeId {
        let id = self.add_node(kind);
        self.start_triggering(id);
        crate::ops::evaluate_local_into(self, id);
        id
    }

    // ---- subscriptions ----------------------------------------------

    /// Registers a subscriber on `source`; idempotent.
    pub fn add_trigger(&mut self, source: NodeId, subscriber: Subscriber) {
        let subs = &mut self.node_mut(source).subscribers;
        if !subs.contains(&subscriber) {
            subs.push(subscriber);
        }
    }

    pub fn remove_trigger(&mut self, source: NodeId, subscriber: Subscriber) {
        self.node_mut(source).subscribers.retain(|s| *s != subscriber);
    }

    /// Subscribes `id` to all of its operands; idempotent, paired with
    /// [`Graph::stop_triggering`].
    pub fn start_triggering(&mut self, id: NodeId) {
        for operand in self.operands(id) {
            self.add_trigger(operand, Subscriber { node: id, member: None });
        }
    }

    pub fn stop_triggering(&mut self, id: NodeId) {
        for operand in self.operands(id) {
            self.remove_trigger(operand, Subscriber { node: id, member: None });
        }
    }

    /// Direct operand edges of `id` (for quantifiers: the container and
    /// the live instance roots, never the template).
    pub fn operands(&self, id: NodeId) -> SmallVec<[NodeId; 4]> {
        match &self.node(id).kind {
            NodeKind::Leaf(_) | NodeKind::Iter(_) => SmallVec::new(),
            NodeKind::Sum(op) => op.source.edges(),
            NodeKind::Product(op) => op.operands.iter().copied().collect(),
            NodeKind::Div(op) => [op.num, op.den].into_iter().collect(),
            NodeKind::IntRange(op) => [op.lo, op.hi].into_iter().collect(),
            NodeKind::Eq(op) | NodeKind::Neq(op) | NodeKind::Leq(op) => {
                [op.lhs, op.rhs].into_iter().collect()
            }
            NodeKind::Not(op) => [op.operand].into_iter().collect(),
            NodeKind::And(op) => op.operands.iter().copied().collect(),
            NodeKind::Or(op) => op.operands.iter().copied().collect(),
            NodeKind::AllDiff(op) => op.source.edges(),
            NodeKind::ForAll(op) => {
                let mut edges: SmallVec<[NodeId; 4]> = SmallVec::new();
                edges.push(op.container);
                edges.extend(op.instances.iter().map(|inst| inst.root));
                edges
            }
        }
    }

    /// Evaluates the whole subgraph under `id` from scratch, bottom-up.
    /// Used at startup and after structural unrolling; search-time updates
    /// go through the incremental propagation path instead.
    pub fn evaluate(&mut self, id: NodeId) {
        for operand in self.operands(id) {
            self.evaluate(operand);
        }
        crate::ops::evaluate_local_into(self, id);
    }

    /// Ids of all nodes, in creation order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Dumps one node's state for fatal diagnostics.
    pub fn dump_node(&self, id: NodeId) -> String {
        let node = self.node(id);
        format!(
            "{id} {}: view={:?} snapshot={:?} subscribers={:?}",
            node.kind.name(),
            node.view,
            node.snapshot,
            node.subscribers
        )
    }
}
