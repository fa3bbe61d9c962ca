//! Shared graph fixtures for Crucible tests.
//!
//! Small constraint problems with a known structure, used by the engine
//! and solver test suites. Each fixture starts from a deliberately
//! violating assignment so propagation and search have work to do.

use crucible_core::value::IntValue;
use crucible_core::Value;
use crucible_engine::{sanity, Graph, NodeId};

/// A built fixture: the graph, its variable leaves in declaration order,
/// and the root constraint node.
pub struct Fixture {
    pub graph: Graph,
    pub vars: Vec<NodeId>,
    pub root: NodeId,
}

impl Fixture {
    /// Root constraint violation under the current assignment.
    pub fn violation(&self) -> u64 {
        self.graph
            .view(self.root)
            .violation()
            .unwrap_or(u64::MAX)
    }

    /// Asserts every cached view equals a from-scratch recompute.
    pub fn assert_consistent(&self) {
        sanity::check(&self.graph, &[self.root]);
    }
}

fn int_var(g: &mut Graph, value: i64) -> NodeId {
    g.add_variable(Value::Int(IntValue::new(value)))
}

/// `n` int variables, all initially 0, constrained to be pairwise
/// distinct and to sum to `total`.
pub fn all_diff_sum(n: usize, total: i64) -> Fixture {
    let mut graph = Graph::default();
    let vars: Vec<NodeId> = (0..n).map(|_| int_var(&mut graph, 0)).collect();
    let distinct = graph.all_diff(vars.clone());
    let sum = graph.sum(vars.clone());
    let target = int_var(&mut graph, total);
    let sums = graph.eq(sum, target);
    let root = graph.and(vec![distinct, sums]);
    Fixture { graph, vars, root }
}

/// Graph colouring: one colour variable per node, all initially 0, with a
/// disequality per edge and colours bounded by `colours - 1`.
pub fn colouring(edges: &[(usize, usize)], colours: i64) -> Fixture {
    let node_count = edges
        .iter()
        .map(|&(a, b)| a.max(b) + 1)
        .max()
        .unwrap_or(0);
    let mut graph = Graph::default();
    let vars: Vec<NodeId> = (0..node_count).map(|_| int_var(&mut graph, 0)).collect();
    let limit = int_var(&mut graph, colours - 1);
    let mut constraints = Vec::with_capacity(edges.len() + node_count);
    for &(a, b) in edges {
        constraints.push(graph.neq(vars[a], vars[b]));
    }
    for &var in &vars {
        constraints.push(graph.leq(var, limit));
    }
    let root = graph.and(constraints);
    Fixture { graph, vars, root }
}
