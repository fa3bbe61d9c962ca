//! From-scratch consistency checking.
//!
//! Incremental caches are only trusted because this pass can rebuild
//! everything the slow way and compare. The solver runs it at a
//! configurable move interval during debugging; any mismatch is a bug in
//! an incremental handler and aborts with both sides of the disagreement.

use std::collections::HashSet;

use crate::graph::{Graph, NodeId, NodeKind};
use crate::ops::evaluate_local_into;

/// Checks every cache reachable from `roots` against a from-scratch
/// recomputation. Panics with a node dump on the first mismatch.
pub fn check(g: &Graph, roots: &[NodeId]) {
    tracing::debug!(nodes = g.len(), "running sanity check");
    for id in g.node_ids() {
        if let NodeKind::Leaf(value) = g.kind(id) {
            value.assert_member_backrefs();
            let cached = value.hash();
            let fresh = value.recompute_hash();
            if cached != fresh {
                panic!(
                    "stale hash cache: cached {cached}, recomputed {fresh} at {}",
                    g.dump_node(id)
                );
            }
        }
    }
    let order = postorder(g, roots);
    let mut fresh = g.clone();
    for &id in &order {
        evaluate_local_into(&mut fresh, id);
    }
    for &id in &order {
        if g.view(id) != fresh.view(id) {
            panic!(
                "stale view: recomputed {:?} at {}",
                fresh.view(id),
                g.dump_node(id)
            );
        }
    }
}

// Operands-before-operators order of the nodes reachable from `roots`.
// Quantifier templates are unreachable by construction and stay unchecked.
fn postorder(g: &Graph, roots: &[NodeId]) -> Vec<NodeId> {
    let mut order = Vec::new();
    let mut done = HashSet::new();
    let mut stack: Vec<(NodeId, bool)> = roots.iter().map(|&r| (r, false)).collect();
    while let Some((id, expanded)) = stack.pop() {
        if done.contains(&id) {
            continue;
        }
        if expanded {
            done.insert(id);
            order.push(id);
        } else {
            stack.push((id, true));
            for operand in g.operands(id) {
                if !done.contains(&operand) {
                    stack.push((operand, false));
                }
            }
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagate::set_int;
    use crate::view::View;
    use crucible_core::value::IntValue;
    use crucible_core::Value;

    fn int_var(g: &mut Graph, v: i64) -> NodeId {
        g.add_variable(Value::Int(IntValue::new(v)))
    }

    #[test]
    fn clean_graph_passes() {
        let mut g = Graph::new();
        let x = int_var(&mut g, 2);
        let y = int_var(&mut g, 5);
        let s = g.sum(vec![x, y]);
        let k = int_var(&mut g, 7);
        let root = g.eq(s, k);
        set_int(&mut g, x, 4);
        check(&g, &[root]);
    }

    #[test]
    #[should_panic(expected = "stale view")]
    fn corrupted_cache_is_fatal() {
        let mut g = Graph::new();
        let x = int_var(&mut g, 2);
        let y = int_var(&mut g, 5);
        let root = g.sum(vec![x, y]);
        // mutate behind the propagation layer's back
        g.node_mut(root).view = View::Int(99);
        check(&g, &[root]);
    }
}
