//! Violation attribution.
//!
//! After propagation, each top-level constraint knows how violated it is
//! but not who to blame. The attribution walk descends from a constraint
//! root towards the decision variables, handing each responsible variable
//! (or container member) a share of the violation. Neighbourhood selection
//! biases towards heavily blamed variables.
//!
//! The walk conserves weight: at every branch the incoming weight is split
//! across the responsible operands, so the total deposited in the sink
//! equals the root violation exactly.
//!
//! The walk is structural, not incremental: it runs over cached views only
//! and never re-evaluates a node.

use crate::graph::{Graph, NodeId, NodeKind};
use crate::ops::AggSource;
use crate::view::View;

/// Receives blame during an attribution walk. Implemented by the search
/// side's violation bookkeeping.
pub trait ViolationSink {
    /// Blames the whole variable `var`.
    fn add_var(&mut self, var: u64, violation: u64);
    /// Blames member `index` of the container variable `var`.
    fn add_member(&mut self, var: u64, index: usize, violation: u64);
}

/// Attributes the current violation of the constraint rooted at `root`.
/// An undefined constraint contributes a single unit of weight so search
/// still has something to steer by.
pub fn attribute(g: &Graph, root: NodeId, sink: &mut impl ViolationSink) {
    let weight = violation_of(g.view(root));
    walk(g, root, weight, None, sink);
}

fn violation_of(view: &View) -> u64 {
    match view {
        View::Undefined => 1,
        v => v.expect_violation(),
    }
}

/// Even split of `weight` over `count` operands; the leftover units go to
/// the earliest slots so nothing is dropped.
fn share(weight: u64, count: usize, slot: usize) -> u64 {
    let count = count as u64;
    weight / count + u64::from((slot as u64) < weight % count)
}

/// The iterator binding active on the current branch: instance iterator
/// node, container variable id, member index.
type IterBinding = Option<(NodeId, u64, usize)>;

fn walk(g: &Graph, id: NodeId, weight: u64, binding: IterBinding, sink: &mut impl ViolationSink) {
    if weight == 0 {
        return;
    }
    match g.kind(id) {
        NodeKind::Leaf(value) => sink.add_var(value.id(), weight),
        NodeKind::Iter(_) => {
            if let Some((iter, var, index)) = binding {
                if iter == id {
                    sink.add_member(var, index, weight);
                }
            }
        }
        NodeKind::Eq(op) | NodeKind::Neq(op) | NodeKind::Leq(op) => {
            walk(g, op.lhs, share(weight, 2, 0), binding, sink);
            walk(g, op.rhs, share(weight, 2, 1), binding, sink);
        }
        NodeKind::Not(op) => walk(g, op.operand, weight, binding, sink),
        // arithmetic fans out: any operand could move the result
        NodeKind::Sum(op) => {
            let edges: Vec<NodeId> = op.source.edges().into_iter().collect();
            for (slot, o) in edges.iter().enumerate() {
                walk(g, *o, share(weight, edges.len(), slot), binding, sink);
            }
        }
        NodeKind::Product(op) => {
            for (slot, &o) in op.operands.iter().enumerate() {
                walk(g, o, share(weight, op.operands.len(), slot), binding, sink);
            }
        }
        NodeKind::Div(op) => {
            walk(g, op.num, share(weight, 2, 0), binding, sink);
            walk(g, op.den, share(weight, 2, 1), binding, sink);
        }
        NodeKind::IntRange(op) => {
            walk(g, op.lo, share(weight, 2, 0), binding, sink);
            walk(g, op.hi, share(weight, 2, 1), binding, sink);
        }
        // only violated conjuncts are to blame; with the incoming weight
        // equal to the node's own violation each conjunct receives exactly
        // its own share
        NodeKind::And(op) => {
            let total: u64 = op.operands.iter().map(|&o| violation_of(g.view(o))).sum();
            if total == 0 {
                return;
            }
            let mut spent = 0;
            for &o in &op.operands {
                let v = violation_of(g.view(o));
                let part = weight * v / total;
                spent += part;
                walk(g, o, part, binding, sink);
            }
            // integer-division leftover lands on the most violated conjunct
            if spent < weight {
                if let Some(&worst) = op
                    .operands
                    .iter()
                    .max_by_key(|&&o| violation_of(g.view(o)))
                {
                    walk(g, worst, weight - spent, binding, sink);
                }
            }
        }
        // the closest-to-satisfied disjunct is the cheapest one to push over
        NodeKind::Or(op) => {
            let closest = op
                .operands
                .iter()
                .filter(|&&o| g.view(o).is_defined())
                .min_by_key(|&&o| g.view(o).expect_violation())
                // every disjunct undefined: the unit of undefined weight
                // still has to reach a variable
                .or_else(|| op.operands.first());
            if let Some(&o) = closest {
                walk(g, o, weight, binding, sink);
            }
        }
        NodeKind::AllDiff(op) => {
            let violating = op.violating_indices(g);
            let count = violating.len();
            if count == 0 {
                return;
            }
            match &op.source {
                AggSource::Operands(operands) => {
                    for (slot, index) in violating.into_iter().enumerate() {
                        walk(g, operands[index], share(weight, count, slot), binding, sink);
                    }
                }
                AggSource::Container(c) => {
                    let var = g.value(*c).id();
                    for (slot, index) in violating.into_iter().enumerate() {
                        sink.add_member(var, index, share(weight, count, slot));
                    }
                }
            }
        }
        NodeKind::ForAll(op) => {
            let total: u64 = op
                .instances
                .iter()
                .map(|inst| violation_of(g.view(inst.root)))
                .sum();
            if total == 0 {
                return;
            }
            let var = g.value(op.container).id();
            let violations: Vec<u64> = op
                .instances
                .iter()
                .map(|inst| violation_of(g.view(inst.root)))
                .collect();
            let mut parts: Vec<u64> = violations.iter().map(|v| weight * v / total).collect();
            let spent: u64 = parts.iter().sum();
            if spent < weight {
                // integer-division leftover lands on the worst instance
                let worst = (0..violations.len())
                    .max_by_key(|&i| violations[i])
                    .unwrap_or(0);
                parts[worst] += weight - spent;
            }
            for (slot, inst) in op.instances.iter().enumerate() {
                walk(g, inst.root, parts[slot], Some((inst.iter, var, slot)), sink);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagate::set_int;
    use crucible_core::value::IntValue;
    use crucible_core::Value;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Recorder {
        vars: HashMap<u64, u64>,
        members: HashMap<(u64, usize), u64>,
    }

    impl ViolationSink for Recorder {
        fn add_var(&mut self, var: u64, violation: u64) {
            *self.vars.entry(var).or_insert(0) += violation;
        }

        fn add_member(&mut self, var: u64, index: usize, violation: u64) {
            *self.members.entry((var, index)).or_insert(0) += violation;
        }
    }

    fn int_var(g: &mut Graph, v: i64) -> NodeId {
        g.add_variable(Value::Int(IntValue::new(v)))
    }

    #[test]
    fn conjunction_blames_only_violated_conjuncts() {
        let mut g = Graph::new();
        let x = int_var(&mut g, 3);
        let y = int_var(&mut g, 3);
        let z = int_var(&mut g, 9);
        let c1 = g.eq(x, y); // satisfied
        let c2 = g.eq(y, z); // violated by 6
        let root = g.and(vec![c1, c2]);
        let mut sink = Recorder::default();
        attribute(&g, root, &mut sink);
        assert_eq!(sink.vars.get(&g.value(x).id()), None);
        assert_eq!(sink.vars.get(&g.value(y).id()), Some(&3));
        assert_eq!(sink.vars.get(&g.value(z).id()), Some(&3));
        // the deposited weight matches the root violation exactly
        assert_eq!(sink.vars.values().sum::<u64>(), 6);
    }

    #[test]
    fn disjunction_blames_the_closest_disjunct() {
        let mut g = Graph::new();
        let x = int_var(&mut g, 0);
        let y = int_var(&mut g, 100);
        let far = g.eq(y, x); // violation 100
        let near = g.eq(x, y); // same violation; both far
        let z = int_var(&mut g, 2);
        let close = {
            let w = int_var(&mut g, 3);
            g.eq(z, w) // violation 1
        };
        let root = g.or(vec![far, near, close]);
        let mut sink = Recorder::default();
        attribute(&g, root, &mut sink);
        // only the closest disjunct's variables are blamed
        assert!(sink.vars.contains_key(&g.value(z).id()));
        assert!(!sink.vars.contains_key(&g.value(y).id()));
    }

    #[test]
    fn fully_undefined_disjunction_still_deposits_its_weight() {
        let mut g = Graph::new();
        let a = int_var(&mut g, 4);
        let b = int_var(&mut g, 6);
        let zero = int_var(&mut g, 0);
        let k = int_var(&mut g, 2);
        let c1 = {
            let d = g.div(a, zero);
            g.eq(d, k)
        };
        let c2 = {
            let d = g.div(b, zero);
            g.eq(d, k)
        };
        let root = g.or(vec![c1, c2]);
        assert!(!g.view(root).is_defined());
        let mut sink = Recorder::default();
        attribute(&g, root, &mut sink);
        // the single unit of undefined weight lands on a variable of the
        // first disjunct instead of being dropped
        assert_eq!(sink.vars.values().sum::<u64>(), 1);
        assert!(sink.vars.contains_key(&g.value(a).id()));
    }

    #[test]
    fn blame_follows_a_repair() {
        let mut g = Graph::new();
        let x = int_var(&mut g, 1);
        let y = int_var(&mut g, 5);
        let root = g.eq(x, y);
        let mut before = Recorder::default();
        attribute(&g, root, &mut before);
        assert_eq!(before.vars.get(&g.value(x).id()), Some(&2));
        assert_eq!(before.vars.get(&g.value(y).id()), Some(&2));
        set_int(&mut g, x, 5);
        let mut after = Recorder::default();
        attribute(&g, root, &mut after);
        assert!(after.vars.is_empty());
    }
}
