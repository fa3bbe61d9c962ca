//! Quantifier unrolling under container mutation: instances must appear,
//! disappear, rebind and swap with the membership, and only the affected
//! instance may be re-evaluated.

use crucible_core::value::{IntValue, SequenceValue, SetValue};
use crucible_core::Value;
use crucible_engine::graph::NodeKind;
use crucible_engine::ops::QuantInstance;
use crucible_engine::propagate::{assign_value, member_set_int, seq_swap, set_add, set_int, set_remove};
use crucible_engine::sanity;
use crucible_engine::{Graph, NodeId};

fn int(v: i64) -> Value {
    Value::Int(IntValue::new(v))
}

fn set_var(g: &mut Graph, values: &[i64]) -> NodeId {
    let mut set = SetValue::new();
    for &v in values {
        assert!(set.add(int(v)));
    }
    g.add_variable(Value::Set(set))
}

fn seq_var(g: &mut Graph, values: &[i64]) -> NodeId {
    let mut seq = SequenceValue::new(false);
    for &v in values {
        assert!(seq.push(int(v)));
    }
    g.add_variable(Value::Sequence(seq))
}

/// forall x in c . x <= bound
fn all_leq(g: &mut Graph, container: NodeId, bound: NodeId) -> NodeId {
    let iter = g.iter_ref();
    let body = g.leq(iter, bound);
    g.for_all(container, iter, body)
}

fn instances(g: &Graph, forall: NodeId) -> Vec<QuantInstance> {
    match g.kind(forall) {
        NodeKind::ForAll(op) => op.instances.clone(),
        _ => unreachable!(),
    }
}

#[test]
fn unrolls_one_instance_per_member() {
    let mut g = Graph::new();
    let c = set_var(&mut g, &[1, 2, 3]);
    let bound = g.add_variable(int(10));
    let fa = all_leq(&mut g, c, bound);
    assert_eq!(instances(&g, fa).len(), 3);
    assert_eq!(g.view(fa).expect_violation(), 0);
    sanity::check(&g, &[fa]);
}

#[test]
fn shared_operand_change_reaches_every_instance() {
    let mut g = Graph::new();
    let c = set_var(&mut g, &[1, 2, 3]);
    let bound = g.add_variable(int(10));
    let fa = all_leq(&mut g, c, bound);

    set_int(&mut g, bound, 0);
    // members 1, 2, 3 each exceed by their own value
    assert_eq!(g.view(fa).expect_violation(), 6);
    set_int(&mut g, bound, 2);
    assert_eq!(g.view(fa).expect_violation(), 1);
    sanity::check(&g, &[fa]);
}

#[test]
fn member_rebinding_touches_only_its_instance() {
    let mut g = Graph::new();
    let c = set_var(&mut g, &[1, 2, 3]);
    let bound = g.add_variable(int(10));
    let fa = all_leq(&mut g, c, bound);
    let before = instances(&g, fa);
    let untouched: Vec<u64> = before[1..]
        .iter()
        .map(|inst| g.node(inst.root).eval_count)
        .collect();

    assert!(member_set_int(&mut g, c, 0, 50));
    assert_eq!(g.view(fa).expect_violation(), 40);
    let after = instances(&g, fa);
    for (inst, evals) in after[1..].iter().zip(untouched) {
        assert_eq!(g.node(inst.root).eval_count, evals);
    }
    sanity::check(&g, &[fa]);
}

#[test]
fn membership_growth_and_shrink_track_instances() {
    let mut g = Graph::new();
    let c = set_var(&mut g, &[1, 2, 3]);
    let bound = g.add_variable(int(10));
    let fa = all_leq(&mut g, c, bound);

    assert!(set_add(&mut g, c, int(99)));
    assert_eq!(instances(&g, fa).len(), 4);
    assert_eq!(g.view(fa).expect_violation(), 89);

    let removed = set_remove(&mut g, c, 3);
    assert_eq!(removed.as_int(), Some(99));
    assert_eq!(instances(&g, fa).len(), 3);
    assert_eq!(g.view(fa).expect_violation(), 0);
    sanity::check(&g, &[fa]);
}

#[test]
fn sequence_swap_carries_bindings_with_the_members() {
    let mut g = Graph::new();
    let c = seq_var(&mut g, &[4, 20, 6]);
    let bound = g.add_variable(int(10));
    let fa = all_leq(&mut g, c, bound);
    assert_eq!(g.view(fa).expect_violation(), 10);

    seq_swap(&mut g, c, 0, 1);
    assert_eq!(g.view(fa).expect_violation(), 10);
    // slot order still mirrors member order
    assert!(member_set_int(&mut g, c, 0, 5));
    assert_eq!(g.view(fa).expect_violation(), 0);
    sanity::check(&g, &[fa]);
}

#[test]
fn whole_container_replacement_reunrolls() {
    let mut g = Graph::new();
    let c = set_var(&mut g, &[1, 2]);
    let bound = g.add_variable(int(10));
    let fa = all_leq(&mut g, c, bound);

    let mut replacement = SetValue::new();
    for v in [30, 40, 50] {
        assert!(replacement.add(int(v)));
    }
    assign_value(&mut g, c, Value::Set(replacement));
    assert_eq!(instances(&g, fa).len(), 3);
    assert_eq!(g.view(fa).expect_violation(), 20 + 30 + 40);
    sanity::check(&g, &[fa]);
}
