//! End-to-end checks of incremental propagation against from-scratch
//! semantics: mutations must land the right cached views without
//! re-running untouched evaluators.

use crucible_core::value::{IntValue, SequenceValue, SetValue};
use crucible_core::Value;
use crucible_engine::graph::NodeKind;
use crucible_engine::propagate::{
    assign_value, member_set_int, seq_insert, seq_remove, seq_swap, set_add, set_int, set_remove,
};
use crucible_engine::sanity;
use crucible_engine::view::View;
use crucible_engine::{Graph, NodeId};

fn int_var(g: &mut Graph, v: i64) -> NodeId {
    g.add_variable(Value::Int(IntValue::new(v)))
}

fn int(v: i64) -> Value {
    Value::Int(IntValue::new(v))
}

fn seq_var(g: &mut Graph, values: &[i64]) -> NodeId {
    let mut seq = SequenceValue::new(false);
    for &v in values {
        assert!(seq.push(int(v)));
    }
    g.add_variable(Value::Sequence(seq))
}

fn set_var(g: &mut Graph, values: &[i64]) -> NodeId {
    let mut set = SetValue::new();
    for &v in values {
        assert!(set.add(int(v)));
    }
    g.add_variable(Value::Set(set))
}

#[test]
fn int_range_appends_incrementally_on_upper_bound_growth() {
    let mut g = Graph::new();
    let lo = int_var(&mut g, 1);
    let hi = int_var(&mut g, 3);
    let range = g.int_range(lo, hi);
    assert_eq!(g.view(range).expect_seq(), &[1, 2, 3]);
    let evals_before = g.node(range).eval_count;

    set_int(&mut g, hi, 4);
    assert_eq!(g.view(range).expect_seq(), &[1, 2, 3, 4]);
    assert!(g.view(range).is_defined());
    // the delta handler patched the end; no from-scratch rebuild ran
    assert_eq!(g.node(range).eval_count, evals_before);

    set_int(&mut g, lo, 0);
    assert_eq!(g.view(range).expect_seq(), &[0, 1, 2, 3, 4]);
    set_int(&mut g, lo, 5);
    assert_eq!(g.view(range).expect_seq(), &[] as &[i64]);
    set_int(&mut g, lo, 2);
    assert_eq!(g.view(range).expect_seq(), &[2, 3, 4]);
    sanity::check(&g, &[range]);
}

#[test]
fn int_range_tolerates_bounds_at_the_integer_maximum() {
    let mut g = Graph::new();
    let lo = int_var(&mut g, i64::MAX - 2);
    let hi = int_var(&mut g, i64::MAX);
    let range = g.int_range(lo, hi);
    assert_eq!(
        g.view(range).expect_seq(),
        &[i64::MAX - 2, i64::MAX - 1, i64::MAX]
    );

    // the delta path keeps the cached tail ending exactly at i64::MAX
    set_int(&mut g, lo, i64::MAX - 1);
    assert_eq!(g.view(range).expect_seq(), &[i64::MAX - 1, i64::MAX]);
    sanity::check(&g, &[range]);
}

#[test]
fn all_diff_violation_follows_member_repair() {
    let mut g = Graph::new();
    let seq = seq_var(&mut g, &[1, 1, 2]);
    let c = g.all_diff_over(seq);
    assert_eq!(g.view(c).expect_violation(), 1);
    match g.kind(c) {
        NodeKind::AllDiff(op) => assert_eq!(op.violating_indices(&g), vec![0, 1]),
        _ => unreachable!(),
    }

    assert!(member_set_int(&mut g, seq, 1, 3));
    assert_eq!(g.view(c).expect_violation(), 0);
    match g.kind(c) {
        NodeKind::AllDiff(op) => assert!(op.violating_indices(&g).is_empty()),
        _ => unreachable!(),
    }
    sanity::check(&g, &[c]);
}

#[test]
fn sum_patches_by_difference_without_rescanning() {
    let mut g = Graph::new();
    let seq = seq_var(&mut g, &[2, 3, 5]);
    let sum = g.sum_over(seq);
    assert_eq!(g.view(sum).expect_int(), 10);
    let evals_before = g.node(sum).eval_count;

    assert!(member_set_int(&mut g, seq, 1, 7));
    assert_eq!(g.view(sum).expect_int(), 14);
    // O(1) delta, not a re-sum
    assert_eq!(g.node(sum).eval_count, evals_before);
    assert_eq!(g.node(seq).eval_count, 0);
    sanity::check(&g, &[sum]);
}

#[test]
fn sum_tracks_structural_container_changes() {
    let mut g = Graph::new();
    let set = set_var(&mut g, &[2, 3]);
    let sum = g.sum_over(set);
    assert_eq!(g.view(sum).expect_int(), 5);

    assert!(set_add(&mut g, set, int(9)));
    assert_eq!(g.view(sum).expect_int(), 14);
    // duplicate is rejected before anything propagates
    assert!(!set_add(&mut g, set, int(9)));
    assert_eq!(g.view(sum).expect_int(), 14);

    let removed = set_remove(&mut g, set, 0);
    assert_eq!(g.view(sum).expect_int(), 14 - removed.as_int().unwrap());
    sanity::check(&g, &[sum]);
}

#[test]
fn sequence_swap_leaves_sum_and_all_diff_unchanged() {
    let mut g = Graph::new();
    let seq = seq_var(&mut g, &[4, 5, 6]);
    let sum = g.sum_over(seq);
    let c = g.all_diff_over(seq);
    seq_swap(&mut g, seq, 0, 2);
    assert_eq!(g.view(sum).expect_int(), 15);
    assert_eq!(g.view(c).expect_violation(), 0);
    sanity::check(&g, &[sum, c]);
}

#[test]
fn sequence_insert_and_remove_shift_correctly() {
    let mut g = Graph::new();
    let seq = seq_var(&mut g, &[1, 2]);
    let sum = g.sum_over(seq);
    assert!(seq_insert(&mut g, seq, 1, int(10)));
    assert_eq!(g.view(sum).expect_int(), 13);
    assert_eq!(g.value(seq).member(1).and_then(Value::as_int), Some(10));

    let removed = seq_remove(&mut g, seq, 1);
    assert_eq!(removed.as_int(), Some(10));
    assert_eq!(g.view(sum).expect_int(), 3);
    sanity::check(&g, &[sum]);
}

#[test]
fn division_by_zero_flips_definedness_and_recovers() {
    let mut g = Graph::new();
    let num = int_var(&mut g, 12);
    let den = int_var(&mut g, 4);
    let div = g.div(num, den);
    let k = int_var(&mut g, 3);
    let root = g.eq(div, k);
    assert_eq!(g.view(root).expect_violation(), 0);

    set_int(&mut g, den, 0);
    assert!(!g.view(div).is_defined());
    assert!(!g.view(root).is_defined());

    set_int(&mut g, den, 6);
    assert_eq!(g.view(div).expect_int(), 2);
    assert_eq!(g.view(root).expect_violation(), 1);
    sanity::check(&g, &[root]);
}

#[test]
fn conjunction_sums_and_disjunction_takes_minimum() {
    let mut g = Graph::new();
    let x = int_var(&mut g, 1);
    let y = int_var(&mut g, 4);
    let z = int_var(&mut g, 4);
    let a = g.eq(x, y); // violation 3
    let b = g.eq(y, z); // violation 0
    let and = g.and(vec![a, b]);
    let or = g.or(vec![a, b]);
    assert_eq!(g.view(and).expect_violation(), 3);
    assert_eq!(g.view(or).expect_violation(), 0);

    set_int(&mut g, z, 9);
    assert_eq!(g.view(and).expect_violation(), 3 + 5);
    // the previous minimum rose; the disjunction rescans to the runner-up
    assert_eq!(g.view(or).expect_violation(), 3);
    sanity::check(&g, &[and, or]);
}

#[test]
fn product_handles_zero_crossings_without_division() {
    let mut g = Graph::new();
    let x = int_var(&mut g, 3);
    let y = int_var(&mut g, 0);
    let z = int_var(&mut g, 5);
    let p = g.product(vec![x, y, z]);
    assert_eq!(g.view(p).expect_int(), 0);
    set_int(&mut g, y, 2);
    assert_eq!(g.view(p).expect_int(), 30);
    set_int(&mut g, x, 0);
    assert_eq!(g.view(p).expect_int(), 0);
    set_int(&mut g, x, -1);
    assert_eq!(g.view(p).expect_int(), -10);
    sanity::check(&g, &[p]);
}

#[test]
fn whole_value_assignment_keeps_identity_and_rebuilds_aggregates() {
    let mut g = Graph::new();
    let set = set_var(&mut g, &[1, 2, 3]);
    let id_before = g.value(set).id();
    let sum = g.sum_over(set);
    assert_eq!(g.view(sum).expect_int(), 6);

    let mut replacement = SetValue::new();
    assert!(replacement.add(int(10)));
    assert!(replacement.add(int(20)));
    assign_value(&mut g, set, Value::Set(replacement));
    assert_eq!(g.value(set).id(), id_before);
    assert_eq!(g.view(sum).expect_int(), 30);
    sanity::check(&g, &[sum]);
}
