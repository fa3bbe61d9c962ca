//! Propagation over the shared problem fixtures.

use crucible_engine::propagate;
use crucible_test::{all_diff_sum, colouring};

#[test]
fn all_diff_sum_reaches_zero_when_solved_by_hand() {
    let mut f = all_diff_sum(3, 6);
    assert!(f.violation() > 0);
    // 1 + 2 + 3 = 6, pairwise distinct
    propagate::set_int(&mut f.graph, f.vars[0], 1);
    propagate::set_int(&mut f.graph, f.vars[1], 2);
    propagate::set_int(&mut f.graph, f.vars[2], 3);
    assert_eq!(f.violation(), 0);
    f.assert_consistent();
}

#[test]
fn colouring_violation_tracks_conflicting_edges() {
    // triangle, two colours: at best one edge stays monochrome
    let mut f = colouring(&[(0, 1), (1, 2), (0, 2)], 2);
    assert_eq!(f.violation(), 3);
    propagate::set_int(&mut f.graph, f.vars[1], 1);
    assert_eq!(f.violation(), 1);
    f.assert_consistent();
}

#[test]
fn colour_bound_counts_as_violation() {
    let mut f = colouring(&[(0, 1)], 2);
    propagate::set_int(&mut f.graph, f.vars[1], 5);
    // the edge is satisfied but the colour limit is not
    assert!(f.violation() > 0);
    propagate::set_int(&mut f.graph, f.vars[1], 1);
    assert_eq!(f.violation(), 0);
    f.assert_consistent();
}
