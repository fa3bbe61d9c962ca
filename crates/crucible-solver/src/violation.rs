//! Per-variable violation bookkeeping.
//!
//! After each committed change the attribution walk deposits blame here:
//! an accumulated weight per root variable, plus a nested container per
//! container-typed variable holding per-member weights. Neighbourhood
//! selection draws variables weighted by blame, with a smoothing rule so
//! non-violating variables still get an occasional turn.

use std::collections::HashMap;

use crucible_core::SolverRng;
use crucible_engine::attribution::ViolationSink;

/// Accumulated violation weight per variable id.
///
/// Weights live in a dense vector indexed by id, with a side list of the
/// ids currently holding non-zero weight so [`ViolationContainer::reset`]
/// touches only those. The total always equals the sum of the top-level
/// entries; member-level blame is counted in the owning variable's weight
/// and recorded again in the child container, so whole-variable selection
/// never has to consult the children.
#[derive(Debug, Default, Clone)]
pub struct ViolationContainer {
    weights: Vec<u64>,
    nonzero: Vec<u64>,
    total: u64,
    children: HashMap<u64, ViolationContainer>,
}

impl ViolationContainer {
    pub fn new() -> ViolationContainer {
        ViolationContainer::default()
    }

    /// Adds `amount` to the weight of variable `var`.
    pub fn add_violation(&mut self, var: u64, amount: u64) {
        if amount == 0 {
            return;
        }
        let index = var as usize;
        if index >= self.weights.len() {
            self.weights.resize(index + 1, 0);
        }
        if self.weights[index] == 0 {
            self.nonzero.push(var);
        }
        self.weights[index] += amount;
        self.total += amount;
    }

    /// Clears all weights for the next attribution pass; O(number of
    /// non-zero entries), not O(max id).
    pub fn reset(&mut self) {
        for &var in &self.nonzero {
            self.weights[var as usize] = 0;
        }
        self.nonzero.clear();
        self.total = 0;
        self.children.clear();
    }

    pub fn var_violation(&self, var: u64) -> u64 {
        self.weights.get(var as usize).copied().unwrap_or(0)
    }

    /// Ids currently holding non-zero weight, in first-blamed order.
    pub fn vars_with_violation(&self) -> &[u64] {
        &self.nonzero
    }

    pub fn total_violation(&self) -> u64 {
        self.total
    }

    pub fn has_child_violation(&self, var: u64) -> bool {
        self.children.contains_key(&var)
    }

    /// Per-member blame inside container variable `var`, keyed by member
    /// index.
    pub fn child_violations(&self, var: u64) -> Option<&ViolationContainer> {
        self.children.get(&var)
    }

    /// Smallest non-zero weight; 0 when nothing is violating.
    pub fn calc_min_violation(&self) -> u64 {
        self.nonzero
            .iter()
            .map(|&v| self.weights[v as usize])
            .min()
            .unwrap_or(0)
    }

    /// Draws one id from `0..=max_var`, weighted by violation.
    ///
    /// With no recorded violation the draw is uniform. Otherwise each
    /// zero-weight id receives a simulated share of
    /// `min_violation / number_of_zero_weight_ids` (at least 1), so search
    /// can still reach variables outside the violating set.
    pub fn select_random_var(&self, max_var: u64, rng: &mut SolverRng) -> u64 {
        if self.total == 0 {
            return rng.range(0..=max_var);
        }
        let min = self.calc_min_violation();
        self.select_weighted(max_var, min, rng)
    }

    /// Draws `count` distinct ids, re-rolling duplicates. The minimum
    /// weight is computed once for the whole batch.
    pub fn select_random_vars(&self, max_var: u64, count: usize, rng: &mut SolverRng) -> Vec<u64> {
        let count = count.min(max_var as usize + 1);
        let mut picked: Vec<u64> = Vec::with_capacity(count);
        if self.total == 0 {
            while picked.len() < count {
                let var = rng.range(0..=max_var);
                if !picked.contains(&var) {
                    picked.push(var);
                }
            }
            return picked;
        }
        let min = self.calc_min_violation();
        while picked.len() < count {
            let var = self.select_weighted(max_var, min, rng);
            if !picked.contains(&var) {
                picked.push(var);
            }
        }
        picked
    }

    fn select_weighted(&self, max_var: u64, min: u64, rng: &mut SolverRng) -> u64 {
        let zero_count = (0..=max_var)
            .filter(|&v| self.var_violation(v) == 0)
            .count() as u64;
        let share = if zero_count == 0 {
            0
        } else {
            (min / zero_count).max(1)
        };
        let in_range: u64 = (0..=max_var).map(|v| self.var_violation(v)).sum();
        let simulated_total = in_range + share * zero_count;
        let mut remaining = rng.range(0..simulated_total);
        for var in 0..=max_var {
            let weight = match self.var_violation(var) {
                0 => share,
                w => w,
            };
            if remaining < weight {
                return var;
            }
            remaining -= weight;
        }
        max_var
    }

    fn child_mut(&mut self, var: u64) -> &mut ViolationContainer {
        self.children.entry(var).or_default()
    }
}

impl ViolationSink for ViolationContainer {
    fn add_var(&mut self, var: u64, violation: u64) {
        self.add_violation(var, violation);
    }

    fn add_member(&mut self, var: u64, index: usize, violation: u64) {
        // the owner carries the member's blame at the top level
        self.add_violation(var, violation);
        self.child_mut(var).add_violation(index as u64, violation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_track_additions_and_reset() {
        let mut c = ViolationContainer::new();
        c.add_violation(0, 3);
        c.add_violation(2, 5);
        c.add_violation(0, 1);
        assert_eq!(c.total_violation(), 9);
        assert_eq!(c.var_violation(0), 4);
        assert_eq!(c.var_violation(1), 0);
        assert_eq!(c.vars_with_violation(), &[0, 2]);
        assert_eq!(c.calc_min_violation(), 4);
        c.reset();
        assert_eq!(c.total_violation(), 0);
        assert!(c.vars_with_violation().is_empty());
    }

    #[test]
    fn member_blame_counts_toward_the_owner() {
        let mut c = ViolationContainer::new();
        c.add_member(3, 1, 4);
        c.add_member(3, 0, 2);
        assert_eq!(c.var_violation(3), 6);
        assert_eq!(c.total_violation(), 6);
        assert!(c.has_child_violation(3));
        let child = c.child_violations(3).unwrap();
        assert_eq!(child.var_violation(1), 4);
        assert_eq!(child.var_violation(0), 2);
        assert_eq!(child.total_violation(), 6);
    }

    #[test]
    fn uniform_when_nothing_violates() {
        let c = ViolationContainer::new();
        let mut rng = SolverRng::from_seed(11);
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[c.select_random_var(3, &mut rng) as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn heavy_variables_are_drawn_more_often() {
        let mut c = ViolationContainer::new();
        c.add_violation(0, 1);
        c.add_violation(1, 10);
        let mut rng = SolverRng::from_seed(5);
        let mut counts = [0u32; 3];
        for _ in 0..3000 {
            counts[c.select_random_var(2, &mut rng) as usize] += 1;
        }
        assert!(counts[1] > counts[0] * 3, "counts {counts:?}");
        // the zero-weight id still gets its smoothed share
        assert!(counts[2] > 0, "counts {counts:?}");
    }

    #[test]
    fn batch_selection_is_distinct_and_in_range() {
        let mut c = ViolationContainer::new();
        c.add_violation(1, 7);
        let mut rng = SolverRng::from_seed(2);
        let picked = c.select_random_vars(4, 3, &mut rng);
        assert_eq!(picked.len(), 3);
        for &var in &picked {
            assert!(var <= 4);
            assert_eq!(picked.iter().filter(|&&p| p == var).count(), 1);
        }
    }
}
