//! UCB1 neighbourhood selection.

use crucible_config::UcbConfig;

use crate::state::NeighbourhoodResult;

/// Multi-armed bandit over the neighbourhood list.
///
/// Reward is violation improvement, cost is the from-scratch evaluation
/// count a neighbourhood consumed; the UCB index is reward rate per unit
/// of cost plus the usual exploration bonus, so cheap, effective moves
/// are preferred and expensive duds decay fast.
#[derive(Debug)]
pub struct UcbSelector {
    bias: f64,
    arms: Vec<Arm>,
    total_cost: f64,
}

#[derive(Debug, Default, Clone)]
struct Arm {
    activations: u64,
    reward: f64,
    cost: f64,
}

impl UcbSelector {
    pub fn new(arm_count: usize, config: &UcbConfig) -> UcbSelector {
        UcbSelector {
            bias: config.exploration_bias,
            arms: vec![Arm::default(); arm_count],
            total_cost: 0.0,
        }
    }

    /// The arm to activate next. Unplayed arms go first, in order.
    pub fn select(&self) -> usize {
        if let Some(unplayed) = self.arms.iter().position(|a| a.activations == 0) {
            return unplayed;
        }
        let mut best = 0;
        let mut best_index = f64::NEG_INFINITY;
        for (i, arm) in self.arms.iter().enumerate() {
            let exploitation = arm.reward / arm.cost;
            let exploration = (self.bias * self.total_cost.ln() / arm.cost).sqrt();
            let index = exploitation + exploration;
            if index > best_index {
                best_index = index;
                best = i;
            }
        }
        best
    }

    /// Folds one sealed activation of `arm` into its statistics.
    pub fn observe(&mut self, arm: usize, result: &NeighbourhoodResult) {
        let improvement = result.mark.violation.saturating_sub(result.violation);
        let cost = result.minor_nodes_used().max(1) as f64;
        let a = &mut self.arms[arm];
        a.activations += 1;
        a.reward += improvement as f64;
        a.cost += cost;
        self.total_cost += cost;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MarkPoint;

    fn sealed(before: u64, after: u64, evals: u64) -> NeighbourhoodResult {
        NeighbourhoodResult {
            found: true,
            committed: after <= before,
            violation: after,
            objective: None,
            minor_nodes: evals,
            mark: MarkPoint {
                iteration: 0,
                violation: before,
                objective: None,
                minor_nodes: 0,
            },
        }
    }

    #[test]
    fn unplayed_arms_are_tried_first() {
        let mut ucb = UcbSelector::new(3, &UcbConfig::default());
        assert_eq!(ucb.select(), 0);
        ucb.observe(0, &sealed(5, 5, 10));
        assert_eq!(ucb.select(), 1);
        ucb.observe(1, &sealed(5, 5, 10));
        assert_eq!(ucb.select(), 2);
    }

    #[test]
    fn rewarding_arms_dominate_once_explored() {
        let mut ucb = UcbSelector::new(2, &UcbConfig::default());
        for _ in 0..20 {
            ucb.observe(0, &sealed(10, 8, 10));
            ucb.observe(1, &sealed(10, 10, 10));
        }
        assert_eq!(ucb.select(), 0);
    }
}
