//! Late acceptance hill climbing.

use std::collections::VecDeque;

use crucible_config::LateAcceptanceConfig;

use crate::model::OptimiseMode;
use crate::neighbourhood::Candidate;
use crate::state::{MarkPoint, NeighbourhoodResult};

use super::{cost_of, Cost, SearchStrategy};

/// Accepts a candidate that beats either the current cost or the cost
/// from `queue_size` activations ago, letting search traverse plateaus
/// and shallow worsenings.
#[derive(Debug)]
pub struct LateAcceptance {
    mode: OptimiseMode,
    capacity: usize,
    history: VecDeque<Cost>,
}

impl LateAcceptance {
    pub fn new(mode: OptimiseMode, config: &LateAcceptanceConfig) -> LateAcceptance {
        LateAcceptance {
            mode,
            capacity: config.queue_size,
            history: VecDeque::with_capacity(config.queue_size),
        }
    }
}

impl SearchStrategy for LateAcceptance {
    fn accept(&mut self, candidate: &Candidate, mark: &MarkPoint) -> bool {
        if !candidate.defined {
            return false;
        }
        let cost = cost_of(candidate.violation, candidate.objective, self.mode);
        let current = cost_of(mark.violation, mark.objective, self.mode);
        let historical = self.history.front().copied().unwrap_or(current);
        cost <= current || cost <= historical
    }

    fn observe(&mut self, result: &NeighbourhoodResult) {
        let cost = cost_of(result.violation, result.objective, self.mode);
        self.history.push_back(cost);
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(violation: u64) -> Candidate {
        Candidate {
            violation,
            objective: None,
            defined: true,
        }
    }

    fn mark(violation: u64) -> MarkPoint {
        MarkPoint {
            iteration: 0,
            violation,
            objective: None,
            minor_nodes: 0,
        }
    }

    fn sealed(violation: u64) -> NeighbourhoodResult {
        NeighbourhoodResult {
            found: true,
            committed: true,
            violation,
            objective: None,
            minor_nodes: 0,
            mark: mark(violation),
        }
    }

    #[test]
    fn worsening_is_allowed_against_an_old_high_cost() {
        let config = LateAcceptanceConfig { queue_size: 2 };
        let mut la = LateAcceptance::new(OptimiseMode::None, &config);
        la.observe(&sealed(10));
        la.observe(&sealed(4));
        // current is 4 but the 2-step-old cost was 10
        assert!(la.accept(&candidate(8), &mark(4)));
        assert!(!la.accept(&candidate(11), &mark(4)));
    }

    #[test]
    fn queue_is_bounded() {
        let config = LateAcceptanceConfig { queue_size: 3 };
        let mut la = LateAcceptance::new(OptimiseMode::None, &config);
        for v in 0..10 {
            la.observe(&sealed(v));
        }
        assert_eq!(la.history.len(), 3);
    }
}
