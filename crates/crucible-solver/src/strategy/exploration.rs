//! Violation back-off exploration.

use crucible_config::ExplorationConfig;

use crate::neighbourhood::Candidate;
use crate::state::{MarkPoint, NeighbourhoodResult};

use super::SearchStrategy;

/// Escapes local minima by allowing the violation to rise above the best
/// seen, within an allowance that backs off geometrically while no
/// improvement arrives and snaps back on the next improvement.
///
/// The allowance starts at `backoff_base` and is raised by
/// `backoff_multiplier` each time a full allowance-length streak passes
/// without improvement; after `backoff_increase_limit` raises it resets.
/// The constants are empirical tuning, not correctness contracts.
#[derive(Debug)]
pub struct ExplorationUsingViolationBackOff {
    base: u64,
    multiplier: f64,
    increase_limit: u32,
    allowance: u64,
    increases: u32,
    best_violation: u64,
    streak: u64,
}

impl ExplorationUsingViolationBackOff {
    pub fn new(config: &ExplorationConfig) -> ExplorationUsingViolationBackOff {
        ExplorationUsingViolationBackOff {
            base: config.backoff_base,
            multiplier: config.backoff_multiplier,
            increase_limit: config.backoff_increase_limit,
            allowance: config.backoff_base,
            increases: 0,
            best_violation: u64::MAX,
            streak: 0,
        }
    }

    pub fn allowance(&self) -> u64 {
        self.allowance
    }

    fn raise_allowance(&mut self) {
        if self.increases >= self.increase_limit {
            self.allowance = self.base;
            self.increases = 0;
            return;
        }
        self.allowance = ((self.allowance as f64 * self.multiplier).ceil()) as u64;
        self.increases += 1;
    }
}

impl SearchStrategy for ExplorationUsingViolationBackOff {
    fn accept(&mut self, candidate: &Candidate, _mark: &MarkPoint) -> bool {
        candidate.defined
            && candidate.violation <= self.best_violation.saturating_add(self.allowance)
    }

    fn observe(&mut self, result: &NeighbourhoodResult) {
        if result.violation < self.best_violation {
            self.best_violation = result.violation;
            self.allowance = self.base;
            self.increases = 0;
            self.streak = 0;
            return;
        }
        self.streak += 1;
        if self.streak >= self.allowance.max(1) {
            self.streak = 0;
            self.raise_allowance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ExplorationConfig {
        ExplorationConfig {
            backoff_base: 2,
            backoff_multiplier: 2.0,
            backoff_increase_limit: 3,
        }
    }

    fn sealed(violation: u64) -> NeighbourhoodResult {
        NeighbourhoodResult {
            found: true,
            committed: true,
            violation,
            objective: None,
            minor_nodes: 0,
            mark: MarkPoint {
                iteration: 0,
                violation,
                objective: None,
                minor_nodes: 0,
            },
        }
    }

    fn candidate(violation: u64) -> Candidate {
        Candidate {
            violation,
            objective: None,
            defined: true,
        }
    }

    #[test]
    fn allowance_bounds_acceptance_around_the_best() {
        let mut ex = ExplorationUsingViolationBackOff::new(&config());
        ex.observe(&sealed(10));
        assert!(ex.accept(&candidate(12), &sealed(10).mark));
        assert!(!ex.accept(&candidate(13), &sealed(10).mark));
    }

    #[test]
    fn allowance_backs_off_then_resets_on_improvement() {
        let mut ex = ExplorationUsingViolationBackOff::new(&config());
        ex.observe(&sealed(10));
        // two non-improving steps exhaust the streak at allowance 2
        ex.observe(&sealed(10));
        ex.observe(&sealed(11));
        assert_eq!(ex.allowance(), 4);
        ex.observe(&sealed(9));
        assert_eq!(ex.allowance(), 2);
    }
}
