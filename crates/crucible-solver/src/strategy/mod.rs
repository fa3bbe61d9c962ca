//! Search strategies.
//!
//! A strategy is the policy side of the neighbourhood protocol: it sees
//! each tentatively applied candidate next to the pre-move mark point and
//! returns the commit-or-revert verdict, then observes the sealed result.
//! The engine side stays policy-free; everything here is replaceable.

mod exploration;
mod late_acceptance;
mod ucb;

pub use exploration::ExplorationUsingViolationBackOff;
pub use late_acceptance::LateAcceptance;
pub use ucb::UcbSelector;

use crate::model::OptimiseMode;
use crate::neighbourhood::Candidate;
use crate::state::{MarkPoint, NeighbourhoodResult};

/// Acceptance policy consulted by `run_neighbourhood`.
pub trait SearchStrategy {
    /// The commit-or-revert verdict for one applied candidate.
    fn accept(&mut self, candidate: &Candidate, mark: &MarkPoint) -> bool;

    /// Sees the sealed result of the activation, committed or not.
    fn observe(&mut self, _result: &NeighbourhoodResult) {}
}

/// Lexicographic search cost: violation first, then the objective folded
/// into minimisation direction. Undefined objectives rank worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Cost {
    violation: u64,
    objective: i64,
}

pub(crate) fn cost_of(violation: u64, objective: Option<i64>, mode: OptimiseMode) -> Cost {
    let objective = match (mode, objective) {
        (OptimiseMode::None, _) => 0,
        (OptimiseMode::Minimise, Some(o)) => o,
        (OptimiseMode::Maximise, Some(o)) => o.saturating_neg(),
        (_, None) => i64::MAX,
    };
    Cost {
        violation,
        objective,
    }
}

/// Accepts any candidate that does not worsen the current cost.
#[derive(Debug)]
pub struct HillClimbing {
    mode: OptimiseMode,
    iterations_since_improvement: u64,
}

impl HillClimbing {
    pub fn new(mode: OptimiseMode) -> HillClimbing {
        HillClimbing {
            mode,
            iterations_since_improvement: 0,
        }
    }

    /// Activations since the last strict improvement; drivers use this to
    /// detect a plateau and switch policy.
    pub fn iterations_since_improvement(&self) -> u64 {
        self.iterations_since_improvement
    }
}

impl SearchStrategy for HillClimbing {
    fn accept(&mut self, candidate: &Candidate, mark: &MarkPoint) -> bool {
        candidate.defined
            && cost_of(candidate.violation, candidate.objective, self.mode)
                <= cost_of(mark.violation, mark.objective, self.mode)
    }

    fn observe(&mut self, result: &NeighbourhoodResult) {
        let improved = result.committed
            && cost_of(result.violation, result.objective, self.mode)
                < cost_of(result.mark.violation, result.mark.objective, self.mode);
        if improved {
            self.iterations_since_improvement = 0;
        } else {
            self.iterations_since_improvement += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mark(violation: u64) -> MarkPoint {
        MarkPoint {
            iteration: 0,
            violation,
            objective: None,
            minor_nodes: 0,
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
    fn hill_climbing_accepts_sideways_but_not_worse() {
        let mut hc = HillClimbing::new(OptimiseMode::None);
        assert!(hc.accept(&candidate(3), &mark(5)));
        assert!(hc.accept(&candidate(5), &mark(5)));
        assert!(!hc.accept(&candidate(6), &mark(5)));
    }

    #[test]
    fn undefined_candidates_are_never_accepted() {
        let mut hc = HillClimbing::new(OptimiseMode::None);
        let undefined = Candidate {
            violation: u64::MAX,
            objective: None,
            defined: false,
        };
        assert!(!hc.accept(&undefined, &mark(u64::MAX)));
    }

    #[test]
    fn objective_breaks_ties_in_mode_direction() {
        let mut min = HillClimbing::new(OptimiseMode::Minimise);
        let better = Candidate {
            violation: 0,
            objective: Some(4),
            defined: true,
        };
        let mark = MarkPoint {
            iteration: 0,
            violation: 0,
            objective: Some(9),
            minor_nodes: 0,
        };
        assert!(min.accept(&better, &mark));
        let mut max = HillClimbing::new(OptimiseMode::Maximise);
        assert!(!max.accept(&better, &mark));
    }
}
