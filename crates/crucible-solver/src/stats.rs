//! Search statistics.

use std::fmt;

use crate::state::NeighbourhoodResult;

/// Per-neighbourhood activation counters.
#[derive(Debug, Default, Clone)]
pub struct NeighbourhoodStats {
    pub activations: u64,
    pub committed: u64,
    /// Commits that strictly lowered the root violation.
    pub improvements: u64,
    /// From-scratch node evaluations spent inside this neighbourhood.
    pub minor_nodes: u64,
}

/// Aggregate counters for one search run.
#[derive(Debug, Default)]
pub struct StatsContainer {
    pub iterations: u64,
    pub committed: u64,
    pub rejected: u64,
    pub no_move_found: u64,
    pub best_violation: Option<u64>,
    /// Objective reading at the moment the best violation was reached.
    pub objective_at_best: Option<i64>,
    per_neighbourhood: Vec<NeighbourhoodStats>,
}

impl StatsContainer {
    pub fn new(neighbourhood_count: usize) -> StatsContainer {
        StatsContainer {
            per_neighbourhood: vec![NeighbourhoodStats::default(); neighbourhood_count],
            ..StatsContainer::default()
        }
    }

    /// Folds one neighbourhood activation into the counters.
    pub fn report_result(&mut self, index: usize, result: &NeighbourhoodResult) {
        self.iterations += 1;
        if result.committed {
            self.committed += 1;
        } else if result.found {
            self.rejected += 1;
        } else {
            self.no_move_found += 1;
        }
        if self.best_violation.map_or(true, |best| result.violation < best) {
            self.best_violation = Some(result.violation);
            self.objective_at_best = result.objective;
        }
        let nb = &mut self.per_neighbourhood[index];
        nb.activations += 1;
        nb.minor_nodes += result.minor_nodes_used();
        if result.committed {
            nb.committed += 1;
            if result.violation < result.mark.violation {
                nb.improvements += 1;
            }
        }
    }

    pub fn neighbourhood(&self, index: usize) -> &NeighbourhoodStats {
        &self.per_neighbourhood[index]
    }
}

impl fmt::Display for StatsContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "iterations: {} (committed {}, rejected {}, no move {})",
            self.iterations, self.committed, self.rejected, self.no_move_found
        )?;
        match self.best_violation {
            Some(v) => writeln!(f, "best violation: {v}")?,
            None => writeln!(f, "best violation: -")?,
        }
        for (i, nb) in self.per_neighbourhood.iter().enumerate() {
            writeln!(
                f,
                "  nb {i}: activations {}, committed {}, improvements {}, minor nodes {}",
                nb.activations, nb.committed, nb.improvements, nb.minor_nodes
            )?;
        }
        Ok(())
    }
}
