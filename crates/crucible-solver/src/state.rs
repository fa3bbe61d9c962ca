//! Search state and the activation driver.
//!
//! [`State`] owns the graph, the model, the violation bookkeeping and the
//! statistics, and runs one neighbourhood activation at a time: read the
//! mark point, let the generator run the propose/check/commit protocol
//! against the strategy, then seal the result, refresh the blame weights
//! on commit, and fold everything into the counters.

use crucible_config::SearchConfig;
use crucible_core::{EndOfSearch, SearchResult, SolverRng};
use crucible_engine::{attribution, sanity, Graph};

use crate::model::{Model, OptimiseMode};
use crate::neighbourhood::{Candidate, MoveOutcome, NeighbourhoodParams};
use crate::stats::StatsContainer;
use crate::strategy::SearchStrategy;
use crate::violation::ViolationContainer;

/// Root readings captured immediately before an activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkPoint {
    pub iteration: u64,
    pub violation: u64,
    pub objective: Option<i64>,
    /// Cumulative from-scratch node evaluation count at the mark.
    pub minor_nodes: u64,
}

/// The sealed record of one neighbourhood activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighbourhoodResult {
    /// Whether any candidate was applied within the try limit.
    pub found: bool,
    pub committed: bool,
    /// Root violation after the activation settled.
    pub violation: u64,
    pub objective: Option<i64>,
    /// Cumulative evaluation count after the activation settled.
    pub minor_nodes: u64,
    pub mark: MarkPoint,
}

impl NeighbourhoodResult {
    /// Evaluations this activation consumed.
    pub fn minor_nodes_used(&self) -> u64 {
        self.minor_nodes.saturating_sub(self.mark.minor_nodes)
    }

    /// Signed violation change; negative means improvement.
    pub fn delta_violation(&self) -> i64 {
        saturating_diff(self.violation, self.mark.violation)
    }

    pub fn delta_objective(&self) -> Option<i64> {
        match (self.objective, self.mark.objective) {
            (Some(now), Some(then)) => Some(now.saturating_sub(then)),
            _ => None,
        }
    }
}

fn saturating_diff(a: u64, b: u64) -> i64 {
    let wide = a as i128 - b as i128;
    wide.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// One in-flight search over a built model.
pub struct State {
    graph: Graph,
    model: Model,
    config: SearchConfig,
    violations: ViolationContainer,
    stats: StatsContainer,
    rng: SolverRng,
    iteration: u64,
    stop_requested: bool,
    /// Neighbourhood indices per dense variable id; empty for constants.
    nbs_by_var_id: Vec<Vec<usize>>,
}

impl State {
    pub fn new(model: Model, graph: Graph, config: SearchConfig) -> State {
        let rng = match config.random_seed {
            Some(seed) => SolverRng::from_seed(seed),
            None => SolverRng::from_entropy(),
        };
        let mut nbs_by_var_id = vec![Vec::new(); graph.variable_count() as usize];
        for (index, nb) in model.neighbourhoods.iter().enumerate() {
            let id = graph.value(model.variables[nb.var].node).id();
            nbs_by_var_id[id as usize].push(index);
        }
        let stats = StatsContainer::new(model.neighbourhoods.len());
        let mut state = State {
            graph,
            model,
            config,
            violations: ViolationContainer::new(),
            stats,
            rng,
            iteration: 0,
            stop_requested: false,
            nbs_by_var_id,
        };
        state.update_var_violations();
        state
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn stats(&self) -> &StatsContainer {
        &self.stats
    }

    pub fn violations(&self) -> &ViolationContainer {
        &self.violations
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Root constraint violation; `u64::MAX` when the root is undefined.
    pub fn violation(&self) -> u64 {
        self.graph
            .view(self.model.constraint)
            .violation()
            .unwrap_or(u64::MAX)
    }

    pub fn objective(&self) -> Option<i64> {
        match self.model.optimise {
            OptimiseMode::None => None,
            _ => self
                .model
                .objective
                .and_then(|o| self.graph.view(o).as_int()),
        }
    }

    /// Makes the next [`test_for_termination`](State::test_for_termination)
    /// end the search.
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    fn test_for_termination(&self) -> SearchResult<()> {
        if self.stop_requested {
            return Err(EndOfSearch);
        }
        if let Some(limit) = self.config.iteration_limit {
            if self.iteration >= limit {
                return Err(EndOfSearch);
            }
        }
        Ok(())
    }

    /// A neighbourhood index to activate next: a variable drawn weighted
    /// by blame, then one of its generators uniformly. Draws that land on
    /// a blamed non-decision leaf are re-rolled a bounded number of times
    /// before falling back to a uniform pick over the catalogue.
    pub fn select_neighbourhood(&mut self) -> usize {
        let max_var = self.graph.variable_count() - 1;
        for _ in 0..16 {
            let id = self.violations.select_random_var(max_var, &mut self.rng) as usize;
            let candidates = &self.nbs_by_var_id[id];
            if !candidates.is_empty() {
                return candidates[self.rng.index(candidates.len())];
            }
        }
        self.rng.index(self.model.neighbourhoods.len())
    }

    /// Runs one activation of neighbourhood `index` under `strategy`.
    ///
    /// Returns [`EndOfSearch`] once a stop was requested or the iteration
    /// limit is reached; the graph is untouched in that case.
    pub fn run_neighbourhood(
        &mut self,
        index: usize,
        strategy: &mut dyn SearchStrategy,
    ) -> SearchResult<NeighbourhoodResult> {
        self.test_for_termination()?;
        self.iteration += 1;
        let mark = MarkPoint {
            iteration: self.iteration,
            violation: self.violation(),
            objective: self.objective(),
            minor_nodes: self.graph.total_evals(),
        };

        let nb = &self.model.neighbourhoods[index];
        let kind = nb.kind;
        let variable = &self.model.variables[nb.var];
        let mut parent_check = |candidate: &Candidate| candidate.defined;
        let mut accept = |candidate: &Candidate| strategy.accept(candidate, &mark);
        let mut params = NeighbourhoodParams {
            graph: &mut self.graph,
            var: variable.node,
            domain: &variable.domain,
            constraint: self.model.constraint,
            objective: self.model.objective,
            violations: &self.violations,
            rng: &mut self.rng,
            try_limit: self.config.parent_check_try_limit,
            assignment_attempt_limit: self.config.assignment_attempt_limit,
            parent_check: &mut parent_check,
            accept: &mut accept,
        };
        let outcome = kind.apply(&mut params);

        let result = NeighbourhoodResult {
            found: outcome != MoveOutcome::NotFound,
            committed: outcome == MoveOutcome::Committed,
            violation: self.violation(),
            objective: self.objective(),
            minor_nodes: self.graph.total_evals(),
            mark,
        };
        if result.committed {
            self.update_var_violations();
            tracing::trace!(
                iteration = self.iteration,
                neighbourhood = %self.model.neighbourhoods[index].name,
                violation = result.violation,
                "committed"
            );
        }
        self.stats.report_result(index, &result);
        strategy.observe(&result);

        if let Some(interval) = self.config.sanity_check_interval {
            if interval > 0 && self.iteration % interval == 0 {
                let mut roots = vec![self.model.constraint];
                roots.extend(self.model.objective);
                sanity::check(&self.graph, &roots);
            }
        }
        Ok(result)
    }

    /// Re-derives the blame weights from the root constraint.
    fn update_var_violations(&mut self) {
        self.violations.reset();
        attribution::attribute(&self.graph, self.model.constraint, &mut self.violations);
    }
}
