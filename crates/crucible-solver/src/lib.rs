//! Crucible Solver - violation-guided local search over constraint models.
//!
//! A model pairs decision variables (typed by
//! [`Domain`](crucible_core::Domain)) with a constraint expression graph.
//! Search repeatedly activates a neighbourhood: propose a local change,
//! let incremental propagation surface the new root violation, and let a
//! [`SearchStrategy`](strategy::SearchStrategy) decide commit or revert.
//! Variable selection is weighted by per-variable blame attributed down
//! from the root after every commit.
//!
//! # Examples
//!
//! Solve `x == 7` over `0..=9` by hill climbing:
//!
//! ```
//! use crucible_config::SearchConfig;
//! use crucible_core::value::IntValue;
//! use crucible_core::{Domain, IntDomain, Value};
//! use crucible_solver::strategy::HillClimbing;
//! use crucible_solver::{ModelBuilder, OptimiseMode, State};
//!
//! let mut builder = ModelBuilder::new();
//! let x = builder.add_variable(
//!     "x",
//!     Domain::Int(IntDomain::range(0, 9).unwrap()),
//!     Value::Int(IntValue::new(0)),
//! );
//! let target = builder.add_constant(Value::Int(IntValue::new(7)));
//! let constraint = builder.graph_mut().eq(x, target);
//! builder.post(constraint);
//! let (model, graph) = builder.build().unwrap();
//!
//! let config = SearchConfig {
//!     random_seed: Some(1),
//!     ..SearchConfig::default()
//! };
//! let mut state = State::new(model, graph, config);
//! let mut strategy = HillClimbing::new(OptimiseMode::None);
//! for _ in 0..200 {
//!     if state.violation() == 0 {
//!         break;
//!     }
//!     let index = state.select_neighbourhood();
//!     state.run_neighbourhood(index, &mut strategy).unwrap();
//! }
//! assert_eq!(state.violation(), 0);
//! ```

pub mod assign;
pub mod model;
pub mod neighbourhood;
pub mod resource;
pub mod state;
pub mod stats;
pub mod strategy;
pub mod violation;

pub use model::{Model, ModelBuilder, OptimiseMode, Variable};
pub use neighbourhood::{Candidate, MoveOutcome, NbKind, Neighbourhood, NeighbourhoodParams};
pub use state::{MarkPoint, NeighbourhoodResult, State};
pub use stats::StatsContainer;
pub use violation::ViolationContainer;
