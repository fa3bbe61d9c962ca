//! Configuration system for Crucible.
//!
//! Load search tuning parameters from TOML files to control termination,
//! acceptance and exploration without code changes. Every default matches
//! the empirically tuned constants the strategies were developed with;
//! they are tuning knobs, not correctness contracts.
//!
//! # Examples
//!
//! Load configuration from a TOML string:
//!
//! ```
//! use crucible_config::SearchConfig;
//!
//! let config = SearchConfig::from_toml_str(r#"
//!     random_seed = 42
//!     iteration_limit = 100000
//!
//!     [late_acceptance]
//!     queue_size = 500
//!
//!     [exploration]
//!     backoff_base = 10
//! "#).unwrap();
//!
//! assert_eq!(config.random_seed, Some(42));
//! assert_eq!(config.late_acceptance.queue_size, 500);
//! ```
//!
//! Use defaults when the file is missing:
//!
//! ```
//! use crucible_config::SearchConfig;
//!
//! let config = SearchConfig::load("search.toml").unwrap_or_default();
//! assert_eq!(config.parent_check_try_limit, 1);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main search configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct SearchConfig {
    /// Random seed for reproducible runs; seeded from the OS when absent.
    pub random_seed: Option<u64>,

    /// Hard cap on search iterations; unlimited when absent.
    pub iteration_limit: Option<u64>,

    /// Attempts a neighbourhood may retry proposing after a failed parent
    /// check before reporting "no move found".
    pub parent_check_try_limit: u32,

    /// Run the from-scratch sanity check every this many iterations;
    /// disabled when absent.
    pub sanity_check_interval: Option<u64>,

    /// Generation attempts for one resource-bounded random assignment
    /// before the neighbourhood gives up.
    pub assignment_attempt_limit: u32,

    pub late_acceptance: LateAcceptanceConfig,
    pub exploration: ExplorationConfig,
    pub ucb: UcbConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            random_seed: None,
            iteration_limit: None,
            parent_check_try_limit: 1,
            sanity_check_interval: None,
            assignment_attempt_limit: 20,
            late_acceptance: LateAcceptanceConfig::default(),
            exploration: ExplorationConfig::default(),
            ucb: UcbConfig::default(),
        }
    }
}

impl SearchConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: SearchConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.parent_check_try_limit == 0 {
            return Err(ConfigError::Invalid(
                "parent_check_try_limit must be at least 1".into(),
            ));
        }
        if self.late_acceptance.queue_size == 0 {
            return Err(ConfigError::Invalid(
                "late_acceptance.queue_size must be at least 1".into(),
            ));
        }
        if self.exploration.backoff_multiplier < 1.0 {
            return Err(ConfigError::Invalid(
                "exploration.backoff_multiplier must be >= 1.0".into(),
            ));
        }
        Ok(())
    }
}

/// Late acceptance hill climbing parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct LateAcceptanceConfig {
    /// Length of the historical cost queue candidates are compared against.
    pub queue_size: usize,
}

impl Default for LateAcceptanceConfig {
    fn default() -> Self {
        LateAcceptanceConfig { queue_size: 400 }
    }
}

/// Violation back-off exploration parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct ExplorationConfig {
    /// Initial extra-violation budget granted when exploration starts.
    pub backoff_base: u64,
    /// Growth factor applied each time the budget is raised.
    pub backoff_multiplier: f64,
    /// Number of budget raises allowed before exploration resets.
    pub backoff_increase_limit: u32,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        ExplorationConfig {
            backoff_base: 10,
            backoff_multiplier: 1.3,
            backoff_increase_limit: 15,
        }
    }
}

/// UCB neighbourhood selection parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct UcbConfig {
    /// Exploration bias of the UCB1 index.
    pub exploration_bias: f64,
}

impl Default for UcbConfig {
    fn default() -> Self {
        UcbConfig {
            exploration_bias: 2.0,
        }
    }
}

#[cfg(test)]
mod tests;
