//! RON scenario files.
//!
//! ```ron
//! Scenario(
//!     history: (start: 0.0, step: 60.0, count: 10, position: 0.0, velocity: 7.5),
//!     predictions: [
//!         (name: "coast", fork_at: 300.0),
//!         (name: "burn", fork_at: 300.0, delta_v: 2.5, count: 8),
//!     ],
//!     prune_after: Some(420.0),
//!     detach_first: true,
//! )
//! ```
//!
//! Every field has a default, so an empty `()` is a valid scenario.

use std::path::Path;

use forkline_core::Instant;
use serde::Deserialize;

/// Errors loading a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("invalid scenario: {0}")]
    Invalid(String),
}

/// A run of the driver: one sampled history and the predictions forked
/// from it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub history: History,
    pub predictions: Vec<Prediction>,
    /// Delete every prediction forking after this instant.
    pub prune_after: Option<Instant>,
    /// Turn the first surviving prediction into an independent root.
    pub detach_first: bool,
    /// Drop history samples before this instant. Refused while any
    /// prediction forks at or before it.
    pub trim_before: Option<Instant>,
}

/// Evenly spaced samples of a body in uniform motion.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct History {
    pub start: Instant,
    /// Seconds between samples.
    pub step: f64,
    pub count: usize,
    pub position: f64,
    pub velocity: f64,
}

/// A continuation forked from the history.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Prediction {
    pub name: String,
    /// Forks at the last history sample at or before this instant.
    pub fork_at: Instant,
    /// Velocity change applied at the fork point.
    pub delta_v: f64,
    pub step: f64,
    pub count: usize,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            history: History::default(),
            predictions: vec![
                Prediction {
                    name: "coast".into(),
                    ..Prediction::default()
                },
                Prediction {
                    name: "burn".into(),
                    delta_v: 2.5,
                    ..Prediction::default()
                },
            ],
            prune_after: None,
            detach_first: false,
            trim_before: None,
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self {
            start: Instant::J2000,
            step: 60.0,
            count: 10,
            position: 0.0,
            velocity: 7.5,
        }
    }
}

impl Default for Prediction {
    fn default() -> Self {
        Self {
            name: "prediction".into(),
            fork_at: Instant::from_seconds(300.0),
            delta_v: 0.0,
            step: 60.0,
            count: 5,
        }
    }
}

impl Scenario {
    /// Read and validate a scenario file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    /// Parse and validate RON text.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let scenario: Scenario = ron::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let history = &self.history;
        if history.count == 0 {
            return Err(ConfigError::Invalid("history needs at least one sample".into()));
        }
        check_step("history", history.step)?;

        for prediction in &self.predictions {
            check_step(&prediction.name, prediction.step)?;
            if prediction.fork_at < history.start {
                return Err(ConfigError::Invalid(format!(
                    "prediction {:?} forks at {}, before the history starts at {}",
                    prediction.name, prediction.fork_at, history.start
                )));
            }
            if !prediction.delta_v.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "prediction {:?} has a non-finite delta_v",
                    prediction.name
                )));
            }
        }
        Ok(())
    }
}

fn check_step(what: &str, step: f64) -> Result<(), ConfigError> {
    if step.is_finite() && step > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{what}: step must be a positive number of seconds, got {step}"
        )))
    }
}
