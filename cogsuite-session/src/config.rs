use std::fs;
use std::path::Path;
use std::time::Duration;

use cogsuite_core::ConfigError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Engine-level settings shared by all tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Upper bound on trials; `None` lets the task decide when it is done.
    pub max_trials: Option<usize>,
    /// Pause between `start()` and the first trial.
    pub start_delay_ms: u64,
    /// Responses faster than this after the window opened are discarded.
    pub min_reaction_ms: u64,
    /// How long response feedback stays up.
    pub feedback_ms: u64,
    /// Wall-time cap after which the session completes.
    pub session_limit_ms: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_trials: None,
            start_delay_ms: 1000,
            min_reaction_ms: 100,
            feedback_ms: 200,
            session_limit_ms: None,
        }
    }
}

impl SessionConfig {
    pub fn with_max_trials(mut self, max_trials: usize) -> Self {
        self.max_trials = Some(max_trials);
        self
    }

    pub fn with_session_limit(mut self, limit_ms: u64) -> Self {
        self.session_limit_ms = Some(limit_ms);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_trials == Some(0) {
            return Err(ConfigError::Invalid("max_trials must be at least 1".into()));
        }
        if self.session_limit_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "session_limit_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }

    pub fn feedback(&self) -> Duration {
        Duration::from_millis(self.feedback_ms)
    }

    pub fn min_reaction_ns(&self) -> u64 {
        self.min_reaction_ms * 1_000_000
    }
}

/// Reads a JSON config file into any deserializable settings type.
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
