use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not access config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings of a random play run. Missing fields in a config file fall back
/// to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayConfig {
    /// Number of environment steps to take
    pub steps: usize,
    /// Render after every step, if the environment is renderable
    pub render: bool,
    /// Show a progress bar
    pub progress: bool,
    /// Seeds action sampling and the first reset
    pub seed: Option<u64>,
    /// Enable per-phase timing of the loop
    pub profile_timers: bool,
    /// Log timing averages every N steps (when profiling)
    pub profile_log_every_steps: usize,
}

impl Default for PlayConfig {
    fn default() -> Self {
        Self {
            steps: 500,
            render: true,
            progress: true,
            seed: None,
            profile_timers: false,
            profile_log_every_steps: 250,
        }
    }
}

impl PlayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_render(mut self, render: bool) -> Self {
        self.render = render;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_profile_timers(mut self, profile_timers: bool) -> Self {
        self.profile_timers = profile_timers;
        self
    }

    pub fn with_profile_log_every_steps(mut self, every: usize) -> Self {
        self.profile_log_every_steps = every;
        self
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(serde_json::from_str(&text)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;

        fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
