//! Engine configuration.
//!
//! Provides unified configuration for an analysis run:
//! - Cycle detection bounds (length, window, caps, frame budget)
//! - Smurfing detection thresholds (fan threshold, window)
//! - Shell detection bounds (chain lengths, activity ceiling, caps)
//!
//! # Example
//!
//! ```rust,ignore
//! use muletrace_core::config::EngineConfig;
//!
//! // Load from environment
//! let config = EngineConfig::from_env()?;
//!
//! // Or load from file
//! let config = EngineConfig::from_file("config/muletrace.toml")?;
//! ```

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Cycle detector configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Maximum cycle length (nodes) to search for.
    pub max_length: usize,
    /// Maximum time span in hours between the earliest and latest
    /// transaction across the edges of a cycle.
    pub time_window_hours: f64,
    /// Maximum number of cycles returned.
    pub max_cycles: usize,
    /// Maximum DFS frames explored per root node.
    pub max_frames_per_root: usize,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            max_length: 5,
            time_window_hours: 72.0,
            max_cycles: 5_000,
            max_frames_per_root: 30_000,
        }
    }
}

/// Smurfing detector configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SmurfingConfig {
    /// Minimum unique counterparties within the window to trigger.
    pub fan_threshold: usize,
    /// Sliding window size in hours.
    pub window_hours: f64,
}

impl Default for SmurfingConfig {
    fn default() -> Self {
        Self {
            fan_threshold: 10,
            window_hours: 72.0,
        }
    }
}

/// Shell detector configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Maximum total transaction count for an intermediate account.
    pub max_intermediate_txns: usize,
    /// Minimum chain length in edges.
    pub min_chain_edges: usize,
    /// Maximum chain length in edges.
    pub max_chain_edges: usize,
    /// Maximum number of chains returned.
    pub max_paths: usize,
    /// Maximum chains emitted per source node.
    pub max_paths_per_source: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            max_intermediate_txns: 3,
            min_chain_edges: 3,
            max_chain_edges: 6,
            max_paths: 2_000,
            max_paths_per_source: 200,
        }
    }
}

/// Unified engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Cycle detector configuration.
    pub cycle: CycleConfig,
    /// Smurfing detector configuration.
    pub smurfing: SmurfingConfig,
    /// Shell detector configuration.
    pub shell: ShellConfig,
    /// Service name used in logs.
    pub service_name: String,
    /// Environment name.
    pub environment: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cycle: CycleConfig::default(),
            smurfing: SmurfingConfig::default(),
            shell: ShellConfig::default(),
            service_name: "muletrace".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Recognized variables: `MULETRACE_ENV`, `MULETRACE_SERVICE_NAME`,
    /// `MULETRACE_CYCLE_WINDOW_HOURS`, `MULETRACE_MAX_CYCLES`,
    /// `MULETRACE_FAN_THRESHOLD`, `MULETRACE_SMURF_WINDOW_HOURS`,
    /// `MULETRACE_MAX_SHELL_PATHS`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(env) = std::env::var("MULETRACE_ENV") {
            config.environment = env;
        }
        if let Ok(name) = std::env::var("MULETRACE_SERVICE_NAME") {
            config.service_name = name;
        }
        if let Ok(val) = std::env::var("MULETRACE_CYCLE_WINDOW_HOURS") {
            if let Ok(hours) = val.parse() {
                config.cycle.time_window_hours = hours;
            }
        }
        if let Ok(val) = std::env::var("MULETRACE_MAX_CYCLES") {
            if let Ok(n) = val.parse() {
                config.cycle.max_cycles = n;
            }
        }
        if let Ok(val) = std::env::var("MULETRACE_FAN_THRESHOLD") {
            if let Ok(n) = val.parse() {
                config.smurfing.fan_threshold = n;
            }
        }
        if let Ok(val) = std::env::var("MULETRACE_SMURF_WINDOW_HOURS") {
            if let Ok(hours) = val.parse() {
                config.smurfing.window_hours = hours;
            }
        }
        if let Ok(val) = std::env::var("MULETRACE_MAX_SHELL_PATHS") {
            if let Ok(n) = val.parse() {
                config.shell.max_paths = n;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| EngineError::config(format!("Failed to read config: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| EngineError::config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| EngineError::config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| EngineError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.cycle.max_length < 3 {
            return Err(EngineError::config(
                "cycle.max_length must be at least 3 (minimum simple cycle)",
            ));
        }
        if self.cycle.time_window_hours <= 0.0 || self.smurfing.window_hours <= 0.0 {
            return Err(EngineError::config("time windows must be positive"));
        }
        if self.smurfing.fan_threshold < 2 {
            return Err(EngineError::config("smurfing.fan_threshold must be >= 2"));
        }
        if self.shell.min_chain_edges > self.shell.max_chain_edges {
            return Err(EngineError::config(
                "shell.min_chain_edges must not exceed shell.max_chain_edges",
            ));
        }
        if self.cycle.max_cycles == 0 || self.shell.max_paths == 0 {
            return Err(EngineError::config("result caps must be positive"));
        }
        Ok(())
    }

    /// Set the cycle detector configuration.
    #[must_use]
    pub fn with_cycle(mut self, config: CycleConfig) -> Self {
        self.cycle = config;
        self
    }

    /// Set the smurfing detector configuration.
    #[must_use]
    pub fn with_smurfing(mut self, config: SmurfingConfig) -> Self {
        self.smurfing = config;
        self
    }

    /// Set the shell detector configuration.
    #[must_use]
    pub fn with_shell(mut self, config: ShellConfig) -> Self {
        self.shell = config;
        self
    }

    /// Set the environment name.
    #[must_use]
    pub fn with_environment(mut self, env: impl Into<String>) -> Self {
        self.environment = env.into();
        self
    }
}
