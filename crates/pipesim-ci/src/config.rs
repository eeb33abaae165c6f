//! Pipeline configuration.
//!
//! The stage sequence and timing knobs are fixed before the runner is built.
//! Values come from defaults, an optional TOML file, and CLI overrides, in
//! that order. Every problem found here is a setup defect and is reported
//! before any run starts.

use crate::error::{PipelineError, Result};
use crate::stage::StageId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Stages run by the demo pipeline when nothing else is configured.
pub const DEFAULT_STAGES: [&str; 4] = ["checkout", "build", "test", "deploy"];

/// Probability that a single stage succeeds.
pub const DEFAULT_SUCCESS_RATE: f64 = 0.9;

pub const DEFAULT_MIN_STAGE_MS: u64 = 2000;
pub const DEFAULT_MAX_STAGE_MS: u64 = 3000;

/// How long a notification stays visible.
pub const DEFAULT_NOTIFICATION_TTL_MS: u64 = 3000;

/// Configuration of one pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Ordered stage identifiers. The declared order is the execution order.
    pub stages: Vec<String>,

    /// Probability in `[0, 1]` that a stage succeeds.
    pub success_rate: f64,

    /// Lower bound (inclusive) of the simulated stage duration.
    pub min_stage_ms: u64,

    /// Upper bound (exclusive) of the simulated stage duration.
    pub max_stage_ms: u64,

    /// Visibility window of a notification.
    pub notification_ttl_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stages: DEFAULT_STAGES.iter().map(|s| s.to_string()).collect(),
            success_rate: DEFAULT_SUCCESS_RATE,
            min_stage_ms: DEFAULT_MIN_STAGE_MS,
            max_stage_ms: DEFAULT_MAX_STAGE_MS,
            notification_ttl_ms: DEFAULT_NOTIFICATION_TTL_MS,
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Replace the stage list with a comma-separated one (`checkout,build`).
    pub fn with_stage_list(mut self, list: &str) -> Self {
        self.stages = list
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();
        self
    }

    pub fn with_success_rate(mut self, rate: f64) -> Self {
        self.success_rate = rate;
        self
    }

    /// Check the configuration and resolve the stage identifiers.
    pub fn validate(&self) -> Result<Vec<StageId>> {
        if self.stages.is_empty() {
            return Err(PipelineError::EmptyPipeline);
        }

        let mut seen = HashSet::new();
        let mut ids = Vec::with_capacity(self.stages.len());
        for raw in &self.stages {
            let id = StageId::new(raw)?;
            if !seen.insert(id.clone()) {
                return Err(PipelineError::DuplicateStage(id.to_string()));
            }
            ids.push(id);
        }

        if !(0.0..=1.0).contains(&self.success_rate) {
            return Err(PipelineError::InvalidConfig(format!(
                "success_rate must be within [0, 1], got {}",
                self.success_rate
            )));
        }

        if self.min_stage_ms >= self.max_stage_ms {
            return Err(PipelineError::InvalidConfig(format!(
                "stage duration window [{}, {}) is empty",
                self.min_stage_ms, self.max_stage_ms
            )));
        }

        Ok(ids)
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        let ids = config.validate().unwrap();
        let names: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(names, vec!["checkout", "build", "test", "deploy"]);
        assert_eq!(config.success_rate, 0.9);
        assert_eq!(config.notification_ttl(), Duration::from_secs(3));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            stages = ["lint", "build"]
            success_rate = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.stages, vec!["lint", "build"]);
        assert_eq!(config.success_rate, 0.5);
        assert_eq!(config.min_stage_ms, DEFAULT_MIN_STAGE_MS);
        assert_eq!(config.max_stage_ms, DEFAULT_MAX_STAGE_MS);
    }

    #[test]
    fn test_empty_stage_list_rejected() {
        let err = PipelineConfig::from_toml_str("stages = []").unwrap_err();
        assert!(matches!(err, PipelineError::EmptyPipeline));
    }

    #[test]
    fn test_duplicate_stage_rejected() {
        let config = PipelineConfig::default().with_stage_list("build, test, build");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateStage(ref s) if s == "build"));
    }

    #[test]
    fn test_blank_stage_rejected() {
        let config = PipelineConfig::default().with_stage_list("build,,test");
        assert!(matches!(
            config.validate().unwrap_err(),
            PipelineError::InvalidStageId(_)
        ));
    }

    #[test]
    fn test_success_rate_out_of_range() {
        let config = PipelineConfig::default().with_success_rate(1.5);
        assert!(matches!(
            config.validate().unwrap_err(),
            PipelineError::InvalidConfig(_)
        ));
    }

    #[test]
    fn test_inverted_delay_window() {
        let err = PipelineConfig::from_toml_str("min_stage_ms = 3000\nmax_stage_ms = 3000")
            .unwrap_err();
        assert!(err.to_string().contains("is empty"));
    }

    #[test]
    fn test_malformed_toml() {
        let err = PipelineConfig::from_toml_str("stages = 'not a list'").unwrap_err();
        assert!(matches!(err, PipelineError::Toml(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "stages = [\"checkout\", \"deploy\"]").unwrap();
        writeln!(file, "notification_ttl_ms = 1500").unwrap();

        let config = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(config.stages, vec!["checkout", "deploy"]);
        assert_eq!(config.notification_ttl(), Duration::from_millis(1500));
    }

    #[test]
    fn test_load_missing_file() {
        let err = PipelineConfig::load(Path::new("/nonexistent/pipesim.toml")).unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
