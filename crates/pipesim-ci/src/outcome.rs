//! Source of stage durations and results.
//!
//! The runner never touches randomness directly; it asks an [`OutcomeSource`]
//! how long a stage works and how it ends. Tests swap in scripted sources.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::stage::Stage;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::time::Duration;

/// How a stage resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    Succeeded,
    Failed,
}

/// Supplies per-stage work duration and outcome.
pub trait OutcomeSource: Send + Sync {
    /// How long the stage is simulated to work.
    fn stage_delay(&self, stage: &Stage) -> Duration;

    /// How the stage ends.
    fn stage_outcome(&self, stage: &Stage) -> StageOutcome;
}

/// Unseeded random outcomes: uniform delay, Bernoulli success.
#[derive(Debug, Clone)]
pub struct RandomOutcomes {
    delay_ms: Range<u64>,
    success_rate: f64,
}

impl RandomOutcomes {
    /// Rejects an empty delay window and a success rate outside `[0, 1]`
    /// (including NaN).
    pub fn new(delay_ms: Range<u64>, success_rate: f64) -> Result<Self> {
        if delay_ms.is_empty() {
            return Err(PipelineError::InvalidConfig(format!(
                "stage duration window [{}, {}) is empty",
                delay_ms.start, delay_ms.end
            )));
        }
        if !(0.0..=1.0).contains(&success_rate) {
            return Err(PipelineError::InvalidConfig(format!(
                "success_rate must be within [0, 1], got {}",
                success_rate
            )));
        }
        Ok(Self {
            delay_ms,
            success_rate,
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::new(
            config.min_stage_ms..config.max_stage_ms,
            config.success_rate,
        )
    }
}

impl OutcomeSource for RandomOutcomes {
    fn stage_delay(&self, _stage: &Stage) -> Duration {
        Duration::from_millis(rand::rng().random_range(self.delay_ms.clone()))
    }

    fn stage_outcome(&self, _stage: &Stage) -> StageOutcome {
        if rand::rng().random_bool(self.success_rate) {
            StageOutcome::Succeeded
        } else {
            StageOutcome::Failed
        }
    }
}
