//! Presentation boundary for stage visuals and the start control.

use crate::stage::{StageId, StageStatus};
use serde::{Deserialize, Serialize};

pub const START_LABEL_IDLE: &str = "Run Pipeline";
pub const START_LABEL_RUNNING: &str = "Running...";

/// State of the control that triggers a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartControl {
    pub enabled: bool,
    pub label: String,
}

impl StartControl {
    /// Ready to start a run.
    pub fn idle() -> Self {
        Self {
            enabled: true,
            label: START_LABEL_IDLE.to_string(),
        }
    }

    /// Locked while a run is in progress.
    pub fn running() -> Self {
        Self {
            enabled: false,
            label: START_LABEL_RUNNING.to_string(),
        }
    }
}

/// Projects stage statuses and the start control onto a presentation.
///
/// Implementations hold no run state and cannot fail.
pub trait StageDisplay: Send + Sync {
    /// Whether `stage` maps to a presentation slot.
    ///
    /// Checked once when the runner is built.
    fn has_slot(&self, _stage: &StageId) -> bool {
        true
    }

    /// Render `status` for `stage`.
    fn set_stage_visual(&self, stage: &StageId, status: StageStatus);

    /// Render the start control.
    fn set_start_control(&self, control: StartControl);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_control_states() {
        let idle = StartControl::idle();
        assert!(idle.enabled);
        assert_eq!(idle.label, "Run Pipeline");

        let running = StartControl::running();
        assert!(!running.enabled);
        assert_eq!(running.label, "Running...");
    }
}
