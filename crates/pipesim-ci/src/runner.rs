//! Sequential pipeline runner.
//!
//! Stages run strictly one after another in declared order. Each stage goes
//! `Pending -> Running`, waits for its simulated duration, then resolves to
//! `Succeeded` or `Failed`. The first failure ends the run; later stages stay
//! `Pending`. Only one run may be in progress per runner.

use crate::config::PipelineConfig;
use crate::display::{StageDisplay, StartControl};
use crate::error::{PipelineError, Result};
use crate::notify::{Notifier, Severity};
use crate::obs;
use crate::outcome::{OutcomeSource, StageOutcome};
use crate::stage::{Stage, StageId, StageSnapshot, StageStatus};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{warn, Instrument};
use uuid::Uuid;

/// Notification text for a run where every stage succeeded.
pub const COMPLETED_MESSAGE: &str = "Pipeline completed successfully!";

/// Notification text for a run that stopped at `stage`.
pub fn failure_message(stage: &StageId) -> String {
    format!("Pipeline failed at {} stage", stage)
}

/// How a call to [`PipelineRunner::start`] ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every stage succeeded.
    Completed,
    /// The stage at `position` failed; nothing after it ran.
    Aborted { stage: StageId, position: usize },
    /// No run happened, either because none was requested yet or because a
    /// run was already in progress.
    NotStarted,
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed)
    }
}

/// Drives the declared stage sequence.
pub struct PipelineRunner {
    stages: Mutex<Vec<Stage>>,
    in_progress: AtomicBool,
    last_outcome: Mutex<RunOutcome>,
    display: Arc<dyn StageDisplay>,
    notifier: Arc<dyn Notifier>,
    outcomes: Arc<dyn OutcomeSource>,
}

impl PipelineRunner {
    /// Build the stage sequence from `config`.
    ///
    /// Fails if the configuration is invalid or a stage has no presentation
    /// slot on `display`.
    pub fn new(
        config: &PipelineConfig,
        display: Arc<dyn StageDisplay>,
        notifier: Arc<dyn Notifier>,
        outcomes: Arc<dyn OutcomeSource>,
    ) -> Result<Self> {
        let ids = config.validate()?;

        if let Some(missing) = ids.iter().find(|id| !display.has_slot(id)) {
            return Err(PipelineError::UnknownSlot(missing.to_string()));
        }

        let stages = ids
            .into_iter()
            .enumerate()
            .map(|(position, id)| Stage::new(id, position))
            .collect();

        Ok(Self {
            stages: Mutex::new(stages),
            in_progress: AtomicBool::new(false),
            last_outcome: Mutex::new(RunOutcome::NotStarted),
            display,
            notifier,
            outcomes,
        })
    }

    /// Run the pipeline once.
    ///
    /// Returns [`RunOutcome::NotStarted`] without touching any state when a
    /// run is already in progress.
    pub async fn start(&self) -> RunOutcome {
        let Some(_guard) = RunGuard::acquire(self) else {
            obs::emit_run_rejected();
            return RunOutcome::NotStarted;
        };

        let run_id = Uuid::new_v4().to_string();
        let span = obs::run_span(&run_id);
        let started = Instant::now();

        let outcome = self.execute(&run_id).instrument(span).await;

        obs::emit_run_finished(
            &run_id,
            started.elapsed().as_millis() as u64,
            outcome.is_completed(),
        );
        *self.lock_last_outcome() = outcome.clone();
        outcome
    }

    async fn execute(&self, run_id: &str) -> RunOutcome {
        self.display.set_start_control(StartControl::running());
        let count = self.reset_stages();
        obs::emit_run_started(run_id, count);

        for position in 0..count {
            let (stage, delay) = {
                let mut stages = self.lock_stages();
                let stage = &mut stages[position];
                log_transition(stage.begin());
                (stage.clone(), self.outcomes.stage_delay(stage))
            };
            self.display
                .set_stage_visual(stage.id(), StageStatus::Running);
            obs::emit_stage_started(
                stage.id().as_str(),
                stage.position(),
                delay.as_millis() as u64,
            );

            tokio::time::sleep(delay).await;

            let outcome = self.outcomes.stage_outcome(&stage);
            let status = {
                let mut stages = self.lock_stages();
                let stage = &mut stages[position];
                log_transition(match outcome {
                    StageOutcome::Succeeded => stage.succeed(),
                    StageOutcome::Failed => stage.fail(),
                });
                stage.status()
            };
            self.display.set_stage_visual(stage.id(), status);
            obs::emit_stage_finished(stage.id().as_str(), stage.position(), status);

            if outcome == StageOutcome::Failed {
                self.notifier
                    .notify(&failure_message(stage.id()), Severity::Error);
                return RunOutcome::Aborted {
                    stage: stage.id().clone(),
                    position: stage.position(),
                };
            }
        }

        self.notifier.notify(COMPLETED_MESSAGE, Severity::Success);
        RunOutcome::Completed
    }

    /// Put every stage back to `Pending` and clear its visual.
    fn reset_stages(&self) -> usize {
        let ids: Vec<StageId> = {
            let mut stages = self.lock_stages();
            stages.iter_mut().for_each(Stage::reset);
            stages.iter().map(|s| s.id().clone()).collect()
        };
        for id in &ids {
            self.display.set_stage_visual(id, StageStatus::Pending);
        }
        ids.len()
    }

    /// Whether a run is currently in progress.
    pub fn is_running(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// Current status of every stage, in declared order.
    pub fn snapshot(&self) -> Vec<StageSnapshot> {
        self.lock_stages().iter().map(Stage::snapshot).collect()
    }

    /// Stage identifiers, in declared order.
    pub fn stage_ids(&self) -> Vec<StageId> {
        self.lock_stages().iter().map(|s| s.id().clone()).collect()
    }

    /// Outcome of the most recent finished run.
    pub fn last_outcome(&self) -> RunOutcome {
        self.lock_last_outcome().clone()
    }

    fn lock_stages(&self) -> MutexGuard<'_, Vec<Stage>> {
        self.stages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_last_outcome(&self) -> MutexGuard<'_, RunOutcome> {
        self.last_outcome.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn log_transition(result: Result<()>) {
    if let Err(e) = result {
        warn!(event = "stage.transition_rejected", error = %e);
    }
}

/// Holds the in-progress flag for one run.
///
/// Dropping it, on any exit path, clears the flag and restores the start
/// control.
struct RunGuard<'a> {
    runner: &'a PipelineRunner,
}

impl<'a> RunGuard<'a> {
    fn acquire(runner: &'a PipelineRunner) -> Option<Self> {
        runner
            .in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { runner })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.runner.in_progress.store(false, Ordering::Release);
        self.runner.display.set_start_control(StartControl::idle());
    }
}
