//! In-memory collaborators for tests
//!
//! Provides `RecordingDisplay`, `RecordingNotifier`, `ScriptedOutcomes` and
//! `RecordingOutcomes`, which capture everything the runner does so tests can
//! assert on ordering without a terminal or real randomness.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use crate::display::{StageDisplay, StartControl};
use crate::notify::{Notification, Notifier, Severity};
use crate::outcome::{OutcomeSource, StageOutcome};
use crate::stage::{Stage, StageId, StageStatus};

// ---------------------------------------------------------------------------
// RecordingDisplay
// ---------------------------------------------------------------------------

/// One call made on a [`StageDisplay`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    Stage { stage: String, status: StageStatus },
    Control(StartControl),
}

/// Display that records every update in call order.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    events: Mutex<Vec<DisplayEvent>>,
    missing_slots: HashSet<String>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend `stage` has no presentation slot.
    pub fn without_slot(mut self, stage: &str) -> Self {
        self.missing_slots.insert(stage.to_string());
        self
    }

    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Stage updates only, as `(stage, status)` pairs.
    pub fn stage_events(&self) -> Vec<(String, StageStatus)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                DisplayEvent::Stage { stage, status } => Some((stage.clone(), *status)),
                DisplayEvent::Control(_) => None,
            })
            .collect()
    }

    /// Start-control updates only.
    pub fn control_events(&self) -> Vec<StartControl> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                DisplayEvent::Control(c) => Some(c.clone()),
                DisplayEvent::Stage { .. } => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl StageDisplay for RecordingDisplay {
    fn has_slot(&self, stage: &StageId) -> bool {
        !self.missing_slots.contains(stage.as_str())
    }

    fn set_stage_visual(&self, stage: &StageId, status: StageStatus) {
        self.events.lock().unwrap().push(DisplayEvent::Stage {
            stage: stage.to_string(),
            status,
        });
    }

    fn set_start_control(&self, control: StartControl) {
        self.events
            .lock()
            .unwrap()
            .push(DisplayEvent::Control(control));
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

/// Notifier that keeps every notification it receives.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.severity == severity)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.notifications
            .lock()
            .unwrap()
            .push(Notification::new(message, severity));
    }
}

// ---------------------------------------------------------------------------
// ScriptedOutcomes
// ---------------------------------------------------------------------------

/// Deterministic outcomes: fixed delay, failure only for named stages.
#[derive(Debug)]
pub struct ScriptedOutcomes {
    delay: Duration,
    failing: HashSet<String>,
    drawn: Mutex<Vec<String>>,
}

impl ScriptedOutcomes {
    /// Every stage succeeds after `delay`.
    pub fn always_succeed(delay: Duration) -> Self {
        Self {
            delay,
            failing: HashSet::new(),
            drawn: Mutex::new(Vec::new()),
        }
    }

    /// Force `stage` to fail.
    pub fn failing_at(mut self, stage: &str) -> Self {
        self.failing.insert(stage.to_string());
        self
    }

    /// Stages whose outcome was drawn, in order.
    pub fn drawn(&self) -> Vec<String> {
        self.drawn.lock().unwrap().clone()
    }
}

impl OutcomeSource for ScriptedOutcomes {
    fn stage_delay(&self, _stage: &Stage) -> Duration {
        self.delay
    }

    fn stage_outcome(&self, stage: &Stage) -> StageOutcome {
        self.drawn.lock().unwrap().push(stage.id().to_string());
        if self.failing.contains(stage.id().as_str()) {
            StageOutcome::Failed
        } else {
            StageOutcome::Succeeded
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingOutcomes
// ---------------------------------------------------------------------------

/// Wraps another source and records the delays it hands out.
#[derive(Debug)]
pub struct RecordingOutcomes<S> {
    inner: S,
    delays: Mutex<Vec<(String, Duration)>>,
}

impl<S: OutcomeSource> RecordingOutcomes<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            delays: Mutex::new(Vec::new()),
        }
    }

    pub fn delays(&self) -> Vec<(String, Duration)> {
        self.delays.lock().unwrap().clone()
    }
}

impl<S: OutcomeSource> OutcomeSource for RecordingOutcomes<S> {
    fn stage_delay(&self, stage: &Stage) -> Duration {
        let delay = self.inner.stage_delay(stage);
        self.delays
            .lock()
            .unwrap()
            .push((stage.id().to_string(), delay));
        delay
    }

    fn stage_outcome(&self, stage: &Stage) -> StageOutcome {
        self.inner.stage_outcome(stage)
    }
}
