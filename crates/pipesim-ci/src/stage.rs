//! Stage identity and status lifecycle.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a pipeline stage (e.g. `checkout`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StageId(String);

impl StageId {
    /// Create a stage identifier. Blank names and embedded whitespace are rejected.
    pub fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(PipelineError::InvalidStageId(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StageId {
    type Error = PipelineError;

    fn try_from(raw: String) -> Result<Self> {
        Self::new(&raw)
    }
}

impl From<StageId> for String {
    fn from(id: StageId) -> Self {
        id.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status of a stage within one run.
///
/// Statuses only move forward: `Pending -> Running -> {Succeeded, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl StageStatus {
    /// Presentation label shown next to the stage.
    pub fn label(&self) -> &'static str {
        match self {
            StageStatus::Pending => "Waiting...",
            StageStatus::Running => "Running...",
            StageStatus::Succeeded => "Success ✓",
            StageStatus::Failed => "Failed ✗",
        }
    }

    /// Whether the stage has resolved for this run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StageStatus::Succeeded | StageStatus::Failed)
    }

    /// Whether moving from `self` to `next` respects the forward-only lifecycle.
    pub fn can_transition_to(&self, next: StageStatus) -> bool {
        matches!(
            (self, next),
            (StageStatus::Pending, StageStatus::Running)
                | (StageStatus::Running, StageStatus::Succeeded)
                | (StageStatus::Running, StageStatus::Failed)
        )
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageStatus::Pending => write!(f, "pending"),
            StageStatus::Running => write!(f, "running"),
            StageStatus::Succeeded => write!(f, "succeeded"),
            StageStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A stage in the declared sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    id: StageId,
    position: usize,
    status: StageStatus,
}

impl Stage {
    pub fn new(id: StageId, position: usize) -> Self {
        Self {
            id,
            position,
            status: StageStatus::Pending,
        }
    }

    pub fn id(&self) -> &StageId {
        &self.id
    }

    /// Zero-based position in the declared sequence.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn status(&self) -> StageStatus {
        self.status
    }

    /// Pending -> Running.
    pub fn begin(&mut self) -> Result<()> {
        self.transition(StageStatus::Running)
    }

    /// Running -> Succeeded.
    pub fn succeed(&mut self) -> Result<()> {
        self.transition(StageStatus::Succeeded)
    }

    /// Running -> Failed.
    pub fn fail(&mut self) -> Result<()> {
        self.transition(StageStatus::Failed)
    }

    /// Return to Pending at the start of a new run.
    pub fn reset(&mut self) {
        self.status = StageStatus::Pending;
    }

    pub fn snapshot(&self) -> StageSnapshot {
        StageSnapshot {
            id: self.id.clone(),
            position: self.position,
            status: self.status,
        }
    }

    fn transition(&mut self, next: StageStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(PipelineError::InvalidStatusTransition {
                stage: self.id.to_string(),
                current: self.status.to_string(),
                requested: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }
}

/// Read-only view of a stage at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSnapshot {
    pub id: StageId,
    pub position: usize,
    pub status: StageStatus,
}
