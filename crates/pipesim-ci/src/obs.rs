//! Structured observability hooks for the pipeline run lifecycle.
//!
//! This module provides:
//! - A run-scoped tracing span
//! - Emission functions for lifecycle events: run start, stage start and
//!   finish, run finish, rejected starts and shown notifications
//!
//! Events are emitted at `info!` level (filterable via `RUST_LOG`).

use crate::notify::Severity;
use crate::stage::StageStatus;
use tracing::{info, Span};

/// Span tagging every event of one run with its `run_id`.
///
/// Attach it with `tracing::Instrument` so it follows the run across awaits.
pub fn run_span(run_id: &str) -> Span {
    tracing::info_span!("pipesim.run", run_id = %run_id)
}

/// Emit event: run started over `stage_count` stages.
pub fn emit_run_started(run_id: &str, stage_count: usize) {
    info!(event = "run.started", run_id = %run_id, stages = stage_count);
}

/// Emit event: a stage began its simulated work.
pub fn emit_stage_started(stage: &str, position: usize, delay_ms: u64) {
    info!(event = "stage.started", stage = %stage, position = position, delay_ms = delay_ms);
}

/// Emit event: a stage resolved.
pub fn emit_stage_finished(stage: &str, position: usize, status: StageStatus) {
    info!(event = "stage.finished", stage = %stage, position = position, status = %status);
}

/// Emit event: run finished with duration and verdict.
pub fn emit_run_finished(run_id: &str, duration_ms: u64, completed: bool) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        completed = completed,
    );
}

/// Emit event: a start request arrived while a run was in progress.
pub fn emit_run_rejected() {
    info!(event = "run.rejected", reason = "already running");
}

/// Emit event: a notification became visible.
pub fn emit_notification_shown(message: &str, severity: Severity) {
    info!(event = "notification.shown", severity = %severity, message = %message);
}
