//! Observability tests for pipeline run tracing.
//!
//! These tests verify that structured tracing events are emitted for the run
//! lifecycle: run start, stage start/finish, run finish and rejected starts.

use pipesim_ci::fakes::{RecordingDisplay, RecordingNotifier, ScriptedOutcomes};
use pipesim_ci::obs::{emit_notification_shown, emit_run_rejected, emit_stage_finished};
use pipesim_ci::{PipelineConfig, PipelineRunner, Severity, StageStatus};
use std::sync::Arc;
use std::time::Duration;
use tracing_test::traced_test;

fn runner(outcomes: ScriptedOutcomes) -> Arc<PipelineRunner> {
    let config = PipelineConfig::default().with_stage_list("checkout,build");
    Arc::new(
        PipelineRunner::new(
            &config,
            Arc::new(RecordingDisplay::new()),
            Arc::new(RecordingNotifier::new()),
            Arc::new(outcomes),
        )
        .expect("valid config"),
    )
}

/// Test: emit_stage_finished logs stage and status
#[traced_test]
#[test]
fn test_emit_stage_finished_logs_status() {
    emit_stage_finished("build", 1, StageStatus::Failed);
    assert!(logs_contain("stage.finished"));
    assert!(logs_contain("failed"));
}

/// Test: emit_run_rejected logs the reason
#[traced_test]
#[test]
fn test_emit_run_rejected_logs_reason() {
    emit_run_rejected();
    assert!(logs_contain("run.rejected"));
    assert!(logs_contain("already running"));
}

/// Test: emit_notification_shown logs severity
#[traced_test]
#[test]
fn test_emit_notification_shown_logs_severity() {
    emit_notification_shown("Pipeline failed at build stage", Severity::Error);
    assert!(logs_contain("notification.shown"));
    assert!(logs_contain("error"));
}

/// Test: a full run emits the lifecycle events inside the run span
#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_run_emits_lifecycle_events() {
    let runner = runner(ScriptedOutcomes::always_succeed(Duration::from_millis(2000)));
    runner.start().await;

    assert!(logs_contain("run.started"));
    assert!(logs_contain("stage.started"));
    assert!(logs_contain("stage.finished"));
    assert!(logs_contain("run.finished"));
    assert!(logs_contain("pipesim.run"));
}

/// Test: a failing run is logged as not completed
#[traced_test]
#[tokio::test(start_paused = true)]
async fn test_failed_run_logged_as_incomplete() {
    let runner = runner(
        ScriptedOutcomes::always_succeed(Duration::from_millis(2000)).failing_at("checkout"),
    );
    runner.start().await;

    assert!(logs_contain("run.finished"));
    assert!(logs_contain("completed=false"));
}
