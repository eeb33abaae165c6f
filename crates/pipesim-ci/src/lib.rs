//! Pipesim CI - a simulated CI/CD pipeline
//!
//! Provides a sequential pipeline runner that:
//! - Drives a fixed, ordered list of stages through `pending -> running -> success|failed`
//! - Simulates variable-length stage work with a timed suspension
//! - Injects random stage failures that halt the rest of the run
//! - Reports outcomes through pluggable display and notifier collaborators

pub mod config;
pub mod display;
pub mod error;
pub mod fakes;
pub mod notify;
pub mod obs;
pub mod outcome;
pub mod runner;
pub mod stage;
pub mod telemetry;

// Re-export key types
pub use config::PipelineConfig;
pub use display::{StageDisplay, StartControl};
pub use error::{PipelineError, Result};
pub use notify::{Notification, NotificationSink, Notifier, Severity, TimedNotifier};
pub use outcome::{OutcomeSource, RandomOutcomes, StageOutcome};
pub use runner::{failure_message, PipelineRunner, RunOutcome, COMPLETED_MESSAGE};
pub use stage::{Stage, StageId, StageSnapshot, StageStatus};
pub use telemetry::{init_tracing, LogFormat};
