//! Transient user notifications.
//!
//! The runner reports terminal outcomes through [`Notifier::notify`], a
//! synchronous fire-and-forget call. [`TimedNotifier`] is the toast-style
//! implementation: one notification visible at a time, newer ones replace
//! older ones, and each disappears after a fixed time-to-live.

use crate::obs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "success"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A message surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

/// Receives notifications from the runner. Must never block.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Renders notifications for a [`TimedNotifier`].
pub trait NotificationSink: Send + Sync {
    /// A notification became visible.
    fn show(&self, notification: &Notification);

    /// A notification was removed, by expiry or by a newer one.
    fn retract(&self, notification: &Notification);
}

#[derive(Debug, Default)]
struct Visible {
    next_id: u64,
    current: Option<(u64, Notification)>,
}

/// Notifier with a single visible slot and timed retraction.
///
/// Retraction timers are spawned on the ambient tokio runtime. Without one,
/// a notification stays until the next one replaces it.
pub struct TimedNotifier {
    sink: Arc<dyn NotificationSink>,
    ttl: Duration,
    state: Arc<Mutex<Visible>>,
}

impl TimedNotifier {
    pub fn new(sink: Arc<dyn NotificationSink>, ttl: Duration) -> Self {
        Self {
            sink,
            ttl,
            state: Arc::new(Mutex::new(Visible::default())),
        }
    }

    /// The notification currently visible, if any.
    pub fn current(&self) -> Option<Notification> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.current.as_ref().map(|(_, n)| n.clone())
    }
}

impl Notifier for TimedNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        let notification = Notification::new(message, severity);

        let (id, superseded) = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.next_id += 1;
            let id = state.next_id;
            let superseded = state.current.replace((id, notification.clone()));
            (id, superseded)
        };

        if let Some((_, previous)) = superseded {
            debug!(event = "notification.superseded", message = %previous.message);
            self.sink.retract(&previous);
        }
        obs::emit_notification_shown(&notification.message, severity);
        self.sink.show(&notification);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let state = Arc::clone(&self.state);
                let sink = Arc::clone(&self.sink);
                let ttl = self.ttl;
                handle.spawn(async move {
                    tokio::time::sleep(ttl).await;
                    retract_if_current(&state, sink.as_ref(), id);
                });
            }
            Err(_) => {
                warn!(
                    event = "notification.no_timer",
                    "No async runtime; notification stays until replaced"
                );
            }
        }
    }
}

fn retract_if_current(state: &Mutex<Visible>, sink: &dyn NotificationSink, id: u64) {
    let expired = {
        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        match state.current {
            Some((current_id, _)) if current_id == id => state.current.take(),
            _ => None,
        }
    };

    if let Some((_, notification)) = expired {
        debug!(event = "notification.expired", message = %notification.message);
        sink.retract(&notification);
    }
}
