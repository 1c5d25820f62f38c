//! User-facing notifications emitted by store actions.
//!
//! Fire-and-forget: a notifier never fails and never blocks the action that
//! emitted it. Presentation (toasts, terminal output) is up to the front end.

use std::sync::{Mutex, PoisonError};

/// Sink for success/error messages.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Notifier that writes to the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        tracing::info!(target: "tetranoma::notify", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::warn!(target: "tetranoma::notify", "{message}");
    }
}

/// Kind of a recorded notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

/// Notifier that keeps every message, for tests and batch front ends.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, kind: NotificationKind, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Notification {
                kind,
                message: message.to_string(),
            });
    }

    /// Everything recorded so far.
    #[must_use]
    pub fn all(&self) -> Vec<Notification> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages of a given kind, in order.
    #[must_use]
    pub fn messages(&self, kind: NotificationKind) -> Vec<String> {
        self.all()
            .into_iter()
            .filter(|n| n.kind == kind)
            .map(|n| n.message)
            .collect()
    }

    /// Drop everything recorded so far.
    pub fn clear(&self) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.record(NotificationKind::Success, message);
    }

    fn error(&self, message: &str) {
        self.record(NotificationKind::Error, message);
    }
}
