//! Notification dispatch seam.
//!
//! The engine produces exactly one notification per lifecycle transition,
//! addressed to the leave's owner. Delivery is external; dispatch failures
//! are logged by the reconciler and never fail the transition.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What happened to the leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// The request was approved.
    LeaveApproved,
    /// The request was rejected.
    LeaveRejected,
    /// The request was cancelled.
    LeaveCancelled,
}

/// A single-recipient notification describing a lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveNotification {
    /// The leave owner; notifications are never broadcast.
    pub recipient_id: String,
    /// The transition that occurred.
    pub kind: NotificationKind,
    /// Canonical leave type name.
    pub leave_type: String,
    /// First covered calendar day of the leave.
    pub date: NaiveDate,
}

/// Error reported by a notification backend.
#[derive(Debug, Error)]
#[error("notification dispatch failed: {message}")]
pub struct NotifyError {
    /// A description of the delivery failure.
    pub message: String,
}

/// Abstraction over the notification delivery mechanism.
pub trait Notifier: Send + Sync {
    /// Delivers a notification to its single recipient.
    fn dispatch(&self, notification: &LeaveNotification) -> Result<(), NotifyError>;
}

/// A notifier that drops every notification; useful when a host wires
/// delivery elsewhere or tests do not care about notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn dispatch(&self, _notification: &LeaveNotification) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// A notifier that records everything it is asked to deliver.
///
/// Used by the test suites to assert exactly one notification per
/// transition.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: std::sync::Mutex<Vec<LeaveNotification>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything dispatched so far.
    pub fn sent(&self) -> Vec<LeaveNotification> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn dispatch(&self, notification: &LeaveNotification) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .map_err(|_| NotifyError {
                message: "recorder lock poisoned".to_string(),
            })?
            .push(notification.clone());
        Ok(())
    }
}
