//! Error types for the leave-attendance reconciliation engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate.
//! Validation failures carry the machine-readable detail (limit, used,
//! requested, conflicting dates) that callers surface in API responses.
//! Configuration gaps are deliberately absent here: missing timezone, shift,
//! or fine settings resolve through documented fallbacks instead of erroring.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// The main error type for the reconciliation engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use leave_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/business.yaml".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Configuration file not found: /missing/business.yaml"
/// );
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A time value did not match the expected `HH:mm` shape.
    #[error("Invalid time value '{value}': expected HH:mm")]
    InvalidTime {
        /// The raw value that failed to parse.
        value: String,
    },

    /// A half-day leave request violated the single-day/session invariants.
    #[error("Invalid half-day leave: {message}")]
    InvalidHalfDay {
        /// A description of the violated invariant.
        message: String,
    },

    /// A leave date range was inconsistent (e.g. end before start).
    #[error("Invalid leave dates: {message}")]
    InvalidDates {
        /// A description of what made the dates invalid.
        message: String,
    },

    /// No leave request exists with the given id.
    #[error("Leave request not found: {id}")]
    LeaveNotFound {
        /// The id that was looked up.
        id: Uuid,
    },

    /// The employee already holds a pending or approved leave covering the
    /// requested dates.
    #[error("Overlapping {status} leave already exists from {start} to {end}")]
    OverlappingLeave {
        /// Start date of the conflicting leave.
        start: NaiveDate,
        /// End date of the conflicting leave.
        end: NaiveDate,
        /// Status of the conflicting leave.
        status: String,
    },

    /// The request would exceed the employee's remaining leave balance.
    #[error(
        "{leave_type} limit exceeded: limit {limit}, used {used}, pending {pending}, requested {requested}"
    )]
    ExceedsBalance {
        /// Canonical leave type name.
        leave_type: String,
        /// Total available days for the period (base limit plus carry-forward).
        limit: Decimal,
        /// Approved days already consumed in the period.
        used: Decimal,
        /// Pending days counted against the quota.
        pending: Decimal,
        /// Days the rejected request asked for.
        requested: Decimal,
    },

    /// A lifecycle transition was requested from an incompatible status.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The status the leave currently holds.
        from: String,
        /// The status that was requested.
        to: String,
    },

    /// The backing document store reported a failure.
    #[error("Storage error: {message}")]
    Store {
        /// A description of the storage failure.
        message: String,
    },

    /// The leave status was committed but its derived attendance rows were
    /// not fully written; the caller should re-run the transition handler.
    #[error("Leave {id} changed status but attendance reconciliation did not complete: {message}")]
    MaterializationIncomplete {
        /// The leave whose attendance is out of sync.
        id: Uuid,
        /// A description of the failure.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
