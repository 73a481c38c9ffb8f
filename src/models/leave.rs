//! Leave request model and related types.
//!
//! Leave types arrive as free-form strings from the request surface
//! ("Casual Leave", " casual ", "Half Day"). They are normalized at the
//! boundary into the closed [`LeaveKind`] set so internal logic never
//! re-parses strings.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// Normalizes a raw leave-type name for matching.
///
/// Lowercases, strips whitespace and punctuation, and drops an optional
/// trailing "leave" so that "Casual Leave", " casual" and "CasualLeave"
/// all collapse to `casual`.
fn normalize_type_name(raw: &str) -> String {
    let compact: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();
    match compact.strip_suffix("leave") {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => compact,
    }
}

/// The canonical set of leave categories.
///
/// Free-form type names are folded into this set on entry; names the
/// engine does not recognize are preserved verbatim in [`LeaveKind::Other`].
///
/// # Example
///
/// ```
/// use leave_engine::models::LeaveKind;
///
/// assert_eq!(LeaveKind::parse(" casual LEAVE "), LeaveKind::Casual);
/// assert_eq!(LeaveKind::parse("Half Day"), LeaveKind::HalfDay);
/// assert_eq!(
///     LeaveKind::parse("Paternity Leave"),
///     LeaveKind::Other("Paternity Leave".to_string())
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveKind {
    /// Casual leave; balance resets monthly.
    Casual,
    /// Sick leave; balance resets yearly.
    Sick,
    /// Half-day leave at 0.5-day weight, tied to a session.
    HalfDay,
    /// Any other leave type, kept under its raw name.
    Other(String),
}

impl LeaveKind {
    /// Parses a free-form leave-type name into its canonical category.
    pub fn parse(raw: &str) -> Self {
        match normalize_type_name(raw).as_str() {
            "casual" => LeaveKind::Casual,
            "sick" => LeaveKind::Sick,
            "halfday" => LeaveKind::HalfDay,
            _ => LeaveKind::Other(raw.trim().to_string()),
        }
    }

    /// Returns the canonical display name for the category.
    pub fn canonical_name(&self) -> String {
        match self {
            LeaveKind::Casual => "Casual Leave".to_string(),
            LeaveKind::Sick => "Sick Leave".to_string(),
            LeaveKind::HalfDay => "Half Day".to_string(),
            LeaveKind::Other(raw) => raw.clone(),
        }
    }

    /// The normalized key used for template and cross-request matching.
    pub(crate) fn key(&self) -> String {
        match self {
            LeaveKind::Casual => "casual".to_string(),
            LeaveKind::Sick => "sick".to_string(),
            LeaveKind::HalfDay => "halfday".to_string(),
            LeaveKind::Other(raw) => normalize_type_name(raw),
        }
    }

    /// Returns true if this kind and `other` name the same leave type.
    pub fn same_type(&self, other: &LeaveKind) -> bool {
        self.key() == other.key()
    }

    /// Returns true if this kind matches a template entry's type name.
    ///
    /// The match is case/whitespace-insensitive and tolerates an optional
    /// trailing "Leave" on either side.
    pub fn matches(&self, template_name: &str) -> bool {
        normalize_type_name(template_name) == self.key()
    }

    /// Returns true for types whose balance resets each calendar month.
    ///
    /// Casual-classified names are monthly; every other type uses a
    /// calendar-year window.
    pub fn is_monthly(&self) -> bool {
        self.key().starts_with("casual")
    }

    /// Returns true for the half-day category.
    pub fn is_half_day(&self) -> bool {
        matches!(self, LeaveKind::HalfDay)
    }
}

impl std::fmt::Display for LeaveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

/// Which half of the shift a half-day leave covers.
///
/// The employee is expected to work the other half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HalfDaySession {
    /// Leave covers the first half; the employee works the second.
    FirstHalf,
    /// Leave covers the second half; the employee works the first.
    SecondHalf,
}

impl HalfDaySession {
    /// Returns the complementary (worked) session.
    pub fn other(self) -> Self {
        match self {
            HalfDaySession::FirstHalf => HalfDaySession::SecondHalf,
            HalfDaySession::SecondHalf => HalfDaySession::FirstHalf,
        }
    }

    /// Human-readable label used in window-decision reasons.
    pub fn label(self) -> &'static str {
        match self {
            HalfDaySession::FirstHalf => "first half",
            HalfDaySession::SecondHalf => "second half",
        }
    }
}

/// Lifecycle status of a leave request.
///
/// A request is created `Pending`, moves to exactly one of
/// `Approved`/`Rejected`, or is `Cancelled` from any non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    /// Awaiting a decision; counts against the balance quota.
    Pending,
    /// Granted; attendance records are materialized for the covered days.
    Approved,
    /// Declined by an approver.
    Rejected,
    /// Withdrawn before or after approval.
    Cancelled,
}

impl LeaveStatus {
    /// Returns true for statuses that permit no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, LeaveStatus::Rejected | LeaveStatus::Cancelled)
    }
}

impl std::fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeaveStatus::Pending => write!(f, "Pending"),
            LeaveStatus::Approved => write!(f, "Approved"),
            LeaveStatus::Rejected => write!(f, "Rejected"),
            LeaveStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// A leave request as stored in the leave collection.
///
/// Dates are business-local calendar days. Day counts are decimal so a
/// half-day request carries exactly 0.5.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Unique identifier for the request.
    pub id: Uuid,
    /// The employee the leave belongs to.
    pub employee_id: String,
    /// Canonicalized leave category.
    pub kind: LeaveKind,
    /// The on-leave session; present exactly when `kind` is half-day.
    pub session: Option<HalfDaySession>,
    /// First covered calendar day (inclusive).
    pub start_date: NaiveDate,
    /// Last covered calendar day (inclusive).
    pub end_date: NaiveDate,
    /// Day weight of the request: 0.5 for half-day, else the inclusive span.
    pub days: Decimal,
    /// Free-text reason supplied by the employee.
    pub reason: String,
    /// Current lifecycle status.
    pub status: LeaveStatus,
    /// The approver who decided the request, once decided.
    pub approved_by: Option<String>,
    /// When the request was approved.
    pub approved_at: Option<DateTime<Utc>>,
    /// When the request was rejected.
    pub rejected_at: Option<DateTime<Utc>>,
    /// Why the request was rejected.
    pub rejection_reason: Option<String>,
}

impl LeaveRequest {
    /// Builds a new `Pending` request, validating the half-day invariants.
    ///
    /// Half-day leave must cover a single calendar day and name a session;
    /// any other leave must not carry a session and must have `end_date`
    /// on or after `start_date`. The day count is derived, never supplied.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use leave_engine::models::{HalfDaySession, LeaveRequest};
    /// use rust_decimal::Decimal;
    ///
    /// let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    /// let leave = LeaveRequest::new(
    ///     "emp_001".to_string(),
    ///     "Half Day",
    ///     Some(HalfDaySession::FirstHalf),
    ///     day,
    ///     day,
    ///     "appointment".to_string(),
    /// )
    /// .unwrap();
    /// assert_eq!(leave.days, Decimal::new(5, 1)); // 0.5
    /// ```
    pub fn new(
        employee_id: String,
        leave_type: &str,
        session: Option<HalfDaySession>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: String,
    ) -> EngineResult<Self> {
        let kind = LeaveKind::parse(leave_type);

        let days = if kind.is_half_day() {
            if start_date != end_date {
                return Err(EngineError::InvalidHalfDay {
                    message: "half-day leave must cover a single calendar day".to_string(),
                });
            }
            if session.is_none() {
                return Err(EngineError::InvalidHalfDay {
                    message: "half-day leave requires a session (first or second half)"
                        .to_string(),
                });
            }
            Decimal::new(5, 1)
        } else {
            if session.is_some() {
                return Err(EngineError::InvalidHalfDay {
                    message: format!("a session is only valid for half-day leave, not {kind}"),
                });
            }
            if end_date < start_date {
                return Err(EngineError::InvalidDates {
                    message: format!("end date {end_date} is before start date {start_date}"),
                });
            }
            Decimal::from((end_date - start_date).num_days() + 1)
        };

        Ok(Self {
            id: Uuid::new_v4(),
            employee_id,
            kind,
            session,
            start_date,
            end_date,
            days,
            reason,
            status: LeaveStatus::Pending,
            approved_by: None,
            approved_at: None,
            rejected_at: None,
            rejection_reason: None,
        })
    }

    /// Returns true if `date` falls within the covered range (inclusive).
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Returns true if the covered range intersects `[start, end]`.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }
}
