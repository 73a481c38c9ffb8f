//! Attendance record model.
//!
//! One record exists per employee per calendar day, created lazily on the
//! first relevant event (a punch, or a leave approval). Both the punch flow
//! and the lifecycle reconciler mutate it; revert logic strips only
//! leave-derived fields and never clobbers a real punch.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::leave::{HalfDaySession, LeaveKind};

/// Daily attendance status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// The employee punched in on a regular working day.
    Present,
    /// The whole day is covered by approved leave.
    OnLeave,
    /// One session is covered by approved half-day leave.
    HalfDay,
    /// No decision yet; also the status a reverted record demotes to.
    Pending,
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttendanceStatus::Present => write!(f, "Present"),
            AttendanceStatus::OnLeave => write!(f, "On Leave"),
            AttendanceStatus::HalfDay => write!(f, "Half Day"),
            AttendanceStatus::Pending => write!(f, "Pending"),
        }
    }
}

/// One attendance row, keyed by (employee, calendar day).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// The employee the record belongs to.
    pub employee_id: String,
    /// The business-local calendar day.
    pub date: NaiveDate,
    /// Current status for the day.
    pub status: AttendanceStatus,
    /// Check-in instant, if the employee punched in.
    pub punch_in: Option<DateTime<Utc>>,
    /// Check-out instant, if the employee punched out.
    pub punch_out: Option<DateTime<Utc>>,
    /// Leave category, set when the record is leave-derived.
    pub leave_kind: Option<LeaveKind>,
    /// On-leave session for half-day records.
    pub leave_session: Option<HalfDaySession>,
    /// Approver of the originating leave, when leave-derived.
    pub approved_by: Option<String>,
    /// Approval instant of the originating leave, when leave-derived.
    pub approved_at: Option<DateTime<Utc>>,
    /// Append-only free-text remarks.
    pub remarks: String,
}

impl AttendanceRecord {
    /// Creates a blank `Pending` record for the given employee and day.
    pub fn pending(employee_id: String, date: NaiveDate) -> Self {
        Self {
            employee_id,
            date,
            status: AttendanceStatus::Pending,
            punch_in: None,
            punch_out: None,
            leave_kind: None,
            leave_session: None,
            approved_by: None,
            approved_at: None,
            remarks: String::new(),
        }
    }

    /// Returns true when the record carries leave-derived tags.
    pub fn is_leave_derived(&self) -> bool {
        self.leave_kind.is_some()
    }

    /// Returns true when the record holds at least one real punch.
    pub fn has_real_punch(&self) -> bool {
        self.punch_in.is_some() || self.punch_out.is_some()
    }

    /// Appends a remark unless the identical remark is already present.
    pub fn append_remark(&mut self, note: &str) {
        if note.is_empty() || self.remarks.split("; ").any(|r| r == note) {
            return;
        }
        if !self.remarks.is_empty() {
            self.remarks.push_str("; ");
        }
        self.remarks.push_str(note);
    }

    /// Removes every occurrence of a remark; safe to call repeatedly.
    pub fn strip_remark(&mut self, note: &str) {
        self.remarks = self
            .remarks
            .split("; ")
            .filter(|r| !r.is_empty() && *r != note)
            .collect::<Vec<_>>()
            .join("; ");
    }

    /// Clears every leave-derived field, leaving punches untouched.
    pub fn clear_leave_fields(&mut self) {
        self.leave_kind = None;
        self.leave_session = None;
        self.approved_by = None;
        self.approved_at = None;
    }
}
