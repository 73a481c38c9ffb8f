//! Half-day session window validation.
//!
//! Given a half-day leave's on-leave session and the current business-local
//! time, decides whether a check-in or check-out is permitted. The window
//! state (`before / inside / after`) is derived fresh on every call from the
//! resolved shift boundaries; nothing here is persisted.

use serde::{Deserialize, Serialize};

use chrono::NaiveTime;

use crate::config::ShiftConfig;
use crate::models::HalfDaySession;

use super::boundary::{SessionTimings, format_minute};

/// The outcome of a punch eligibility check.
///
/// Denials always carry a reason naming the violated boundary and the
/// on-leave half so the caller can present an actionable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowDecision {
    /// Whether the punch is permitted right now.
    pub allowed: bool,
    /// Why the punch was denied, when it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl WindowDecision {
    /// An allowing decision.
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    /// A denying decision with the given reason.
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Punch direction being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunchKind {
    /// Start-of-work punch.
    CheckIn,
    /// End-of-work punch.
    CheckOut,
}

/// Grace settings governing half-day windows, resolved from the shift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HalfDayRules {
    /// Minutes after the midpoint a first-half worker may still check out.
    pub first_half_logout_grace: i64,
    /// Minutes before the midpoint a second-half worker may check in.
    pub second_half_login_grace: i64,
    /// Disables the login grace: check-in opens exactly at the midpoint.
    pub strict_login: bool,
}

impl HalfDayRules {
    /// Extracts the half-day grace settings from a shift, defaulting all
    /// values to zero when the shift has no half-day section.
    pub fn from_config(shift: &ShiftConfig) -> Self {
        match &shift.half_day {
            Some(half_day) => Self {
                first_half_logout_grace: half_day.first_half_logout_grace_minutes.max(0),
                second_half_login_grace: half_day.second_half_login_grace_minutes.max(0),
                strict_login: half_day.strict_login,
            },
            None => Self::default(),
        }
    }
}

/// The working window for the employee's on-site half, in unwrapped
/// minutes: `(start, end)`.
///
/// The two sessions partition the shift exactly: the working window of a
/// first-half leave is the complement (within the shift) of the working
/// window of a second-half leave.
///
/// # Example
///
/// ```
/// use leave_engine::config::ShiftConfig;
/// use leave_engine::models::HalfDaySession;
/// use leave_engine::schedule::{SessionTimings, working_window};
///
/// let timings = SessionTimings::resolve(&ShiftConfig::default()).unwrap();
/// let second = working_window(&timings, HalfDaySession::FirstHalf);
/// let first = working_window(&timings, HalfDaySession::SecondHalf);
/// assert_eq!(first.1, second.0); // they meet at the midpoint
/// ```
pub fn working_window(timings: &SessionTimings, leave_session: HalfDaySession) -> (i64, i64) {
    match leave_session {
        // First half on leave: the employee works the second session.
        HalfDaySession::FirstHalf => (timings.mid_min(), timings.end_min()),
        // Second half on leave: the employee works the first session.
        HalfDaySession::SecondHalf => (timings.start_min(), timings.mid_min()),
    }
}

/// Decides whether a punch is permitted at `now_local`.
///
/// `leave_session` is the on-leave half of an approved half-day leave, or
/// `None` for a full-day approved leave, which blocks punches
/// unconditionally. Callers with no leave at all should not invoke the
/// validator; a regular working day has no window restriction.
pub fn evaluate_punch(
    leave_session: Option<HalfDaySession>,
    punch: PunchKind,
    now_local: NaiveTime,
    timings: &SessionTimings,
    rules: &HalfDayRules,
) -> WindowDecision {
    let session = match leave_session {
        Some(session) => session,
        None => {
            let action = match punch {
                PunchKind::CheckIn => "check-in",
                PunchKind::CheckOut => "check-out",
            };
            return WindowDecision::deny(format!(
                "employee is on approved leave for the full day; {action} is not permitted"
            ));
        }
    };

    let now = timings.normalize_now(now_local);
    let mid = timings.mid_min();
    let start = timings.start_min();
    let end = timings.end_min();

    match (session, punch) {
        // First half on leave: work runs from the midpoint to the shift end.
        (HalfDaySession::FirstHalf, PunchKind::CheckIn) => {
            let open = if rules.strict_login || rules.second_half_login_grace == 0 {
                mid
            } else {
                mid - rules.second_half_login_grace
            };
            if now < open {
                WindowDecision::deny(format!(
                    "check-in for second-half work opens at {} (first half is on leave)",
                    format_minute(open)
                ))
            } else if now > end {
                WindowDecision::deny(format!(
                    "shift ended at {}; the check-in window is closed",
                    format_minute(end)
                ))
            } else {
                WindowDecision::allow()
            }
        }
        (HalfDaySession::FirstHalf, PunchKind::CheckOut) => {
            if now < mid {
                WindowDecision::deny(format!(
                    "check-out opens at the session boundary {} (first half is on leave)",
                    format_minute(mid)
                ))
            } else {
                WindowDecision::allow()
            }
        }
        // Second half on leave: work runs from the shift start to the midpoint.
        (HalfDaySession::SecondHalf, PunchKind::CheckIn) => {
            if now < start {
                WindowDecision::deny(format!(
                    "check-in for first-half work opens at {} (second half is on leave)",
                    format_minute(start)
                ))
            } else if now >= mid {
                WindowDecision::deny(format!(
                    "first-half work ends at {}; the second half is on leave",
                    format_minute(mid)
                ))
            } else {
                WindowDecision::allow()
            }
        }
        (HalfDaySession::SecondHalf, PunchKind::CheckOut) => {
            let close = mid + rules.first_half_logout_grace;
            if now < mid {
                WindowDecision::deny(format!(
                    "check-out for first-half work opens at {} (second half is on leave)",
                    format_minute(mid)
                ))
            } else if now > close {
                WindowDecision::deny(format!(
                    "check-out window closed at {} (second half is on leave)",
                    format_minute(close)
                ))
            } else {
                WindowDecision::allow()
            }
        }
    }
}
