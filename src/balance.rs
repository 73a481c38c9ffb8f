//! Leave balance computation.
//!
//! Computes the per-type balance breakdown for an employee at a target
//! date: base limit from the leave template, carried-forward days from the
//! previous period, approved usage and pending commitments in the current
//! period, and the remaining balance. Pending requests count against the
//! quota so several open requests cannot jointly over-commit it.
//!
//! The computation is deterministic and side-effect-free; it issues
//! read-only queries against the leave collection.

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{LeaveKind, LeaveRequest, LeaveStatus, Staff};
use crate::store::LeaveStore;

/// The balance breakdown for one employee, leave type and period.
///
/// A type absent from the employee's template is unrestricted: the limit
/// fields are `None` and callers treat the request as always allowed. The
/// `balance` field is clamped at zero; over-commitment shows up as
/// `used + pending` exceeding `total_available`, never as a negative
/// balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveBalance {
    /// Canonical leave type name.
    pub leave_type: String,
    /// Per-period limit from the template, if the type is governed.
    pub base_limit: Option<Decimal>,
    /// Days carried over from the previous period.
    pub carried_forward: Decimal,
    /// `base_limit + carried_forward`, if the type is governed.
    pub total_available: Option<Decimal>,
    /// Approved days consumed inside the current period.
    pub used: Decimal,
    /// Pending days counted against the quota inside the current period.
    pub pending: Decimal,
    /// Remaining days, clamped at zero; `None` for unrestricted types.
    pub balance: Option<Decimal>,
    /// True when the type resets monthly (casual-classified names).
    pub is_monthly: bool,
    /// Whether the template enables carry-forward for the type.
    pub carry_forward_enabled: bool,
}

impl LeaveBalance {
    /// True when no template entry governs the type.
    pub fn is_unrestricted(&self) -> bool {
        self.base_limit.is_none()
    }
}

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next.expect("first of month is always valid") - Duration::days(1)
}

fn month_bounds(target: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = NaiveDate::from_ymd_opt(target.year(), target.month(), 1)
        .expect("first of month is always valid");
    (start, last_day_of_month(target.year(), target.month()))
}

fn year_bounds(year: i32) -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(year, 1, 1).expect("January 1 is always valid"),
        NaiveDate::from_ymd_opt(year, 12, 31).expect("December 31 is always valid"),
    )
}

fn period_bounds(is_monthly: bool, target: NaiveDate) -> (NaiveDate, NaiveDate) {
    if is_monthly {
        month_bounds(target)
    } else {
        year_bounds(target.year())
    }
}

fn previous_period_bounds(is_monthly: bool, target: NaiveDate) -> (NaiveDate, NaiveDate) {
    if is_monthly {
        let (year, month) = if target.month() == 1 {
            (target.year() - 1, 12)
        } else {
            (target.year(), target.month() - 1)
        };
        let start =
            NaiveDate::from_ymd_opt(year, month, 1).expect("first of month is always valid");
        (start, last_day_of_month(year, month))
    } else {
        year_bounds(target.year() - 1)
    }
}

/// Days a leave contributes to a period window.
///
/// Overlap, not containment: a multi-day leave spanning the boundary
/// contributes only its in-period days. Half-day leaves contribute their
/// stored 0.5 weight whenever they touch the period.
fn counted_days(leave: &LeaveRequest, period_start: NaiveDate, period_end: NaiveDate) -> Decimal {
    if !leave.overlaps(period_start, period_end) {
        return Decimal::ZERO;
    }
    if leave.kind.is_half_day() {
        return leave.days;
    }
    let start = leave.start_date.max(period_start);
    let end = leave.end_date.min(period_end);
    Decimal::from((end - start).num_days() + 1)
}

fn sum_days<'a, I>(leaves: I, period_start: NaiveDate, period_end: NaiveDate) -> Decimal
where
    I: Iterator<Item = &'a LeaveRequest>,
{
    leaves
        .map(|leave| counted_days(leave, period_start, period_end))
        .sum()
}

/// Computes the balance breakdown for `kind` at `target` date.
///
/// `exclude` removes one request (by id) from the pending sum; the
/// approval flow passes the request being approved so the re-check does
/// not count it against itself.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use leave_engine::balance::compute_balance;
/// use leave_engine::models::{LeaveKind, LeaveTemplate, LeaveTypeConfig, Staff};
/// use leave_engine::store::MemoryStore;
/// use rust_decimal::Decimal;
///
/// let store = MemoryStore::new();
/// let staff = Staff {
///     id: "emp_001".to_string(),
///     name: "Test Employee".to_string(),
///     leave_template: Some(LeaveTemplate {
///         name: "standard".to_string(),
///         leave_types: vec![LeaveTypeConfig {
///             name: "Casual Leave".to_string(),
///             max_days: Decimal::from(2),
///             carry_forward: false,
///         }],
///     }),
///     shift: None,
///     daily_salary: None,
/// };
///
/// let target = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
/// let balance = compute_balance(&store, &staff, &LeaveKind::Casual, target, None).unwrap();
/// assert_eq!(balance.balance, Some(Decimal::from(2)));
/// assert!(balance.is_monthly);
/// ```
pub fn compute_balance(
    store: &dyn LeaveStore,
    staff: &Staff,
    kind: &LeaveKind,
    target: NaiveDate,
    exclude: Option<Uuid>,
) -> EngineResult<LeaveBalance> {
    let entry = staff.template_entry(kind);
    let is_monthly = kind.is_monthly();
    let (period_start, period_end) = period_bounds(is_monthly, target);

    let leaves = store.find_by_employee(
        &staff.id,
        &[LeaveStatus::Pending, LeaveStatus::Approved],
    )?;
    let same_type: Vec<&LeaveRequest> = leaves
        .iter()
        .filter(|l| l.kind.same_type(kind))
        .collect();

    let used = sum_days(
        same_type
            .iter()
            .copied()
            .filter(|l| l.status == LeaveStatus::Approved),
        period_start,
        period_end,
    );
    let pending = sum_days(
        same_type
            .iter()
            .copied()
            .filter(|l| l.status == LeaveStatus::Pending && Some(l.id) != exclude),
        period_start,
        period_end,
    );

    let carry_forward_enabled = entry.map(|e| e.carry_forward).unwrap_or(false);
    let base_limit = entry.map(|e| e.max_days);

    let carried_forward = match (base_limit, carry_forward_enabled) {
        (Some(limit), true) => {
            let (prev_start, prev_end) = previous_period_bounds(is_monthly, target);
            let previous_used = sum_days(
                same_type
                    .iter()
                    .copied()
                    .filter(|l| l.status == LeaveStatus::Approved),
                prev_start,
                prev_end,
            );
            (limit - previous_used).max(Decimal::ZERO)
        }
        _ => Decimal::ZERO,
    };

    let total_available = base_limit.map(|limit| limit + carried_forward);
    let balance =
        total_available.map(|total| (total - used - pending).max(Decimal::ZERO));

    Ok(LeaveBalance {
        leave_type: kind.canonical_name(),
        base_limit,
        carried_forward,
        total_available,
        used,
        pending,
        balance,
        is_monthly,
        carry_forward_enabled,
    })
}
