//! Punctuality fine calculation.
//!
//! A fine prices late-arrival or early-exit minutes under the business fine
//! configuration: the first matching override rule wins, otherwise the
//! configured method applies. The calculation is a total function: missing
//! salary or shift-hours context degrades to a zero rate, never an error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{CustomFineUnit, FineConfig, FineMethod, FinePayout, FineScope};

/// The punch violation being priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FineTrigger {
    /// The employee checked in after the expected boundary.
    LateArrival,
    /// The employee checked out before the expected boundary.
    EarlyExit,
}

fn scope_matches(scope: FineScope, trigger: FineTrigger) -> bool {
    match scope {
        FineScope::Both => true,
        FineScope::LateArrival => trigger == FineTrigger::LateArrival,
        FineScope::EarlyExit => trigger == FineTrigger::EarlyExit,
    }
}

/// Computes the monetary fine for a punch violation.
///
/// Returns zero when fines are disabled, `minutes` is non-positive, or
/// `minutes` does not exceed the configured grace threshold. Otherwise the
/// first rule whose scope matches `trigger` decides the payout; with no
/// matching rule the configured method applies (`FixedPerHour`: flat rate x
/// hours; `ShiftBased`: daily salary over shift hours x hours). The result
/// is rounded to two decimal places.
///
/// # Example
///
/// ```
/// use leave_engine::config::{FineConfig, FineMethod};
/// use leave_engine::fine::{FineTrigger, calculate_fine};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let config = FineConfig {
///     enabled: true,
///     grace_minutes: 0,
///     method: FineMethod::ShiftBased,
///     per_hour_rate: Decimal::ZERO,
///     rules: vec![],
/// };
///
/// // 60 minutes late, daily salary 800 over an 8-hour shift: 100.00.
/// let fine = calculate_fine(
///     60,
///     FineTrigger::LateArrival,
///     &config,
///     Decimal::from(800),
///     Decimal::from(8),
/// );
/// assert_eq!(fine, Decimal::from_str("100.00").unwrap());
/// ```
pub fn calculate_fine(
    minutes: i64,
    trigger: FineTrigger,
    config: &FineConfig,
    daily_salary: Decimal,
    shift_hours: Decimal,
) -> Decimal {
    if !config.enabled || minutes <= 0 || minutes <= config.grace_minutes {
        return Decimal::ZERO;
    }

    let hours = Decimal::from(minutes) / Decimal::from(60);
    let hourly_rate = if shift_hours > Decimal::ZERO {
        daily_salary / shift_hours
    } else {
        Decimal::ZERO
    };

    let rule = config
        .rules
        .iter()
        .find(|r| scope_matches(r.applies_to, trigger));

    let amount = match rule {
        Some(rule) => match &rule.payout {
            FinePayout::Custom { amount, unit } => match unit {
                CustomFineUnit::PerMinute => *amount * Decimal::from(minutes),
                CustomFineUnit::PerHour => *amount * hours,
                CustomFineUnit::Fixed => *amount,
            },
            FinePayout::SalaryMultiple { factor } => {
                hourly_rate * Decimal::from(*factor) * hours
            }
            FinePayout::HalfDaySalary => daily_salary / Decimal::from(2),
            FinePayout::FullDaySalary => daily_salary,
        },
        None => match config.method {
            FineMethod::FixedPerHour => config.per_hour_rate * hours,
            FineMethod::ShiftBased => hourly_rate * hours,
        },
    };

    amount.round_dp(2)
}
