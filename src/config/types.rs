//! Configuration types for the reconciliation engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files or supplied directly by
//! an embedding host. Missing optional settings degrade to documented
//! defaults rather than erroring.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::LeaveTemplate;

/// Half-day settings attached to a shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HalfDayConfig {
    /// Explicit session boundary as `HH:mm`; the arithmetic midpoint of
    /// the shift applies when absent or invalid.
    #[serde(default)]
    pub midpoint: Option<String>,
    /// Minutes after the midpoint during which a first-half worker may
    /// still check out.
    #[serde(default)]
    pub first_half_logout_grace_minutes: i64,
    /// Minutes before the midpoint during which a second-half worker may
    /// already check in.
    #[serde(default)]
    pub second_half_login_grace_minutes: i64,
    /// When set, the second-half check-in opens exactly at the midpoint
    /// regardless of the login grace.
    #[serde(default)]
    pub strict_login: bool,
}

/// A business (or per-staff) shift definition.
///
/// Times are `HH:mm` strings in business-local time; an end before the
/// start denotes an overnight shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftConfig {
    /// Shift start, business-local `HH:mm`.
    pub start_time: String,
    /// Shift end, business-local `HH:mm`.
    pub end_time: String,
    /// Late-arrival tolerance in minutes before lateness is recorded.
    #[serde(default)]
    pub grace_minutes: i64,
    /// Optional half-day session settings.
    #[serde(default)]
    pub half_day: Option<HalfDayConfig>,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            start_time: "10:00".to_string(),
            end_time: "19:00".to_string(),
            grace_minutes: 15,
            half_day: None,
        }
    }
}

/// How a fine is computed when no override rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FineMethod {
    /// Hourly rate derived from daily salary over shift hours.
    ShiftBased,
    /// Flat configured rate per hour.
    FixedPerHour,
}

/// Which punch direction an override rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FineScope {
    /// Late check-in only.
    LateArrival,
    /// Early check-out only.
    EarlyExit,
    /// Either direction.
    Both,
}

/// Unit for a custom fine amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomFineUnit {
    /// Amount is charged per late/early minute.
    PerMinute,
    /// Amount is charged per late/early hour.
    PerHour,
    /// Amount is charged once, regardless of duration.
    Fixed,
}

/// Payout formula of an override rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "payout")]
pub enum FinePayout {
    /// A configured amount per minute, per hour, or as a one-off.
    Custom {
        /// The configured amount.
        amount: Decimal,
        /// How the amount scales with the violation duration.
        unit: CustomFineUnit,
    },
    /// N times the derived hourly rate, applied per late/early hour.
    SalaryMultiple {
        /// The multiplier (1, 2 or 3 in practice).
        factor: u32,
    },
    /// Half the daily salary, flat.
    HalfDaySalary,
    /// The full daily salary, flat.
    FullDaySalary,
}

/// An ordered fine override rule; the first matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FineRule {
    /// Punch direction(s) the rule covers.
    pub applies_to: FineScope,
    /// Payout formula applied when the rule matches.
    #[serde(flatten)]
    pub payout: FinePayout,
}

/// Per-business fine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FineConfig {
    /// Master switch; disabled means every fine is zero.
    #[serde(default)]
    pub enabled: bool,
    /// Minutes at or under this threshold are never fined.
    #[serde(default)]
    pub grace_minutes: i64,
    /// Fallback formula when no rule matches.
    pub method: FineMethod,
    /// Flat hourly rate for [`FineMethod::FixedPerHour`].
    #[serde(default)]
    pub per_hour_rate: Decimal,
    /// Ordered override rules.
    #[serde(default)]
    pub rules: Vec<FineRule>,
}

impl Default for FineConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            grace_minutes: 0,
            method: FineMethod::ShiftBased,
            per_hour_rate: Decimal::ZERO,
            rules: Vec::new(),
        }
    }
}

/// System-wide fallback settings, injected rather than global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    /// IANA timezone used when a business configures none.
    pub timezone: String,
    /// Shift applied when neither business nor staff configures one.
    pub shift: ShiftConfig,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timezone: "Asia/Dhaka".to_string(),
            shift: ShiftConfig::default(),
        }
    }
}

/// Business-level settings: timezone and shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessConfig {
    /// IANA timezone of the business; the system default applies when
    /// absent.
    #[serde(default)]
    pub timezone: Option<String>,
    /// The business shift.
    #[serde(default)]
    pub shift: ShiftConfig,
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            timezone: None,
            shift: ShiftConfig::default(),
        }
    }
}

/// The complete engine configuration.
///
/// Aggregates business settings, fine configuration, the leave template,
/// and injectable defaults. Constructed by the loader or assembled
/// directly by an embedding host (and by tests).
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Business-level timezone and shift.
    pub business: BusinessConfig,
    /// Fine configuration.
    pub fines: FineConfig,
    /// Leave template governing per-type limits.
    pub template: LeaveTemplate,
    /// System-wide fallbacks.
    pub defaults: Defaults,
}

impl EngineConfig {
    /// Creates a configuration from its component parts.
    pub fn new(
        business: BusinessConfig,
        fines: FineConfig,
        template: LeaveTemplate,
        defaults: Defaults,
    ) -> Self {
        Self {
            business,
            fines,
            template,
            defaults,
        }
    }

    /// The shift governing a staff member: staff override first, then the
    /// business shift.
    pub fn shift_for<'a>(&'a self, staff: &'a crate::models::Staff) -> &'a ShiftConfig {
        staff.shift.as_ref().unwrap_or(&self.business.shift)
    }

    /// The business timezone if configured.
    pub fn timezone(&self) -> Option<&str> {
        self.business.timezone.as_deref()
    }
}
