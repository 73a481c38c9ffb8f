//! Staff model and leave template configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::leave::LeaveKind;
use crate::config::ShiftConfig;

/// Per-type leave allowance inside a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveTypeConfig {
    /// Type name as configured by HR (matched fuzzily against requests).
    pub name: String,
    /// Day limit per period (month or year depending on the type).
    pub max_days: Decimal,
    /// Whether unused days roll into the next period.
    #[serde(default)]
    pub carry_forward: bool,
}

/// A company's leave template: the set of governed leave types.
///
/// Leave types absent from the template are unrestricted; the balance
/// engine reports them with no limit and callers treat them as
/// always-allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveTemplate {
    /// Template name.
    pub name: String,
    /// Governed leave types.
    pub leave_types: Vec<LeaveTypeConfig>,
}

impl LeaveTemplate {
    /// Resolves a leave kind against the template's type list.
    ///
    /// Matching is case/whitespace-insensitive and tolerates an optional
    /// trailing "Leave" on the configured name.
    pub fn resolve(&self, kind: &LeaveKind) -> Option<&LeaveTypeConfig> {
        self.leave_types.iter().find(|t| kind.matches(&t.name))
    }
}

/// An employee as seen by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    /// Unique identifier for the employee.
    pub id: String,
    /// Display name.
    pub name: String,
    /// The leave template governing this employee, if any.
    #[serde(default)]
    pub leave_template: Option<LeaveTemplate>,
    /// Per-staff shift override; the business shift applies when absent.
    #[serde(default)]
    pub shift: Option<ShiftConfig>,
    /// Daily salary used as fine context; missing salary means zero-rate
    /// fines, never an error.
    #[serde(default)]
    pub daily_salary: Option<Decimal>,
}

impl Staff {
    /// Looks up the template entry governing a leave kind, if any.
    pub fn template_entry(&self, kind: &LeaveKind) -> Option<&LeaveTypeConfig> {
        self.leave_template.as_ref().and_then(|t| t.resolve(kind))
    }
}
