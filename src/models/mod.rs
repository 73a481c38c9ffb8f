//! Core data models for the reconciliation engine.
//!
//! This module contains all the domain models used throughout the engine.

mod attendance;
mod leave;
mod staff;

pub use attendance::{AttendanceRecord, AttendanceStatus};
pub use leave::{HalfDaySession, LeaveKind, LeaveRequest, LeaveStatus};
pub use staff::{LeaveTemplate, LeaveTypeConfig, Staff};
