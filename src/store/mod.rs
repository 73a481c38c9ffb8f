//! Document-store abstractions for leave and attendance collections.
//!
//! The engine never talks to a database directly; it issues indexed
//! lookups through these traits. Hosts back them with whatever document
//! store they run; [`memory::MemoryStore`] backs them for tests and
//! lightweight embedding.

pub mod memory;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{AttendanceRecord, LeaveRequest, LeaveStatus};

pub use memory::MemoryStore;

/// Abstraction over the leave-request collection.
pub trait LeaveStore: Send + Sync {
    /// Inserts a new leave request.
    fn insert(&self, leave: LeaveRequest) -> EngineResult<()>;

    /// Fetches a leave request by id.
    fn get(&self, id: Uuid) -> EngineResult<Option<LeaveRequest>>;

    /// Persists an updated leave request.
    fn update(&self, leave: &LeaveRequest) -> EngineResult<()>;

    /// Returns an employee's leave requests holding any of the given
    /// statuses, ordered by start date.
    fn find_by_employee(
        &self,
        employee_id: &str,
        statuses: &[LeaveStatus],
    ) -> EngineResult<Vec<LeaveRequest>>;
}

/// Abstraction over the attendance collection, keyed by (employee, day).
pub trait AttendanceStore: Send + Sync {
    /// Fetches the record for an employee and calendar day.
    fn get(&self, employee_id: &str, date: NaiveDate) -> EngineResult<Option<AttendanceRecord>>;

    /// Creates or replaces the record for its (employee, day) key.
    fn upsert(&self, record: AttendanceRecord) -> EngineResult<()>;

    /// Deletes the record for an employee and calendar day, if present.
    fn delete(&self, employee_id: &str, date: NaiveDate) -> EngineResult<()>;
}
