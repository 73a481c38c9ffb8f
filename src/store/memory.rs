//! In-memory document store.
//!
//! Backs both store traits with `RwLock`-guarded maps. Used throughout the
//! test suites and suitable for single-process embedding.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{AttendanceRecord, LeaveRequest, LeaveStatus};

use super::{AttendanceStore, LeaveStore};

/// An in-memory implementation of both store traits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    leaves: RwLock<HashMap<Uuid, LeaveRequest>>,
    attendance: RwLock<HashMap<(String, NaiveDate), AttendanceRecord>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned(what: &str) -> EngineError {
        EngineError::Store {
            message: format!("{what} lock poisoned"),
        }
    }

    /// Number of attendance records held (test convenience).
    pub fn attendance_count(&self) -> usize {
        self.attendance.read().map(|map| map.len()).unwrap_or(0)
    }
}

impl LeaveStore for MemoryStore {
    fn insert(&self, leave: LeaveRequest) -> EngineResult<()> {
        let mut leaves = self.leaves.write().map_err(|_| Self::poisoned("leave"))?;
        leaves.insert(leave.id, leave);
        Ok(())
    }

    fn get(&self, id: Uuid) -> EngineResult<Option<LeaveRequest>> {
        let leaves = self.leaves.read().map_err(|_| Self::poisoned("leave"))?;
        Ok(leaves.get(&id).cloned())
    }

    fn update(&self, leave: &LeaveRequest) -> EngineResult<()> {
        let mut leaves = self.leaves.write().map_err(|_| Self::poisoned("leave"))?;
        if !leaves.contains_key(&leave.id) {
            return Err(EngineError::Store {
                message: format!("update of unknown leave {}", leave.id),
            });
        }
        leaves.insert(leave.id, leave.clone());
        Ok(())
    }

    fn find_by_employee(
        &self,
        employee_id: &str,
        statuses: &[LeaveStatus],
    ) -> EngineResult<Vec<LeaveRequest>> {
        let leaves = self.leaves.read().map_err(|_| Self::poisoned("leave"))?;
        let mut matched: Vec<LeaveRequest> = leaves
            .values()
            .filter(|l| l.employee_id == employee_id && statuses.contains(&l.status))
            .cloned()
            .collect();
        matched.sort_by_key(|l| (l.start_date, l.id));
        Ok(matched)
    }
}

impl AttendanceStore for MemoryStore {
    fn get(&self, employee_id: &str, date: NaiveDate) -> EngineResult<Option<AttendanceRecord>> {
        let attendance = self
            .attendance
            .read()
            .map_err(|_| Self::poisoned("attendance"))?;
        Ok(attendance.get(&(employee_id.to_string(), date)).cloned())
    }

    fn upsert(&self, record: AttendanceRecord) -> EngineResult<()> {
        let mut attendance = self
            .attendance
            .write()
            .map_err(|_| Self::poisoned("attendance"))?;
        attendance.insert((record.employee_id.clone(), record.date), record);
        Ok(())
    }

    fn delete(&self, employee_id: &str, date: NaiveDate) -> EngineResult<()> {
        let mut attendance = self
            .attendance
            .write()
            .map_err(|_| Self::poisoned("attendance"))?;
        attendance.remove(&(employee_id.to_string(), date));
        Ok(())
    }
}
