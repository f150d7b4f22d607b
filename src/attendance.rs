//! Marking attendance for a session and summarizing it.

use crate::error::{AppError, AppResult};
use crate::gateway::Gateway;
use crate::models::{Class, EnrolledStudent, Principal, Session, Status};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::HashMap;
use tracing::{debug, warn};

/// What the sheet shows for one student. `Unmarked` means no record has been written yet, which is
/// not the same as [`Status::Absent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Marked(Status),
    Unmarked,
}

/// Head counts for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttendanceSummary {
    pub total: usize,
    pub present: usize,
    pub absent: usize,
    /// Percentage of enrolled students present, rounded to the nearest integer.
    pub rate: u32,
}

impl AttendanceSummary {
    pub fn from_marks(marks: impl IntoIterator<Item = Mark>) -> Self {
        let mut summary = Self::default();

        for mark in marks {
            summary.total += 1;
            match mark {
                Mark::Marked(Status::Present) => summary.present += 1,
                Mark::Marked(Status::Absent) => summary.absent += 1,
                Mark::Unmarked => {}
            }
        }

        summary.rate = attendance_rate(summary.present, summary.total);
        summary
    }
}

/// `round(present / total * 100)`, or 0 for an empty class.
pub fn attendance_rate(present: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }

    (present as f64 / total as f64 * 100.0).round() as u32
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub student: EnrolledStudent,
    pub mark: Mark,
}

/// Everything the attendance page for one session shows.
#[derive(Debug, Clone)]
pub struct SessionSheet {
    pub class: Class,
    pub session: Session,
    /// One entry per enrolled student, ordered by name.
    pub entries: Vec<SheetEntry>,
    pub summary: AttendanceSummary,
}

impl SessionSheet {
    pub fn mark_of(&self, student_id: &str) -> Option<Mark> {
        self.entries
            .iter()
            .find(|entry| entry.student.id == student_id)
            .map(|entry| entry.mark)
    }
}

/// Reads and writes attendance on behalf of one principal.
pub struct AttendanceAggregator<'a> {
    gateway: &'a mut Gateway,
    principal: &'a Principal,
}

impl<'a> AttendanceAggregator<'a> {
    pub fn new(gateway: &'a mut Gateway, principal: &'a Principal) -> Self {
        Self { gateway, principal }
    }

    /// Loads the sheet for a session: every enrolled student with their mark, and the summary.
    pub fn sheet(&mut self, session_id: &str) -> AppResult<SessionSheet> {
        let session = self.gateway.get_session(self.principal, session_id)?;
        let class = self.gateway.get_class(self.principal, &session.class_id)?;
        let students = self.gateway.list_students(self.principal, &class.id)?;

        let mut recorded: HashMap<String, Status> = self
            .gateway
            .list_attendance(self.principal, session_id)?
            .into_iter()
            .map(|record| (record.user_id, record.status))
            .collect();

        let entries: Vec<SheetEntry> = students
            .into_iter()
            .map(|student| {
                let mark = recorded
                    .remove(&student.id)
                    .map_or(Mark::Unmarked, Mark::Marked);
                SheetEntry { student, mark }
            })
            .collect();

        let summary = AttendanceSummary::from_marks(entries.iter().map(|entry| entry.mark));

        Ok(SessionSheet {
            class,
            session,
            entries,
            summary,
        })
    }

    /// Sets a student's status for a session, inserting the record the first time and updating it
    /// in place afterwards. Returns the re-fetched sheet.
    pub fn set_status(
        &mut self,
        session_id: &str,
        student_id: &str,
        status: Status,
    ) -> AppResult<SessionSheet> {
        self.upsert(session_id, student_id, status)?;
        debug!(session_id, student_id, %status, "attendance recorded");

        self.sheet(session_id)
    }

    fn upsert(&mut self, session_id: &str, student_id: &str, status: Status) -> AppResult<()> {
        if let Some(existing) = self
            .gateway
            .find_attendance(self.principal, session_id, student_id)?
        {
            return self
                .gateway
                .update_attendance(self.principal, &existing.id, status);
        }

        self.insert_or_update(session_id, student_id, status)
    }

    fn insert_or_update(
        &mut self,
        session_id: &str,
        student_id: &str,
        status: Status,
    ) -> AppResult<()> {
        match self
            .gateway
            .insert_attendance(self.principal, session_id, student_id, status)
        {
            Ok(_) => Ok(()),
            // Somebody else wrote the record between our lookup and insert.
            Err(AppError::Transport(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                _,
            ))) => {
                warn!(session_id, student_id, "attendance record appeared concurrently");
                let existing = self
                    .gateway
                    .find_attendance(self.principal, session_id, student_id)?
                    .ok_or_else(|| AppError::not_found("attendance record", student_id))?;
                self.gateway
                    .update_attendance(self.principal, &existing.id, status)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use chrono::NaiveDate;

    fn principal() -> Principal {
        Principal {
            id: "p-ada".to_string(),
            email: "ada@x.com".to_string(),
        }
    }

    #[test]
    fn insert_falls_back_to_update_when_the_record_already_exists() {
        let mut gateway = Gateway::new(db::connect(":memory:").unwrap());
        let ada = principal();
        let class = gateway.insert_class(&ada, "CS101", "Fall").unwrap();
        let session = gateway
            .insert_session(&ada, &class.id, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap())
            .unwrap();
        let student = gateway
            .insert_student(&ada, &class.id, "Ada", "ada@x.com")
            .unwrap();

        // Another writer got there between our lookup and our insert.
        let first = gateway
            .insert_attendance(&ada, &session.id, &student.id, Status::Present)
            .unwrap();

        AttendanceAggregator::new(&mut gateway, &ada)
            .insert_or_update(&session.id, &student.id, Status::Absent)
            .unwrap();

        let records = gateway.list_attendance(&ada, &session.id).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, first.id);
        assert_eq!(records[0].status, Status::Absent);
    }

    #[test]
    fn empty_class_has_zero_rate() {
        assert_eq!(attendance_rate(0, 0), 0);
        assert_eq!(AttendanceSummary::from_marks([]), AttendanceSummary::default());
    }

    #[test]
    fn rate_rounds_to_nearest_percent() {
        assert_eq!(attendance_rate(1, 3), 33);
        assert_eq!(attendance_rate(2, 3), 67);
        assert_eq!(attendance_rate(1, 2), 50);
        assert_eq!(attendance_rate(1, 8), 13);
        assert_eq!(attendance_rate(5, 5), 100);
    }

    #[test]
    fn rate_stays_within_bounds() {
        for total in 1..=40 {
            for present in 0..=total {
                let rate = attendance_rate(present, total);
                assert!(rate <= 100);
                assert_eq!(rate == 100, present == total);
                assert_eq!(rate == 0, present == 0);
            }
        }
    }

    #[test]
    fn unmarked_counts_toward_total_only() {
        let summary = AttendanceSummary::from_marks([
            Mark::Marked(Status::Present),
            Mark::Marked(Status::Absent),
            Mark::Unmarked,
            Mark::Unmarked,
        ]);

        assert_eq!(
            summary,
            AttendanceSummary {
                total: 4,
                present: 1,
                absent: 1,
                rate: 25,
            }
        );
    }
}
