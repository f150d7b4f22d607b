//! The data access gateway: every read and write against `classes`, `class_students`,
//! `sessions`, and `attendance`.
//!
//! Each method takes the acting [`Principal`] and only ever touches rows reachable through a class
//! that principal owns. A row owned by somebody else is reported exactly like a row that does not
//! exist, as [`AppError::NotFound`].

use crate::error::{AppError, AppResult};
use crate::models::{AttendanceRecord, Class, EnrolledStudent, Principal, Session, Status};
use crate::schema::{attendance, class_students, classes, sessions};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use tracing::debug;
use uuid::Uuid;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Owner-scoped access to the attendance tables.
pub struct Gateway {
    db: SqliteConnection,
}

impl Gateway {
    pub fn new(db: SqliteConnection) -> Self {
        Self { db }
    }

    /// Gives back the underlying connection.
    pub fn into_inner(self) -> SqliteConnection {
        self.db
    }

    /// Retrieves the principal's classes, newest first.
    pub fn list_classes(&mut self, principal: &Principal) -> AppResult<Vec<Class>> {
        Ok(classes::table
            .filter(classes::owner_id.eq(&principal.id))
            .order(classes::created_at.desc())
            .select(Class::as_select())
            .load(&mut self.db)?)
    }

    pub fn get_class(&mut self, principal: &Principal, class_id: &str) -> AppResult<Class> {
        classes::table
            .filter(classes::id.eq(class_id))
            .filter(classes::owner_id.eq(&principal.id))
            .select(Class::as_select())
            .first(&mut self.db)
            .optional()?
            .ok_or_else(|| AppError::not_found("class", class_id))
    }

    pub fn insert_class(
        &mut self,
        principal: &Principal,
        name: &str,
        term: &str,
    ) -> AppResult<Class> {
        let class = Class {
            id: new_id(),
            owner_id: principal.id.clone(),
            name: name.to_string(),
            term: term.to_string(),
            created_at: now(),
        };

        let class = diesel::insert_into(classes::table)
            .values(&class)
            .returning(Class::as_returning())
            .get_result(&mut self.db)?;

        debug!(class_id = %class.id, owner = %principal.id, "inserted class");
        Ok(class)
    }

    /// Deletes a class. Its sessions, students, and their attendance go with it.
    pub fn delete_class(&mut self, principal: &Principal, class_id: &str) -> AppResult<()> {
        let deleted = diesel::delete(
            classes::table
                .filter(classes::id.eq(class_id))
                .filter(classes::owner_id.eq(&principal.id)),
        )
        .execute(&mut self.db)?;

        if deleted == 0 {
            return Err(AppError::not_found("class", class_id));
        }

        debug!(class_id, "deleted class");
        Ok(())
    }

    /// Retrieves the sessions of a class, latest date first.
    pub fn list_sessions(
        &mut self,
        principal: &Principal,
        class_id: &str,
    ) -> AppResult<Vec<Session>> {
        self.get_class(principal, class_id)?;

        Ok(sessions::table
            .filter(sessions::class_id.eq(class_id))
            .order((sessions::date.desc(), sessions::created_at.desc()))
            .select(Session::as_select())
            .load(&mut self.db)?)
    }

    pub fn get_session(&mut self, principal: &Principal, session_id: &str) -> AppResult<Session> {
        sessions::table
            .inner_join(classes::table)
            .filter(sessions::id.eq(session_id))
            .filter(classes::owner_id.eq(&principal.id))
            .select(Session::as_select())
            .first(&mut self.db)
            .optional()?
            .ok_or_else(|| AppError::not_found("session", session_id))
    }

    pub fn insert_session(
        &mut self,
        principal: &Principal,
        class_id: &str,
        date: NaiveDate,
    ) -> AppResult<Session> {
        self.get_class(principal, class_id)?;

        let session = Session {
            id: new_id(),
            class_id: class_id.to_string(),
            date,
            created_at: now(),
        };

        Ok(diesel::insert_into(sessions::table)
            .values(&session)
            .returning(Session::as_returning())
            .get_result(&mut self.db)?)
    }

    /// Deletes a session along with its attendance records.
    pub fn delete_session(&mut self, principal: &Principal, session_id: &str) -> AppResult<()> {
        self.get_session(principal, session_id)?;

        diesel::delete(sessions::table.find(session_id)).execute(&mut self.db)?;

        debug!(session_id, "deleted session");
        Ok(())
    }

    /// Retrieves the students enrolled in a class, ordered by name.
    pub fn list_students(
        &mut self,
        principal: &Principal,
        class_id: &str,
    ) -> AppResult<Vec<EnrolledStudent>> {
        self.get_class(principal, class_id)?;

        Ok(class_students::table
            .filter(class_students::class_id.eq(class_id))
            .order(class_students::name.asc())
            .select(EnrolledStudent::as_select())
            .load(&mut self.db)?)
    }

    pub fn get_student(
        &mut self,
        principal: &Principal,
        student_id: &str,
    ) -> AppResult<EnrolledStudent> {
        class_students::table
            .inner_join(classes::table)
            .filter(class_students::id.eq(student_id))
            .filter(classes::owner_id.eq(&principal.id))
            .select(EnrolledStudent::as_select())
            .first(&mut self.db)
            .optional()?
            .ok_or_else(|| AppError::not_found("student", student_id))
    }

    pub fn insert_student(
        &mut self,
        principal: &Principal,
        class_id: &str,
        name: &str,
        email: &str,
    ) -> AppResult<EnrolledStudent> {
        self.get_class(principal, class_id)?;

        let student = EnrolledStudent {
            id: new_id(),
            class_id: class_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            created_at: now(),
        };

        Ok(diesel::insert_into(class_students::table)
            .values(&student)
            .returning(EnrolledStudent::as_returning())
            .get_result(&mut self.db)?)
    }

    /// Removes a student from their class along with their attendance records.
    pub fn delete_student(&mut self, principal: &Principal, student_id: &str) -> AppResult<()> {
        self.get_student(principal, student_id)?;

        diesel::delete(class_students::table.find(student_id)).execute(&mut self.db)?;

        debug!(student_id, "removed student");
        Ok(())
    }

    /// Retrieves every attendance record of a session.
    pub fn list_attendance(
        &mut self,
        principal: &Principal,
        session_id: &str,
    ) -> AppResult<Vec<AttendanceRecord>> {
        self.get_session(principal, session_id)?;

        Ok(attendance::table
            .filter(attendance::session_id.eq(session_id))
            .select(AttendanceRecord::as_select())
            .load(&mut self.db)?)
    }

    /// Looks up the record for a `(session, student)` pair, if one has been written.
    pub fn find_attendance(
        &mut self,
        principal: &Principal,
        session_id: &str,
        student_id: &str,
    ) -> AppResult<Option<AttendanceRecord>> {
        Ok(attendance::table
            .inner_join(sessions::table.inner_join(classes::table))
            .filter(attendance::session_id.eq(session_id))
            .filter(attendance::user_id.eq(student_id))
            .filter(classes::owner_id.eq(&principal.id))
            .select(AttendanceRecord::as_select())
            .first(&mut self.db)
            .optional()?)
    }

    /// Writes the first record for a `(session, student)` pair. The student must be enrolled in the
    /// session's class.
    pub fn insert_attendance(
        &mut self,
        principal: &Principal,
        session_id: &str,
        student_id: &str,
        status: Status,
    ) -> AppResult<AttendanceRecord> {
        let session = self.get_session(principal, session_id)?;

        let enrolled = class_students::table
            .filter(class_students::id.eq(student_id))
            .filter(class_students::class_id.eq(&session.class_id))
            .count()
            .get_result::<i64>(&mut self.db)?;
        if enrolled == 0 {
            return Err(AppError::not_found("student", student_id));
        }

        let record = AttendanceRecord {
            id: new_id(),
            session_id: session_id.to_string(),
            user_id: student_id.to_string(),
            status,
            updated_at: now(),
        };

        Ok(diesel::insert_into(attendance::table)
            .values(&record)
            .returning(AttendanceRecord::as_returning())
            .get_result(&mut self.db)?)
    }

    /// Overwrites the status of an existing record and bumps its `updated_at`.
    pub fn update_attendance(
        &mut self,
        principal: &Principal,
        record_id: &str,
        new_status: Status,
    ) -> AppResult<()> {
        let owned = attendance::table
            .inner_join(sessions::table.inner_join(classes::table))
            .filter(attendance::id.eq(record_id))
            .filter(classes::owner_id.eq(&principal.id))
            .select(attendance::id)
            .first::<String>(&mut self.db)
            .optional()?;

        if owned.is_none() {
            return Err(AppError::not_found("attendance record", record_id));
        }

        diesel::update(attendance::table.find(record_id))
            .set((
                attendance::status.eq(new_status),
                attendance::updated_at.eq(now()),
            ))
            .execute(&mut self.db)?;

        Ok(())
    }
}
