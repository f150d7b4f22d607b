//! Managing classes, their enrolled students, and their sessions.

use crate::error::{AppError, AppResult};
use crate::gateway::Gateway;
use crate::models::{Class, EnrolledStudent, Principal, Session};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use std::io::{self, Write};
use std::path::Path;
use tracing::{info, warn};

/// Asks the operator to confirm a destructive operation.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool>;
}

/// Asks on the terminal. Anything but `y` declines.
#[derive(Debug, Default)]
pub struct Prompt;

impl Confirm for Prompt {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        println!("{prompt}");
        print!("Proceed? y/[N]: ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        Ok(input.trim().eq_ignore_ascii_case("y"))
    }
}

/// Confirms everything, for `--yes`.
#[derive(Debug, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _prompt: &str) -> io::Result<bool> {
        Ok(true)
    }
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        Ok(self(prompt))
    }
}

/// The result of a create: the new item and the re-fetched listing it now appears in.
#[derive(Debug, Clone)]
pub struct Created<T> {
    pub item: T,
    pub listing: Vec<T>,
}

/// The result of a delete that needed confirmation.
#[derive(Debug, Clone)]
pub enum Removal<T> {
    /// Deleted `item`; `listing` was re-fetched afterwards.
    Removed { item: T, listing: Vec<T> },
    /// The operator declined and nothing was sent.
    Declined,
}

/// A class with its sessions (latest first) and students (by name).
#[derive(Debug, Clone)]
pub struct ClassDetail {
    pub class: Class,
    pub sessions: Vec<Session>,
    pub students: Vec<EnrolledStudent>,
}

/// The outcome of enrolling students from a CSV file. Rows are enrolled one at a time, so a failed
/// row does not undo the ones before it.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub enrolled: Vec<EnrolledStudent>,
    /// 1-indexed data row and why it was skipped.
    pub failed: Vec<(usize, String)>,
    pub listing: Vec<EnrolledStudent>,
}

#[derive(Debug, Deserialize)]
struct StudentRow {
    name: String,
    email: String,
}

fn required(field: &'static str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation { field });
    }
    Ok(value.to_string())
}

/// Class, session, and student management on behalf of one principal.
pub struct RosterManager<'a> {
    gateway: &'a mut Gateway,
    principal: &'a Principal,
}

impl<'a> RosterManager<'a> {
    pub fn new(gateway: &'a mut Gateway, principal: &'a Principal) -> Self {
        Self { gateway, principal }
    }

    /// The principal's classes, newest first.
    pub fn classes(&mut self) -> AppResult<Vec<Class>> {
        self.gateway.list_classes(self.principal)
    }

    pub fn create_class(&mut self, name: &str, term: &str) -> AppResult<Created<Class>> {
        let name = required("name", name)?;
        let term = required("term", term)?;

        let item = self.gateway.insert_class(self.principal, &name, &term)?;
        info!(class_id = %item.id, "created class");

        Ok(Created {
            item,
            listing: self.classes()?,
        })
    }

    pub fn delete_class(
        &mut self,
        class_id: &str,
        confirm: &mut dyn Confirm,
    ) -> AppResult<Removal<Class>> {
        let class = self.gateway.get_class(self.principal, class_id)?;

        let prompt = format!(
            "Are you sure you want to delete \"{}\"? This will also delete all sessions and attendance records for this class.",
            class.name
        );
        if !confirm.confirm(&prompt)? {
            return Ok(Removal::Declined);
        }

        self.gateway.delete_class(self.principal, class_id)?;
        info!(class_id, "deleted class");

        Ok(Removal::Removed {
            item: class,
            listing: self.classes()?,
        })
    }

    pub fn class_detail(&mut self, class_id: &str) -> AppResult<ClassDetail> {
        let class = self.gateway.get_class(self.principal, class_id)?;
        let sessions = self.gateway.list_sessions(self.principal, class_id)?;
        let students = self.gateway.list_students(self.principal, class_id)?;

        Ok(ClassDetail {
            class,
            sessions,
            students,
        })
    }

    /// Creates a session on `date`, or today if no date is given.
    pub fn create_session(
        &mut self,
        class_id: &str,
        date: Option<NaiveDate>,
    ) -> AppResult<Created<Session>> {
        let date = date.unwrap_or_else(|| Local::now().date_naive());

        let item = self.gateway.insert_session(self.principal, class_id, date)?;
        info!(session_id = %item.id, %date, "created session");

        Ok(Created {
            item,
            listing: self.gateway.list_sessions(self.principal, class_id)?,
        })
    }

    pub fn delete_session(
        &mut self,
        session_id: &str,
        confirm: &mut dyn Confirm,
    ) -> AppResult<Removal<Session>> {
        let session = self.gateway.get_session(self.principal, session_id)?;

        let prompt = format!(
            "Are you sure you want to delete the session on {}? This will also delete all attendance records for this session.",
            session.date.format("%A, %B %-d, %Y")
        );
        if !confirm.confirm(&prompt)? {
            return Ok(Removal::Declined);
        }

        self.gateway.delete_session(self.principal, session_id)?;
        info!(session_id, "deleted session");

        Ok(Removal::Removed {
            listing: self.gateway.list_sessions(self.principal, &session.class_id)?,
            item: session,
        })
    }

    pub fn enroll_student(
        &mut self,
        class_id: &str,
        name: &str,
        email: &str,
    ) -> AppResult<Created<EnrolledStudent>> {
        let item = self.enroll(class_id, name, email)?;

        Ok(Created {
            item,
            listing: self.gateway.list_students(self.principal, class_id)?,
        })
    }

    fn enroll(&mut self, class_id: &str, name: &str, email: &str) -> AppResult<EnrolledStudent> {
        let name = required("name", name)?;
        let email = required("email", email)?;

        let student = self
            .gateway
            .insert_student(self.principal, class_id, &name, &email)?;
        info!(student_id = %student.id, class_id, "enrolled student");

        Ok(student)
    }

    pub fn remove_student(
        &mut self,
        student_id: &str,
        confirm: &mut dyn Confirm,
    ) -> AppResult<Removal<EnrolledStudent>> {
        let student = self.gateway.get_student(self.principal, student_id)?;

        let prompt = format!(
            "Are you sure you want to remove \"{}\" from this class? This will also delete all their attendance records.",
            student.name
        );
        if !confirm.confirm(&prompt)? {
            return Ok(Removal::Declined);
        }

        self.gateway.delete_student(self.principal, student_id)?;
        info!(student_id, "removed student");

        Ok(Removal::Removed {
            listing: self.gateway.list_students(self.principal, &student.class_id)?,
            item: student,
        })
    }

    /// Enrolls every `name,email` row of a CSV file with a header line.
    pub fn import_students(&mut self, class_id: &str, file_path: &Path) -> AppResult<ImportReport> {
        // Fail before reading anything if the class is not ours.
        self.gateway.get_class(self.principal, class_id)?;

        let mut reader = csv::Reader::from_path(file_path)?;
        let mut report = ImportReport::default();

        for (index, row) in reader.deserialize::<StudentRow>().enumerate() {
            let line = index + 1;
            let enrolled = row
                .map_err(AppError::from)
                .and_then(|row| self.enroll(class_id, &row.name, &row.email));

            match enrolled {
                Ok(student) => report.enrolled.push(student),
                Err(err) => {
                    warn!(line, %err, "skipping roster row");
                    report.failed.push((line, err.to_string()));
                }
            }
        }

        report.listing = self.gateway.list_students(self.principal, class_id)?;
        Ok(report)
    }
}
