use crate::attendance::{Mark, SessionSheet};
use crate::error::AppError;
use crate::models::{Class, EnrolledStudent, Session};
use crate::roster::{ClassDetail, ImportReport};
use std::fmt;
use tabled::{Table, Tabled, settings::Style};

/// One rendered screen: a heading, a body, and possibly an inline error notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub heading: String,
    pub body: String,
    pub notice: Option<String>,
}

impl Page {
    pub fn new(heading: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            body: body.into(),
            notice: None,
        }
    }

    /// A page that only reports that `action` failed.
    pub fn failed(heading: impl Into<String>, action: &str, err: &AppError) -> Self {
        Self {
            heading: heading.into(),
            body: String::new(),
            notice: Some(format!("{action}: {err}")),
        }
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.heading)?;
        if let Some(notice) = &self.notice {
            writeln!(f, "! {notice}")?;
        }
        if !self.body.is_empty() {
            write!(f, "\n{}", self.body)?;
        }
        Ok(())
    }
}

fn render<T: Tabled>(rows: Vec<T>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::modern());
    table.to_string()
}

#[derive(Tabled)]
struct ClassRow {
    id: String,
    name: String,
    term: String,
    created: String,
}

/// Pretty prints the principal's classes.
pub fn classes_table(classes: &[Class]) -> String {
    if classes.is_empty() {
        return "No classes yet. Create one with `rollcall add-class <NAME> <TERM>`.".to_string();
    }

    render(
        classes
            .iter()
            .map(|class| ClassRow {
                id: class.id.clone(),
                name: class.name.clone(),
                term: class.term.clone(),
                created: class.created_at.format("%Y-%m-%d %H:%M").to_string(),
            })
            .collect(),
    )
}

#[derive(Tabled)]
struct SessionRow {
    id: String,
    date: String,
}

pub fn sessions_table(sessions: &[Session]) -> String {
    if sessions.is_empty() {
        return "No sessions yet.".to_string();
    }

    render(
        sessions
            .iter()
            .map(|session| SessionRow {
                id: session.id.clone(),
                date: session.date.format("%a %Y-%m-%d").to_string(),
            })
            .collect(),
    )
}

#[derive(Tabled)]
struct StudentRow {
    id: String,
    name: String,
    email: String,
}

pub fn students_table(students: &[EnrolledStudent]) -> String {
    if students.is_empty() {
        return "No students yet.".to_string();
    }

    render(
        students
            .iter()
            .map(|student| StudentRow {
                id: student.id.clone(),
                name: student.name.clone(),
                email: student.email.clone(),
            })
            .collect(),
    )
}

pub fn class_detail(detail: &ClassDetail) -> String {
    format!(
        "Term: {}\n\nSessions:\n{}\n\nStudents:\n{}",
        detail.class.term,
        sessions_table(&detail.sessions),
        students_table(&detail.students)
    )
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Total Students")]
    total: usize,
    #[tabled(rename = "Present")]
    present: usize,
    #[tabled(rename = "Absent")]
    absent: usize,
    #[tabled(rename = "Attendance Rate")]
    rate: String,
}

#[derive(Tabled)]
struct SheetRow {
    id: String,
    name: String,
    email: String,
    status: &'static str,
}

/// Pretty prints the attendance sheet for a session, summary first.
pub fn attendance_sheet(sheet: &SessionSheet) -> String {
    let summary = render(vec![SummaryRow {
        total: sheet.summary.total,
        present: sheet.summary.present,
        absent: sheet.summary.absent,
        rate: format!("{}%", sheet.summary.rate),
    }]);

    if sheet.entries.is_empty() {
        return format!(
            "{summary}\n\nNo students yet. Add students to this class before marking attendance."
        );
    }

    let rows = sheet
        .entries
        .iter()
        .map(|entry| SheetRow {
            id: entry.student.id.clone(),
            name: entry.student.name.clone(),
            email: entry.student.email.clone(),
            status: match entry.mark {
                Mark::Marked(status) => status.as_str(),
                Mark::Unmarked => "-",
            },
        })
        .collect();

    format!("{summary}\n\n{}", render(rows))
}

pub fn session_heading(sheet: &SessionSheet) -> String {
    format!(
        "{} ({}), session: {}",
        sheet.class.name,
        sheet.class.term,
        sheet.session.date.format("%A, %B %-d, %Y")
    )
}

pub fn import_report(report: &ImportReport) -> String {
    let mut out = format!("Enrolled {} student(s).", report.enrolled.len());
    for (line, reason) in &report.failed {
        out.push_str(&format!("\nRow {line} skipped: {reason}"));
    }
    out.push_str("\n\n");
    out.push_str(&students_table(&report.listing));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_page_keeps_the_error_inline() {
        let page = Page::failed(
            "Dashboard",
            "Failed to load classes",
            &AppError::not_found("class", "c-1"),
        );

        assert_eq!(
            page.notice.as_deref(),
            Some("Failed to load classes: class `c-1` not found")
        );
        assert_eq!(
            page.to_string(),
            "Dashboard\n! Failed to load classes: class `c-1` not found\n"
        );
    }

    #[test]
    fn empty_listings_say_so() {
        assert!(classes_table(&[]).starts_with("No classes yet."));
        assert_eq!(sessions_table(&[]), "No sessions yet.");
        assert_eq!(students_table(&[]), "No students yet.");
    }
}
