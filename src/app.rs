//! Dispatches a parsed [`Command`] to the page it loads.

use crate::attendance::AttendanceAggregator;
use crate::auth::{AuthProvider, LocalAuth, SessionCache, SignInConfirmation, sign_in_verified};
use crate::cli::Command;
use crate::config::Settings;
use crate::db;
use crate::display::{self, Page};
use crate::error::AppResult;
use crate::gateway::Gateway;
use crate::guard::{Guard, Navigator, Route, TerminalNavigator, redirect_for};
use crate::models::{Principal, Status};
use crate::oracle::SessionOracle;
use crate::roster::{Confirm, Removal, RosterManager};
use chrono::NaiveDate;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

pub struct App {
    gateway: Gateway,
    auth: LocalAuth,
    navigator: TerminalNavigator,
    retry_after: Duration,
}

impl App {
    pub fn open(settings: &Settings) -> AppResult<Self> {
        let gateway = Gateway::new(db::connect(&settings.database.url)?);
        let auth = LocalAuth::new(
            db::connect(&settings.database.url)?,
            SessionCache::new(&settings.auth.session_file),
            settings.auth.session_ttl(),
        );

        Ok(Self {
            gateway,
            auth,
            navigator: TerminalNavigator,
            retry_after: settings.auth.retry_interval(),
        })
    }

    /// Runs one command and returns the page it renders, or `None` if the guard sent the user to
    /// sign in instead.
    pub fn run(&mut self, command: Command, confirm: &mut dyn Confirm) -> Option<Page> {
        match command {
            Command::SignUp { email, password } => Some(match self.auth.sign_up(&email, &password) {
                Ok(principal) => Page::new(
                    "Sign up",
                    format!(
                        "Check your email to confirm your account! Then run `rollcall confirm-email {}`.",
                        principal.email
                    ),
                ),
                Err(err) => Page::failed("Sign up", "Sign up failed", &err),
            }),
            Command::ConfirmEmail { email } => Some(match self.auth.confirm_email(&email) {
                Ok(()) => Page::new(
                    "Confirm email",
                    format!("{email} is confirmed. You can sign in now."),
                ),
                Err(err) => Page::failed("Confirm email", "Confirmation failed", &err),
            }),
            Command::Login { email, password } => self.login(&email, &password),
            Command::Logout => Some(match self.auth.sign_out() {
                Ok(()) => Page::new("Sign out", "Signed out."),
                Err(err) => Page::failed("Sign out", "Sign out failed", &err),
            }),
            Command::Whoami => {
                let resolved = SessionOracle::new(&mut self.auth, self.retry_after).resolve();
                Some(Page::new(
                    "Session",
                    match resolved {
                        Some(principal) => {
                            format!("Signed in as {} ({})", principal.email, principal.id)
                        }
                        None => "Not signed in.".to_string(),
                    },
                ))
            }
            Command::Dashboard => self.guarded(|app, principal| app.dashboard(principal)),
            Command::AddClass { name, term } => {
                self.guarded(|app, principal| app.add_class(principal, &name, &term))
            }
            Command::DeleteClass { class_id } => {
                self.guarded(|app, principal| app.delete_class(principal, &class_id, confirm))
            }
            Command::ShowClass { class_id } => {
                self.guarded(|app, principal| app.show_class(principal, &class_id))
            }
            Command::AddSession { class_id, date } => {
                self.guarded(|app, principal| app.add_session(principal, &class_id, date))
            }
            Command::DeleteSession { session_id } => {
                self.guarded(|app, principal| app.delete_session(principal, &session_id, confirm))
            }
            Command::AddStudent {
                class_id,
                name,
                email,
            } => self.guarded(|app, principal| {
                app.add_student(principal, &class_id, &name, &email)
            }),
            Command::RemoveStudent { student_id } => {
                self.guarded(|app, principal| app.remove_student(principal, &student_id, confirm))
            }
            Command::ImportStudents {
                class_id,
                file_path,
            } => self.guarded(|app, principal| {
                app.import_students(principal, &class_id, &file_path)
            }),
            Command::ShowSession { session_id } => {
                self.guarded(|app, principal| app.show_session(principal, &session_id))
            }
            Command::Mark {
                session_id,
                student_id,
                status,
            } => self.guarded(|app, principal| {
                app.mark(principal, &session_id, &student_id, status)
            }),
        }
    }

    /// Renders `view` for the signed-in principal, or returns `None` after the guard redirected.
    fn guarded(&mut self, view: impl FnOnce(&mut Self, &Principal) -> Page) -> Option<Page> {
        let principal = self.authorize(None)?;
        Some(view(self, &principal))
    }

    /// Runs the guard for a protected page.
    fn authorize(&mut self, just_signed_in: Option<&SignInConfirmation>) -> Option<Principal> {
        let mut oracle = SessionOracle::new(&mut self.auth, self.retry_after);
        let mut guard = Guard::new();

        guard.check(&mut oracle, &mut self.navigator, just_signed_in);
        guard.principal().cloned()
    }

    fn login(&mut self, email: &str, password: &str) -> Option<Page> {
        let current = self.auth.get_user().unwrap_or_else(|err| {
            warn!(%err, "could not validate the cached session");
            None
        });

        if let (Some(principal), Some(target)) =
            (&current, redirect_for(&Route::Login, current.as_ref()))
        {
            self.navigator.navigate(target);
            let page = self.dashboard(principal);
            return Some(page.with_notice(format!("Already signed in as {}.", principal.email)));
        }

        match sign_in_verified(&mut self.auth, email, password) {
            Ok(confirmation) => {
                self.navigator.navigate(Route::Dashboard);
                let principal = self.authorize(Some(&confirmation))?;
                Some(self.dashboard(&principal))
            }
            Err(err) => Some(Page::failed("Sign in", "Sign in failed", &err)),
        }
    }

    fn dashboard(&mut self, principal: &Principal) -> Page {
        match self.roster(principal).classes() {
            Ok(classes) => Page::new("Your Classes", display::classes_table(&classes)),
            Err(err) => Page::failed(
                "Your Classes",
                "Failed to load classes. Please try again",
                &err,
            ),
        }
    }

    fn roster<'a>(&'a mut self, principal: &'a Principal) -> RosterManager<'a> {
        RosterManager::new(&mut self.gateway, principal)
    }

    fn add_class(&mut self, principal: &Principal, name: &str, term: &str) -> Page {
        match self.roster(principal).create_class(name, term) {
            Ok(created) => Page::new(
                "Your Classes",
                format!(
                    "Created \"{}\" ({}).\n\n{}",
                    created.item.name,
                    created.item.term,
                    display::classes_table(&created.listing)
                ),
            ),
            Err(err) => Page::failed("Your Classes", "Failed to create class", &err),
        }
    }

    fn delete_class(
        &mut self,
        principal: &Principal,
        class_id: &str,
        confirm: &mut dyn Confirm,
    ) -> Page {
        match self.roster(principal).delete_class(class_id, confirm) {
            Ok(Removal::Removed { item, listing }) => Page::new(
                "Your Classes",
                format!("Deleted \"{}\".\n\n{}", item.name, display::classes_table(&listing)),
            ),
            Ok(Removal::Declined) => Page::new("Your Classes", "Deletion canceled."),
            Err(err) => Page::failed(
                "Your Classes",
                "Failed to delete class. Please try again",
                &err,
            ),
        }
    }

    fn show_class(&mut self, principal: &Principal, class_id: &str) -> Page {
        match self.roster(principal).class_detail(class_id) {
            Ok(detail) => Page::new(detail.class.name.clone(), display::class_detail(&detail)),
            Err(err) => Page::failed("Class", "Failed to load class", &err),
        }
    }

    fn add_session(
        &mut self,
        principal: &Principal,
        class_id: &str,
        date: Option<NaiveDate>,
    ) -> Page {
        match self.roster(principal).create_session(class_id, date) {
            Ok(created) => Page::new(
                "Sessions",
                format!(
                    "Added session on {}.\n\n{}",
                    created.item.date,
                    display::sessions_table(&created.listing)
                ),
            ),
            Err(err) => Page::failed("Sessions", "Failed to create session", &err),
        }
    }

    fn delete_session(
        &mut self,
        principal: &Principal,
        session_id: &str,
        confirm: &mut dyn Confirm,
    ) -> Page {
        match self.roster(principal).delete_session(session_id, confirm) {
            Ok(Removal::Removed { item, listing }) => Page::new(
                "Sessions",
                format!(
                    "Deleted session on {}.\n\n{}",
                    item.date,
                    display::sessions_table(&listing)
                ),
            ),
            Ok(Removal::Declined) => Page::new("Sessions", "Deletion canceled."),
            Err(err) => {
                Page::failed("Sessions", "Failed to delete session. Please try again", &err)
            }
        }
    }

    fn add_student(
        &mut self,
        principal: &Principal,
        class_id: &str,
        name: &str,
        email: &str,
    ) -> Page {
        match self.roster(principal).enroll_student(class_id, name, email) {
            Ok(created) => Page::new(
                "Students",
                format!(
                    "Enrolled {}.\n\n{}",
                    created.item.name,
                    display::students_table(&created.listing)
                ),
            ),
            Err(err) => Page::failed("Students", "Failed to add student", &err),
        }
    }

    fn remove_student(
        &mut self,
        principal: &Principal,
        student_id: &str,
        confirm: &mut dyn Confirm,
    ) -> Page {
        match self.roster(principal).remove_student(student_id, confirm) {
            Ok(Removal::Removed { item, listing }) => Page::new(
                "Students",
                format!("Removed {}.\n\n{}", item.name, display::students_table(&listing)),
            ),
            Ok(Removal::Declined) => Page::new("Students", "Removal canceled."),
            Err(err) => {
                Page::failed("Students", "Failed to remove student. Please try again", &err)
            }
        }
    }

    fn import_students(&mut self, principal: &Principal, class_id: &str, file_path: &Path) -> Page {
        match self.roster(principal).import_students(class_id, file_path) {
            Ok(report) => Page::new("Students", display::import_report(&report)),
            Err(err) => Page::failed("Students", "Failed to import students", &err),
        }
    }

    fn show_session(&mut self, principal: &Principal, session_id: &str) -> Page {
        match AttendanceAggregator::new(&mut self.gateway, principal).sheet(session_id) {
            Ok(sheet) => Page::new(
                display::session_heading(&sheet),
                display::attendance_sheet(&sheet),
            ),
            Err(err) => Page::failed(
                "Attendance",
                "Failed to load attendance data. Please try again",
                &err,
            ),
        }
    }

    fn mark(
        &mut self,
        principal: &Principal,
        session_id: &str,
        student_id: &str,
        status: Status,
    ) -> Page {
        let marked = AttendanceAggregator::new(&mut self.gateway, principal).set_status(
            session_id,
            student_id,
            status,
        );

        match marked {
            Ok(sheet) => Page::new(
                display::session_heading(&sheet),
                display::attendance_sheet(&sheet),
            ),
            Err(err) => Page::failed("Attendance", "Failed to update attendance", &err),
        }
    }
}
