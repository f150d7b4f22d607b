//! This module contains the command-line interface [`Cli`] parser for tracking class attendance.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::Status;

/// The command line configuration struct, where the command-line interface parser is automatically
/// derived by [`clap::Parser`].
#[derive(Parser, Debug)]
#[command(name = "rollcall", version, about = "Track attendance for the classes you teach")]
pub struct Cli {
    /// Answer yes to every confirmation prompt.
    #[arg(long, global = true)]
    pub yes: bool,

    /// The different commands available for managing classes and attendance.
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account. It must be confirmed before it can sign in.
    SignUp {
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Confirm the email address of an account.
    ConfirmEmail { email: String },

    /// Sign in and show the dashboard.
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Sign out.
    Logout,

    /// Show who is signed in.
    Whoami,

    /// List your classes.
    Dashboard,

    /// Create a class.
    AddClass { name: String, term: String },

    /// Delete a class with all of its sessions, students, and attendance.
    DeleteClass { class_id: String },

    /// Show the sessions and students of a class.
    ShowClass { class_id: String },

    /// Add a session to a class. Defaults to today.
    AddSession {
        class_id: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Delete a session and its attendance.
    DeleteSession { session_id: String },

    /// Enroll a student in a class.
    AddStudent {
        class_id: String,
        name: String,
        email: String,
    },

    /// Remove a student and their attendance from a class.
    RemoveStudent { student_id: String },

    /// Enroll students from a CSV file with `name` and `email` columns.
    ImportStudents { class_id: String, file_path: PathBuf },

    /// Show the attendance sheet of a session.
    ShowSession { session_id: String },

    /// Mark a student present or absent for a session.
    Mark {
        session_id: String,
        student_id: String,
        #[arg(value_enum)]
        status: Status,
    },
}
