//! The error type shared by every module of the crate.

use std::io;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{field} must not be empty")]
    Validation { field: &'static str },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{kind} `{id}` not found")]
    NotFound { kind: &'static str, id: String },

    #[error("Service request failed: {0}")]
    Transport(#[from] diesel::result::Error),

    #[error("Could not connect to the database: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("Session was lost. Please try signing in again.")]
    Consistency,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed session cache: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl AppError {
    pub fn not_found(kind: &'static str, id: &str) -> Self {
        AppError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Reasons a sign-in or sign-up was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password. Please check your credentials and try again.")]
    InvalidCredentials,

    #[error(
        "Please verify your email address before signing in. Check your inbox for the confirmation email."
    )]
    EmailNotConfirmed,

    #[error("An account with this email already exists.")]
    EmailTaken,

    #[error("Password should be at least 6 characters.")]
    WeakPassword,
}
