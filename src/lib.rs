use anyhow::Result;

pub mod app;
pub mod attendance;
pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod display;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod models;
pub mod oracle;
pub mod roster;
pub mod schema;

pub use crate::app::App;
pub use crate::error::{AppError, AppResult, AuthError};

use crate::config::Settings;

pub fn create_default_app() -> Result<App> {
    // Load configuration from defaults, `config.toml`, and the environment.
    let settings = Settings::load()?;

    Ok(App::open(&settings)?)
}
