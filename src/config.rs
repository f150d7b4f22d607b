//! Runtime settings, layered from defaults, `config.toml`, and the environment.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// Where the signed-in session token is cached between invocations.
    pub session_file: PathBuf,
    /// How long the session oracle waits before its single retry.
    pub retry_interval_ms: u64,
    pub session_ttl_hours: i64,
}

impl Settings {
    /// Loads the settings. Later sources override earlier ones:
    ///
    /// 1. built-in defaults,
    /// 2. `config.toml` in the working directory, if present,
    /// 3. `ROLLCALL_*` environment variables (`ROLLCALL_AUTH__RETRY_INTERVAL_MS=0`),
    /// 4. `DATABASE_URL`, also read from `.env`.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = Config::builder()
            .set_default("database.url", "rollcall.sqlite3")?
            .set_default("auth.session_file", ".rollcall-session.json")?
            .set_default("auth.retry_interval_ms", 500)?
            .set_default("auth.session_ttl_hours", 24)?
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("ROLLCALL")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Ok(database_url) = env::var("DATABASE_URL") {
            info!("using DATABASE_URL from the environment");
            builder = builder.set_override("database.url", database_url)?;
        }

        builder.build()?.try_deserialize()
    }
}

impl AuthSettings {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours)
    }
}
