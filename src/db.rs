//! Opening the SQLite database and bringing its schema up to date.

use crate::error::AppResult;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use tracing::debug;

/// The schema, as written by the `create_tables` migration. Every statement is idempotent.
const SCHEMA: &str = include_str!("../migrations/2025-01-06-000000_create_tables/up.sql");

/// Connects to the `sqlite3` database at `database_url`, turns on foreign key enforcement (which
/// the cascading deletes rely on), and creates any missing tables.
///
/// `":memory:"` gives a private, empty database, which is what the tests use.
pub fn connect(database_url: &str) -> AppResult<SqliteConnection> {
    let mut connection = SqliteConnection::establish(database_url)?;

    connection.batch_execute("PRAGMA foreign_keys = ON;")?;
    connection.batch_execute(SCHEMA)?;

    debug!(database_url, "database ready");

    Ok(connection)
}
