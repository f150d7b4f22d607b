#![allow(dead_code)]
use rollcall::db;
use rollcall::gateway::Gateway;
use rollcall::models::Principal;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// A gateway over a fresh in-memory database.
pub fn gateway() -> Gateway {
    Gateway::new(db::connect(":memory:").expect("in-memory database"))
}

pub fn principal(name: &str) -> Principal {
    Principal {
        id: format!("principal-{name}"),
        email: format!("{name}@x.com"),
    }
}

/// A path in the system temp dir that nothing else is using.
pub fn temp_path(prefix: &str, ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = std::env::temp_dir().join(format!("{prefix}-{}-{nanos}.{ext}", std::process::id()));
    std::fs::remove_file(&path).ok();
    path
}
