//! Sign-up, sign-in, and session lookup.
//!
//! [`AuthProvider`] is the seam the rest of the crate authenticates through. [`LocalAuth`] backs it
//! with the `principals` and `auth_sessions` tables plus a small JSON file caching the signed-in
//! session between invocations, the way a browser keeps its session cookie.

use crate::error::{AppError, AppResult, AuthError};
use crate::models::{AuthSessionRow, Principal, PrincipalRow};
use crate::schema::{auth_sessions, principals};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 6;

/// An issued sign-in session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub principal: Principal,
    pub expires_at: NaiveDateTime,
}

impl AuthSession {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now().naive_utc()
    }
}

/// Proof that a sign-in has been committed: the session row exists and the cached token has been
/// written. Only this module can create one.
#[derive(Debug, Clone)]
pub struct SignInConfirmation {
    session: AuthSession,
}

impl SignInConfirmation {
    pub(crate) fn committed(session: AuthSession) -> Self {
        Self { session }
    }

    pub fn principal(&self) -> &Principal {
        &self.session.principal
    }

    pub fn access_token(&self) -> &str {
        &self.session.access_token
    }

    pub fn is_expired(&self) -> bool {
        self.session.is_expired()
    }
}

/// Session issuance and validation.
pub trait AuthProvider {
    /// Returns the cached session if it is one the backend actually issued and has not expired.
    fn get_session(&mut self) -> AppResult<Option<AuthSession>>;

    /// Validates the cached session against the backend and returns its principal.
    fn get_user(&mut self) -> AppResult<Option<Principal>>;

    fn sign_in_with_password(&mut self, email: &str, password: &str)
    -> AppResult<SignInConfirmation>;

    fn sign_out(&mut self) -> AppResult<()>;
}

/// Signs in, then reads the cached session back to make sure it is the one just issued.
pub fn sign_in_verified<A: AuthProvider + ?Sized>(
    auth: &mut A,
    email: &str,
    password: &str,
) -> AppResult<SignInConfirmation> {
    let confirmation = auth.sign_in_with_password(email, password)?;

    match auth.get_session()? {
        Some(session) if session.access_token == confirmation.access_token() => {
            info!(principal = %confirmation.principal().id, "signed in");
            Ok(confirmation)
        }
        _ => {
            warn!("session missing right after sign-in");
            Err(AppError::Consistency)
        }
    }
}

/// The file holding the signed-in session between invocations.
#[derive(Debug, Clone)]
pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> AppResult<Option<AuthSession>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        Ok(Some(serde_json::from_str(&contents)?))
    }

    pub fn store(&self, session: &AuthSession) -> AppResult<()> {
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn clear(&self) -> AppResult<()> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());

    format!("{salt}${}", STANDARD.encode(hasher.finalize()))
}

fn verify_password(password: &str, stored: &str) -> bool {
    stored
        .split_once('$')
        .is_some_and(|(salt, _)| hash_password(password, salt) == stored)
}

/// An [`AuthProvider`] backed by the local database.
pub struct LocalAuth {
    db: SqliteConnection,
    cache: SessionCache,
    session_ttl: chrono::Duration,
}

impl LocalAuth {
    pub fn new(db: SqliteConnection, cache: SessionCache, session_ttl: chrono::Duration) -> Self {
        Self {
            db,
            cache,
            session_ttl,
        }
    }

    /// Creates an account. It cannot sign in until its email is confirmed.
    pub fn sign_up(&mut self, email: &str, password: &str) -> AppResult<Principal> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AppError::Validation { field: "email" });
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword.into());
        }

        let taken = principals::table
            .filter(principals::email.eq(email))
            .count()
            .get_result::<i64>(&mut self.db)?;
        if taken > 0 {
            return Err(AuthError::EmailTaken.into());
        }

        let row = PrincipalRow {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash: hash_password(password, &Uuid::new_v4().simple().to_string()),
            email_confirmed: false,
            created_at: Utc::now().naive_utc(),
        };

        diesel::insert_into(principals::table)
            .values(&row)
            .execute(&mut self.db)?;

        info!(principal = %row.id, "signed up, awaiting email confirmation");

        Ok(Principal {
            id: row.id,
            email: row.email,
        })
    }

    /// Marks the account's email as confirmed.
    pub fn confirm_email(&mut self, email: &str) -> AppResult<()> {
        let updated = diesel::update(principals::table.filter(principals::email.eq(email.trim())))
            .set(principals::email_confirmed.eq(true))
            .execute(&mut self.db)?;

        if updated == 0 {
            return Err(AppError::not_found("account", email));
        }

        Ok(())
    }
}

impl AuthProvider for LocalAuth {
    fn get_session(&mut self) -> AppResult<Option<AuthSession>> {
        let Some(cached) = self.cache.load()? else {
            return Ok(None);
        };

        // The cache file is plain JSON; only a token we issued to that principal counts.
        let issued = auth_sessions::table
            .inner_join(principals::table)
            .filter(auth_sessions::access_token.eq(&cached.access_token))
            .filter(auth_sessions::principal_id.eq(&cached.principal.id))
            .select((auth_sessions::expires_at, principals::email))
            .first::<(NaiveDateTime, String)>(&mut self.db)
            .optional()?;

        let Some((expires_at, email)) = issued else {
            warn!(principal = %cached.principal.id, "cached session was never issued, ignoring it");
            return Ok(None);
        };

        let session = AuthSession {
            access_token: cached.access_token,
            principal: Principal {
                id: cached.principal.id,
                email,
            },
            expires_at,
        };
        Ok((!session.is_expired()).then_some(session))
    }

    fn get_user(&mut self) -> AppResult<Option<Principal>> {
        let Some(cached) = self.cache.load()? else {
            return Ok(None);
        };

        let found = auth_sessions::table
            .inner_join(principals::table)
            .filter(auth_sessions::access_token.eq(&cached.access_token))
            .filter(auth_sessions::expires_at.gt(Utc::now().naive_utc()))
            .select((principals::id, principals::email))
            .first::<(String, String)>(&mut self.db)
            .optional()?;

        Ok(found.map(|(id, email)| Principal { id, email }))
    }

    fn sign_in_with_password(
        &mut self,
        email: &str,
        password: &str,
    ) -> AppResult<SignInConfirmation> {
        let account = principals::table
            .filter(principals::email.eq(email.trim()))
            .select(PrincipalRow::as_select())
            .first(&mut self.db)
            .optional()?;

        let account = match account {
            Some(account) if verify_password(password, &account.password_hash) => account,
            _ => return Err(AuthError::InvalidCredentials.into()),
        };

        if !account.email_confirmed {
            return Err(AuthError::EmailNotConfirmed.into());
        }

        let now = Utc::now().naive_utc();
        let row = AuthSessionRow {
            access_token: Uuid::new_v4().simple().to_string(),
            principal_id: account.id.clone(),
            expires_at: now + self.session_ttl,
            created_at: now,
        };

        diesel::insert_into(auth_sessions::table)
            .values(&row)
            .execute(&mut self.db)?;

        let session = AuthSession {
            access_token: row.access_token,
            principal: Principal {
                id: account.id,
                email: account.email,
            },
            expires_at: row.expires_at,
        };
        self.cache.store(&session)?;

        debug!(path = %self.cache.path().display(), "cached session");

        Ok(SignInConfirmation::committed(session))
    }

    fn sign_out(&mut self) -> AppResult<()> {
        if let Some(cached) = self.cache.load()? {
            diesel::delete(auth_sessions::table.find(&cached.access_token)).execute(&mut self.db)?;
            info!(principal = %cached.principal.id, "signed out");
        }

        self.cache.clear()
    }
}
