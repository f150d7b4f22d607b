mod common;

use chrono::{Duration, Utc};
use rollcall::auth::{AuthProvider, AuthSession, LocalAuth, SessionCache, sign_in_verified};
use rollcall::oracle::SessionOracle;
use rollcall::{AppError, AuthError, db};
use std::time::Duration as StdDuration;

fn local_auth(name: &str) -> LocalAuth {
    LocalAuth::new(
        db::connect(":memory:").expect("in-memory database"),
        SessionCache::new(common::temp_path(name, "json")),
        Duration::hours(1),
    )
}

#[test]
fn sign_in_requires_a_confirmed_email() {
    let mut auth = local_auth("unconfirmed");
    auth.sign_up("ada@x.com", "hunter22").unwrap();

    let err = auth.sign_in_with_password("ada@x.com", "hunter22").unwrap_err();
    assert!(matches!(err, AppError::Auth(AuthError::EmailNotConfirmed)));
    assert!(auth.get_session().unwrap().is_none());

    auth.confirm_email("ada@x.com").unwrap();
    let confirmation = sign_in_verified(&mut auth, "ada@x.com", "hunter22").unwrap();
    assert_eq!(confirmation.principal().email, "ada@x.com");

    auth.sign_out().unwrap();
}

#[test]
fn bad_credentials_are_indistinguishable() {
    let mut auth = local_auth("credentials");
    auth.sign_up("ada@x.com", "hunter22").unwrap();
    auth.confirm_email("ada@x.com").unwrap();

    for (email, password) in [("ada@x.com", "wrong-password"), ("nobody@x.com", "hunter22")] {
        let err = auth.sign_in_with_password(email, password).unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::InvalidCredentials)));
    }
}

#[test]
fn sign_up_validates_its_input() {
    let mut auth = local_auth("sign-up");

    assert!(matches!(
        auth.sign_up(" ", "hunter22"),
        Err(AppError::Validation { field: "email" })
    ));
    assert!(matches!(
        auth.sign_up("ada@x.com", "123"),
        Err(AppError::Auth(AuthError::WeakPassword))
    ));

    auth.sign_up("ada@x.com", "hunter22").unwrap();
    assert!(matches!(
        auth.sign_up("ada@x.com", "different"),
        Err(AppError::Auth(AuthError::EmailTaken))
    ));
    assert!(matches!(
        auth.confirm_email("nobody@x.com"),
        Err(AppError::NotFound { .. })
    ));
}

#[test]
fn session_and_user_agree_until_sign_out() {
    let mut auth = local_auth("lifecycle");
    let principal = auth.sign_up("ada@x.com", "hunter22").unwrap();
    auth.confirm_email("ada@x.com").unwrap();

    assert!(auth.get_session().unwrap().is_none());
    assert!(auth.get_user().unwrap().is_none());

    let confirmation = auth.sign_in_with_password("ada@x.com", "hunter22").unwrap();
    let session = auth.get_session().unwrap().expect("cached session");
    assert_eq!(session.access_token, confirmation.access_token());
    assert_eq!(session.principal, principal);
    assert_eq!(auth.get_user().unwrap(), Some(principal));

    auth.sign_out().unwrap();
    assert!(auth.get_session().unwrap().is_none());
    assert!(auth.get_user().unwrap().is_none());

    // Signing out twice is harmless.
    auth.sign_out().unwrap();
}

#[test]
fn expired_sessions_resolve_to_nobody() {
    let cache = common::temp_path("expired", "json");
    let mut auth = LocalAuth::new(
        db::connect(":memory:").unwrap(),
        SessionCache::new(&cache),
        Duration::seconds(-1),
    );
    auth.sign_up("ada@x.com", "hunter22").unwrap();
    auth.confirm_email("ada@x.com").unwrap();

    auth.sign_in_with_password("ada@x.com", "hunter22").unwrap();

    assert!(auth.get_session().unwrap().is_none());
    assert!(auth.get_user().unwrap().is_none());
    assert!(matches!(
        sign_in_verified(&mut auth, "ada@x.com", "hunter22"),
        Err(AppError::Consistency)
    ));

    auth.sign_out().unwrap();
}

#[test]
fn forged_session_file_resolves_to_nobody() {
    let cache = common::temp_path("forged", "json");
    let mut auth = LocalAuth::new(
        db::connect(":memory:").unwrap(),
        SessionCache::new(&cache),
        Duration::hours(1),
    );
    let victim = auth.sign_up("victim@x.com", "hunter22").unwrap();
    auth.confirm_email("victim@x.com").unwrap();

    SessionCache::new(&cache)
        .store(&AuthSession {
            access_token: "never-issued".to_string(),
            principal: victim.clone(),
            expires_at: Utc::now().naive_utc() + Duration::days(365),
        })
        .unwrap();

    assert!(auth.get_session().unwrap().is_none());
    assert!(auth.get_user().unwrap().is_none());
    assert_eq!(SessionOracle::new(&mut auth, StdDuration::ZERO).resolve(), None);

    // A real token does not carry over to somebody else's principal id.
    let mallory = auth.sign_up("mallory@x.com", "hunter22").unwrap();
    auth.confirm_email("mallory@x.com").unwrap();
    let confirmation = auth.sign_in_with_password("mallory@x.com", "hunter22").unwrap();
    SessionCache::new(&cache)
        .store(&AuthSession {
            access_token: confirmation.access_token().to_string(),
            principal: victim,
            expires_at: Utc::now().naive_utc() + Duration::days(365),
        })
        .unwrap();

    assert!(auth.get_session().unwrap().is_none());
    assert_eq!(
        SessionOracle::new(&mut auth, StdDuration::ZERO).resolve(),
        Some(mallory)
    );

    auth.sign_out().unwrap();
}
