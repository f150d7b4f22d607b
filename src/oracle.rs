//! Resolves whether anybody is signed in.

use crate::auth::AuthProvider;
use crate::error::AppResult;
use crate::models::Principal;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Checks both sources of truth, the cached session and a validated user lookup, and tries once
/// more after `retry_after` if neither produced a principal.
pub struct SessionOracle<'a, A: AuthProvider + ?Sized> {
    auth: &'a mut A,
    retry_after: Duration,
}

impl<'a, A: AuthProvider + ?Sized> SessionOracle<'a, A> {
    pub fn new(auth: &'a mut A, retry_after: Duration) -> Self {
        Self { auth, retry_after }
    }

    /// Returns the signed-in principal, or `None` if there is none after the retry. Errors from
    /// the auth provider count as `None`.
    pub fn resolve(&mut self) -> Option<Principal> {
        for attempt in 0..2 {
            if attempt > 0 {
                debug!(wait = ?self.retry_after, "no principal yet, retrying once");
                thread::sleep(self.retry_after);
            }

            match self.check() {
                Ok(Some(principal)) => return Some(principal),
                Ok(None) => {}
                Err(err) => {
                    warn!(%err, "session check failed, treating as signed out");
                    return None;
                }
            }
        }

        None
    }

    fn check(&mut self) -> AppResult<Option<Principal>> {
        if let Some(session) = self.auth.get_session()? {
            return Ok(Some(session.principal));
        }

        self.auth.get_user()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthSession, SignInConfirmation};
    use crate::error::{AppError, AuthError};
    use chrono::{Duration as TimeDelta, Utc};
    use std::collections::VecDeque;

    /// Answers `get_session` and `get_user` from scripted queues; an empty queue means `None`.
    #[derive(Default)]
    struct Scripted {
        sessions: VecDeque<AppResult<Option<AuthSession>>>,
        users: VecDeque<AppResult<Option<Principal>>>,
        calls: usize,
    }

    impl AuthProvider for Scripted {
        fn get_session(&mut self) -> AppResult<Option<AuthSession>> {
            self.calls += 1;
            self.sessions.pop_front().unwrap_or(Ok(None))
        }

        fn get_user(&mut self) -> AppResult<Option<Principal>> {
            self.calls += 1;
            self.users.pop_front().unwrap_or(Ok(None))
        }

        fn sign_in_with_password(&mut self, _: &str, _: &str) -> AppResult<SignInConfirmation> {
            Err(AuthError::InvalidCredentials.into())
        }

        fn sign_out(&mut self) -> AppResult<()> {
            Ok(())
        }
    }

    fn ada() -> Principal {
        Principal {
            id: "p-ada".to_string(),
            email: "ada@x.com".to_string(),
        }
    }

    #[test]
    fn cached_session_short_circuits() {
        let mut auth = Scripted::default();
        auth.sessions.push_back(Ok(Some(AuthSession {
            access_token: "token".to_string(),
            principal: ada(),
            expires_at: Utc::now().naive_utc() + TimeDelta::hours(1),
        })));

        let resolved = SessionOracle::new(&mut auth, Duration::ZERO).resolve();

        assert_eq!(resolved, Some(ada()));
        assert_eq!(auth.calls, 1);
    }

    #[test]
    fn falls_back_to_validated_user() {
        let mut auth = Scripted::default();
        auth.users.push_back(Ok(Some(ada())));

        let resolved = SessionOracle::new(&mut auth, Duration::ZERO).resolve();

        assert_eq!(resolved, Some(ada()));
        assert_eq!(auth.calls, 2);
    }

    #[test]
    fn retry_picks_up_late_session() {
        let mut auth = Scripted::default();
        auth.users.push_back(Ok(None));
        auth.users.push_back(Ok(Some(ada())));

        let resolved = SessionOracle::new(&mut auth, Duration::ZERO).resolve();

        assert_eq!(resolved, Some(ada()));
        assert_eq!(auth.calls, 4);
    }

    #[test]
    fn gives_up_after_one_retry() {
        let mut auth = Scripted::default();

        let resolved = SessionOracle::new(&mut auth, Duration::ZERO).resolve();

        assert_eq!(resolved, None);
        assert_eq!(auth.calls, 4);
    }

    #[test]
    fn errors_fail_closed() {
        let mut auth = Scripted::default();
        auth.sessions.push_back(Err(AppError::Consistency));
        auth.users.push_back(Ok(Some(ada())));

        let resolved = SessionOracle::new(&mut auth, Duration::ZERO).resolve();

        assert_eq!(resolved, None);
        assert_eq!(auth.calls, 1);
    }
}
