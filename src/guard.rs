//! Deciding, per page load, whether to render protected content or send the user to sign in.

use crate::auth::{AuthProvider, SignInConfirmation};
use crate::models::Principal;
use crate::oracle::SessionOracle;
use std::fmt;
use tracing::{debug, info};

/// A page of the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    Class(String),
    Session(String),
}

impl Route {
    /// Whether the page requires a signed-in principal.
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Login => write!(f, "/login"),
            Route::Dashboard => write!(f, "/dashboard"),
            Route::Class(id) => write!(f, "/classes/{id}"),
            Route::Session(id) => write!(f, "/sessions/{id}"),
        }
    }
}

/// Performs navigations requested by the guard.
pub trait Navigator {
    fn navigate(&mut self, to: Route);
}

/// Writes redirects to the terminal.
#[derive(Debug, Default)]
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&mut self, to: Route) {
        info!(%to, "redirecting");
        if to == Route::Login {
            eprintln!("Not signed in. Sign in with `rollcall login <EMAIL> --password <PASSWORD>`.");
        } else {
            eprintln!("Redirecting to {to}");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Checking,
    Authorized(Principal),
    Redirecting(Route),
}

/// The state machine `Checking -> {Authorized, Redirecting}`. Both outcomes are terminal.
#[derive(Debug)]
pub struct Guard {
    state: GuardState,
}

impl Guard {
    pub fn new() -> Self {
        Self {
            state: GuardState::Checking,
        }
    }

    pub fn state(&self) -> &GuardState {
        &self.state
    }

    /// The principal to render protected content for, once authorized.
    pub fn principal(&self) -> Option<&Principal> {
        match &self.state {
            GuardState::Authorized(principal) => Some(principal),
            _ => None,
        }
    }

    /// Runs the check if it has not run yet.
    ///
    /// A navigation that arrives with a fresh [`SignInConfirmation`] is authorized from it
    /// directly. Otherwise the oracle decides, and a `None` from it issues one navigation to
    /// [`Route::Login`].
    pub fn check<A, N>(
        &mut self,
        oracle: &mut SessionOracle<'_, A>,
        navigator: &mut N,
        just_signed_in: Option<&SignInConfirmation>,
    ) -> &GuardState
    where
        A: AuthProvider + ?Sized,
        N: Navigator + ?Sized,
    {
        if self.state != GuardState::Checking {
            return &self.state;
        }

        let resolved = match just_signed_in {
            Some(confirmation) if !confirmation.is_expired() => {
                debug!("authorized from sign-in confirmation");
                Some(confirmation.principal().clone())
            }
            _ => oracle.resolve(),
        };

        self.state = match resolved {
            Some(principal) => GuardState::Authorized(principal),
            None => {
                navigator.navigate(Route::Login);
                GuardState::Redirecting(Route::Login)
            }
        };

        &self.state
    }
}

impl Default for Guard {
    fn default() -> Self {
        Self::new()
    }
}

/// Where to send a navigation to `route` instead, if anywhere. A signed-in principal never sees
/// the sign-in form; they land on the dashboard.
pub fn redirect_for(route: &Route, principal: Option<&Principal>) -> Option<Route> {
    match (route, principal) {
        (Route::Login, Some(_)) => Some(Route::Dashboard),
        _ => None,
    }
}
