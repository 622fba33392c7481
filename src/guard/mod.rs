//! Navigation gating. A guard decision only reads the session through
//! [`SessionView`]; it never mutates it and never fails. Every branch ends in a
//! defined render-or-redirect outcome.
//!
//! UX-only guard: real access control lives on the API.

pub mod routes;

use crate::session::{Authenticator, Role, SessionStorage, SessionStore};
use tracing::{debug, warn};

/// Default login surface for general areas.
pub const DEFAULT_LOGIN_PATH: &str = "/auth?form=login";
/// Fixed destination for authenticated users lacking a required role.
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

/// Read-only view of the session consulted by the guard.
pub trait SessionView {
    fn is_ready(&self) -> bool;
    fn is_authenticated(&self) -> bool;
    fn has_role(&self, role: &str) -> bool;
    /// Role label used in diagnostics only.
    fn role_label(&self) -> Option<Role>;
}

impl<A: Authenticator, S: SessionStorage> SessionView for SessionStore<A, S> {
    fn is_ready(&self) -> bool {
        Self::is_ready(self)
    }

    fn is_authenticated(&self) -> bool {
        Self::is_authenticated(self)
    }

    fn has_role(&self, role: &str) -> bool {
        Self::has_role(self, role)
    }

    fn role_label(&self) -> Option<Role> {
        self.current_principal().map(|principal| principal.role)
    }
}

/// Access policy of a protected route group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardPolicy {
    allowed_roles: Vec<String>,
    redirect_to: String,
}

impl GuardPolicy {
    /// An empty allow-list admits any authenticated principal.
    #[must_use]
    pub fn new<I, R>(allowed_roles: I, redirect_to: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self {
            allowed_roles: allowed_roles.into_iter().map(Into::into).collect(),
            redirect_to: redirect_to.into(),
        }
    }

    /// Any authenticated principal, with the given login destination.
    #[must_use]
    pub fn authenticated(redirect_to: impl Into<String>) -> Self {
        Self::new(Vec::<String>::new(), redirect_to)
    }

    #[must_use]
    pub fn allowed_roles(&self) -> &[String] {
        &self.allowed_roles
    }

    #[must_use]
    pub fn redirect_to(&self) -> &str {
        &self.redirect_to
    }

    /// True when `session` satisfies at least one listed role, or the list is empty.
    fn admits(&self, session: &impl SessionView) -> bool {
        self.allowed_roles.is_empty() || self.allowed_roles.iter().any(|role| session.has_role(role))
    }
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self::authenticated(DEFAULT_LOGIN_PATH)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Session not hydrated yet: show a neutral loading state.
    Loading,
    /// Not logged in; `from` is the originally requested path so the login
    /// surface can send the user back there.
    RedirectToLogin { to: String, from: String },
    /// Logged in without a required role.
    Forbidden { to: String },
    Render,
}

impl Decision {
    /// Redirect target, if this decision redirects.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::RedirectToLogin { to, .. } | Self::Forbidden { to } => Some(to),
            Self::Loading | Self::Render => None,
        }
    }

    #[must_use]
    pub const fn renders(&self) -> bool {
        matches!(self, Self::Render)
    }
}

/// Decides whether the navigation to `requested_path` may render.
pub fn evaluate(session: &impl SessionView, requested_path: &str, policy: &GuardPolicy) -> Decision {
    if !session.is_ready() {
        debug!(path = requested_path, "session not ready, holding navigation");
        return Decision::Loading;
    }

    if !session.is_authenticated() {
        warn!(
            path = requested_path,
            redirect_to = policy.redirect_to(),
            "user not authenticated, redirecting to login"
        );
        return Decision::RedirectToLogin {
            to: policy.redirect_to().to_string(),
            from: requested_path.to_string(),
        };
    }

    if !policy.admits(session) {
        warn!(
            path = requested_path,
            role = session.role_label().map_or("-", Role::as_str),
            allowed = ?policy.allowed_roles(),
            "user authenticated but lacks required role"
        );
        return Decision::Forbidden {
            to: UNAUTHORIZED_PATH.to_string(),
        };
    }

    Decision::Render
}

/// Waits for hydration to finish, then decides.
pub async fn evaluate_when_ready<A, S>(
    session: &SessionStore<A, S>,
    requested_path: &str,
    policy: &GuardPolicy,
) -> Decision
where
    A: Authenticator,
    S: SessionStorage,
{
    session.wait_until_ready().await;
    evaluate(session, requested_path, policy)
}
