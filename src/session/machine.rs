//! Session lifecycle as an explicit state machine. The store feeds it discrete
//! events; nothing else mutates session state.

use super::principal::Principal;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Storage has not been read yet.
    #[default]
    Pending,
    Anonymous,
    Authenticated(Principal),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Hydrated(Option<Principal>),
    LoginSuccess(Principal),
    LoginFailure,
    Logout,
}

impl SessionEvent {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Hydrated(_) => "HYDRATED",
            Self::LoginSuccess(_) => "LOGIN_SUCCESS",
            Self::LoginFailure => "LOGIN_FAILURE",
            Self::Logout => "LOGOUT",
        }
    }
}

impl SessionState {
    #[must_use]
    pub fn apply(self, event: SessionEvent) -> Self {
        match (self, event) {
            (Self::Pending, SessionEvent::Hydrated(Some(principal))) => {
                Self::Authenticated(principal)
            }
            (Self::Pending, SessionEvent::Hydrated(None)) => Self::Anonymous,
            // once ready, hydration never overrides what login/logout decided
            (state, SessionEvent::Hydrated(_)) => state,
            (_, SessionEvent::LoginSuccess(principal)) => Self::Authenticated(principal),
            (Self::Pending, SessionEvent::LoginFailure) => Self::Pending,
            (_, SessionEvent::LoginFailure | SessionEvent::Logout) => Self::Anonymous,
        }
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    #[must_use]
    pub const fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Authenticated(principal) => Some(principal),
            Self::Pending | Self::Anonymous => None,
        }
    }
}
