//! Session module: the authenticated principal, its persistence and its
//! lifecycle. This module touches credentials and must never log passwords or
//! token material.
//!
//! Flow Overview: on startup the store hydrates from the persisted slot and
//! becomes ready. Login exchanges credentials through an [`Authenticator`],
//! writes the principal to storage and then to memory. Logout clears both.

mod authenticator;
mod errors;
pub mod machine;
mod principal;
pub mod storage;
mod store;

pub use authenticator::Authenticator;
pub use errors::{AuthError, HydrationError, LOGIN_FAILED_MESSAGE};
pub use machine::{SessionEvent, SessionState};
pub use principal::{IncompletePrincipal, Principal, PrincipalError, Role, UnknownRole};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError};
pub use store::{DEFAULT_LOGIN_TIMEOUT, SessionStore};
