//! # HRMS Portal (session and navigation core)
//!
//! `hrms_portal` owns "who is logged in" for the HRMS administrative portal and
//! decides, per navigation, whether a screen may render.
//!
//! ## Session
//!
//! The [`session::SessionStore`] holds the authenticated [`session::Principal`]
//! (id, username, role, bearer token) and mirrors it into a single persisted
//! slot so a session survives restarts. The store is constructed explicitly and
//! passed to whoever needs it; there is no ambient global state.
//!
//! - **Hydration:** restoring from storage never fails. Missing or corrupt data
//!   degrades to "logged out".
//! - **Login:** either commits to storage and memory, or clears the in-memory
//!   principal and surfaces a typed error. Storage is untouched on failure.
//! - **Roles:** a closed set (`ADMIN`, `EMPLOYEE`, `HR`, `PENDING`), compared
//!   case-insensitively. Unknown roles never satisfy an allow-list.
//!
//! ## Navigation
//!
//! The [`guard`] module evaluates a navigation against a role allow-list and
//! answers with one of: loading, redirect to login, redirect to
//! `/unauthorized`, or render. [`guard::routes::RouteTable`] maps the portal's
//! paths onto guard policies.
//!
//! ## Around the session
//!
//! [`account`] covers self-registration and the three-step password recovery,
//! [`remote_log`] forwards client errors to the backend's log collector, and
//! [`cli`] wires everything into the `hrms-portal` binary.
//!
//! Access control here is a UX concern only; the backend enforces the real
//! authorization on every request through the bearer token.

pub mod account;
pub mod api;
pub mod cli;
pub mod config;
pub mod guard;
pub mod remote_log;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
