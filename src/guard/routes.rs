//! The portal's navigation map. Protected groups carry their own allow-list and
//! login surface: the employee area sends anonymous users to the general login
//! form, the admin area to the admin login page.

use super::{DEFAULT_LOGIN_PATH, Decision, GuardPolicy, SessionView, evaluate};
use crate::session::{Authenticator, Role, SessionStorage, SessionStore};

pub const ADMIN_LOGIN_PATH: &str = "/admin-login";
pub const ADMIN_HOME_PATH: &str = "/admin/dashboard";
pub const EMPLOYEE_HOME_PATH: &str = "/employee";

const PUBLIC_PATHS: [&str; 5] = ["/", "/auth", "/forgot-password", "/unauthorized", ADMIN_LOGIN_PATH];

const EMPLOYEE_PATHS: [&str; 5] = [
    "/employee",
    "/employee/my-profile",
    "/employee/attendance",
    "/employee/leaves",
    "/employee/salary-slips",
];

const ADMIN_PATHS: [&str; 8] = [
    "/admin/dashboard",
    "/admin/users",
    "/admin/employees",
    "/admin/leave-approval",
    "/admin/attendance",
    "/admin/payroll",
    "/admin/contact-messages",
    "/admin/logs",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected(GuardPolicy),
}

#[derive(Clone, Debug)]
struct Route {
    path: &'static str,
    access: Access,
    /// Index routes forward to a child once admitted.
    forward_to: Option<&'static str>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RedirectReason {
    Login { from: String },
    Forbidden,
    Index,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigation {
    Loading,
    Render { path: String },
    Redirect { to: String, reason: RedirectReason },
    NotFound { path: String },
}

#[derive(Clone, Debug)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::portal()
    }
}

impl RouteTable {
    /// The HRMS portal routes.
    #[must_use]
    pub fn portal() -> Self {
        let employee = GuardPolicy::new([Role::Employee.as_str(), Role::Admin.as_str()], DEFAULT_LOGIN_PATH);
        let admin = GuardPolicy::new([Role::Admin.as_str()], ADMIN_LOGIN_PATH);

        let mut routes: Vec<Route> = PUBLIC_PATHS
            .iter()
            .map(|&path| Route {
                path,
                access: Access::Public,
                forward_to: None,
            })
            .collect();

        routes.extend(EMPLOYEE_PATHS.iter().map(|&path| Route {
            path,
            access: Access::Protected(employee.clone()),
            forward_to: None,
        }));

        routes.push(Route {
            path: "/admin",
            access: Access::Protected(admin.clone()),
            forward_to: Some(ADMIN_HOME_PATH),
        });
        routes.extend(ADMIN_PATHS.iter().map(|&path| Route {
            path,
            access: Access::Protected(admin.clone()),
            forward_to: None,
        }));

        Self { routes }
    }

    /// Access rule for `path`, or `None` when no route matches.
    #[must_use]
    pub fn access(&self, path: &str) -> Option<&Access> {
        self.find(path).map(|route| &route.access)
    }

    fn find(&self, path: &str) -> Option<&Route> {
        let normalized = normalize_path(path);
        self.routes.iter().find(|route| route.path == normalized)
    }

    /// Resolves a navigation: public and unknown paths render directly,
    /// protected ones go through the guard.
    pub fn navigate(&self, session: &impl SessionView, requested: &str) -> Navigation {
        let Some(route) = self.find(requested) else {
            return Navigation::NotFound {
                path: normalize_path(requested),
            };
        };

        let policy = match &route.access {
            Access::Public => {
                return Navigation::Render {
                    path: route.path.to_string(),
                };
            }
            Access::Protected(policy) => policy,
        };

        match evaluate(session, requested, policy) {
            Decision::Loading => Navigation::Loading,
            Decision::RedirectToLogin { to, from } => Navigation::Redirect {
                to,
                reason: RedirectReason::Login { from },
            },
            Decision::Forbidden { to } => Navigation::Redirect {
                to,
                reason: RedirectReason::Forbidden,
            },
            Decision::Render => route.forward_to.map_or_else(
                || Navigation::Render {
                    path: route.path.to_string(),
                },
                |to| Navigation::Redirect {
                    to: to.to_string(),
                    reason: RedirectReason::Index,
                },
            ),
        }
    }

    /// Waits for hydration to finish, then resolves the navigation.
    pub async fn navigate_when_ready<A, S>(
        &self,
        session: &SessionStore<A, S>,
        requested: &str,
    ) -> Navigation
    where
        A: Authenticator,
        S: SessionStorage,
    {
        session.wait_until_ready().await;
        self.navigate(session, requested)
    }

    /// Where to go after a successful login: back to `from` when the new
    /// session may render it, otherwise the role's home page. Roles without a
    /// home page yield `None`.
    pub fn after_login(&self, session: &impl SessionView, role: Role, from: Option<&str>) -> Option<String> {
        if let Some(from) = from {
            match self.navigate(session, from) {
                Navigation::Render { path } => return Some(path),
                Navigation::Redirect {
                    to,
                    reason: RedirectReason::Index,
                } => return Some(to),
                _ => {}
            }
        }
        landing_path(role).map(ToString::to_string)
    }
}

/// Home page for a freshly logged-in role.
#[must_use]
pub const fn landing_path(role: Role) -> Option<&'static str> {
    match role {
        Role::Admin => Some(ADMIN_HOME_PATH),
        Role::Employee => Some(EMPLOYEE_HOME_PATH),
        Role::Hr | Role::Pending => None,
    }
}

/// Drops query and fragment, collapses a trailing slash and ensures a leading one.
fn normalize_path(path: &str) -> String {
    let path = path.trim();
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = path[..end].trim_end_matches('/');

    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
