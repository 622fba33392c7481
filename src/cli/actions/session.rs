use crate::{
    cli::{actions::secret_or_prompt, globals::GlobalArgs},
    guard::routes::RouteTable,
    session::AuthError,
};
use anyhow::{Result, anyhow};
use secrecy::SecretString;
use serde_json::json;
use tracing::debug;

#[derive(Debug)]
pub struct LoginArgs {
    pub username: String,
    pub password: Option<SecretString>,
    pub from: Option<String>,
    pub admin: bool,
}

/// Logs in, persists the session and prints where the portal would land.
/// With `admin` set only an `ADMIN` account may stay logged in.
/// # Errors
/// Returns an error with the user-facing message if the login fails.
pub async fn login(args: LoginArgs, globals: &GlobalArgs) -> Result<()> {
    let password = secret_or_prompt(args.password, "Password")?;
    let session = globals.session();

    let outcome = if args.admin {
        session.login_as_admin(&args.username, &password).await
    } else {
        session.login(&args.username, &password).await
    };

    let principal = match outcome {
        Ok(principal) => principal,
        Err(err) => {
            report_failure(&err, &args.username, globals).await;
            return Err(anyhow!(err.user_message()));
        }
    };

    println!(
        "Logged in as {} ({}, id {})",
        principal.username, principal.role, principal.id
    );

    match RouteTable::portal().after_login(&session, principal.role, args.from.as_deref()) {
        Some(path) => println!("Landing page: {path}"),
        None => println!("No portal area for role {}", principal.role),
    }

    Ok(())
}

async fn report_failure(err: &AuthError, username: &str, globals: &GlobalArgs) {
    let shipper = globals.log_shipper();
    let shipped = match err {
        AuthError::LoginInProgress => return,
        AuthError::NotAdmin => {
            shipper
                .warn("admin login refused for non-admin role", json!({ "username": username }))
                .await
        }
        _ => {
            shipper
                .error(
                    "login failed",
                    json!({ "username": username, "reason": err.to_string() }),
                )
                .await
        }
    };
    debug!(shipped, "login failure reported");
}

pub fn logout(globals: &GlobalArgs) {
    let session = globals.session();
    let was_logged_in = session.is_authenticated();
    session.logout();

    if was_logged_in {
        println!("Logged out");
    } else {
        println!("No active session");
    }
}

pub fn whoami(globals: &GlobalArgs) {
    match globals.session().current_principal() {
        Some(principal) => println!(
            "{} ({}, id {})",
            principal.username, principal.role, principal.id
        ),
        None => println!("Not logged in"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn globals(server: &MockServer, dir: &tempfile::TempDir) -> GlobalArgs {
        let config = AppConfig::new(
            &server.uri(),
            Some(dir.path().join("session.json").as_path()),
            Duration::from_secs(2),
            Duration::from_secs(2),
        )
        .unwrap();
        GlobalArgs::new(config).unwrap()
    }

    #[tokio::test]
    async fn login_persists_and_logout_clears() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jwtToken": "jwt-7",
                "type": "Bearer",
                "id": 7,
                "username": "alice",
                "role": "ADMIN"
            })))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let globals = globals(&server, &dir);

        login(
            LoginArgs {
                username: "alice".to_string(),
                password: Some(SecretString::from("Secret1!")),
                from: None,
                admin: false,
            },
            &globals,
        )
        .await
        .unwrap();

        assert!(dir.path().join("session.json").exists());
        assert!(globals.session().has_role("admin"));

        logout(&globals);
        assert!(!dir.path().join("session.json").exists());
        assert!(!globals.session().is_authenticated());
    }

    #[tokio::test]
    async fn login_failure_surfaces_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "Invalid username or password"
            })))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let globals = globals(&server, &dir);

        let err = login(
            LoginArgs {
                username: "alice".to_string(),
                password: Some(SecretString::from("wrong")),
                from: None,
                admin: false,
            },
            &globals,
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "Invalid username or password");
        assert!(!dir.path().join("session.json").exists());
    }

    async fn mount_login(server: &MockServer, role: &str) {
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jwtToken": "jwt-5",
                "type": "Bearer",
                "id": 5,
                "username": "carol",
                "role": role
            })))
            .mount(server)
            .await;
    }

    fn admin_login(username: &str) -> LoginArgs {
        LoginArgs {
            username: username.to_string(),
            password: Some(SecretString::from("Secret1!")),
            from: None,
            admin: true,
        }
    }

    #[tokio::test]
    async fn admin_login_refuses_employee() {
        let server = MockServer::start().await;
        mount_login(&server, "EMPLOYEE").await;
        let dir = tempfile::tempdir().unwrap();
        let globals = globals(&server, &dir);

        let err = login(admin_login("carol"), &globals).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Access Denied: You are not authorized as an Admin."
        );
        assert!(!dir.path().join("session.json").exists());
        assert!(!globals.session().is_authenticated());
    }

    #[tokio::test]
    async fn admin_login_accepts_admin() {
        let server = MockServer::start().await;
        mount_login(&server, "ADMIN").await;
        let dir = tempfile::tempdir().unwrap();
        let globals = globals(&server, &dir);

        login(admin_login("carol"), &globals).await.unwrap();

        assert!(globals.session().has_role("ADMIN"));
    }
}
