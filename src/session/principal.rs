//! The authenticated principal and the closed role set. A principal is replaced
//! wholesale on login and logout; it is never patched in place. The bearer token
//! stays wrapped in `SecretString` so it cannot leak through `Debug` output.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Roles known to the HRMS backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Employee,
    Hr,
    Pending,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Self; 4] = [Self::Admin, Self::Employee, Self::Hr, Self::Pending];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Employee => "EMPLOYEE",
            Self::Hr => "HR",
            Self::Pending => "PENDING",
        }
    }

    /// Case-insensitive lookup; `None` for anything outside the closed set.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(name))
    }

    /// True when `name` denotes this role, ignoring case.
    #[must_use]
    pub fn matches(self, name: &str) -> bool {
        Self::parse(name) == Some(self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value).ok_or_else(|| UnknownRole(value.to_string()))
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(de::Error::custom)
    }
}

/// Reasons a principal payload is rejected after it parsed as JSON.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IncompletePrincipal {
    #[error("username is empty")]
    EmptyUsername,
    #[error("token is empty")]
    EmptyToken,
}

/// The authenticated user record. Serializes to exactly `id`, `username`,
/// `role` and `token`; the backend's `jwtToken` field name is accepted on input.
#[derive(Debug, Serialize, Deserialize)]
pub struct Principal {
    pub id: i64,
    pub username: String,
    pub role: Role,
    #[serde(
        alias = "jwtToken",
        serialize_with = "serialize_token",
        deserialize_with = "deserialize_token"
    )]
    pub token: SecretString,
}

impl Principal {
    #[must_use]
    pub fn new(id: i64, username: impl Into<String>, role: Role, token: SecretString) -> Self {
        Self {
            id,
            username: username.into(),
            role,
            token,
        }
    }

    /// Parses a principal and checks that every field is populated.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed, a field is missing, the role is
    /// unknown, or the username/token is empty.
    pub fn from_json(raw: &str) -> Result<Self, PrincipalError> {
        let principal: Self = serde_json::from_str(raw)?;
        principal.validate()?;
        Ok(principal)
    }

    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// # Errors
    /// Returns the first empty field found.
    pub fn validate(&self) -> Result<(), IncompletePrincipal> {
        if self.username.trim().is_empty() {
            return Err(IncompletePrincipal::EmptyUsername);
        }
        if self.token.expose_secret().trim().is_empty() {
            return Err(IncompletePrincipal::EmptyToken);
        }
        Ok(())
    }

    #[must_use]
    pub fn has_role(&self, name: &str) -> bool {
        self.role.matches(name)
    }
}

impl Clone for Principal {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
            token: SecretString::from(self.token.expose_secret().to_string()),
        }
    }
}

impl PartialEq for Principal {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.username == other.username
            && self.role == other.role
            && self.token.expose_secret() == other.token.expose_secret()
    }
}

impl Eq for Principal {}

#[derive(Debug, Error)]
pub enum PrincipalError {
    #[error("invalid principal json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("incomplete principal: {0}")]
    Incomplete(#[from] IncompletePrincipal),
}

fn serialize_token<S: Serializer>(token: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(token.expose_secret())
}

fn deserialize_token<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn principal(role: Role) -> Principal {
        Principal::new(7, "alice", role, SecretString::from("jwt-abc".to_string()))
    }

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse(" Employee "), Some(Role::Employee));
        assert_eq!(Role::parse("hr"), Some(Role::Hr));
        assert_eq!(Role::parse("PENDING"), Some(Role::Pending));
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn unknown_role_never_matches() {
        for role in Role::ALL {
            assert!(!role.matches("ROOT"));
            assert!(!role.matches(""));
        }
        assert_eq!(
            "ROLE_ADMIN".parse::<Role>(),
            Err(UnknownRole("ROLE_ADMIN".to_string()))
        );
    }

    #[test]
    fn persisted_form_has_exactly_four_fields() {
        let value: Value = serde_json::from_str(&principal(Role::Admin).to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"id": 7, "username": "alice", "role": "ADMIN", "token": "jwt-abc"})
        );
    }

    #[test]
    fn accepts_backend_login_response_shape() {
        let raw = r#"{"jwtToken":"jwt-abc","type":"Bearer","id":7,"username":"alice","role":"ADMIN"}"#;
        let parsed = Principal::from_json(raw).unwrap();
        assert_eq!(parsed, principal(Role::Admin));
    }

    #[test]
    fn lowercase_role_is_normalized() {
        let raw = r#"{"id":7,"username":"alice","role":"admin","token":"jwt-abc"}"#;
        let parsed = Principal::from_json(raw).unwrap();
        assert_eq!(parsed.role, Role::Admin);
        assert!(parsed.has_role("ADMIN"));
        assert!(!parsed.has_role("EMPLOYEE"));
    }

    #[test]
    fn rejects_incomplete_payloads() {
        let cases = [
            r#"{"id":7,"role":"ADMIN","token":"t"}"#,
            r#"{"id":7,"username":"alice","token":"t"}"#,
            r#"{"id":7,"username":"alice","role":"ADMIN"}"#,
            r#"{"id":7,"username":"alice","role":"WIZARD","token":"t"}"#,
            r#"{"id":7,"username":"  ","role":"ADMIN","token":"t"}"#,
            r#"{"id":7,"username":"alice","role":"ADMIN","token":""}"#,
            r#"not json"#,
            r#"null"#,
        ];
        for raw in cases {
            assert!(Principal::from_json(raw).is_err(), "accepted {raw}");
        }
    }

    #[test]
    fn debug_output_redacts_token() {
        let rendered = format!("{:?}", principal(Role::Employee));
        assert!(!rendered.contains("jwt-abc"));
        assert!(rendered.contains("alice"));
    }
}
