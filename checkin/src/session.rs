//! Operator session.
//!
//! The surrounding application establishes who is signed in; the check-in
//! flow only needs the bearer token, the tenant the operator acts for, and
//! their role. Every outgoing call is built from one `Session` value.

use crate::error::{CheckInError, Result};
use std::env;
use std::str::FromStr;

/// Role of the signed-in operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    /// Platform administrator
    Admin,
    /// Event host / organizer
    Host,
    /// Door staff
    #[default]
    Staff,
}

impl Role {
    /// Lowercase name of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Host => "host",
            Self::Staff => "staff",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CheckInError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "host" | "organizer" => Ok(Self::Host),
            "staff" => Ok(Self::Staff),
            other => Err(CheckInError::Config(format!("unknown role `{other}`"))),
        }
    }
}

/// Credentials attached to every request.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Bearer token.
    pub token: String,

    /// Tenant the operator acts for.
    pub tenant_id: String,

    /// Operator role.
    pub role: Role,
}

impl Session {
    /// Create a session.
    #[must_use]
    pub fn new(token: impl Into<String>, tenant_id: impl Into<String>, role: Role) -> Self {
        Self {
            token: token.into(),
            tenant_id: tenant_id.into(),
            role,
        }
    }

    /// Read the session from `TURNSTILE_TOKEN`, `TURNSTILE_TENANT_ID` and
    /// `TURNSTILE_ROLE`.
    ///
    /// Returns `Ok(None)` when the token or tenant is absent or blank.
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::Config`] if `TURNSTILE_ROLE` names an unknown role.
    pub fn from_env() -> Result<Option<Self>> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Session::from_env`], reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::Config`] if the role is unknown.
    pub fn from_lookup<F>(lookup: F) -> Result<Option<Self>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let role = non_blank("TURNSTILE_ROLE")
            .map(|value| value.parse::<Role>())
            .transpose()?
            .unwrap_or_default();

        let (Some(token), Some(tenant_id)) =
            (non_blank("TURNSTILE_TOKEN"), non_blank("TURNSTILE_TENANT_ID"))
        else {
            return Ok(None);
        };

        Ok(Some(Self::new(token.trim(), tenant_id.trim(), role)))
    }
}

// Never print the token.
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("role", &self.role)
            .finish()
    }
}
