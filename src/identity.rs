//! Caller identity
//!
//! Authentication happens upstream. A gateway verifies the caller's token and
//! forwards a verified `{user id, role}` as request headers; this module turns
//! those headers into a [`CallerIdentity`] and offers the role checks the
//! services need.

use async_trait::async_trait;
use hyper::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::IdentityConfig;
use crate::error::LostFoundError;

/// Role granted to a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = LostFoundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(LostFoundError::Unauthorized(format!("unknown role '{}'", other))),
        }
    }
}

/// A verified caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: i64,
    pub role: Role,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl CallerIdentity {
    pub fn user(user_id: i64) -> Self {
        Self {
            user_id,
            role: Role::User,
            display_name: None,
            email: None,
        }
    }

    pub fn admin(user_id: i64) -> Self {
        Self {
            user_id,
            role: Role::Admin,
            display_name: None,
            email: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fail with `Forbidden` unless the caller holds the admin role
    pub fn require_admin(&self) -> Result<(), LostFoundError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(LostFoundError::Forbidden("Admins only".into()))
        }
    }
}

/// Resolves the caller behind a request
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` when the request carries no identity at all,
    /// `Err(Unauthorized)` when it carries a malformed one.
    async fn identify(&self, headers: &HeaderMap) -> Result<Option<CallerIdentity>, LostFoundError>;
}

/// Trusts identity headers set by the fronting gateway
pub struct HeaderIdentityProvider {
    config: IdentityConfig,
}

impl HeaderIdentityProvider {
    pub fn new(config: IdentityConfig) -> Self {
        Self { config }
    }

    fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, LostFoundError> {
        match headers.get(name) {
            None => Ok(None),
            Some(value) => {
                let value = value.to_str().map_err(|_| {
                    LostFoundError::Unauthorized(format!("header {} is not valid UTF-8", name))
                })?;
                let value = value.trim();
                Ok(if value.is_empty() { None } else { Some(value) })
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for HeaderIdentityProvider {
    async fn identify(&self, headers: &HeaderMap) -> Result<Option<CallerIdentity>, LostFoundError> {
        let user_id = match Self::header(headers, &self.config.user_id_header)? {
            Some(raw) => raw.parse::<i64>().map_err(|_| {
                LostFoundError::Unauthorized(format!("invalid user id '{}'", raw))
            })?,
            None => return Ok(None),
        };

        let role = match Self::header(headers, &self.config.role_header)? {
            Some(raw) => raw.parse::<Role>()?,
            None => Role::User,
        };

        Ok(Some(CallerIdentity {
            user_id,
            role,
            display_name: Self::header(headers, &self.config.name_header)?.map(str::to_string),
            email: Self::header(headers, &self.config.email_header)?.map(str::to_string),
        }))
    }
}
