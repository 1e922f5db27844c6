use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::ProfileId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

/// Privileged role granted through the auth provider's claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppRole {
    Admin,
}

impl AppRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AppRole::Admin => "admin",
        }
    }

    #[must_use]
    pub fn grants(self, permission: Permission) -> bool {
        match (self, permission) {
            (AppRole::Admin, Permission::CreateCrosswords) => true,
        }
    }
}

impl fmt::Display for AppRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppRole {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(AppRole::Admin),
            other => Err(ProfileError::UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// `crosswords.create`
    CreateCrosswords,
}

/// An authenticated user. Passed into services explicitly; logging out means
/// tearing down whatever was built with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionContext {
    profile_id: ProfileId,
}

impl SessionContext {
    #[must_use]
    pub fn new(profile_id: ProfileId) -> Self {
        Self { profile_id }
    }

    #[must_use]
    pub fn profile_id(&self) -> ProfileId {
        self.profile_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    id: ProfileId,
    username: Option<String>,
    role: Option<AppRole>,
}

impl Profile {
    #[must_use]
    pub fn new(id: ProfileId, username: Option<String>, role: Option<AppRole>) -> Self {
        let username = username
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        Self { id, username, role }
    }

    #[must_use]
    pub fn id(&self) -> ProfileId {
        self.id
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    #[must_use]
    pub fn role(&self) -> Option<AppRole> {
        self.role
    }

    #[must_use]
    pub fn can(&self, permission: Permission) -> bool {
        self.role.is_some_and(|role| role.grants(permission))
    }

    #[must_use]
    pub fn session(&self) -> SessionContext {
        SessionContext::new(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_admins_create_crosswords() {
        let admin = Profile::new(ProfileId::random(), Some("ana".into()), Some(AppRole::Admin));
        let player = Profile::new(ProfileId::random(), Some("  ".into()), None);
        assert!(admin.can(Permission::CreateCrosswords));
        assert!(!player.can(Permission::CreateCrosswords));
        assert_eq!(player.username(), None);
    }

    #[test]
    fn role_parses_claim_text() {
        assert_eq!("admin".parse::<AppRole>(), Ok(AppRole::Admin));
        assert!("root".parse::<AppRole>().is_err());
    }
}
