//! Authorization roles for the protected admin applications.
//!
//! Roles are stored as free-form strings in the user-record store. Three of
//! them grant access to the protected applications; every other label is
//! kept verbatim as `Role::Unknown` so a denial can report what was stored.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Authorization role attached to a user record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Owner of the platform.
    Owner,
    /// Allowed to upload and manage catalog content.
    Uploader,
    /// Administrator of the admin applications.
    Admin,
    /// Any other label found in the store.
    Unknown(String),
}

impl Role {
    /// Returns the label as stored in the user-record store.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Owner => "owner",
            Self::Uploader => "uploader",
            Self::Admin => "admin",
            Self::Unknown(label) => label,
        }
    }

    /// Returns true if this role may enter the protected applications.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        match self {
            Self::Owner | Self::Uploader | Self::Admin => true,
            Self::Unknown(_) => false,
        }
    }
}

impl FromStr for Role {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "owner" => Self::Owner,
            "uploader" => Self::Uploader,
            "admin" => Self::Admin,
            other => Self::Unknown(other.to_string()),
        })
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        let Ok(role) = s.parse::<Role>();
        role
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Unknown(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of looking up a user's role, as seen by the access decision.
///
/// Only `Found` with an allowed role grants access. The remaining variants
/// are all treated as a denial and differ only in what gets logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleLookup {
    /// The user record exists and carries this role.
    Found(Role),
    /// No user record exists for the identity.
    NotFound,
    /// The store could not be read.
    StoreError(String),
    /// The store did not answer within the configured bound.
    TimedOut,
}

impl RoleLookup {
    /// Returns true if the lookup grants access to the protected applications.
    #[must_use]
    pub fn grants_access(&self) -> bool {
        matches!(self, Self::Found(role) if role.is_allowed())
    }

    /// Returns the role, if one was found.
    #[must_use]
    pub fn role(&self) -> Option<&Role> {
        match self {
            Self::Found(role) => Some(role),
            _ => None,
        }
    }
}

impl fmt::Display for RoleLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(role) => write!(f, "role '{role}'"),
            Self::NotFound => write!(f, "no user record"),
            Self::StoreError(reason) => write!(f, "role lookup failed: {reason}"),
            Self::TimedOut => write!(f, "role lookup timed out"),
        }
    }
}
