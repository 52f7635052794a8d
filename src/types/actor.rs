//! Caller identity passed into privileged operations
//!
//! Authentication itself happens upstream; by the time a request reaches the
//! ledger the caller is just an id and a role.

use super::ids::UserId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    /// Internal processing (payment retries, journal replay)
    System,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            "system" => Ok(Role::System),
            other => Err(format!("Invalid role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn admin(id: UserId) -> Self {
        Actor {
            id,
            role: Role::Admin,
        }
    }

    pub fn user(id: UserId) -> Self {
        Actor { id, role: Role::User }
    }

    pub fn system() -> Self {
        Actor {
            id: 0,
            role: Role::System,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
