//! Role hierarchy and the authorization primitive.
//!
//! RULE: every privileged operation calls `authorize` before acting and
//! writes an audit record afterward regardless of the outcome —
//! rejections are audit-worthy too. See engine.rs.

use crate::error::{DeskError, DeskResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The totally ordered role set: viewer < analyst < admin.
/// Role ordering is the sole authorization signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Viewer,
    Analyst,
    Admin,
}

impl Role {
    /// Ordinal used for the hierarchy comparison. An unrecognized role
    /// never reaches this point — parsing rejects it at the boundary,
    /// which is the closed-enum equivalent of ordinal 0.
    pub fn rank(&self) -> u8 {
        match self {
            Role::Viewer => 1,
            Role::Analyst => 2,
            Role::Admin => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Analyst => "analyst",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewer" => Ok(Role::Viewer),
            "analyst" => Ok(Role::Analyst),
            "admin" => Ok(Role::Admin),
            other => Err(DeskError::Validation(format!("unknown role '{other}'"))),
        }
    }
}

/// The authenticated actor performing an operation. Authentication
/// itself happens upstream; the core only sees the result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Principal {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: i64, email: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            email: email.into(),
            role,
        }
    }
}

/// The single authorization primitive: satisfied iff the principal's
/// rank meets the required rank. Never errors — what to do with `false`
/// is the caller's decision.
pub fn authorize(principal_role: Role, required_role: Role) -> bool {
    principal_role.rank() >= required_role.rank()
}

/// Convenience for boundary code holding string roles: parse both
/// sides, rejecting unrecognized values instead of passing them
/// through.
pub fn authorize_str(principal_role: &str, required_role: &str) -> DeskResult<bool> {
    let principal = Role::from_str(principal_role)?;
    let required = Role::from_str(required_role)?;
    Ok(authorize(principal, required))
}
