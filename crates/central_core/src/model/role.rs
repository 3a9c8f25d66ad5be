//! Role declarations.
//!
//! A role is a closed set of permission profiles. Roles are resolved once at
//! identity-resolution time and carried on the [`Actor`](crate::model::actor::Actor);
//! the permission table for each role lives in [`crate::authz::policy`].

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Assignment system name for site administrators.
pub const ROLE_ADMIN: &str = "admin";
/// Assignment system name for project managers.
pub const ROLE_MANAGER: &str = "manager";
/// Assignment system name for project viewers.
pub const ROLE_VIEWER: &str = "viewer";
/// Assignment system name for data collectors.
pub const ROLE_FORMFILL: &str = "formfill";

const SUPPORTED_ROLE_STRINGS: &[&str] = &[ROLE_ADMIN, ROLE_MANAGER, ROLE_VIEWER, ROLE_FORMFILL];

/// Permission profile assigned to an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Site-wide administrator.
    #[serde(rename = "admin")]
    Admin,
    /// Project manager: full control inside one project.
    #[serde(rename = "manager")]
    Manager,
    /// Read-only access to a project and its data.
    #[serde(rename = "viewer")]
    Viewer,
    /// Data collector: sees open forms and submits to them.
    #[serde(rename = "formfill")]
    DataCollector,
}

impl Role {
    /// Stable assignment system name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => ROLE_ADMIN,
            Self::Manager => ROLE_MANAGER,
            Self::Viewer => ROLE_VIEWER,
            Self::DataCollector => ROLE_FORMFILL,
        }
    }

    /// Whether the role is only meaningful as a site-wide assignment.
    pub fn is_site_role(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns supported role system names.
pub fn supported_role_strings() -> &'static [&'static str] {
    SUPPORTED_ROLE_STRINGS
}

/// Parses a role from its assignment system name.
///
/// `data-collector` is accepted as an alias of `formfill`.
pub fn parse_role(value: &str) -> Result<Role, RoleParseError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(RoleParseError::EmptyRole);
    }

    match normalized {
        ROLE_ADMIN => Ok(Role::Admin),
        ROLE_MANAGER => Ok(Role::Manager),
        ROLE_VIEWER => Ok(Role::Viewer),
        ROLE_FORMFILL | "data-collector" => Ok(Role::DataCollector),
        other => Err(RoleParseError::UnsupportedRole(other.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleParseError {
    EmptyRole,
    UnsupportedRole(String),
}

impl Display for RoleParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyRole => write!(f, "role value must not be empty"),
            Self::UnsupportedRole(value) => write!(
                f,
                "role is unsupported: {value} (expected {})",
                supported_role_strings().join("|")
            ),
        }
    }
}

impl Error for RoleParseError {}

#[cfg(test)]
mod tests {
    use super::{parse_role, supported_role_strings, Role, RoleParseError};

    #[test]
    fn parses_system_names_and_collector_alias() {
        assert_eq!(parse_role("formfill").unwrap(), Role::DataCollector);
        assert_eq!(parse_role("data-collector").unwrap(), Role::DataCollector);
        assert_eq!(parse_role("manager").unwrap(), Role::Manager);
        assert_eq!(parse_role("viewer").unwrap(), Role::Viewer);
        assert_eq!(parse_role("admin").unwrap(), Role::Admin);
    }

    #[test]
    fn rejects_empty_and_unknown_roles() {
        assert_eq!(parse_role("  ").unwrap_err(), RoleParseError::EmptyRole);
        assert_eq!(
            parse_role("Admin").unwrap_err(),
            RoleParseError::UnsupportedRole("Admin".to_string())
        );
        let message = parse_role("owner").unwrap_err().to_string();
        assert!(message.contains("admin|manager|viewer|formfill"));
    }

    #[test]
    fn as_str_round_trips_through_parse() {
        for value in supported_role_strings() {
            assert_eq!(parse_role(value).unwrap().as_str(), *value);
        }
    }
}
