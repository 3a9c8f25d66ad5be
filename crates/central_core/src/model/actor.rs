//! Actor identity and role assignments.
//!
//! # Responsibility
//! - Define the stored actor record and role assignment rows.
//! - Define [`Actor`], the resolved identity handed to the evaluator.
//!
//! # Invariants
//! - An `Actor` is an immutable snapshot for one request; it is rebuilt from
//!   the store on every resolution and never cached across requests.
//! - No assignment on a project means no roles there; lookups return an
//!   empty set, never an error.

use crate::model::project::ProjectId;
use crate::model::role::Role;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+$").expect("valid email regex"));

/// Database id of one actor row.
pub type ActorId = i64;

/// Stored actor (user) record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRecord {
    pub id: ActorId,
    pub email: String,
    pub display_name: String,
}

/// Returns whether `value` looks like a deliverable email address.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

/// Where a role assignment applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "project_id")]
pub enum AssignmentScope {
    /// Applies to every project.
    Site,
    Project(ProjectId),
}

/// One stored role assignment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub actor_id: ActorId,
    pub role: Role,
    pub scope: AssignmentScope,
}

/// Authenticated identity with its resolved role assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: ActorId,
    pub email: String,
    site_roles: BTreeSet<Role>,
    project_roles: BTreeMap<ProjectId, BTreeSet<Role>>,
}

impl Actor {
    /// Creates an actor with no role assignments.
    pub fn new(id: ActorId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            site_roles: BTreeSet::new(),
            project_roles: BTreeMap::new(),
        }
    }

    /// Builds an actor from its stored record and assignment rows.
    pub fn from_assignments(record: &ActorRecord, assignments: &[RoleAssignment]) -> Self {
        let mut actor = Self::new(record.id, record.email.clone());
        for assignment in assignments.iter().filter(|a| a.actor_id == record.id) {
            actor.grant(assignment.scope, assignment.role);
        }
        actor
    }

    /// Adds one role assignment to this snapshot.
    pub fn grant(&mut self, scope: AssignmentScope, role: Role) {
        match scope {
            AssignmentScope::Site => {
                self.site_roles.insert(role);
            }
            AssignmentScope::Project(project_id) => {
                self.project_roles.entry(project_id).or_default().insert(role);
            }
        }
    }

    /// Builder form of [`Actor::grant`] for a project-scoped role.
    pub fn with_project_role(mut self, project_id: ProjectId, role: Role) -> Self {
        self.grant(AssignmentScope::Project(project_id), role);
        self
    }

    /// Builder form of [`Actor::grant`] for a site-scoped role.
    pub fn with_site_role(mut self, role: Role) -> Self {
        self.grant(AssignmentScope::Site, role);
        self
    }

    /// Roles that apply outside any project (site-level actions).
    pub fn site_roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.site_roles.iter().copied()
    }

    /// Effective roles on one project: site roles plus project assignments.
    pub fn roles_for(&self, project_id: ProjectId) -> BTreeSet<Role> {
        let mut roles = self.site_roles.clone();
        if let Some(assigned) = self.project_roles.get(&project_id) {
            roles.extend(assigned.iter().copied());
        }
        roles
    }
}

#[cfg(test)]
mod tests {
    use super::{is_valid_email, Actor, ActorRecord, AssignmentScope, RoleAssignment};
    use crate::model::role::Role;

    #[test]
    fn unassigned_project_has_no_roles() {
        let actor = Actor::new(7, "chelsea@getodk.org");
        assert!(actor.roles_for(1).is_empty());
    }

    #[test]
    fn site_roles_apply_to_every_project() {
        let actor = Actor::new(1, "alice@getodk.org")
            .with_site_role(Role::Admin)
            .with_project_role(2, Role::Viewer);
        assert!(actor.roles_for(1).contains(&Role::Admin));
        let roles = actor.roles_for(2);
        assert!(roles.contains(&Role::Admin));
        assert!(roles.contains(&Role::Viewer));
    }

    #[test]
    fn from_assignments_ignores_rows_of_other_actors() {
        let record = ActorRecord {
            id: 7,
            email: "chelsea@getodk.org".to_string(),
            display_name: "Chelsea".to_string(),
        };
        let rows = [
            RoleAssignment {
                actor_id: 7,
                role: Role::DataCollector,
                scope: AssignmentScope::Project(1),
            },
            RoleAssignment {
                actor_id: 8,
                role: Role::Manager,
                scope: AssignmentScope::Project(1),
            },
        ];
        let actor = Actor::from_assignments(&record, &rows);
        assert_eq!(
            actor.roles_for(1).into_iter().collect::<Vec<_>>(),
            vec![Role::DataCollector]
        );
    }

    #[test]
    fn email_shape_check() {
        assert!(is_valid_email("alice@getodk.org"));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("a b@c"));
    }
}
