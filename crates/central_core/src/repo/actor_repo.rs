//! Actor and role-assignment persistence.
//!
//! # Invariants
//! - `admin` is only assignable site-wide; every other role only per project.
//! - Assigning an existing role again is a no-op.

use crate::model::actor::{is_valid_email, ActorId, ActorRecord, AssignmentScope, RoleAssignment};
use crate::model::role::{parse_role, Role};
use crate::repo::{is_unique_violation, RepoError, RepoResult, SqliteStore};
use rusqlite::{params, OptionalExtension, Row};

/// Repository interface for actors and their role assignments.
pub trait ActorRepository {
    fn create_actor(&self, email: &str, display_name: &str) -> RepoResult<ActorRecord>;
    fn get_actor(&self, id: ActorId) -> RepoResult<Option<ActorRecord>>;
    fn find_actor_by_email(&self, email: &str) -> RepoResult<Option<ActorRecord>>;
    fn assign_role(&self, actor_id: ActorId, role: Role, scope: AssignmentScope) -> RepoResult<()>;
    /// Returns whether an assignment was removed.
    fn unassign_role(
        &self,
        actor_id: ActorId,
        role: Role,
        scope: AssignmentScope,
    ) -> RepoResult<bool>;
    fn list_assignments(&self, actor_id: ActorId) -> RepoResult<Vec<RoleAssignment>>;
}

impl ActorRepository for SqliteStore<'_> {
    fn create_actor(&self, email: &str, display_name: &str) -> RepoResult<ActorRecord> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(RepoError::InvalidInput(format!("invalid email `{email}`")));
        }

        let result = self.conn.execute(
            "INSERT INTO actors (email, display_name) VALUES (?1, ?2);",
            params![email, display_name.trim()],
        );
        match result {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(RepoError::Duplicate {
                    entity: "actor",
                    key: email.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        }

        let id = self.conn.last_insert_rowid();
        self.get_actor(id)?
            .ok_or_else(|| RepoError::InvalidData(format!("actor {id} missing after insert")))
    }

    fn get_actor(&self, id: ActorId) -> RepoResult<Option<ActorRecord>> {
        let actor = self
            .conn
            .query_row(
                "SELECT id, email, display_name FROM actors WHERE id = ?1;",
                [id],
                parse_actor_row,
            )
            .optional()?;
        Ok(actor)
    }

    fn find_actor_by_email(&self, email: &str) -> RepoResult<Option<ActorRecord>> {
        let actor = self
            .conn
            .query_row(
                "SELECT id, email, display_name FROM actors WHERE email = ?1 COLLATE NOCASE;",
                [email.trim()],
                parse_actor_row,
            )
            .optional()?;
        Ok(actor)
    }

    fn assign_role(&self, actor_id: ActorId, role: Role, scope: AssignmentScope) -> RepoResult<()> {
        check_scope(role, scope)?;
        if self.get_actor(actor_id)?.is_none() {
            return Err(RepoError::not_found("actor", actor_id));
        }
        if let AssignmentScope::Project(project_id) = scope {
            let exists: bool = self.conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM projects WHERE id = ?1);",
                [project_id],
                |row| row.get(0),
            )?;
            if !exists {
                return Err(RepoError::not_found("project", project_id));
            }
        }

        let project_id = scope_project_id(scope);
        self.conn.execute(
            "INSERT OR IGNORE INTO assignments (actor_id, role, project_id) VALUES (?1, ?2, ?3);",
            params![actor_id, role.as_str(), project_id],
        )?;
        Ok(())
    }

    fn unassign_role(
        &self,
        actor_id: ActorId,
        role: Role,
        scope: AssignmentScope,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM assignments
             WHERE actor_id = ?1
               AND role = ?2
               AND project_id IS ?3;",
            params![actor_id, role.as_str(), scope_project_id(scope)],
        )?;
        Ok(changed > 0)
    }

    fn list_assignments(&self, actor_id: ActorId) -> RepoResult<Vec<RoleAssignment>> {
        let mut stmt = self.conn.prepare(
            "SELECT actor_id, role, project_id
             FROM assignments
             WHERE actor_id = ?1
             ORDER BY project_id ASC, role ASC;",
        )?;
        let mut rows = stmt.query([actor_id])?;
        let mut assignments = Vec::new();
        while let Some(row) = rows.next()? {
            let role_text: String = row.get("role")?;
            let role = parse_role(&role_text).map_err(|_| {
                RepoError::InvalidData(format!("invalid role `{role_text}` in assignments.role"))
            })?;
            let scope = match row.get::<_, Option<i64>>("project_id")? {
                Some(project_id) => AssignmentScope::Project(project_id),
                None => AssignmentScope::Site,
            };
            assignments.push(RoleAssignment {
                actor_id: row.get("actor_id")?,
                role,
                scope,
            });
        }
        Ok(assignments)
    }
}

fn parse_actor_row(row: &Row<'_>) -> rusqlite::Result<ActorRecord> {
    Ok(ActorRecord {
        id: row.get("id")?,
        email: row.get("email")?,
        display_name: row.get("display_name")?,
    })
}

fn check_scope(role: Role, scope: AssignmentScope) -> RepoResult<()> {
    match (role.is_site_role(), scope) {
        (true, AssignmentScope::Site) | (false, AssignmentScope::Project(_)) => Ok(()),
        (true, AssignmentScope::Project(_)) => Err(RepoError::InvalidInput(format!(
            "role `{role}` can only be assigned site-wide"
        ))),
        (false, AssignmentScope::Site) => Err(RepoError::InvalidInput(format!(
            "role `{role}` can only be assigned on a project"
        ))),
    }
}

fn scope_project_id(scope: AssignmentScope) -> Option<i64> {
    match scope {
        AssignmentScope::Site => None,
        AssignmentScope::Project(project_id) => Some(project_id),
    }
}
