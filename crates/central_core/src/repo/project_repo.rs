//! Project persistence.

use crate::model::project::{Project, ProjectId};
use crate::repo::{RepoError, RepoResult, SqliteStore};
use rusqlite::{params, OptionalExtension, Row};

/// Repository interface for projects.
pub trait ProjectRepository {
    fn create_project(&self, name: &str) -> RepoResult<Project>;
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    /// All projects ordered by name, then id.
    fn list_projects(&self) -> RepoResult<Vec<Project>>;
    fn update_project_name(&self, id: ProjectId, name: &str) -> RepoResult<()>;
}

impl ProjectRepository for SqliteStore<'_> {
    fn create_project(&self, name: &str) -> RepoResult<Project> {
        let name = normalize_project_name(name)?;
        self.conn
            .execute("INSERT INTO projects (name) VALUES (?1);", [name])?;
        let id = self.conn.last_insert_rowid();
        self.get_project(id)?
            .ok_or_else(|| RepoError::InvalidData(format!("project {id} missing after insert")))
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let project = self
            .conn
            .query_row(
                "SELECT id, name, created_at FROM projects WHERE id = ?1;",
                [id],
                parse_project_row,
            )
            .optional()?;
        Ok(project)
    }

    fn list_projects(&self) -> RepoResult<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM projects ORDER BY name ASC, id ASC;")?;
        let projects = stmt
            .query_map([], parse_project_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    fn update_project_name(&self, id: ProjectId, name: &str) -> RepoResult<()> {
        let name = normalize_project_name(name)?;
        let changed = self.conn.execute(
            "UPDATE projects
             SET
                name = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id, name],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("project", id));
        }
        Ok(())
    }
}

fn normalize_project_name(name: &str) -> RepoResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RepoError::InvalidInput(
            "project name must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

fn parse_project_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
    })
}
