//! Form persistence.
//!
//! # Invariants
//! - `list_forms` orders by `xml_form_id` in byte order, so listings are
//!   stable across calls.
//! - Persisted `state` must decode to a known `FormState`; unknown values are
//!   reported as `InvalidData` instead of being defaulted.
//! - `update_form` applies name and state in one transaction.

use crate::model::form::{parse_form_state, Form, FormId, FormState, NewForm};
use crate::model::project::ProjectId;
use crate::repo::{
    bool_to_int, int_to_bool, is_unique_violation, RepoError, RepoResult, SqliteStore,
};
use rusqlite::{params, Row, Transaction, TransactionBehavior};

const FORM_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    xml_form_id,
    name,
    state,
    published,
    has_attachments
FROM forms";

/// Repository interface for forms.
pub trait FormRepository {
    fn create_form(&self, project_id: ProjectId, form: &NewForm) -> RepoResult<Form>;
    fn get_form(&self, project_id: ProjectId, xml_form_id: &str) -> RepoResult<Option<Form>>;
    fn list_forms(&self, project_id: ProjectId) -> RepoResult<Vec<Form>>;
    /// Sets the name and/or lifecycle state of a form. `None` leaves the
    /// field unchanged.
    fn update_form(
        &self,
        form_id: FormId,
        name: Option<&str>,
        state: Option<FormState>,
    ) -> RepoResult<()>;
}

impl FormRepository for SqliteStore<'_> {
    fn create_form(&self, project_id: ProjectId, form: &NewForm) -> RepoResult<Form> {
        form.validate()?;
        let project_exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE id = ?1);",
            [project_id],
            |row| row.get(0),
        )?;
        if !project_exists {
            return Err(RepoError::not_found("project", project_id));
        }

        let result = self.conn.execute(
            "INSERT INTO forms (
                project_id,
                xml_form_id,
                name,
                published,
                has_attachments
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                project_id,
                form.xml_form_id.as_str(),
                form.name.as_deref(),
                bool_to_int(form.published),
                bool_to_int(form.has_attachments),
            ],
        );
        match result {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(RepoError::Duplicate {
                    entity: "form",
                    key: format!("{project_id}/{}", form.xml_form_id),
                });
            }
            Err(err) => return Err(err.into()),
        }

        self.get_form(project_id, &form.xml_form_id)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "form {project_id}/{} missing after insert",
                form.xml_form_id
            ))
        })
    }

    fn get_form(&self, project_id: ProjectId, xml_form_id: &str) -> RepoResult<Option<Form>> {
        let mut stmt = self.conn.prepare(&format!(
            "{FORM_SELECT_SQL}
             WHERE project_id = ?1
               AND xml_form_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![project_id, xml_form_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_form_row(row)?));
        }
        Ok(None)
    }

    fn list_forms(&self, project_id: ProjectId) -> RepoResult<Vec<Form>> {
        let mut stmt = self.conn.prepare(&format!(
            "{FORM_SELECT_SQL}
             WHERE project_id = ?1
             ORDER BY xml_form_id ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([project_id])?;
        let mut forms = Vec::new();
        while let Some(row) = rows.next()? {
            forms.push(parse_form_row(row)?);
        }
        Ok(forms)
    }

    fn update_form(
        &self,
        form_id: FormId,
        name: Option<&str>,
        state: Option<FormState>,
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM forms WHERE id = ?1);",
            [form_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(RepoError::not_found("form", form_id));
        }

        if let Some(name) = name {
            tx.execute(
                "UPDATE forms SET name = ?2 WHERE id = ?1;",
                params![form_id, name],
            )?;
        }
        if let Some(state) = state {
            tx.execute(
                "UPDATE forms SET state = ?2 WHERE id = ?1;",
                params![form_id, state.as_str()],
            )?;
        }

        tx.execute(
            "UPDATE forms
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [form_id],
        )?;

        tx.commit()?;
        Ok(())
    }
}

fn parse_form_row(row: &Row<'_>) -> RepoResult<Form> {
    let state_text: String = row.get("state")?;
    let state = parse_form_state(&state_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid form state `{state_text}` in forms.state"))
    })?;

    Ok(Form {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        xml_form_id: row.get("xml_form_id")?,
        name: row.get("name")?,
        state,
        published: int_to_bool(row.get("published")?, "forms.published")?,
        has_attachments: int_to_bool(row.get("has_attachments")?, "forms.has_attachments")?,
    })
}
