//! Submission persistence.

use crate::model::actor::ActorId;
use crate::model::form::FormId;
use crate::model::submission::Submission;
use crate::repo::{is_unique_violation, RepoError, RepoResult, SqliteStore};
use rusqlite::{params, OptionalExtension, Row};

/// Repository interface for submissions.
pub trait SubmissionRepository {
    /// Fails with `Duplicate` when `instance_id` already exists on the form.
    fn create_submission(
        &self,
        form_id: FormId,
        instance_id: &str,
        submitter_id: ActorId,
    ) -> RepoResult<Submission>;
    fn get_submission(&self, form_id: FormId, instance_id: &str) -> RepoResult<Option<Submission>>;
    /// Submissions of one form, oldest first.
    fn list_submissions(&self, form_id: FormId) -> RepoResult<Vec<Submission>>;
}

impl SubmissionRepository for SqliteStore<'_> {
    fn create_submission(
        &self,
        form_id: FormId,
        instance_id: &str,
        submitter_id: ActorId,
    ) -> RepoResult<Submission> {
        let instance_id = instance_id.trim();
        if instance_id.is_empty() {
            return Err(RepoError::InvalidInput(
                "submission instance id must not be empty".to_string(),
            ));
        }

        let result = self.conn.execute(
            "INSERT INTO submissions (form_id, instance_id, submitter_id) VALUES (?1, ?2, ?3);",
            params![form_id, instance_id, submitter_id],
        );
        match result {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(RepoError::Duplicate {
                    entity: "submission",
                    key: instance_id.to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        }

        self.get_submission(form_id, instance_id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("submission {instance_id} missing after insert"))
        })
    }

    fn get_submission(&self, form_id: FormId, instance_id: &str) -> RepoResult<Option<Submission>> {
        let submission = self
            .conn
            .query_row(
                "SELECT id, form_id, instance_id, submitter_id, created_at
                 FROM submissions
                 WHERE form_id = ?1
                   AND instance_id = ?2;",
                params![form_id, instance_id],
                parse_submission_row,
            )
            .optional()?;
        Ok(submission)
    }

    fn list_submissions(&self, form_id: FormId) -> RepoResult<Vec<Submission>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, form_id, instance_id, submitter_id, created_at
             FROM submissions
             WHERE form_id = ?1
             ORDER BY created_at ASC, id ASC;",
        )?;
        let submissions = stmt
            .query_map([form_id], parse_submission_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(submissions)
    }
}

fn parse_submission_row(row: &Row<'_>) -> rusqlite::Result<Submission> {
    Ok(Submission {
        id: row.get("id")?,
        form_id: row.get("form_id")?,
        instance_id: row.get("instance_id")?,
        submitter_id: row.get("submitter_id")?,
        created_at: row.get("created_at")?,
    })
}
