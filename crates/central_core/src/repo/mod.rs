//! Resource store: repository contracts and the SQLite implementation.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per resource.
//! - Isolate SQL details from the access service.
//!
//! # Invariants
//! - Every read goes to the database; nothing here caches rows, so a
//!   committed write is visible to the very next read on the connection.
//! - Repository APIs return semantic errors (`NotFound`, `Duplicate`) in
//!   addition to DB transport errors.

use crate::db::DbError;
use crate::model::form::FormValidationError;
use rusqlite::{ffi, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod actor_repo;
pub mod form_repo;
pub mod project_repo;
pub mod submission_repo;

pub use actor_repo::ActorRepository;
pub use form_repo::FormRepository;
pub use project_repo::ProjectRepository;
pub use submission_repo::SubmissionRepository;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for store persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound {
        entity: &'static str,
        key: String,
    },
    Duplicate {
        entity: &'static str,
        key: String,
    },
    InvalidForm(FormValidationError),
    /// Caller input rejected before reaching SQL.
    InvalidInput(String),
    /// Persisted row cannot be decoded into a model.
    InvalidData(String),
}

impl RepoError {
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::Duplicate { entity, key } => write!(f, "{entity} already exists: {key}"),
            Self::InvalidForm(err) => write!(f, "{err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidForm(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<FormValidationError> for RepoError {
    fn from(value: FormValidationError) -> Self {
        Self::InvalidForm(value)
    }
}

/// Everything the access service reads and writes.
pub trait ResourceStore:
    ActorRepository + ProjectRepository + FormRepository + SubmissionRepository
{
}

impl<T> ResourceStore for T where
    T: ActorRepository + ProjectRepository + FormRepository + SubmissionRepository
{
}

/// SQLite-backed resource store over a migrated connection.
pub struct SqliteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStore<'conn> {
    /// Wraps a connection returned by `open_db` / `open_db_in_memory`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
