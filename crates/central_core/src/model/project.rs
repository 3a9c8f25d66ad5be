//! Project domain model.

use serde::{Deserialize, Serialize};

/// Database id of one project row.
pub type ProjectId = i64;

/// Project record. A project owns forms and role assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Epoch milliseconds.
    pub created_at: i64,
}
