//! Submission domain model.
//!
//! # Invariants
//! - `instance_id` is unique per form.
//! - A submission is only created while its form accepts submissions.

use crate::model::actor::ActorId;
use crate::model::form::FormId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Submission record as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub form_id: FormId,
    /// Instance identifier carried in the submitted data, e.g. `uuid:…`.
    pub instance_id: String,
    pub submitter_id: ActorId,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// Generates an instance id in the `uuid:<v4>` shape used by collection clients.
pub fn generate_instance_id() -> String {
    format!("uuid:{}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::generate_instance_id;

    #[test]
    fn generated_instance_ids_are_prefixed_and_unique() {
        let first = generate_instance_id();
        let second = generate_instance_id();
        assert!(first.starts_with("uuid:"));
        assert_ne!(first, second);
    }
}
