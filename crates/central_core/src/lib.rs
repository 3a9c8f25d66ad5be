//! Access core for ODK Central projects, forms and submissions.
//! This crate is the single source of truth for who may do what.

pub mod authz;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use authz::action::{parse_action, Action, ActionParseError, ResourceKind};
pub use authz::decision::Decision;
pub use authz::evaluator::{
    evaluate, evaluate_action_id, filter_readable_forms, filter_readable_projects,
    EvaluationError, Resource,
};
pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::actor::{Actor, ActorId, ActorRecord, AssignmentScope, RoleAssignment};
pub use model::form::{Form, FormId, FormState, NewForm};
pub use model::project::{Project, ProjectId};
pub use model::role::{parse_role, Role};
pub use model::submission::Submission;
pub use repo::{RepoError, RepoResult, ResourceStore, SqliteStore};
pub use service::access_service::{AccessError, AccessResult, AccessService, FormPatch};

/// Minimal health-check API for integration probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
