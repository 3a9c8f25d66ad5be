//! Authorization evaluator.
//!
//! # Responsibility
//! - Decide `Allowed | Forbidden | Conflict` for one `(actor, action, resource)`.
//! - Filter listings down to the resources an actor may read.
//!
//! # Invariants
//! - Evaluation is a pure function of its inputs: no I/O, no caches, no clock.
//! - No assignment on the resource's project is a plain `Forbidden`.
//! - A resource that does not match the action's kind is an error, never a
//!   silent `Allowed`.

use crate::authz::action::{parse_action, Action, ActionParseError, ResourceKind};
use crate::authz::decision::Decision;
use crate::authz::policy::{grant_for, state_gate, AUTHENTICATED_ACTIONS};
use crate::model::actor::Actor;
use crate::model::form::Form;
use crate::model::project::{Project, ProjectId};
use crate::model::role::Role;
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Resource reference handed to the evaluator, with current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource<'a> {
    Site,
    Project(ProjectId),
    /// Form snapshot fetched for this request; carries the lifecycle state.
    Form(&'a Form),
}

impl Resource<'_> {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Site => ResourceKind::Site,
            Self::Project(_) => ResourceKind::Project,
            Self::Form(_) => ResourceKind::Form,
        }
    }
}

impl Display for Resource<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Site => write!(f, "site"),
            Self::Project(project_id) => write!(f, "project:{project_id}"),
            Self::Form(form) => write!(
                f,
                "form:{}/{} state={}",
                form.project_id, form.xml_form_id, form.state
            ),
        }
    }
}

/// Inputs the evaluator cannot decide on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// The action identifier is missing or unknown.
    Action(ActionParseError),
    /// The supplied resource is not the kind the action targets, so required
    /// state (e.g. the form lifecycle state) is missing.
    ResourceMismatch {
        action: Action,
        expected: ResourceKind,
        supplied: ResourceKind,
    },
}

impl Display for EvaluationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Action(err) => write!(f, "{err}"),
            Self::ResourceMismatch {
                action,
                expected,
                supplied,
            } => write!(
                f,
                "action `{action}` targets {expected:?} resources, got {supplied:?}"
            ),
        }
    }
}

impl Error for EvaluationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Action(err) => Some(err),
            Self::ResourceMismatch { .. } => None,
        }
    }
}

impl From<ActionParseError> for EvaluationError {
    fn from(value: ActionParseError) -> Self {
        Self::Action(value)
    }
}

/// Decides whether `actor` may perform `action` on `resource`.
pub fn evaluate(
    actor: &Actor,
    action: Action,
    resource: Resource<'_>,
) -> Result<Decision, EvaluationError> {
    let decision = decide(actor, action, resource)?;
    debug!(
        "event=authz_check module=authz actor_id={} action={} resource={} decision={}",
        actor.id, action, resource, decision
    );
    Ok(decision)
}

/// Same as [`evaluate`] for a dotted action identifier.
pub fn evaluate_action_id(
    actor: &Actor,
    action_id: &str,
    resource: Resource<'_>,
) -> Result<Decision, EvaluationError> {
    let action = parse_action(action_id)?;
    evaluate(actor, action, resource)
}

/// Keeps the projects `actor` may read, preserving input order.
pub fn filter_readable_projects(actor: &Actor, projects: Vec<Project>) -> Vec<Project> {
    projects
        .into_iter()
        .filter(|project| {
            decide(actor, Action::ProjectRead, Resource::Project(project.id))
                == Ok(Decision::Allowed)
        })
        .collect()
}

/// Keeps the forms `actor` may read, preserving input order.
pub fn filter_readable_forms(actor: &Actor, forms: Vec<Form>) -> Vec<Form> {
    forms
        .into_iter()
        .filter(|form| {
            decide(actor, Action::FormRead, Resource::Form(form)) == Ok(Decision::Allowed)
        })
        .collect()
}

fn decide(
    actor: &Actor,
    action: Action,
    resource: Resource<'_>,
) -> Result<Decision, EvaluationError> {
    let expected = action.resource_kind();
    if resource.kind() != expected {
        return Err(EvaluationError::ResourceMismatch {
            action,
            expected,
            supplied: resource.kind(),
        });
    }

    let decision = match resource {
        Resource::Site => {
            if AUTHENTICATED_ACTIONS.contains(&action) {
                Decision::Allowed
            } else {
                Decision::combine(actor.site_roles().map(|role| role_decision(role, action, None)))
            }
        }
        Resource::Project(project_id) => Decision::combine(
            actor
                .roles_for(project_id)
                .into_iter()
                .map(|role| role_decision(role, action, None)),
        ),
        Resource::Form(form) => Decision::combine(
            actor
                .roles_for(form.project_id)
                .into_iter()
                .map(|role| role_decision(role, action, Some(form))),
        ),
    };
    Ok(decision)
}

fn role_decision(role: Role, action: Action, form: Option<&Form>) -> Decision {
    let Some(grant) = grant_for(role, action) else {
        return Decision::Forbidden;
    };

    match form {
        Some(form) => {
            if !grant.forms.covers(action, form) {
                return Decision::Forbidden;
            }
            state_gate(action, form.state)
        }
        None => Decision::Allowed,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        evaluate, evaluate_action_id, filter_readable_forms, filter_readable_projects,
        EvaluationError, Resource,
    };
    use crate::authz::action::{Action, ActionParseError, ResourceKind, FORM_SUBRESOURCE_ACTIONS};
    use crate::authz::decision::Decision;
    use crate::model::actor::Actor;
    use crate::model::form::{Form, FormState};
    use crate::model::project::Project;
    use crate::model::role::Role;

    fn form(id: i64, project_id: i64, xml_form_id: &str, state: FormState) -> Form {
        Form {
            id,
            project_id,
            xml_form_id: xml_form_id.to_string(),
            name: None,
            state,
            published: true,
            has_attachments: false,
        }
    }

    fn collector() -> Actor {
        Actor::new(7, "chelsea@getodk.org").with_project_role(1, Role::DataCollector)
    }

    #[test]
    fn collector_is_forbidden_project_and_form_mutations() {
        let actor = collector();
        let simple = form(1, 1, "simple", FormState::Open);

        assert_eq!(
            evaluate(&actor, Action::ProjectUpdate, Resource::Project(1)).unwrap(),
            Decision::Forbidden
        );
        assert_eq!(
            evaluate(&actor, Action::FormCreate, Resource::Project(1)).unwrap(),
            Decision::Forbidden
        );
        assert_eq!(
            evaluate(&actor, Action::FormUpdate, Resource::Form(&simple)).unwrap(),
            Decision::Forbidden
        );
    }

    #[test]
    fn submission_create_follows_form_state() {
        let actor = collector();
        for (state, expected) in [
            (FormState::Open, Decision::Allowed),
            (FormState::Closing, Decision::Allowed),
            (FormState::Closed, Decision::Conflict),
        ] {
            let target = form(1, 1, "simple", state);
            assert_eq!(
                evaluate(&actor, Action::SubmissionCreate, Resource::Form(&target)).unwrap(),
                expected,
                "state {state}"
            );
        }
    }

    #[test]
    fn collector_denied_subresources_in_every_state() {
        let actor = collector();
        for state in [FormState::Open, FormState::Closing, FormState::Closed] {
            let target = form(3, 1, "withAttachments", state);
            for action in FORM_SUBRESOURCE_ACTIONS {
                assert_eq!(
                    evaluate(&actor, *action, Resource::Form(&target)).unwrap(),
                    Decision::Forbidden,
                    "{action} on {state} form"
                );
            }
        }
    }

    #[test]
    fn collector_cannot_read_closed_form() {
        let actor = collector();
        let closed = form(3, 1, "withAttachments", FormState::Closed);
        assert_eq!(
            evaluate(&actor, Action::FormRead, Resource::Form(&closed)).unwrap(),
            Decision::Forbidden
        );
    }

    #[test]
    fn manager_reads_closed_form_but_hits_conflict_on_submission() {
        let actor = Actor::new(2, "bob@getodk.org").with_project_role(1, Role::Manager);
        let closed = form(3, 1, "withAttachments", FormState::Closed);
        assert_eq!(
            evaluate(&actor, Action::FormRead, Resource::Form(&closed)).unwrap(),
            Decision::Allowed
        );
        assert_eq!(
            evaluate(&actor, Action::SubmissionCreate, Resource::Form(&closed)).unwrap(),
            Decision::Conflict
        );
    }

    #[test]
    fn viewer_cannot_submit_even_to_open_form() {
        let actor = Actor::new(3, "viewer@getodk.org").with_project_role(1, Role::Viewer);
        let open = form(1, 1, "simple", FormState::Open);
        let closed = form(2, 1, "simple2", FormState::Closed);
        assert_eq!(
            evaluate(&actor, Action::SubmissionCreate, Resource::Form(&open)).unwrap(),
            Decision::Forbidden
        );
        assert_eq!(
            evaluate(&actor, Action::SubmissionCreate, Resource::Form(&closed)).unwrap(),
            Decision::Forbidden
        );
    }

    #[test]
    fn no_assignment_means_forbidden_not_error() {
        let actor = Actor::new(9, "nobody@getodk.org");
        let other = form(1, 2, "simple", FormState::Open);
        assert_eq!(
            evaluate(&actor, Action::ProjectRead, Resource::Project(2)).unwrap(),
            Decision::Forbidden
        );
        assert_eq!(
            evaluate(&actor, Action::SubmissionCreate, Resource::Form(&other)).unwrap(),
            Decision::Forbidden
        );
        assert_eq!(
            evaluate(&actor, Action::ProjectList, Resource::Site).unwrap(),
            Decision::Allowed
        );
    }

    #[test]
    fn roles_on_other_projects_do_not_leak() {
        let actor = Actor::new(7, "chelsea@getodk.org").with_project_role(2, Role::Manager);
        assert_eq!(
            evaluate(&actor, Action::ProjectRead, Resource::Project(1)).unwrap(),
            Decision::Forbidden
        );
    }

    #[test]
    fn combined_roles_take_the_strongest_decision() {
        let actor = collector().with_project_role(1, Role::Viewer);
        let simple = form(1, 1, "simple", FormState::Open);
        assert_eq!(
            evaluate(&actor, Action::SubmissionList, Resource::Form(&simple)).unwrap(),
            Decision::Allowed
        );
        assert_eq!(
            evaluate(&actor, Action::SubmissionCreate, Resource::Form(&simple)).unwrap(),
            Decision::Allowed
        );
    }

    #[test]
    fn evaluation_is_idempotent() {
        let actor = collector();
        let closed = form(1, 1, "simple", FormState::Closed);
        let first = evaluate(&actor, Action::SubmissionCreate, Resource::Form(&closed));
        let second = evaluate(&actor, Action::SubmissionCreate, Resource::Form(&closed));
        assert_eq!(first, second);
    }

    #[test]
    fn mismatched_resource_fails_loudly() {
        let admin = Actor::new(1, "alice@getodk.org").with_site_role(Role::Admin);
        let err = evaluate(&admin, Action::SubmissionCreate, Resource::Project(1)).unwrap_err();
        assert_eq!(
            err,
            EvaluationError::ResourceMismatch {
                action: Action::SubmissionCreate,
                expected: ResourceKind::Form,
                supplied: ResourceKind::Project,
            }
        );
    }

    #[test]
    fn unknown_action_id_fails_loudly() {
        let actor = collector();
        let err = evaluate_action_id(&actor, "", Resource::Site).unwrap_err();
        assert_eq!(err, EvaluationError::Action(ActionParseError::EmptyAction));
        assert_eq!(
            evaluate_action_id(&actor, "project.read", Resource::Project(1)).unwrap(),
            Decision::Allowed
        );
    }

    #[test]
    fn only_admin_creates_projects() {
        let admin = Actor::new(1, "alice@getodk.org").with_site_role(Role::Admin);
        let manager = Actor::new(2, "bob@getodk.org").with_project_role(1, Role::Manager);
        assert_eq!(
            evaluate(&admin, Action::ProjectCreate, Resource::Site).unwrap(),
            Decision::Allowed
        );
        assert_eq!(
            evaluate(&manager, Action::ProjectCreate, Resource::Site).unwrap(),
            Decision::Forbidden
        );
    }

    #[test]
    fn listing_filters_keep_order() {
        let actor = collector();
        let projects = vec![
            Project {
                id: 1,
                name: "Default Project".to_string(),
                created_at: 0,
            },
            Project {
                id: 2,
                name: "Project Two".to_string(),
                created_at: 0,
            },
        ];
        let visible = filter_readable_projects(&actor, projects);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Default Project");

        let mut draft = form(4, 1, "draftOnly", FormState::Open);
        draft.published = false;
        let forms = vec![
            form(1, 1, "simple", FormState::Open),
            form(3, 1, "withAttachments", FormState::Closed),
            draft,
            form(2, 1, "withrepeat", FormState::Closing),
        ];
        let ids: Vec<_> = filter_readable_forms(&actor, forms)
            .into_iter()
            .map(|form| form.xml_form_id)
            .collect();
        assert_eq!(ids, vec!["simple", "withrepeat"]);
    }
}
