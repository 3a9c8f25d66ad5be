//! Access-checked use-case service.
//!
//! # Responsibility
//! - Resolve actors and load current resource state from the store.
//! - Run the evaluator before every read or write and map its outcome to
//!   `AccessError`.
//! - Filter listings to what the actor may read.
//!
//! # Invariants
//! - Role assignments and form state are re-read from the store on every
//!   call; nothing is cached between calls.
//! - A denied call never returns resource data.
//! - Missing resources are reported before authorization (`NotFound`).

use crate::authz::action::{Action, ResourceKind};
use crate::authz::decision::Decision;
use crate::authz::evaluator::{
    evaluate, filter_readable_forms, filter_readable_projects, EvaluationError, Resource,
};
use crate::model::actor::{Actor, ActorId, ActorRecord};
use crate::model::form::{Form, FormState, NewForm};
use crate::model::project::{Project, ProjectId};
use crate::model::submission::{generate_instance_id, Submission};
use crate::repo::{RepoError, ResourceStore};
use log::{info, warn};
use std::borrow::Cow;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type AccessResult<T> = Result<T, AccessError>;

/// Service error carrying the transport-level outcome of a request.
#[derive(Debug)]
pub enum AccessError {
    /// Credential resolved to an actor that no longer exists.
    UnknownActor(String),
    /// The actor's roles do not permit the action.
    Forbidden { action: Action },
    /// The action is permitted but the resource state precludes it.
    Conflict { action: Action, reason: String },
    NotFound { entity: &'static str, key: String },
    /// A required request input was not supplied.
    MissingInput(&'static str),
    /// The operation does not accept this action.
    UnsupportedAction(Action),
    Evaluation(EvaluationError),
    Repo(RepoError),
}

impl AccessError {
    /// Transport status the request router answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnknownActor(_) => 401,
            Self::Forbidden { .. } => 403,
            Self::Conflict { .. } => 409,
            Self::NotFound { .. } => 404,
            Self::MissingInput(_) | Self::UnsupportedAction(_) => 400,
            Self::Evaluation(_) => 500,
            Self::Repo(RepoError::Duplicate { .. }) => 409,
            Self::Repo(RepoError::InvalidInput(_) | RepoError::InvalidForm(_)) => 400,
            Self::Repo(_) => 500,
        }
    }
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownActor(key) => write!(f, "unknown actor: {key}"),
            Self::Forbidden { .. } => {
                write!(f, "the authenticated actor does not have rights to do that")
            }
            Self::Conflict { reason, .. } => write!(f, "{reason}"),
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::MissingInput(name) => write!(f, "missing required input: {name}"),
            Self::UnsupportedAction(action) => write!(f, "action not supported here: {action}"),
            Self::Evaluation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Evaluation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AccessError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, key } => Self::NotFound { entity, key },
            other => Self::Repo(other),
        }
    }
}

impl From<EvaluationError> for AccessError {
    fn from(value: EvaluationError) -> Self {
        Self::Evaluation(value)
    }
}

/// Partial form update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPatch {
    pub name: Option<String>,
    pub state: Option<FormState>,
}

impl FormPatch {
    pub fn state(state: FormState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }
}

/// Access-checked facade over a resource store.
pub struct AccessService<S: ResourceStore> {
    store: S,
}

impl<S: ResourceStore> AccessService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Direct store access for privileged setup paths (seeding, assignment
    /// management). Not access-checked.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolves an actor id into an identity with its current assignments.
    pub fn resolve_actor(&self, actor_id: ActorId) -> AccessResult<Actor> {
        let record = self
            .store
            .get_actor(actor_id)?
            .ok_or_else(|| AccessError::UnknownActor(actor_id.to_string()))?;
        self.actor_from_record(&record)
    }

    /// Resolves an actor by login email.
    pub fn resolve_actor_by_email(&self, email: &str) -> AccessResult<Actor> {
        let record = self
            .store
            .find_actor_by_email(email)?
            .ok_or_else(|| AccessError::UnknownActor(email.trim().to_string()))?;
        self.actor_from_record(&record)
    }

    /// Lists the projects the actor may read. Never fails for lack of roles.
    pub fn list_projects(&self, actor: &Actor) -> AccessResult<Vec<Project>> {
        self.authorize(actor, Action::ProjectList, Resource::Site)?;
        let projects = self.store.list_projects()?;
        Ok(filter_readable_projects(actor, projects))
    }

    pub fn get_project(&self, actor: &Actor, project_id: ProjectId) -> AccessResult<Project> {
        let project = self.load_project(project_id)?;
        self.authorize(actor, Action::ProjectRead, Resource::Project(project.id))?;
        Ok(project)
    }

    pub fn create_project(&self, actor: &Actor, name: &str) -> AccessResult<Project> {
        self.authorize(actor, Action::ProjectCreate, Resource::Site)?;
        let project = self.store.create_project(name)?;
        info!(
            "event=project_create module=service status=ok actor_id={} project_id={}",
            actor.id, project.id
        );
        Ok(project)
    }

    pub fn update_project(
        &self,
        actor: &Actor,
        project_id: ProjectId,
        name: &str,
    ) -> AccessResult<Project> {
        self.load_project(project_id)?;
        self.authorize(actor, Action::ProjectUpdate, Resource::Project(project_id))?;
        self.store.update_project_name(project_id, name)?;
        self.load_project(project_id)
    }

    /// Lists the forms of a project the actor may read, ordered by
    /// `xml_form_id`.
    pub fn list_forms(&self, actor: &Actor, project_id: ProjectId) -> AccessResult<Vec<Form>> {
        self.load_project(project_id)?;
        self.authorize(actor, Action::FormList, Resource::Project(project_id))?;
        let forms = self.store.list_forms(project_id)?;
        Ok(filter_readable_forms(actor, forms))
    }

    pub fn get_form(
        &self,
        actor: &Actor,
        project_id: ProjectId,
        xml_form_id: &str,
    ) -> AccessResult<Form> {
        let form = self.load_form(project_id, xml_form_id)?;
        self.authorize(actor, Action::FormRead, Resource::Form(&form))?;
        Ok(form)
    }

    pub fn create_form(
        &self,
        actor: &Actor,
        project_id: ProjectId,
        form: &NewForm,
    ) -> AccessResult<Form> {
        self.load_project(project_id)?;
        self.authorize(actor, Action::FormCreate, Resource::Project(project_id))?;
        let created = self.store.create_form(project_id, form)?;
        info!(
            "event=form_create module=service status=ok actor_id={} project_id={} xml_form_id={}",
            actor.id, project_id, created.xml_form_id
        );
        Ok(created)
    }

    /// Applies a partial update, including lifecycle state transitions.
    ///
    /// The new state is committed before returning, so the next evaluation
    /// against this store observes it.
    pub fn update_form(
        &self,
        actor: &Actor,
        project_id: ProjectId,
        xml_form_id: &str,
        patch: &FormPatch,
    ) -> AccessResult<Form> {
        let form = self.load_form(project_id, xml_form_id)?;
        self.authorize(actor, Action::FormUpdate, Resource::Form(&form))?;

        self.store.update_form(form.id, patch.name.as_deref(), patch.state)?;
        if let Some(state) = patch.state {
            info!(
                "event=form_state module=service status=ok actor_id={} project_id={} xml_form_id={} from={} to={}",
                actor.id, project_id, form.xml_form_id, form.state, state
            );
        }
        self.load_form(project_id, xml_form_id)
    }

    /// Moves a form through its lifecycle (`open`, `closing`, `closed`).
    pub fn set_form_state(
        &self,
        actor: &Actor,
        project_id: ProjectId,
        xml_form_id: &str,
        state: FormState,
    ) -> AccessResult<Form> {
        self.update_form(actor, project_id, xml_form_id, &FormPatch::state(state))
    }

    /// Authorizes access to a form sub-resource (definition downloads,
    /// versions, fields, manifest, attachments) and returns the form.
    pub fn read_form_resource(
        &self,
        actor: &Actor,
        project_id: ProjectId,
        xml_form_id: &str,
        action: Action,
    ) -> AccessResult<Form> {
        if !action.is_form_subresource() {
            return Err(AccessError::UnsupportedAction(action));
        }
        let form = self.load_form(project_id, xml_form_id)?;
        self.authorize(actor, action, Resource::Form(&form))?;
        Ok(form)
    }

    pub fn list_submissions(
        &self,
        actor: &Actor,
        project_id: ProjectId,
        xml_form_id: &str,
    ) -> AccessResult<Vec<Submission>> {
        let form = self.load_form(project_id, xml_form_id)?;
        self.authorize(actor, Action::SubmissionList, Resource::Form(&form))?;
        Ok(self.store.list_submissions(form.id)?)
    }

    /// Exports submissions of one form as RFC 4180 CSV text.
    pub fn export_submissions_csv(
        &self,
        actor: &Actor,
        project_id: ProjectId,
        xml_form_id: &str,
    ) -> AccessResult<String> {
        let form = self.load_form(project_id, xml_form_id)?;
        self.authorize(actor, Action::SubmissionDownload, Resource::Form(&form))?;
        let submissions = self.store.list_submissions(form.id)?;

        let mut csv = String::from("instanceID,submitterID,createdAt\r\n");
        for submission in &submissions {
            csv.push_str(&format!(
                "{},{},{}\r\n",
                csv_field(&submission.instance_id),
                submission.submitter_id,
                submission.created_at
            ));
        }
        Ok(csv)
    }

    pub fn get_submission(
        &self,
        actor: &Actor,
        project_id: ProjectId,
        xml_form_id: &str,
        instance_id: &str,
    ) -> AccessResult<Submission> {
        let form = self.load_form(project_id, xml_form_id)?;
        self.authorize(actor, Action::SubmissionRead, Resource::Form(&form))?;
        self.store
            .get_submission(form.id, instance_id)?
            .ok_or_else(|| AccessError::NotFound {
                entity: "submission",
                key: instance_id.to_string(),
            })
    }

    /// Creates a submission if the actor may submit and the form accepts
    /// submissions. Generates a `uuid:` instance id when none is given.
    pub fn create_submission(
        &self,
        actor: &Actor,
        project_id: ProjectId,
        xml_form_id: &str,
        instance_id: Option<&str>,
    ) -> AccessResult<Submission> {
        let form = self.load_form(project_id, xml_form_id)?;
        self.authorize(actor, Action::SubmissionCreate, Resource::Form(&form))?;

        let instance_id = match instance_id {
            Some(value) => value.to_string(),
            None => generate_instance_id(),
        };
        let submission = self
            .store
            .create_submission(form.id, &instance_id, actor.id)?;
        info!(
            "event=submission_create module=service status=ok actor_id={} project_id={} xml_form_id={}",
            actor.id, project_id, form.xml_form_id
        );
        Ok(submission)
    }

    /// Loads the target of `action` and returns the raw decision.
    pub fn check(
        &self,
        actor: &Actor,
        action: Action,
        project_id: Option<ProjectId>,
        xml_form_id: Option<&str>,
    ) -> AccessResult<Decision> {
        let decision = match action.resource_kind() {
            ResourceKind::Site => evaluate(actor, action, Resource::Site)?,
            ResourceKind::Project => {
                let project_id = project_id.ok_or(AccessError::MissingInput("project id"))?;
                self.load_project(project_id)?;
                evaluate(actor, action, Resource::Project(project_id))?
            }
            ResourceKind::Form => {
                let project_id = project_id.ok_or(AccessError::MissingInput("project id"))?;
                let xml_form_id = xml_form_id.ok_or(AccessError::MissingInput("xml form id"))?;
                let form = self.load_form(project_id, xml_form_id)?;
                evaluate(actor, action, Resource::Form(&form))?
            }
        };
        Ok(decision)
    }

    fn actor_from_record(&self, record: &ActorRecord) -> AccessResult<Actor> {
        let assignments = self.store.list_assignments(record.id)?;
        Ok(Actor::from_assignments(record, &assignments))
    }

    fn authorize(&self, actor: &Actor, action: Action, resource: Resource<'_>) -> AccessResult<()> {
        match evaluate(actor, action, resource)? {
            Decision::Allowed => Ok(()),
            Decision::Forbidden => {
                info!(
                    "event=access_denied module=service status=403 actor_id={} action={} resource={}",
                    actor.id, action, resource
                );
                Err(AccessError::Forbidden { action })
            }
            Decision::Conflict => {
                warn!(
                    "event=access_conflict module=service status=409 actor_id={} action={} resource={}",
                    actor.id, action, resource
                );
                Err(AccessError::Conflict {
                    action,
                    reason: conflict_reason(action, resource),
                })
            }
        }
    }

    fn load_project(&self, project_id: ProjectId) -> AccessResult<Project> {
        self.store
            .get_project(project_id)?
            .ok_or_else(|| AccessError::NotFound {
                entity: "project",
                key: project_id.to_string(),
            })
    }

    fn load_form(&self, project_id: ProjectId, xml_form_id: &str) -> AccessResult<Form> {
        self.load_project(project_id)?;
        self.store
            .get_form(project_id, xml_form_id)?
            .ok_or_else(|| AccessError::NotFound {
                entity: "form",
                key: format!("{project_id}/{xml_form_id}"),
            })
    }
}

fn conflict_reason(action: Action, resource: Resource<'_>) -> String {
    match resource {
        Resource::Form(form) if action == Action::SubmissionCreate => format!(
            "form `{}` is {}: {}",
            form.xml_form_id,
            form.state,
            form.state.description()
        ),
        _ => format!("`{action}` is not possible in the current resource state"),
    }
}

/// Quotes a CSV field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
