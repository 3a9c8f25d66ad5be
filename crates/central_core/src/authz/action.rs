//! Action identifiers checked by the evaluator.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Kind of resource an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Site-level collections (project listing/creation).
    Site,
    Project,
    /// A form, its sub-resources, or its submissions.
    Form,
}

/// One requested operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    ProjectList,
    ProjectCreate,
    ProjectRead,
    ProjectUpdate,
    FormList,
    FormCreate,
    FormRead,
    FormUpdate,
    FormXmlRead,
    FormXlsRead,
    FormVersionList,
    FormFieldList,
    FormManifestRead,
    FormAttachmentList,
    FormAttachmentRead,
    SubmissionCreate,
    SubmissionList,
    SubmissionRead,
    SubmissionDownload,
}

/// Every action, in declaration order.
pub const ALL_ACTIONS: &[Action] = &[
    Action::ProjectList,
    Action::ProjectCreate,
    Action::ProjectRead,
    Action::ProjectUpdate,
    Action::FormList,
    Action::FormCreate,
    Action::FormRead,
    Action::FormUpdate,
    Action::FormXmlRead,
    Action::FormXlsRead,
    Action::FormVersionList,
    Action::FormFieldList,
    Action::FormManifestRead,
    Action::FormAttachmentList,
    Action::FormAttachmentRead,
    Action::SubmissionCreate,
    Action::SubmissionList,
    Action::SubmissionRead,
    Action::SubmissionDownload,
];

/// Form sub-resources: definition downloads, versions, fields, manifest and
/// attachments.
pub const FORM_SUBRESOURCE_ACTIONS: &[Action] = &[
    Action::FormXmlRead,
    Action::FormXlsRead,
    Action::FormVersionList,
    Action::FormFieldList,
    Action::FormManifestRead,
    Action::FormAttachmentList,
    Action::FormAttachmentRead,
];

impl Action {
    /// Stable dotted identifier, e.g. `submission.create`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProjectList => "project.list",
            Self::ProjectCreate => "project.create",
            Self::ProjectRead => "project.read",
            Self::ProjectUpdate => "project.update",
            Self::FormList => "form.list",
            Self::FormCreate => "form.create",
            Self::FormRead => "form.read",
            Self::FormUpdate => "form.update",
            Self::FormXmlRead => "form.xml.read",
            Self::FormXlsRead => "form.xls.read",
            Self::FormVersionList => "form.version.list",
            Self::FormFieldList => "form.field.list",
            Self::FormManifestRead => "form.manifest.read",
            Self::FormAttachmentList => "form.attachment.list",
            Self::FormAttachmentRead => "form.attachment.read",
            Self::SubmissionCreate => "submission.create",
            Self::SubmissionList => "submission.list",
            Self::SubmissionRead => "submission.read",
            Self::SubmissionDownload => "submission.download",
        }
    }

    /// Resource kind the caller must supply for this action.
    pub fn resource_kind(self) -> ResourceKind {
        match self {
            Self::ProjectList | Self::ProjectCreate => ResourceKind::Site,
            Self::ProjectRead | Self::ProjectUpdate | Self::FormList | Self::FormCreate => {
                ResourceKind::Project
            }
            _ => ResourceKind::Form,
        }
    }

    /// Whether the target form's lifecycle state can block this action.
    pub fn is_state_gated(self) -> bool {
        matches!(self, Self::SubmissionCreate)
    }

    pub fn is_form_subresource(self) -> bool {
        FORM_SUBRESOURCE_ACTIONS.contains(&self)
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses an action from its dotted identifier.
pub fn parse_action(value: &str) -> Result<Action, ActionParseError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(ActionParseError::EmptyAction);
    }
    ALL_ACTIONS
        .iter()
        .copied()
        .find(|action| action.as_str() == normalized)
        .ok_or_else(|| ActionParseError::UnsupportedAction(normalized.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionParseError {
    EmptyAction,
    UnsupportedAction(String),
}

impl Display for ActionParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyAction => write!(f, "action identifier must not be empty"),
            Self::UnsupportedAction(value) => write!(f, "action is unsupported: {value}"),
        }
    }
}

impl Error for ActionParseError {}
