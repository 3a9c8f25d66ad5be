//! Role permission table and form-state gate.
//!
//! # Responsibility
//! - Declare, per role, the actions it grants and on which forms.
//! - Declare which form states block state-gated actions.
//!
//! # Invariants
//! - The table is static data. Adding a role means adding one row to
//!   [`ROLE_TABLE`]; no handler branches on role names.
//! - A missing grant means `Forbidden`. A state gate can only turn an
//!   otherwise granted action into `Conflict`, never into `Allowed`.

use crate::authz::action::Action;
use crate::authz::decision::Decision;
use crate::model::form::{Form, FormState};
use crate::model::role::Role;

/// Which forms of a project a grant covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormScope {
    /// Every form in the project, whatever its state.
    AnyForm,
    /// Published forms that are not closed. Others are `Forbidden`, except
    /// that state-gated actions on a published closed form reach the gate.
    CollectorAccessible,
}

impl FormScope {
    /// Whether a grant with this scope reaches `form` for `action`.
    pub fn covers(self, action: Action, form: &Form) -> bool {
        match self {
            Self::AnyForm => true,
            Self::CollectorAccessible if action.is_state_gated() => form.published,
            Self::CollectorAccessible => form.is_accessible_to_collectors(),
        }
    }
}

/// One permitted action of a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant {
    pub action: Action,
    pub forms: FormScope,
}

const fn any(action: Action) -> Grant {
    Grant {
        action,
        forms: FormScope::AnyForm,
    }
}

const fn accessible(action: Action) -> Grant {
    Grant {
        action,
        forms: FormScope::CollectorAccessible,
    }
}

/// Actions every authenticated actor may perform. Results are filtered per
/// resource afterwards.
pub const AUTHENTICATED_ACTIONS: &[Action] = &[Action::ProjectList];

const ADMIN_GRANTS: &[Grant] = &[
    any(Action::ProjectList),
    any(Action::ProjectCreate),
    any(Action::ProjectRead),
    any(Action::ProjectUpdate),
    any(Action::FormList),
    any(Action::FormCreate),
    any(Action::FormRead),
    any(Action::FormUpdate),
    any(Action::FormXmlRead),
    any(Action::FormXlsRead),
    any(Action::FormVersionList),
    any(Action::FormFieldList),
    any(Action::FormManifestRead),
    any(Action::FormAttachmentList),
    any(Action::FormAttachmentRead),
    any(Action::SubmissionCreate),
    any(Action::SubmissionList),
    any(Action::SubmissionRead),
    any(Action::SubmissionDownload),
];

const MANAGER_GRANTS: &[Grant] = &[
    any(Action::ProjectRead),
    any(Action::ProjectUpdate),
    any(Action::FormList),
    any(Action::FormCreate),
    any(Action::FormRead),
    any(Action::FormUpdate),
    any(Action::FormXmlRead),
    any(Action::FormXlsRead),
    any(Action::FormVersionList),
    any(Action::FormFieldList),
    any(Action::FormManifestRead),
    any(Action::FormAttachmentList),
    any(Action::FormAttachmentRead),
    any(Action::SubmissionCreate),
    any(Action::SubmissionList),
    any(Action::SubmissionRead),
    any(Action::SubmissionDownload),
];

const VIEWER_GRANTS: &[Grant] = &[
    any(Action::ProjectRead),
    any(Action::FormList),
    any(Action::FormRead),
    any(Action::FormXmlRead),
    any(Action::FormXlsRead),
    any(Action::FormVersionList),
    any(Action::FormFieldList),
    any(Action::FormManifestRead),
    any(Action::FormAttachmentList),
    any(Action::FormAttachmentRead),
    any(Action::SubmissionList),
    any(Action::SubmissionRead),
    any(Action::SubmissionDownload),
];

// No form sub-resources, in any form state.
const DATA_COLLECTOR_GRANTS: &[Grant] = &[
    any(Action::ProjectRead),
    any(Action::FormList),
    accessible(Action::FormRead),
    accessible(Action::SubmissionCreate),
];

/// Role → granted actions.
pub const ROLE_TABLE: &[(Role, &[Grant])] = &[
    (Role::Admin, ADMIN_GRANTS),
    (Role::Manager, MANAGER_GRANTS),
    (Role::Viewer, VIEWER_GRANTS),
    (Role::DataCollector, DATA_COLLECTOR_GRANTS),
];

/// Returns every grant of `role`.
pub fn grants_for(role: Role) -> &'static [Grant] {
    ROLE_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == role)
        .map(|(_, grants)| *grants)
        .unwrap_or(&[])
}

/// Returns the grant of `role` for `action`, if any.
pub fn grant_for(role: Role, action: Action) -> Option<Grant> {
    grants_for(role)
        .iter()
        .copied()
        .find(|grant| grant.action == action)
}

/// Applies the form lifecycle gate to an already granted action.
///
/// `open` and `closing` accept submissions; `closed` yields `Conflict`.
pub fn state_gate(action: Action, state: FormState) -> Decision {
    if action.is_state_gated() && !state.accepts_submissions() {
        return Decision::Conflict;
    }
    Decision::Allowed
}
