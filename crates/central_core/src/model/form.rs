//! Form domain model.
//!
//! # Responsibility
//! - Define the form record owned by a project.
//! - Define the form lifecycle state and its submission-acceptance rules.
//!
//! # Invariants
//! - `xml_form_id` is unique inside one project.
//! - Lifecycle transitions are driven by privileged actors only; the
//!   authorization layer reads `state`, it never writes it.

use crate::model::project::ProjectId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static XML_FORM_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").expect("valid xml form id regex"));

/// Database id of one form row.
pub type FormId = i64;

/// Form lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormState {
    /// Downloadable and accepting submissions.
    Open,
    /// Not downloadable as new, but still accepting submissions.
    Closing,
    /// Not downloadable and not accepting submissions.
    Closed,
}

impl FormState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }

    /// Whether new submissions may be created in this state.
    pub fn accepts_submissions(self) -> bool {
        !matches!(self, Self::Closed)
    }

    /// Short user-facing summary of the state.
    pub fn description(self) -> &'static str {
        match self {
            Self::Open => "This Form is downloadable and is accepting Submissions.",
            Self::Closing => "This Form is not downloadable but still accepts Submissions.",
            Self::Closed => "This Form is not downloadable and does not accept Submissions.",
        }
    }
}

impl Display for FormState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a form state from its stored/wire string value.
pub fn parse_form_state(value: &str) -> Result<FormState, FormStateParseError> {
    match value.trim() {
        "open" => Ok(FormState::Open),
        "closing" => Ok(FormState::Closing),
        "closed" => Ok(FormState::Closed),
        other => Err(FormStateParseError(other.to_string())),
    }
}

/// Unknown form state string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormStateParseError(pub String);

impl Display for FormStateParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "form state is unsupported: `{}` (expected open|closing|closed)",
            self.0
        )
    }
}

impl Error for FormStateParseError {}

/// Form record as supplied by the resource store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    pub id: FormId,
    pub project_id: ProjectId,
    /// Form identifier declared in the form definition, e.g. `simple`.
    pub xml_form_id: String,
    pub name: Option<String>,
    pub state: FormState,
    /// `false` while only a draft definition exists.
    pub published: bool,
    /// Whether media attachments or entity datasets are linked.
    pub has_attachments: bool,
}

impl Form {
    /// Whether a data collector may see this form at all.
    pub fn is_accessible_to_collectors(&self) -> bool {
        self.published && self.state.accepts_submissions()
    }
}

/// Input for creating a new form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewForm {
    pub xml_form_id: String,
    pub name: Option<String>,
    pub published: bool,
    pub has_attachments: bool,
}

impl NewForm {
    /// Published open form with no attachments.
    pub fn published(xml_form_id: impl Into<String>) -> Self {
        Self {
            xml_form_id: xml_form_id.into(),
            name: None,
            published: true,
            has_attachments: false,
        }
    }

    /// Draft-only form; invisible to collectors until published.
    pub fn draft(xml_form_id: impl Into<String>) -> Self {
        Self {
            published: false,
            ..Self::published(xml_form_id)
        }
    }

    pub fn with_attachments(mut self) -> Self {
        self.has_attachments = true;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn validate(&self) -> Result<(), FormValidationError> {
        if self.xml_form_id.trim().is_empty() {
            return Err(FormValidationError::EmptyXmlFormId);
        }
        if !XML_FORM_ID_RE.is_match(&self.xml_form_id) {
            return Err(FormValidationError::InvalidXmlFormId(
                self.xml_form_id.clone(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValidationError {
    EmptyXmlFormId,
    InvalidXmlFormId(String),
}

impl Display for FormValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyXmlFormId => write!(f, "xml form id must not be empty"),
            Self::InvalidXmlFormId(value) => write!(f, "xml form id is invalid: {value}"),
        }
    }
}

impl Error for FormValidationError {}

#[cfg(test)]
mod tests {
    use super::{parse_form_state, FormState, FormStateParseError, NewForm};

    #[test]
    fn parses_all_states() {
        assert_eq!(parse_form_state("open").unwrap(), FormState::Open);
        assert_eq!(parse_form_state("closing").unwrap(), FormState::Closing);
        assert_eq!(parse_form_state(" closed ").unwrap(), FormState::Closed);
    }

    #[test]
    fn rejects_unknown_state() {
        let err = parse_form_state("archived").unwrap_err();
        assert_eq!(err, FormStateParseError("archived".to_string()));
    }

    #[test]
    fn only_closed_stops_submissions() {
        assert!(FormState::Open.accepts_submissions());
        assert!(FormState::Closing.accepts_submissions());
        assert!(!FormState::Closed.accepts_submissions());
    }

    #[test]
    fn closing_description_keeps_accepting_semantics() {
        assert!(FormState::Closing
            .description()
            .contains("still accepts Submissions"));
    }

    #[test]
    fn validates_xml_form_ids() {
        assert!(NewForm::published("simple").validate().is_ok());
        assert!(NewForm::published("with-repeat.v2").validate().is_ok());
        assert!(NewForm::published("   ").validate().is_err());
        assert!(NewForm::published("has space").validate().is_err());
    }
}
