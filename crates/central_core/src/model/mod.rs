//! Domain model for projects, forms, submissions and the actors acting on them.
//!
//! # Responsibility
//! - Define the records supplied by the resource store.
//! - Define the closed role set and the resolved actor identity.
//!
//! # Invariants
//! - Roles are scoped to a project, except site-wide administrator grants.
//! - Models are plain data; authorization decisions live in `crate::authz`.

pub mod actor;
pub mod form;
pub mod project;
pub mod role;
pub mod submission;
