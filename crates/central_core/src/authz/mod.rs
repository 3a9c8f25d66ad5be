//! Role-based authorization.
//!
//! # Responsibility
//! - Map `(actor, action, resource state)` to an explicit tri-state decision.
//! - Keep the role permission table as declarative data.
//!
//! # Invariants
//! - Decisions are deterministic and side-effect free apart from debug logs.
//! - `Forbidden` and `Conflict` are ordinary outcomes, not errors.

pub mod action;
pub mod decision;
pub mod evaluator;
pub mod policy;
