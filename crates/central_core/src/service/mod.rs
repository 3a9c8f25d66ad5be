//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate identity resolution, store reads and authorization into
//!   request-level APIs.
//! - Keep callers decoupled from storage details.

pub mod access_service;
