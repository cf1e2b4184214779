// SPDX-License-Identifier: MIT OR Apache-2.0
//! Core data model for the Backforge generation orchestrator: the
//! `Spec` intermediate representation, the `Project` persistence record
//! and its lifecycle state machine, RAG document/chunk records, and the
//! report/request types exchanged with the sandbox & repair loop.
//!
//! This crate has no I/O of its own; it defines the shapes every other
//! `bf-*` crate passes around.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod document;
mod project;
mod sandbox;
mod spec;
mod tenancy;
mod thread;

pub use document::{Chunk, Document, EMBEDDING_DIM};
pub use project::{IllegalTransition, Project, ProjectStatus};
pub use sandbox::{
    AutoFixRequest, AutoFixRequestError, EndpointResult, PatchRequest, SandboxTestReport,
    VerificationReport,
};
pub use spec::{
    AuthConfig, Database, Entity, Field, FieldType, ProjectSlug, Spec, SpecError,
    GENERIC_PROJECT_NAMES, RESERVED_FIELD_NAMES,
};
pub use tenancy::check_owner;
pub use thread::{Message, Role, Thread};
