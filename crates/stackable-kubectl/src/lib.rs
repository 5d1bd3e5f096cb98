//! A generic resource management layer over generated, per-kind typed
//! Kubernetes API clients.
//!
//! Generated clients expose one method per verb and kind (for example
//! `create_namespaced_pod`) and one model type per kind and version. This
//! crate discovers both once, at startup, and offers a single
//! create/read/update/delete/list/apply surface which works for every kind:
//!
//! - [`registry::ModelRegistry`] introspects a [`registry::ClientSurface`] and
//!   builds the structural ([`model::ModelDefinition`]) and operation
//!   ([`api::ApiDefinition`]) catalogs.
//! - [`parser::Parser`] turns untyped documents into typed [`model::Model`]
//!   instances using nothing but the structural catalog.
//! - [`kubectl::Kubectl`] resolves identities, dispatches verbs and runs the
//!   apply (upsert) protocol. Remote faults are returned as data
//!   ([`kubectl::Outcome::Fault`]), never raised.
//!
//! ## Crate Features
//!
//! - `clap` enables deriving [`clap::Args`] for [`options::KubectlOptions`].

pub mod api;
pub mod document;
pub mod identity;
pub mod kubectl;
pub mod logging;
pub mod model;
pub mod models;
pub mod options;
pub mod parser;
pub mod registry;

#[cfg(test)]
mod fixtures;

// External re-exports
pub use k8s_gvk::{self, GroupVersion, GroupVersionKind};
pub use serde_json;

pub use crate::kubectl::{Kubectl, Outcome};
