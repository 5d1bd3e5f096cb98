//! The contract of generated API clients and the operation catalog entries
//! built from them.
//!
//! Generated clients expose one method per verb and kind, named like
//! `create_namespaced_pod` or `list_pod_for_all_namespaces`. An [`ApiClient`]
//! lists these method names and invokes them by name, which is all the
//! [registry](crate::registry) needs to discover and dispatch verbs.
use std::{collections::BTreeMap, fmt};

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::model::Model;

mod definition;

pub use definition::*;

/// Verb-specific keyword options passed through to the client, for example
/// `pretty`, `dryRun` or `labelSelector`.
pub type Options = BTreeMap<String, serde_json::Value>;

/// The result of a single client call: a typed result or a remote fault.
pub type ApiResponse = Result<Box<dyn Model>, ApiException>;

/// The recognized verbs.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    EnumIter,
    EnumString,
    Eq,
    Hash,
    IntoStaticStr,
    Ord,
    PartialEq,
    PartialOrd,
)]
#[strum(serialize_all = "snake_case")]
pub enum Verb {
    Create,
    Read,
    Replace,
    Delete,
    List,
    ListForAllNamespaces,
}

/// A remote fault raised by a client call.
///
/// The body usually carries a serialized [`Status`](crate::models::Status),
/// which the dispatcher turns into a typed fault instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiException {
    /// The HTTP status code.
    pub status: u16,

    /// The HTTP reason phrase, for example `Not Found`.
    pub reason: String,

    /// The serialized response body, if any.
    pub body: Option<String>,
}

impl ApiException {
    pub fn new(status: u16, reason: impl Into<String>, body: Option<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            body,
        }
    }
}

impl fmt::Display for ApiException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) {}", self.status, self.reason)
    }
}

impl std::error::Error for ApiException {}

/// The arguments of a single client call.
///
/// The registry only fills in `namespace` for namespaced operations.
#[derive(Clone, Copy, Debug)]
pub struct ApiRequest<'a> {
    pub name: Option<&'a str>,
    pub namespace: Option<&'a str>,
    pub body: Option<&'a dyn Model>,
    pub options: &'a Options,
}

impl<'a> ApiRequest<'a> {
    pub fn new(options: &'a Options) -> Self {
        Self {
            name: None,
            namespace: None,
            body: None,
            options,
        }
    }

    pub fn with_name(self, name: &'a str) -> Self {
        Self {
            name: Some(name),
            ..self
        }
    }

    pub fn with_namespace(self, namespace: Option<&'a str>) -> Self {
        Self { namespace, ..self }
    }

    pub fn with_body(self, body: &'a dyn Model) -> Self {
        Self {
            body: Some(body),
            ..self
        }
    }
}

/// A generated API client, constructed from a transport handle by the caller.
///
/// Implementations must be safe to share, the registry keeps one handle per
/// client and hands it to every operation discovered on it.
pub trait ApiClient: Send + Sync {
    /// The name of the generated type, like `CoreV1Api`. The served group and
    /// version are derived from it.
    fn type_name(&self) -> &str;

    /// The names of all public methods of the client.
    fn methods(&self) -> Vec<String>;

    /// Invokes the method `method` and blocks until the call returns or
    /// faults.
    fn call(&self, method: &str, request: ApiRequest<'_>) -> ApiResponse;
}
