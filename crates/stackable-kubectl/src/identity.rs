//! Resolution of the canonical [`GroupVersionKind`] of documents and typed
//! instances.
use k8s_gvk::{GroupVersionKind, ParseApiVersionError};
use snafu::{OptionExt, ResultExt, Snafu};

use crate::{document::Document, model::Model};

pub const KIND_FIELD: &str = "kind";
pub const API_VERSION_FIELD: &str = "apiVersion";

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum Error {
    #[snafu(display("required field {field:?} is missing"))]
    MissingField { field: &'static str },

    #[snafu(display("field {field:?} must be a string"))]
    NotAString { field: &'static str },

    #[snafu(display("failed to parse api version {api_version:?}"))]
    ParseApiVersion {
        source: ParseApiVersionError,
        api_version: String,
    },
}

/// The accepted shapes of identity sources.
#[derive(Clone, Copy, Debug)]
pub enum IdentitySource<'a> {
    /// Explicit `kind` and raw `apiVersion` fields.
    ApiVersion { kind: &'a str, api_version: &'a str },

    /// Explicit `kind`, group and version. The group is taken verbatim, the
    /// version is capitalized.
    Parts {
        kind: &'a str,
        group: &'a str,
        version: &'a str,
    },

    /// A typed instance exposing `kind` and `apiVersion`.
    Model(&'a dyn Model),

    /// An untyped document carrying `kind` and `apiVersion` fields.
    Document(&'a Document),
}

impl<'a> From<&'a Document> for IdentitySource<'a> {
    fn from(document: &'a Document) -> Self {
        Self::Document(document)
    }
}

/// Resolves the canonical identity of `source`.
///
/// ```
/// use stackable_kubectl::identity::{IdentitySource, identity_of};
/// use stackable_kubectl::GroupVersionKind;
///
/// let gvk = identity_of(IdentitySource::ApiVersion {
///     kind: "Ingress",
///     api_version: "networking.k8s.io/v1",
/// })
/// .unwrap();
/// assert_eq!(gvk, GroupVersionKind::new("Networking", "V1", "Ingress"));
/// ```
pub fn identity_of<'a>(source: impl Into<IdentitySource<'a>>) -> Result<GroupVersionKind> {
    match source.into() {
        IdentitySource::ApiVersion { kind, api_version } => from_api_version(kind, api_version),
        IdentitySource::Parts {
            kind,
            group,
            version,
        } => Ok(GroupVersionKind::from_parts(group, version, kind)),
        IdentitySource::Model(model) => {
            let kind = model.kind().context(MissingFieldSnafu { field: KIND_FIELD })?;
            let api_version = model.api_version().context(MissingFieldSnafu {
                field: API_VERSION_FIELD,
            })?;
            from_api_version(kind, api_version)
        }
        IdentitySource::Document(document) => {
            let kind = string_field(document, KIND_FIELD)?;
            let api_version = string_field(document, API_VERSION_FIELD)?;
            from_api_version(kind, api_version)
        }
    }
}

fn from_api_version(kind: &str, api_version: &str) -> Result<GroupVersionKind> {
    GroupVersionKind::from_api_version(kind, api_version)
        .context(ParseApiVersionSnafu { api_version })
}

fn string_field<'a>(document: &'a Document, field: &'static str) -> Result<&'a str> {
    document
        .get(field)
        .filter(|value| !value.is_null())
        .context(MissingFieldSnafu { field })?
        .as_str()
        .context(NotAStringSnafu { field })
}
