use std::sync::LazyLock;

use regex::Regex;
use snafu::{OptionExt, Snafu, ensure};

use crate::{CORE_GROUP, GroupVersion, GroupVersionKind};

/// Suffix carried by every generated API type name, for example `CoreV1Api`.
pub const API_TYPE_SUFFIX: &str = "Api";

// Lazily initialized regular expressions
static TYPE_NAME_SEGMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Z][^A-Z]*").expect("failed to compile type name segment regex")
});

static VERSION_SEGMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^V[0-9]+(?:[a-z]+[0-9]+)?$").expect("failed to compile version segment regex")
});

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum ParseTypeNameError {
    #[snafu(display("type name {type_name:?} must start with an upper-case character"))]
    InvalidFormat { type_name: String },

    #[snafu(display("type name {type_name:?} does not contain a version segment"))]
    MissingVersion { type_name: String },

    #[snafu(display("type name {type_name:?} does not contain a kind"))]
    MissingKind { type_name: String },

    #[snafu(display("type name {type_name:?} is not an API type, expected a {API_TYPE_SUFFIX:?} suffix"))]
    NotAnApiType { type_name: String },
}

/// Splits a generated type name at every lower-case to upper-case boundary
/// and locates the version segment.
///
/// Returns the group/version encoded in the prefix and the remainder of the
/// name after the version segment. Segments before the version form the
/// group. Without any, the type belongs to the [`CORE_GROUP`].
fn split_type_name(type_name: &str) -> Result<(GroupVersion, &str), ParseTypeNameError> {
    ensure!(
        type_name.starts_with(|c: char| c.is_ascii_uppercase()),
        InvalidFormatSnafu { type_name }
    );

    let segments: Vec<_> = TYPE_NAME_SEGMENT_REGEX.find_iter(type_name).collect();
    let position = segments
        .iter()
        .position(|segment| VERSION_SEGMENT_REGEX.is_match(segment.as_str()))
        .context(MissingVersionSnafu { type_name })?;

    let group: String = segments[..position]
        .iter()
        .map(|segment| segment.as_str())
        .collect();
    let group = if group.is_empty() {
        CORE_GROUP.to_owned()
    } else {
        group
    };

    let version = segments[position];
    let remainder = &type_name[version.end()..];

    Ok((GroupVersion::new(group, version.as_str()), remainder))
}

impl GroupVersionKind {
    /// Derives an identity from the name of a generated model type, like
    /// `V1Pod`, `V1beta1CronJob` or `AppsV1beta1Deployment`.
    ///
    /// The name is split at lower-case to upper-case boundaries. If the first
    /// segment is a version, the resource belongs to the core group. Otherwise
    /// the segments before the version form the group. Everything after the
    /// version, rejoined, is the kind.
    pub fn from_type_name(type_name: &str) -> Result<Self, ParseTypeNameError> {
        let (group_version, kind) = split_type_name(type_name)?;
        ensure!(!kind.is_empty(), MissingKindSnafu { type_name });

        Ok(group_version.with_kind(kind))
    }
}

impl GroupVersion {
    /// Derives the group and version served by a generated API type, like
    /// `CoreV1Api`, `AppsV1beta1Api` or `RbacAuthorizationV1Api`.
    pub fn from_api_type_name(type_name: &str) -> Result<Self, ParseTypeNameError> {
        let (group_version, remainder) = split_type_name(type_name)?;
        ensure!(
            remainder == API_TYPE_SUFFIX,
            NotAnApiTypeSnafu { type_name }
        );

        Ok(group_version)
    }
}
