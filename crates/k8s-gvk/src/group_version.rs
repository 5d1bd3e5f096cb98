use std::{fmt, str::FromStr};

use snafu::{Snafu, ensure};

/// The canonical group of all resources whose `apiVersion` carries no group,
/// for example `v1`.
pub const CORE_GROUP: &str = "Core";

/// Suffix which is stripped from groups before they are canonicalized.
pub const RESERVED_GROUP_SUFFIX: &str = ".k8s.io";

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum ParseApiVersionError {
    #[snafu(display("api version cannot be empty"))]
    Empty,

    #[snafu(display("group cannot be empty"))]
    EmptyGroup,

    #[snafu(display("version cannot be empty"))]
    EmptyVersion,

    #[snafu(display("version {version:?} cannot contain a slash"))]
    NestedVersion { version: String },
}

/// A canonical API group and version, for example `Apps.V1` or `Core.V1`.
///
/// Equality, hashing and ordering are by value, which makes it usable as a
/// catalog key. Use [`GroupVersion::from_api_version`] (or [`FromStr`]) to
/// canonicalize a raw `apiVersion` string.
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct GroupVersion {
    pub group: String,
    pub version: String,
}

impl GroupVersion {
    /// Creates a new [`GroupVersion`] from already canonical parts.
    pub fn new(group: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
        }
    }

    /// Creates a new [`GroupVersion`] in the [`CORE_GROUP`].
    pub fn core(version: impl Into<String>) -> Self {
        Self::new(CORE_GROUP, version)
    }

    /// Parses and canonicalizes a raw `apiVersion` of the form
    /// `(<GROUP>/)<VERSION>`.
    ///
    /// ```
    /// use k8s_gvk::GroupVersion;
    ///
    /// let gv = GroupVersion::from_api_version("stable.example.com/v1alpha1").unwrap();
    /// assert_eq!(gv, GroupVersion::new("StableExampleCom", "V1alpha1"));
    ///
    /// let gv = GroupVersion::from_api_version("v1").unwrap();
    /// assert_eq!(gv, GroupVersion::core("V1"));
    /// ```
    pub fn from_api_version(api_version: &str) -> Result<Self, ParseApiVersionError> {
        let api_version = api_version.trim();
        ensure!(!api_version.is_empty(), EmptySnafu);

        let (group, version) = match api_version.split_once('/') {
            Some((group, version)) => {
                ensure!(!group.is_empty(), EmptyGroupSnafu);
                (Some(group), version)
            }
            None => (None, api_version),
        };

        ensure!(!version.is_empty(), EmptyVersionSnafu);
        ensure!(!version.contains('/'), NestedVersionSnafu { version });

        Ok(Self {
            group: group.map_or_else(|| CORE_GROUP.to_owned(), canonical_group),
            version: capitalize(version),
        })
    }

    pub fn with_kind(&self, kind: impl Into<String>) -> GroupVersionKind {
        GroupVersionKind {
            group: self.group.clone(),
            version: self.version.clone(),
            kind: kind.into(),
        }
    }

    pub fn is_core(&self) -> bool {
        self.group == CORE_GROUP
    }
}

impl FromStr for GroupVersion {
    type Err = ParseApiVersionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::from_api_version(input)
    }
}

impl fmt::Display for GroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.version)
    }
}

/// A canonical API group, version and kind, for example `Deployment/Apps.V1`.
///
/// This is the key of every catalog in the registry. The derived ordering
/// compares the group first, then the version and lastly the kind.
#[cfg_attr(feature = "serde", derive(::serde::Deserialize, ::serde::Serialize))]
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    /// Creates a new [`GroupVersionKind`] from already canonical parts. None
    /// of the parts are modified.
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Creates a new [`GroupVersionKind`] from an explicit group, version and
    /// kind. Only the version is capitalized, the group is taken verbatim.
    pub fn from_parts(group: impl Into<String>, version: &str, kind: impl Into<String>) -> Self {
        Self::new(group, capitalize(version), kind)
    }

    /// Derives the canonical identity of a resource from its `kind` and raw
    /// `apiVersion` fields. See [`GroupVersion::from_api_version`].
    pub fn from_api_version(
        kind: impl Into<String>,
        api_version: &str,
    ) -> Result<Self, ParseApiVersionError> {
        GroupVersion::from_api_version(api_version).map(|gv| gv.with_kind(kind))
    }

    pub fn group_version(&self) -> GroupVersion {
        GroupVersion::new(&self.group, &self.version)
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}.{}", self.kind, self.group, self.version)
    }
}

/// Upper-cases the first character and lower-cases all remaining ones.
pub(crate) fn capitalize(input: &str) -> String {
    let mut chars = input.chars();

    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn canonical_group(group: &str) -> String {
    group
        .strip_suffix(RESERVED_GROUP_SUFFIX)
        .unwrap_or(group)
        .split('.')
        .map(capitalize)
        .collect()
}
