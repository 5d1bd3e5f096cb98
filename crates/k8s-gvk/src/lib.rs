//! This library provides canonical identities for Kubernetes API resource
//! kinds. An identity consists of three components: the API group, the
//! version and (for [`GroupVersionKind`]) the kind.
//!
//! Identities are always stored in their canonical form: the reserved
//! `.k8s.io` suffix is removed from the group, every remaining dot-delimited
//! group segment is capitalized and concatenated, and the version is
//! capitalized. Resources without a group belong to the [`CORE_GROUP`].
//!
//! ## Usage
//!
//! Identities can be derived from the `apiVersion` and `kind` fields of a
//! resource document.
//!
//! ```
//! use k8s_gvk::GroupVersionKind;
//!
//! let gvk = GroupVersionKind::from_api_version("ClusterRole", "rbac.authorization.k8s.io/v1")
//!     .expect("valid Kubernetes API version");
//!
//! assert_eq!(gvk.group, "RbacAuthorization");
//! assert_eq!(gvk.version, "V1");
//! assert_eq!(gvk.to_string(), "ClusterRole/RbacAuthorization.V1");
//! ```
//!
//! Alternatively, they can be derived from the name of a generated model or
//! API type, which encodes the group and version as a prefix.
//!
//! ```
//! use k8s_gvk::{GroupVersion, GroupVersionKind};
//!
//! let gvk = GroupVersionKind::from_type_name("AppsV1beta1Deployment")
//!     .expect("valid model type name");
//! assert_eq!(gvk, GroupVersionKind::new("Apps", "V1beta1", "Deployment"));
//!
//! let gv = GroupVersion::from_api_type_name("CoreV1Api").expect("valid API type name");
//! assert_eq!(gv, GroupVersion::core("V1"));
//! ```

mod group_version;
mod type_name;

pub use group_version::*;
pub use type_name::*;
