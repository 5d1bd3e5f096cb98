//! Options of the dispatcher.
use serde::Deserialize;

/// The namespace used for namespaced operations if neither the document nor
/// the caller provides one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// The option key under which the field manager is passed to mutating verbs.
pub const FIELD_MANAGER_OPTION: &str = "fieldManager";

/// Available options to configure a [`Kubectl`](crate::Kubectl).
///
/// Additionally, this struct can be used as CLI arguments. This functionality
/// is only available if the feature `clap` is enabled.
#[cfg_attr(feature = "clap", derive(clap::Args))]
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct KubectlOptions {
    /// The namespace of namespaced resources which neither specify one
    /// themselves nor are addressed with an explicit namespace.
    #[cfg_attr(feature = "clap", arg(
        long = "default-namespace",
        env = "KUBECTL_DEFAULT_NAMESPACE",
        default_value = DEFAULT_NAMESPACE
    ))]
    pub default_namespace: String,

    /// The name of the actor making changes, passed to create and replace
    /// calls as `fieldManager` unless the call specifies one.
    #[cfg_attr(feature = "clap", arg(long = "field-manager", env = "KUBECTL_FIELD_MANAGER"))]
    pub field_manager: Option<String>,
}

impl Default for KubectlOptions {
    fn default() -> Self {
        Self {
            default_namespace: DEFAULT_NAMESPACE.to_owned(),
            field_manager: None,
        }
    }
}
