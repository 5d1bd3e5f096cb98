use std::{collections::BTreeMap, fmt, sync::Arc};

use k8s_gvk::GroupVersionKind;

use crate::api::{ApiClient, Verb};

/// The minimum number of distinct verbs an operation set must implement to be
/// kept in the registry. Sets with fewer verbs (for example status or scale
/// sub-resources) are discarded as incomplete.
pub const MIN_VERBS: usize = 5;

/// The verbs available for one kind, the client which serves them and whether
/// they need a namespace argument.
#[derive(Clone)]
pub struct ApiDefinition {
    group_version_kind: GroupVersionKind,
    client: Arc<dyn ApiClient>,
    requires_namespace: bool,
    actions: BTreeMap<Verb, String>,
}

impl ApiDefinition {
    pub fn new(group_version_kind: GroupVersionKind, client: Arc<dyn ApiClient>) -> Self {
        Self {
            group_version_kind,
            client,
            requires_namespace: false,
            actions: BTreeMap::new(),
        }
    }

    pub fn group_version_kind(&self) -> &GroupVersionKind {
        &self.group_version_kind
    }

    pub fn client(&self) -> &Arc<dyn ApiClient> {
        &self.client
    }

    pub fn requires_namespace(&self) -> bool {
        self.requires_namespace
    }

    pub fn set_requires_namespace(&mut self, requires_namespace: bool) {
        self.requires_namespace = requires_namespace;
    }

    /// Records `method` as the implementation of `verb`, replacing any
    /// previously recorded method.
    pub fn add_action(&mut self, verb: Verb, method: impl Into<String>) {
        self.actions.insert(verb, method.into());
    }

    /// Returns the name of the client method implementing `verb`.
    pub fn action(&self, verb: Verb) -> Option<&str> {
        self.actions.get(&verb).map(String::as_str)
    }

    pub fn verbs(&self) -> impl Iterator<Item = Verb> + '_ {
        self.actions.keys().copied()
    }

    /// Returns `true` if at least [`MIN_VERBS`] distinct verbs are available.
    pub fn is_complete(&self) -> bool {
        self.actions.len() >= MIN_VERBS
    }

    pub(crate) fn with_group_version_kind(self, group_version_kind: GroupVersionKind) -> Self {
        Self {
            group_version_kind,
            ..self
        }
    }
}

impl fmt::Debug for ApiDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiDefinition")
            .field("group_version_kind", &self.group_version_kind)
            .field("client", &self.client.type_name())
            .field("requires_namespace", &self.requires_namespace)
            .field("actions", &self.actions)
            .finish()
    }
}
