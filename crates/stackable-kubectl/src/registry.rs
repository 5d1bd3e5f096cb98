//! The structural and operation catalogs, built once by introspecting a
//! [`ClientSurface`].
//!
//! Discovery derives the served group/version of every client from its type
//! name (`AppsV1Api` serves `Apps.V1`) and attributes every method following
//! the `<verb>(_namespaced)?_<kind>(_for_all_namespaces)?` naming pattern to
//! the operation set of that kind. Operation sets implementing fewer than
//! [`MIN_VERBS`] verbs are dropped.
//!
//! Model types are keyed by the identity derived from their type name. If an
//! operation set exists for the same kind and version, its identity is used
//! instead, so both catalogs share their keys (`V1Deployment` is keyed as
//! `Deployment/Apps.V1`).
use std::{
    collections::{BTreeMap, HashMap, btree_map::Entry},
    str::FromStr,
    sync::{Arc, LazyLock},
};

use k8s_gvk::{GroupVersion, GroupVersionKind, ParseTypeNameError};
use regex::Regex;
use snafu::{OptionExt, ResultExt, Snafu};
use tracing::{debug, info};

use crate::{
    api::{ApiClient, ApiDefinition, ApiRequest, ApiResponse, MIN_VERBS, Verb},
    model::{ModelDefinition, ModelType},
    models,
};

const HTTP_INFO_SUFFIX: &str = "_with_http_info";
const ALL_NAMESPACES_SUFFIX: &str = "_for_all_namespaces";
const COLLECTION_PREFIX: &str = "collection";

static METHOD_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<verb>delete|read|create|replace|list)_(?P<namespaced>namespaced_)?(?P<kind>.+)$")
        .expect("failed to compile method name regex")
});

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum Error {
    #[snafu(display("no operations are registered for {gvk}"))]
    UnsupportedKind { gvk: GroupVersionKind },

    #[snafu(display("{verb} is not supported for {gvk}"))]
    UnsupportedVerb { gvk: GroupVersionKind, verb: Verb },

    #[snafu(display("no operations are registered for kind {kind:?}"))]
    UnknownKind { kind: String },

    #[snafu(display("failed to derive identity of model type {type_name:?}"))]
    InvalidTypeName {
        source: ParseTypeNameError,
        type_name: String,
    },
}

/// The externally supplied client classes and model types the registry is
/// built from.
#[derive(Clone, Default)]
pub struct ClientSurface {
    clients: Vec<Arc<dyn ApiClient>>,
    models: Vec<ModelDefinition>,
}

impl ClientSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api(self, client: impl ApiClient + 'static) -> Self {
        self.with_shared_api(Arc::new(client))
    }

    /// Adds a client handle which is shared with the caller.
    pub fn with_shared_api(mut self, client: Arc<dyn ApiClient>) -> Self {
        self.clients.push(client);
        self
    }

    pub fn with_model<T: ModelType>(self) -> Self {
        self.with_model_definition(T::definition())
    }

    pub fn with_model_definition(mut self, definition: ModelDefinition) -> Self {
        self.models.push(definition);
        self
    }
}

/// The registry of all known model types and operation sets.
///
/// Built once with [`ModelRegistry::new`] and read-only afterwards, except for
/// the additive [`ModelRegistry::register_custom_resource`] and
/// [`ModelRegistry::register_model`]. These take `&mut self`, so concurrent
/// registration must be serialized by the owner.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: BTreeMap<GroupVersionKind, ModelDefinition>,
    apis: BTreeMap<GroupVersionKind, ApiDefinition>,
    kind_index: BTreeMap<String, GroupVersionKind>,
    type_index: HashMap<String, GroupVersionKind>,
}

impl ModelRegistry {
    /// Runs discovery over `surface`. The meta models from
    /// [`models`](crate::models) are always registered.
    pub fn new(surface: ClientSurface) -> Self {
        let mut registry = Self::default();

        for client in &surface.clients {
            let group_version = match GroupVersion::from_api_type_name(client.type_name()) {
                Ok(group_version) => group_version,
                Err(error) => {
                    debug!(
                        error = &error as &dyn std::error::Error,
                        client = client.type_name(),
                        "skipping client without group and version"
                    );
                    continue;
                }
            };

            for definition in discover_operations(client, &group_version).into_values() {
                if let Some(definition) = complete(definition) {
                    registry
                        .apis
                        .insert(definition.group_version_kind().clone(), definition);
                }
            }
        }

        for definition in models::definitions().into_iter().chain(surface.models) {
            if let Err(error) = registry.install_model(definition) {
                debug!(
                    error = &error as &dyn std::error::Error,
                    "skipping model type without identity"
                );
            }
        }

        registry.build_kind_index();

        info!(
            models = registry.models.len(),
            apis = registry.apis.len(),
            kinds = registry.kind_index.len(),
            "built model registry"
        );

        registry
    }

    /// Registers the model type of a custom resource under `gvk`, replacing a
    /// previously registered one.
    ///
    /// If `client` is given, its methods are enumerated for the kind of `gvk`
    /// and the resulting operation set is installed under `gvk`, subject to
    /// the same completeness rule as discovery. The kind then resolves to
    /// `gvk`.
    pub fn register_custom_resource(
        &mut self,
        gvk: GroupVersionKind,
        definition: ModelDefinition,
        client: Option<Arc<dyn ApiClient>>,
    ) {
        debug!(%gvk, type_name = definition.type_name(), "registering custom resource");
        self.type_index
            .insert(definition.type_name().to_owned(), gvk.clone());
        self.models.insert(gvk.clone(), definition);

        let Some(client) = client else {
            return;
        };

        let definition = discover_operations(&client, &gvk.group_version())
            .remove(&gvk.kind)
            .and_then(complete);

        match definition {
            Some(definition) => {
                self.apis
                    .insert(gvk.clone(), definition.with_group_version_kind(gvk.clone()));
                self.kind_index.insert(gvk.kind.clone(), gvk);
            }
            None => debug!(
                %gvk,
                client = client.type_name(),
                "client provides no complete operation set for custom resource"
            ),
        }
    }

    /// Registers an additional model type, for example a type nested in a
    /// custom resource. Returns the key it was installed under.
    pub fn register_model(&mut self, definition: ModelDefinition) -> Result<GroupVersionKind> {
        let type_name = definition.type_name().to_owned();
        self.install_model(definition)
            .context(InvalidTypeNameSnafu { type_name })
    }

    pub fn model_definition(&self, gvk: &GroupVersionKind) -> Option<&ModelDefinition> {
        self.models.get(gvk)
    }

    /// Looks up the definition of a model type by its type name, as used in
    /// nested field types.
    pub fn resolve_model_for_type(&self, type_name: &str) -> Option<&ModelDefinition> {
        if let Some(gvk) = self.type_index.get(type_name) {
            return self.models.get(gvk);
        }

        let gvk = GroupVersionKind::from_type_name(type_name).ok()?;
        self.models.get(&gvk)
    }

    pub fn api_definition(&self, gvk: &GroupVersionKind) -> Option<&ApiDefinition> {
        self.apis.get(gvk)
    }

    /// Returns `true` if operations on `gvk` take a namespace argument.
    /// Unknown identities don't.
    pub fn requires_namespace(&self, gvk: &GroupVersionKind) -> bool {
        self.apis
            .get(gvk)
            .is_some_and(ApiDefinition::requires_namespace)
    }

    /// Resolves a bare kind to its preferred identity.
    ///
    /// If multiple versions serve the kind, the lexicographically greatest
    /// version string is preferred (`V1beta1` over `V1`). Use a fully
    /// qualified [`GroupVersionKind`] to address a specific version.
    pub fn resolve_kind(&self, kind: &str) -> Result<&GroupVersionKind> {
        self.kind_index.get(kind).context(UnknownKindSnafu { kind })
    }

    pub fn models(&self) -> impl Iterator<Item = (&GroupVersionKind, &ModelDefinition)> {
        self.models.iter()
    }

    pub fn apis(&self) -> impl Iterator<Item = (&GroupVersionKind, &ApiDefinition)> {
        self.apis.iter()
    }

    /// Invokes the client method implementing `verb` for `gvk`.
    ///
    /// The namespace of `request` is only passed on if the operation set
    /// requires one. Remote faults are part of the returned
    /// [`ApiResponse`], only lookup failures are errors.
    pub fn invoke(
        &self,
        gvk: &GroupVersionKind,
        verb: Verb,
        request: ApiRequest<'_>,
    ) -> Result<ApiResponse> {
        let definition = self
            .apis
            .get(gvk)
            .context(UnsupportedKindSnafu { gvk: gvk.clone() })?;
        let method = definition.action(verb).context(UnsupportedVerbSnafu {
            gvk: gvk.clone(),
            verb,
        })?;

        let request = if definition.requires_namespace() {
            request
        } else {
            request.with_namespace(None)
        };

        debug!(
            %gvk,
            %verb,
            method,
            name = request.name,
            namespace = request.namespace,
            "invoking client method"
        );

        Ok(definition.client().call(method, request))
    }

    fn install_model(
        &mut self,
        definition: ModelDefinition,
    ) -> Result<GroupVersionKind, ParseTypeNameError> {
        let gvk = GroupVersionKind::from_type_name(definition.type_name())?;
        let gvk = self.canonical_key(gvk);

        self.type_index
            .insert(definition.type_name().to_owned(), gvk.clone());
        self.models.insert(gvk.clone(), definition);

        Ok(gvk)
    }

    /// Returns the key of the operation set serving the same kind and version
    /// as `gvk`, or `gvk` itself if there is none.
    fn canonical_key(&self, gvk: GroupVersionKind) -> GroupVersionKind {
        if self.apis.contains_key(&gvk) {
            return gvk;
        }

        self.apis
            .keys()
            .find(|key| key.kind == gvk.kind && key.version == gvk.version)
            .cloned()
            .unwrap_or(gvk)
    }

    fn build_kind_index(&mut self) {
        for gvk in self.apis.keys() {
            match self.kind_index.entry(gvk.kind.clone()) {
                Entry::Vacant(entry) => {
                    entry.insert(gvk.clone());
                }
                Entry::Occupied(mut entry) => {
                    let current = entry.get();
                    if (&gvk.version, &gvk.group) > (&current.version, &current.group) {
                        entry.insert(gvk.clone());
                    }
                }
            }
        }
    }
}

fn complete(definition: ApiDefinition) -> Option<ApiDefinition> {
    if definition.is_complete() {
        Some(definition)
    } else {
        debug!(
            gvk = %definition.group_version_kind(),
            verbs = definition.verbs().count(),
            min_verbs = MIN_VERBS,
            "dropping incomplete operation set"
        );
        None
    }
}

/// Enumerates the methods of `client` and groups them into one operation set
/// per kind, keyed by the normalized kind.
fn discover_operations(
    client: &Arc<dyn ApiClient>,
    group_version: &GroupVersion,
) -> BTreeMap<String, ApiDefinition> {
    let mut methods = client.methods();
    methods.sort();

    let mut operations = BTreeMap::<String, ApiDefinition>::new();

    for method in methods {
        let Some(MethodName {
            verb,
            namespaced,
            kind,
        }) = MethodName::parse(&method)
        else {
            continue;
        };

        let definition = operations.entry(kind).or_insert_with_key(|kind| {
            ApiDefinition::new(group_version.with_kind(kind.as_str()), Arc::clone(client))
        });

        if namespaced || verb == Verb::ListForAllNamespaces {
            definition.set_requires_namespace(true);
        }

        definition.add_action(verb, method);
    }

    operations
}

/// The parts of a verb method name like `list_namespaced_config_map`.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct MethodName {
    pub verb: Verb,
    pub namespaced: bool,

    /// The normalized kind, for example `ConfigMap`.
    pub kind: String,
}

impl MethodName {
    /// Parses a method name. Returns [`None`] for methods which are not verb
    /// implementations, including the `_with_http_info` variants and
    /// collection operations.
    pub(crate) fn parse(method: &str) -> Option<Self> {
        if method.ends_with(HTTP_INFO_SUFFIX) {
            return None;
        }

        let captures = METHOD_NAME_REGEX.captures(method)?;
        let mut verb = Verb::from_str(&captures["verb"]).ok()?;
        let namespaced = captures.name("namespaced").is_some();
        let mut kind = captures.name("kind")?.as_str();

        if kind.starts_with(COLLECTION_PREFIX) {
            return None;
        }

        if let Some(stripped) = kind.strip_suffix(ALL_NAMESPACES_SUFFIX) {
            if verb != Verb::List {
                return None;
            }

            verb = Verb::ListForAllNamespaces;
            kind = stripped;
        }

        if kind.is_empty() {
            return None;
        }

        Some(Self {
            verb,
            namespaced,
            kind: normalize_kind(kind),
        })
    }
}

/// Capitalizes every underscore separated segment and joins them:
/// `config_map` becomes `ConfigMap`.
fn normalize_kind(token: &str) -> String {
    token
        .split('_')
        .flat_map(|segment| {
            let mut chars = segment.chars();
            chars
                .next()
                .into_iter()
                .flat_map(char::to_uppercase)
                .chain(chars.flat_map(char::to_lowercase))
        })
        .collect()
}
