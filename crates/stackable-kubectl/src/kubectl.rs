//! The generic create/read/update/delete/list/apply entry point.
//!
//! Every verb resolves the identity of its target, looks up the operation set
//! in the [`ModelRegistry`] and invokes the matching client method. Remote
//! faults are deserialized into a typed [`Fault`] and returned as
//! [`Outcome::Fault`], so each call has exactly one return channel for
//! results of the remote side. Errors are reserved for local failures, like
//! documents which can't be parsed or kinds which are not registered.
use std::{borrow::Cow, fmt, sync::Arc};

use k8s_gvk::GroupVersionKind;
use snafu::{OptionExt, ResultExt, Snafu, ensure};
use strum::Display;
use tracing::{debug, info, warn};

use crate::{
    api::{ApiClient, ApiException, ApiRequest, Options, Verb},
    document::{self, Document},
    identity::{self, IdentitySource, identity_of},
    model::{Model, ModelDefinition},
    models::{DeleteOptions, Status},
    options::{FIELD_MANAGER_OPTION, KubectlOptions},
    parser::{self, Parser},
    registry::{self, ClientSurface, ModelRegistry},
};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to parse document"))]
    ParseDocument { source: document::Error },

    #[snafu(display("document is empty"))]
    EmptyDocument,

    #[snafu(display("failed to resolve resource identity"))]
    InvalidIdentity { source: identity::Error },

    #[snafu(display("{gvk} resource has no name"))]
    MissingName { gvk: GroupVersionKind },

    #[snafu(display("unsupported resource kind"))]
    UnsupportedKind { source: registry::Error },

    #[snafu(display("failed to deserialize document"))]
    Deserialize { source: parser::Error },

    #[snafu(display("no model type is registered for {gvk}"))]
    UnrepresentableDocument { gvk: GroupVersionKind },
}

/// The input of document based verbs.
#[derive(Debug)]
pub enum Body<'a> {
    /// A serialized YAML or JSON document.
    Text(&'a str),

    /// An already parsed document.
    Document(&'a Document),

    /// An already typed instance.
    Model(Box<dyn Model>),
}

impl Body<'_> {
    pub fn model(model: impl Model) -> Self {
        Self::Model(Box::new(model))
    }
}

impl<'a> From<&'a str> for Body<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a Document> for Body<'a> {
    fn from(document: &'a Document) -> Self {
        Self::Document(document)
    }
}

impl From<Box<dyn Model>> for Body<'_> {
    fn from(model: Box<dyn Model>) -> Self {
        Self::Model(model)
    }
}

/// A kind, either bare or fully qualified.
///
/// Bare kinds resolve to the preferred version, see
/// [`ModelRegistry::resolve_kind`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Kind(String),
    Qualified(GroupVersionKind),
}

impl From<&str> for ResourceKind {
    fn from(kind: &str) -> Self {
        Self::Kind(kind.to_owned())
    }
}

impl From<String> for ResourceKind {
    fn from(kind: String) -> Self {
        Self::Kind(kind)
    }
}

impl From<GroupVersionKind> for ResourceKind {
    fn from(gvk: GroupVersionKind) -> Self {
        Self::Qualified(gvk)
    }
}

/// The target of read and delete calls: a document whose identity, name and
/// namespace are used, or a kind and name.
#[derive(Debug)]
pub enum Target<'a> {
    Body(Body<'a>),
    Named { kind: ResourceKind, name: &'a str },
}

impl<'a> Target<'a> {
    pub fn named(kind: impl Into<ResourceKind>, name: &'a str) -> Self {
        Self::Named {
            kind: kind.into(),
            name,
        }
    }
}

impl<'a> From<Body<'a>> for Target<'a> {
    fn from(body: Body<'a>) -> Self {
        Self::Body(body)
    }
}

impl<'a> From<&'a Document> for Target<'a> {
    fn from(document: &'a Document) -> Self {
        Self::Body(Body::Document(document))
    }
}

/// A remote fault, as returned by a client call.
#[derive(Clone, Debug, PartialEq)]
pub struct Fault {
    /// The HTTP status code.
    pub status: u16,

    /// The HTTP reason phrase.
    pub reason: String,

    /// The deserialized response body, usually a [`Status`]. Absent if the
    /// body is empty or can't be deserialized.
    pub payload: Option<Box<dyn Model>>,
}

impl Fault {
    pub fn status_object(&self) -> Option<&Status> {
        self.payload.as_deref()?.downcast_ref()
    }

    /// The machine readable reason, like `NotFound`. Falls back to the HTTP
    /// reason phrase.
    pub fn reason(&self) -> &str {
        self.status_object()
            .and_then(|status| status.reason.as_deref())
            .unwrap_or(&self.reason)
    }

    /// The human readable message. Falls back to the HTTP reason phrase.
    pub fn message(&self) -> &str {
        self.status_object()
            .and_then(|status| status.message.as_deref())
            .unwrap_or(&self.reason)
    }

    /// Returns `true` if the fault signals that the requested resource does
    /// not exist.
    pub fn is_not_found(&self) -> bool {
        match self.status_object() {
            Some(status) if status.reason.is_some() => status.is_not_found(),
            _ => self.status == 404,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) {}", self.status, self.message())
    }
}

/// The single return channel of all verbs: the typed result or the typed
/// fault of the remote call.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Success(Box<dyn Model>),
    Fault(Fault),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn success(&self) -> Option<&dyn Model> {
        match self {
            Self::Success(model) => Some(model.as_ref()),
            Self::Fault(_) => None,
        }
    }

    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Self::Success(_) => None,
            Self::Fault(fault) => Some(fault),
        }
    }

    /// Returns the result as the concrete model type `T`, if it is one.
    pub fn into_model<T: Model>(self) -> Option<T> {
        match self {
            Self::Success(model) => model.downcast::<T>().map(|model| *model),
            Self::Fault(_) => None,
        }
    }
}

/// The action taken by [`Kubectl::apply`].
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    Created,
    Updated,
}

/// The result of [`Kubectl::apply`].
#[derive(Clone, Debug, PartialEq)]
pub struct Applied {
    /// The identity of the applied document.
    pub gvk: GroupVersionKind,

    /// The action taken. Absent if reading the current state faulted with
    /// anything but not-found, in which case nothing was written.
    pub action: Option<Action>,

    /// The result of the final call.
    pub outcome: Outcome,
}

impl Applied {
    /// A one-line human readable summary, like `deployment.apps/v1 "web"
    /// created`, or the message of the fault.
    pub fn summary(&self) -> String {
        match &self.outcome {
            Outcome::Success(model) => {
                let kind = model.kind().unwrap_or(&self.gvk.kind).to_lowercase();
                let api_version = model.api_version().unwrap_or_default();
                let name = model.name().unwrap_or_default();

                match self.action {
                    Some(action) => format!("{kind}.{api_version} {name:?} {action}"),
                    None => format!("{kind}.{api_version} {name:?}"),
                }
            }
            Outcome::Fault(fault) => fault.message().to_owned(),
        }
    }
}

/// The dispatcher, owning the registry it dispatches through.
#[derive(Debug)]
pub struct Kubectl {
    registry: ModelRegistry,
    options: KubectlOptions,
}

impl Kubectl {
    /// Builds the registry from `surface` and creates a dispatcher on top of
    /// it.
    pub fn new(surface: ClientSurface, options: KubectlOptions) -> Self {
        Self::from_registry(ModelRegistry::new(surface), options)
    }

    pub fn from_registry(registry: ModelRegistry, options: KubectlOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn options(&self) -> &KubectlOptions {
        &self.options
    }

    pub fn parser(&self) -> Parser<'_> {
        Parser::new(&self.registry)
    }

    /// See [`ModelRegistry::register_custom_resource`].
    pub fn register_custom_resource(
        &mut self,
        gvk: GroupVersionKind,
        definition: ModelDefinition,
        client: Option<Arc<dyn ApiClient>>,
    ) {
        self.registry
            .register_custom_resource(gvk, definition, client);
    }

    /// See [`ModelRegistry::register_model`].
    pub fn register_model(
        &mut self,
        definition: ModelDefinition,
    ) -> Result<GroupVersionKind, registry::Error> {
        self.registry.register_model(definition)
    }

    /// Resolves the identity of `body` and turns it into a typed instance.
    pub fn parse_model<'b>(
        &self,
        body: impl Into<Body<'b>>,
    ) -> Result<(GroupVersionKind, Box<dyn Model>)> {
        match body.into() {
            Body::Text(text) => {
                let document = document::parse(text)
                    .context(ParseDocumentSnafu)?
                    .context(EmptyDocumentSnafu)?;
                self.parse_document(&document)
            }
            Body::Document(document) => self.parse_document(document),
            Body::Model(model) => {
                let gvk = identity_of(IdentitySource::Model(model.as_ref()))
                    .context(InvalidIdentitySnafu)?;
                Ok((gvk, model))
            }
        }
    }

    /// Creates the resource described by `body`.
    ///
    /// The namespace of the document takes precedence over `namespace`, which
    /// takes precedence over the default namespace. It is only passed on for
    /// namespaced kinds.
    pub fn create_resource<'b>(
        &self,
        body: impl Into<Body<'b>>,
        namespace: Option<&str>,
        options: &Options,
    ) -> Result<Outcome> {
        let (gvk, model) = self.parse_model(body)?;
        let namespace = self.namespace_for(model.namespace(), namespace);

        self.create(&gvk, model.as_ref(), namespace, options)
    }

    /// Replaces the resource described by `body`. The document must be named.
    pub fn update_resource<'b>(
        &self,
        body: impl Into<Body<'b>>,
        namespace: Option<&str>,
        options: &Options,
    ) -> Result<Outcome> {
        let (gvk, model) = self.parse_model(body)?;
        let name = model
            .name()
            .context(MissingNameSnafu { gvk: gvk.clone() })?;
        let namespace = self.namespace_for(model.namespace(), namespace);

        self.replace(&gvk, model.as_ref(), name, namespace, options)
    }

    pub fn read_resource<'b>(
        &self,
        target: impl Into<Target<'b>>,
        namespace: Option<&str>,
        options: &Options,
    ) -> Result<Outcome> {
        match target.into() {
            Target::Body(body) => {
                let (gvk, model) = self.parse_model(body)?;
                let name = model
                    .name()
                    .context(MissingNameSnafu { gvk: gvk.clone() })?;
                let namespace = self.namespace_for(model.namespace(), namespace);

                self.read(&gvk, name, namespace, options)
            }
            Target::Named { kind, name } => {
                let gvk = self.resolve_kind(kind)?;
                let namespace = self.namespace_for(None, namespace);

                self.read(&gvk, name, namespace, options)
            }
        }
    }

    /// Deletes the target. A [`DeleteOptions`] body is sent along.
    pub fn delete_resource<'b>(
        &self,
        target: impl Into<Target<'b>>,
        namespace: Option<&str>,
        options: &Options,
    ) -> Result<Outcome> {
        match target.into() {
            Target::Body(body) => {
                let (gvk, model) = self.parse_model(body)?;
                let name = model
                    .name()
                    .context(MissingNameSnafu { gvk: gvk.clone() })?;
                let namespace = self.namespace_for(model.namespace(), namespace);

                self.delete(&gvk, name, namespace, options)
            }
            Target::Named { kind, name } => {
                let gvk = self.resolve_kind(kind)?;
                let namespace = self.namespace_for(None, namespace);

                self.delete(&gvk, name, namespace, options)
            }
        }
    }

    /// Lists all resources of `kind` in `namespace` (or the default
    /// namespace) for namespaced kinds, or all resources of cluster scoped
    /// kinds.
    pub fn list_resource(
        &self,
        kind: impl Into<ResourceKind>,
        namespace: Option<&str>,
        options: &Options,
    ) -> Result<Outcome> {
        let gvk = self.resolve_kind(kind.into())?;
        let namespace = self.namespace_for(None, namespace);
        let request = ApiRequest::new(options).with_namespace(Some(namespace));

        self.dispatch(&gvk, Verb::List, request)
    }

    pub fn list_resource_all_namespaces(
        &self,
        kind: impl Into<ResourceKind>,
        options: &Options,
    ) -> Result<Outcome> {
        let gvk = self.resolve_kind(kind.into())?;

        self.dispatch(&gvk, Verb::ListForAllNamespaces, ApiRequest::new(options))
    }

    /// Creates the resource described by `body` if it doesn't exist yet, or
    /// replaces it otherwise.
    ///
    /// The current state is read first. If the read faults with not-found,
    /// the resource is created. Otherwise the metadata of the current state
    /// (including the resource version) is copied onto the document, which is
    /// then used to replace the resource. Any other read fault is returned
    /// without writing anything.
    pub fn apply<'b>(&self, body: impl Into<Body<'b>>) -> Result<Applied> {
        let (gvk, mut model) = self.parse_model(body)?;
        let name = model
            .name()
            .context(MissingNameSnafu { gvk: gvk.clone() })?
            .to_owned();
        let namespace = self.namespace_for(model.namespace(), None).to_owned();
        let options = Options::new();

        let (action, outcome) = match self.read(&gvk, &name, &namespace, &options)? {
            Outcome::Fault(fault) if fault.is_not_found() => (
                Some(Action::Created),
                self.create(&gvk, model.as_ref(), &namespace, &options)?,
            ),
            Outcome::Fault(fault) => (None, Outcome::Fault(fault)),
            Outcome::Success(current) => {
                model.set_metadata(current.metadata().cloned());
                (
                    Some(Action::Updated),
                    self.replace(&gvk, model.as_ref(), &name, &namespace, &options)?,
                )
            }
        };

        let applied = Applied {
            gvk,
            action,
            outcome,
        };

        match &applied.outcome {
            Outcome::Success(_) => info!(summary = %applied.summary(), "applied resource"),
            Outcome::Fault(fault) => info!(
                gvk = %applied.gvk,
                status = fault.status,
                summary = %applied.summary(),
                "failed to apply resource"
            ),
        }

        Ok(applied)
    }

    fn parse_document(&self, document: &Document) -> Result<(GroupVersionKind, Box<dyn Model>)> {
        ensure!(!document.is_empty(), EmptyDocumentSnafu);

        let gvk = identity_of(document).context(InvalidIdentitySnafu)?;
        let model = self
            .parser()
            .parse(document)
            .context(DeserializeSnafu)?
            .context(UnrepresentableDocumentSnafu { gvk: gvk.clone() })?;

        Ok((gvk, model))
    }

    fn resolve_kind(&self, kind: ResourceKind) -> Result<GroupVersionKind> {
        match kind {
            ResourceKind::Kind(kind) => self
                .registry
                .resolve_kind(&kind)
                .cloned()
                .context(UnsupportedKindSnafu),
            ResourceKind::Qualified(gvk) => Ok(gvk),
        }
    }

    fn namespace_for<'a>(
        &'a self,
        document_namespace: Option<&'a str>,
        namespace: Option<&'a str>,
    ) -> &'a str {
        document_namespace
            .or(namespace)
            .unwrap_or(&self.options.default_namespace)
    }

    /// Adds the configured field manager unless the caller passed one.
    fn mutating_options<'a>(&self, options: &'a Options) -> Cow<'a, Options> {
        match &self.options.field_manager {
            Some(field_manager) if !options.contains_key(FIELD_MANAGER_OPTION) => {
                let mut options = options.clone();
                options.insert(
                    FIELD_MANAGER_OPTION.to_owned(),
                    serde_json::Value::String(field_manager.clone()),
                );
                Cow::Owned(options)
            }
            _ => Cow::Borrowed(options),
        }
    }

    fn create(
        &self,
        gvk: &GroupVersionKind,
        model: &dyn Model,
        namespace: &str,
        options: &Options,
    ) -> Result<Outcome> {
        let options = self.mutating_options(options);
        let request = ApiRequest::new(&options)
            .with_namespace(Some(namespace))
            .with_body(model);

        self.dispatch(gvk, Verb::Create, request)
    }

    fn replace(
        &self,
        gvk: &GroupVersionKind,
        model: &dyn Model,
        name: &str,
        namespace: &str,
        options: &Options,
    ) -> Result<Outcome> {
        let options = self.mutating_options(options);
        let request = ApiRequest::new(&options)
            .with_name(name)
            .with_namespace(Some(namespace))
            .with_body(model);

        self.dispatch(gvk, Verb::Replace, request)
    }

    fn read(
        &self,
        gvk: &GroupVersionKind,
        name: &str,
        namespace: &str,
        options: &Options,
    ) -> Result<Outcome> {
        let request = ApiRequest::new(options)
            .with_name(name)
            .with_namespace(Some(namespace));

        self.dispatch(gvk, Verb::Read, request)
    }

    fn delete(
        &self,
        gvk: &GroupVersionKind,
        name: &str,
        namespace: &str,
        options: &Options,
    ) -> Result<Outcome> {
        let delete_options = DeleteOptions {
            api_version: Some("v1".to_owned()),
            kind: Some("DeleteOptions".to_owned()),
            ..DeleteOptions::default()
        };
        let request = ApiRequest::new(options)
            .with_name(name)
            .with_namespace(Some(namespace))
            .with_body(&delete_options);

        self.dispatch(gvk, Verb::Delete, request)
    }

    fn dispatch(
        &self,
        gvk: &GroupVersionKind,
        verb: Verb,
        request: ApiRequest<'_>,
    ) -> Result<Outcome> {
        let response = self
            .registry
            .invoke(gvk, verb, request)
            .context(UnsupportedKindSnafu)?;

        Ok(match response {
            Ok(model) => Outcome::Success(model),
            Err(exception) => Outcome::Fault(self.fault(gvk, verb, exception)),
        })
    }

    fn fault(&self, gvk: &GroupVersionKind, verb: Verb, exception: ApiException) -> Fault {
        debug!(
            %gvk,
            %verb,
            status = exception.status,
            reason = %exception.reason,
            "client call faulted"
        );

        let payload = match exception.body.as_deref() {
            Some(body) => self.parser().parse_str(body).unwrap_or_else(|error| {
                warn!(
                    error = &error as &dyn std::error::Error,
                    %gvk,
                    %verb,
                    "failed to deserialize fault payload"
                );
                None
            }),
            None => None,
        };

        Fault {
            status: exception.status,
            reason: exception.reason,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use rstest::rstest;

    use super::*;
    use crate::{
        api::ApiResponse,
        fixtures::{Cluster, ConfigMap, CronTab, CronTabSpec, Namespace, Pod, PodList, cluster},
        model::ModelType,
        models::ObjectMeta,
    };

    const POD: &str = indoc! {"
        apiVersion: v1
        kind: Pod
        metadata:
          name: web
        spec:
          containers:
            - name: nginx
              image: nginx:1.27
    "};

    fn kubectl(cluster: &Cluster) -> Kubectl {
        Kubectl::new(cluster.surface(), KubectlOptions::default())
    }

    #[rstest]
    #[case::default_namespace(POD, None, "default")]
    #[case::caller_namespace(POD, Some("prod"), "prod")]
    #[case::document_namespace(
        "apiVersion: v1\nkind: Pod\nmetadata:\n  name: web\n  namespace: staging\n",
        Some("prod"),
        "staging"
    )]
    fn namespace_precedence(
        cluster: Cluster,
        #[case] body: &str,
        #[case] namespace: Option<&str>,
        #[case] expected: &str,
    ) {
        let kubectl = kubectl(&cluster);

        let outcome = kubectl
            .create_resource(body, namespace, &Options::new())
            .expect("pod must be dispatched");
        assert!(outcome.is_success());

        let calls = cluster.core.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "create_namespaced_pod");
        assert_eq!(calls[0].namespace.as_deref(), Some(expected));
    }

    #[rstest]
    fn configured_default_namespace(cluster: Cluster) {
        let kubectl = Kubectl::new(cluster.surface(), KubectlOptions {
            default_namespace: "tenant".into(),
            field_manager: None,
        });

        kubectl
            .list_resource("Pod", None, &Options::new())
            .expect("pods must be listed");

        assert_eq!(cluster.core.calls()[0].namespace.as_deref(), Some("tenant"));
    }

    #[rstest]
    fn cluster_scoped_kinds_take_no_namespace(cluster: Cluster) {
        let kubectl = kubectl(&cluster);

        let outcome = kubectl
            .create_resource(
                "apiVersion: v1\nkind: Namespace\nmetadata:\n  name: prod\n",
                Some("ignored"),
                &Options::new(),
            )
            .expect("namespace must be dispatched");

        let namespace: Namespace = outcome.into_model().expect("result must be a namespace");
        assert_eq!(
            namespace.metadata.and_then(|metadata| metadata.resource_version),
            Some("1".into())
        );
        assert_eq!(cluster.core.calls()[0].namespace, None);
    }

    #[rstest]
    fn faults_are_data(cluster: Cluster) {
        let kubectl = kubectl(&cluster);

        let outcome = kubectl
            .read_resource(Target::named("Pod", "missing"), None, &Options::new())
            .expect("pod must be dispatched");

        let fault = outcome.fault().expect("missing pods must fault");
        assert_eq!(fault.status, 404);
        assert!(fault.is_not_found());
        assert_eq!(fault.reason(), "NotFound");
        assert_eq!(fault.message(), "Pod \"missing\": NotFound");
        assert_eq!(
            fault.status_object().and_then(|status| status.code),
            Some(404)
        );
    }

    #[rstest]
    fn apply_creates_missing_resources(cluster: Cluster) {
        let kubectl = kubectl(&cluster);

        let applied = kubectl.apply(POD).expect("pod must be applied");

        assert_eq!(applied.action, Some(Action::Created));
        assert_eq!(applied.summary(), "pod.v1 \"web\" created");
        assert_eq!(
            cluster.core.methods_called(),
            ["read_namespaced_pod", "create_namespaced_pod"]
        );
    }

    #[rstest]
    fn apply_updates_existing_resources(cluster: Cluster) {
        let kubectl = kubectl(&cluster);
        kubectl.apply(POD).expect("pod must be applied");

        for expected_version in ["2", "3"] {
            let applied = kubectl.apply(POD).expect("pod must be applied");

            assert_eq!(applied.action, Some(Action::Updated));
            assert_eq!(applied.summary(), "pod.v1 \"web\" updated");

            let pod: Pod = applied.outcome.into_model().expect("result must be a pod");
            let metadata = pod.metadata.expect("metadata must be present");
            assert_eq!(metadata.resource_version.as_deref(), Some(expected_version));
            assert_eq!(metadata.uid.as_deref(), Some("uid-1"));
        }

        assert_eq!(
            cluster.core.methods_called(),
            [
                "read_namespaced_pod",
                "create_namespaced_pod",
                "read_namespaced_pod",
                "replace_namespaced_pod",
                "read_namespaced_pod",
                "replace_namespaced_pod",
            ]
        );
    }

    /// A client which rejects every call.
    struct ForbiddenApi;

    impl ApiClient for ForbiddenApi {
        fn type_name(&self) -> &str {
            "CoreV1Api"
        }

        fn methods(&self) -> Vec<String> {
            ["create", "read", "replace", "delete", "list"]
                .into_iter()
                .map(|verb| format!("{verb}_namespace"))
                .collect()
        }

        fn call(&self, _method: &str, _request: ApiRequest<'_>) -> ApiResponse {
            Err(ApiException::new(403, "Forbidden", None))
        }
    }

    #[test]
    fn apply_surfaces_other_read_faults() {
        let surface = ClientSurface::new()
            .with_api(ForbiddenApi)
            .with_model::<Namespace>();
        let kubectl = Kubectl::new(surface, KubectlOptions::default());

        let applied = kubectl
            .apply("apiVersion: v1\nkind: Namespace\nmetadata:\n  name: prod\n")
            .expect("namespace must be dispatched");

        assert_eq!(applied.action, None);
        let fault = applied.outcome.fault().expect("read must fault");
        assert_eq!(fault.status, 403);
        assert!(fault.payload.is_none());
        assert!(!fault.is_not_found());
        assert_eq!(applied.summary(), "Forbidden");
    }

    #[rstest]
    fn update_with_stale_version_faults(cluster: Cluster) {
        let kubectl = kubectl(&cluster);
        kubectl
            .create_resource(POD, None, &Options::new())
            .expect("pod must be created");

        let stale = indoc! {"
            apiVersion: v1
            kind: Pod
            metadata:
              name: web
              resourceVersion: \"7\"
        "};
        let outcome = kubectl
            .update_resource(stale, None, &Options::new())
            .expect("pod must be dispatched");

        let fault = outcome.fault().expect("stale updates must fault");
        assert_eq!(fault.status, 409);
        assert_eq!(fault.reason(), "Conflict");
    }

    #[rstest]
    fn update_requires_name(cluster: Cluster) {
        let kubectl = kubectl(&cluster);

        let result = kubectl.update_resource(
            "apiVersion: v1\nkind: Pod\nspec:\n  nodeName: node-1\n",
            None,
            &Options::new(),
        );
        assert!(matches!(result, Err(Error::MissingName { .. })));
    }

    #[rstest]
    fn delete_by_name_and_by_document(cluster: Cluster) {
        let kubectl = kubectl(&cluster);
        kubectl
            .create_resource(POD, Some("prod"), &Options::new())
            .expect("pod must be created");

        let outcome = kubectl
            .delete_resource(Target::named("Pod", "web"), Some("prod"), &Options::new())
            .expect("pod must be dispatched");
        let status = outcome
            .success()
            .and_then(|model| model.downcast_ref::<Status>())
            .expect("deletion must succeed");
        assert_eq!(status.status.as_deref(), Some("Success"));
        assert!(cluster.core.stored("Pod", Some("prod"), "web").is_none());

        let document = document::parse(POD)
            .expect("document must parse")
            .expect("document must not be empty");
        let outcome = kubectl
            .delete_resource(&document, None, &Options::new())
            .expect("pod must be dispatched");
        assert!(outcome.fault().is_some_and(Fault::is_not_found));

        let calls = cluster.core.calls();
        assert_eq!(calls[1].method, "delete_namespaced_pod");
        assert_eq!(calls[1].name.as_deref(), Some("web"));
        assert_eq!(calls[1].body.as_deref(), Some("V1DeleteOptions"));
        assert_eq!(calls[2].namespace.as_deref(), Some("default"));
    }

    #[rstest]
    fn list(cluster: Cluster) {
        let kubectl = kubectl(&cluster);
        for namespace in ["prod", "staging"] {
            kubectl
                .create_resource(POD, Some(namespace), &Options::new())
                .expect("pod must be created");
        }

        let pods: PodList = kubectl
            .list_resource("Pod", Some("prod"), &Options::new())
            .expect("pods must be listed")
            .into_model()
            .expect("result must be a pod list");
        assert_eq!(pods.items.map(|items| items.len()), Some(1));

        let pods: PodList = kubectl
            .list_resource_all_namespaces("Pod", &Options::new())
            .expect("pods must be listed")
            .into_model()
            .expect("result must be a pod list");
        let namespaces: Vec<_> = pods
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(|pod| pod.metadata.and_then(|metadata| metadata.namespace))
            .collect();
        assert_eq!(namespaces, ["prod", "staging"]);

        let calls = cluster.core.calls();
        assert_eq!(calls[2].method, "list_namespaced_pod");
        assert_eq!(calls[3].method, "list_pod_for_all_namespaces");
        assert_eq!(calls[3].namespace, None);
    }

    #[rstest]
    fn unsupported_kinds(cluster: Cluster) {
        let kubectl = kubectl(&cluster);

        let result = kubectl.read_resource(Target::named("Job", "backup"), None, &Options::new());
        assert!(matches!(
            result,
            Err(Error::UnsupportedKind {
                source: registry::Error::UnknownKind { .. }
            })
        ));

        let result = kubectl.create_resource(
            "apiVersion: batch/v1\nkind: Job\nmetadata:\n  name: backup\n",
            None,
            &Options::new(),
        );
        assert!(matches!(result, Err(Error::UnrepresentableDocument { .. })));

        // Status models are known, but there are no operations for them
        let result = kubectl.create_resource(
            "apiVersion: v1\nkind: Status\nstatus: Success\n",
            None,
            &Options::new(),
        );
        assert!(matches!(
            result,
            Err(Error::UnsupportedKind {
                source: registry::Error::UnsupportedKind { .. }
            })
        ));
    }

    #[rstest]
    #[case::empty("", "document is empty")]
    #[case::no_kind("metadata:\n  name: web\n", "failed to resolve resource identity")]
    #[case::invalid_yaml("kind: [Pod", "failed to parse document")]
    fn invalid_documents(cluster: Cluster, #[case] body: &str, #[case] message: &str) {
        let kubectl = kubectl(&cluster);

        let err = kubectl
            .create_resource(body, None, &Options::new())
            .expect_err("document must be rejected");
        assert_eq!(err.to_string(), message);
        assert!(cluster.core.calls().is_empty());
    }

    #[rstest]
    fn qualified_kinds(cluster: Cluster) {
        let kubectl = kubectl(&cluster);

        kubectl
            .read_resource(
                Target::named(GroupVersionKind::new("Apps", "V1", "Deployment"), "web"),
                None,
                &Options::new(),
            )
            .expect("deployment must be dispatched");
        kubectl
            .read_resource(Target::named("Deployment", "web"), None, &Options::new())
            .expect("deployment must be dispatched");

        assert_eq!(cluster.apps.methods_called(), ["read_namespaced_deployment"]);
        assert_eq!(
            cluster.apps_v1beta1.methods_called(),
            ["read_namespaced_deployment"]
        );
    }

    #[rstest]
    fn typed_bodies(cluster: Cluster) {
        let kubectl = kubectl(&cluster);
        let config_map = ConfigMap {
            api_version: Some("v1".into()),
            kind: Some("ConfigMap".into()),
            metadata: Some(ObjectMeta {
                name: Some("settings".into()),
                ..ObjectMeta::default()
            }),
            data: Some([("mode".to_owned(), "fast".to_owned())].into()),
            immutable: None,
        };

        let outcome = kubectl
            .create_resource(Body::model(config_map), None, &Options::new())
            .expect("config map must be dispatched");
        assert!(outcome.is_success());

        let outcome = kubectl
            .read_resource(Target::named("ConfigMap", "settings"), None, &Options::new())
            .expect("config map must be dispatched");
        let config_map: ConfigMap = outcome.into_model().expect("result must be a config map");
        assert_eq!(
            config_map.data.and_then(|data| data.get("mode").cloned()),
            Some("fast".into())
        );
    }

    #[rstest]
    #[case::configured(None, Some("kubectl"))]
    #[case::overridden(Some("operator"), Some("operator"))]
    fn field_manager(
        cluster: Cluster,
        #[case] requested: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let kubectl = Kubectl::new(cluster.surface(), KubectlOptions {
            field_manager: Some("kubectl".into()),
            ..KubectlOptions::default()
        });

        let mut options = Options::new();
        if let Some(requested) = requested {
            options.insert(FIELD_MANAGER_OPTION.into(), requested.into());
        }

        kubectl
            .create_resource(POD, None, &options)
            .expect("pod must be dispatched");
        kubectl
            .read_resource(Target::named("Pod", "web"), None, &options)
            .expect("pod must be dispatched");

        let calls = cluster.core.calls();
        assert_eq!(
            calls[0].options[FIELD_MANAGER_OPTION].as_str(),
            expected
        );
        assert_eq!(
            calls[1].options.get(FIELD_MANAGER_OPTION).and_then(|value| value.as_str()),
            requested
        );
    }

    #[rstest]
    fn custom_resources(cluster: Cluster) {
        let mut kubectl = kubectl(&cluster);
        kubectl.register_custom_resource(
            GroupVersionKind::new("StableExampleCom", "V1", "CronTab"),
            CronTab::definition(),
            Some(cluster.cron_tabs.clone() as Arc<dyn ApiClient>),
        );
        kubectl
            .register_model(CronTabSpec::definition())
            .expect("type name must carry an identity");

        let applied = kubectl
            .apply(indoc! {"
                apiVersion: stable.example.com/v1
                kind: CronTab
                metadata:
                  name: nightly
                spec:
                  cronSpec: '0 3 * * *'
                  replicas: 2
            "})
            .expect("cron tab must be applied");

        assert_eq!(
            applied.summary(),
            "crontab.stable.example.com/v1 \"nightly\" created"
        );
        let cron_tab: CronTab = applied.outcome.into_model().expect("result must be a cron tab");
        assert_eq!(
            cron_tab.spec.and_then(|spec| spec.replicas),
            Some(2)
        );
        assert_eq!(
            cluster.cron_tabs.methods_called(),
            ["read_namespaced_cron_tab", "create_namespaced_cron_tab"]
        );
    }
}
