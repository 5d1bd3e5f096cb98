//! An in-memory client surface with a handful of core, apps and batch kinds
//! and a custom resource.
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use jiff::civil::Date;
use rstest::fixture;

use crate::{
    api::{ApiClient, ApiException, ApiRequest, ApiResponse, Verb},
    model::Model,
    models::{ListMeta, Status},
    registry::{ClientSurface, MethodName},
};

crate::model! {
    pub resource Pod => "V1Pod" {
        spec: PodSpec => "spec",
    }
}

crate::model! {
    pub struct PodSpec => "V1PodSpec" {
        containers: Vec<Container> => "containers",
        node_name: String => "nodeName",
        restart_policy: String => "restartPolicy",
    }
}

crate::model! {
    pub struct Container => "V1Container" {
        name: String => "name",
        image: String => "image",
        args: Vec<String> => "args",
        ports: Vec<ContainerPort> => "ports",
    }
}

crate::model! {
    pub struct ContainerPort => "V1ContainerPort" {
        container_port: i32 => "containerPort",
        protocol: String => "protocol",
    }
}

crate::model! {
    pub typed PodList => "V1PodList" {
        metadata: ListMeta => "metadata",
        items: Vec<Pod> => "items",
    }
}

crate::model! {
    pub resource Namespace => "V1Namespace" {}
}

crate::model! {
    pub resource ConfigMap => "V1ConfigMap" {
        data: BTreeMap<String, String> => "data",
        immutable: bool => "immutable",
    }
}

crate::model! {
    pub resource Deployment => "V1Deployment" {
        spec: DeploymentSpec => "spec",
    }
}

crate::model! {
    pub resource DeploymentV1beta1 => "AppsV1beta1Deployment" {
        spec: DeploymentSpec => "spec",
    }
}

crate::model! {
    pub struct DeploymentSpec => "V1DeploymentSpec" {
        replicas: i32 => "replicas",
    }
}

crate::model! {
    pub resource CronTab => "StableExampleComV1CronTab" {
        spec: CronTabSpec => "spec",
    }
}

crate::model! {
    pub struct CronTabSpec => "StableExampleComV1CronTabSpec" {
        cron_spec: String => "cronSpec",
        image: String => "image",
        replicas: i32 => "replicas",
        start: Date => "start",
    }
}

/// Builds the list result of a list call from the stored items.
type ListFn = fn(Vec<Box<dyn Model>>) -> Box<dyn Model>;

/// A single recorded client call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub method: String,
    pub name: Option<String>,
    pub namespace: Option<String>,

    /// The type name of the body, if any.
    pub body: Option<String>,
    pub options: BTreeMap<String, serde_json::Value>,
}

type StoreKey = (String, Option<String>, String);

/// A generated API client backed by a map.
///
/// Every call is recorded. Stored resources get a `uid` and a
/// `resourceVersion` which is bumped on every replace. Replace calls with a
/// stale resource version fail with a conflict.
#[derive(Debug)]
pub struct InMemoryApi {
    type_name: &'static str,
    methods: Vec<String>,
    lists: BTreeMap<String, ListFn>,
    store: Mutex<BTreeMap<StoreKey, Box<dyn Model>>>,
    calls: Mutex<Vec<Call>>,
}

impl InMemoryApi {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            methods: Vec::new(),
            lists: BTreeMap::new(),
            store: Mutex::default(),
            calls: Mutex::default(),
        }
    }

    pub fn with_methods(mut self, methods: &[&str]) -> Self {
        self.methods
            .extend(methods.iter().map(|method| (*method).to_owned()));
        self
    }

    pub fn with_list(mut self, kind: &str, list: ListFn) -> Self {
        self.lists.insert(kind.to_owned(), list);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    pub fn methods_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.method).collect()
    }

    pub fn stored(&self, kind: &str, namespace: Option<&str>, name: &str) -> Option<Box<dyn Model>> {
        let key = (kind.to_owned(), namespace.map(str::to_owned), name.to_owned());
        self.store
            .lock()
            .expect("store lock poisoned")
            .get(&key)
            .cloned()
    }

    /// Stores `model` directly, bypassing the recorded calls.
    pub fn insert(&self, kind: &str, model: Box<dyn Model>) {
        let name = model.name().expect("stored resources must be named").to_owned();
        let key = (kind.to_owned(), model.namespace().map(str::to_owned), name);
        self.store
            .lock()
            .expect("store lock poisoned")
            .insert(key, model);
    }

    fn record(&self, method: &str, request: &ApiRequest<'_>) {
        self.calls.lock().expect("calls lock poisoned").push(Call {
            method: method.to_owned(),
            name: request.name.map(str::to_owned),
            namespace: request.namespace.map(str::to_owned),
            body: request.body.map(|body| body.type_name().to_owned()),
            options: request.options.clone(),
        });
    }
}

impl ApiClient for InMemoryApi {
    fn type_name(&self) -> &str {
        self.type_name
    }

    fn methods(&self) -> Vec<String> {
        self.methods.clone()
    }

    fn call(&self, method: &str, request: ApiRequest<'_>) -> ApiResponse {
        self.record(method, &request);

        let MethodName { verb, kind, .. } =
            MethodName::parse(method).expect("only verb methods are invoked");
        let namespace = request.namespace.map(str::to_owned);
        let mut store = self.store.lock().expect("store lock poisoned");

        match verb {
            Verb::Create => {
                let mut model = request.body.expect("create requires a body").clone_model();
                let name = model.name().expect("created resources must be named").to_owned();
                let key = (kind.clone(), namespace.clone(), name.clone());
                if store.contains_key(&key) {
                    return Err(fault(409, "AlreadyExists", &kind, &name));
                }

                let mut metadata = model.metadata().cloned().unwrap_or_default();
                metadata.namespace = namespace;
                metadata.uid = Some(format!("uid-{}", store.len() + 1));
                metadata.resource_version = Some("1".to_owned());
                model.set_metadata(Some(metadata));

                store.insert(key, model.clone());
                Ok(model)
            }
            Verb::Read => {
                let name = request.name.expect("read requires a name");
                let key = (kind.clone(), namespace, name.to_owned());
                store
                    .get(&key)
                    .cloned()
                    .ok_or_else(|| fault(404, "NotFound", &kind, name))
            }
            Verb::Replace => {
                let name = request.name.expect("replace requires a name");
                let key = (kind.clone(), namespace, name.to_owned());
                let Some(current) = store.get(&key) else {
                    return Err(fault(404, "NotFound", &kind, name));
                };

                let mut model = request.body.expect("replace requires a body").clone_model();
                let current_version = resource_version(current.as_ref());
                if resource_version(model.as_ref()) != current_version {
                    return Err(fault(409, "Conflict", &kind, name));
                }

                let mut metadata = model.metadata().cloned().unwrap_or_default();
                metadata.resource_version = Some((current_version + 1).to_string());
                model.set_metadata(Some(metadata));

                store.insert(key, model.clone());
                Ok(model)
            }
            Verb::Delete => {
                let name = request.name.expect("delete requires a name");
                let key = (kind.clone(), namespace, name.to_owned());
                match store.remove(&key) {
                    Some(_) => Ok(Box::new(Status {
                        api_version: Some("v1".to_owned()),
                        kind: Some("Status".to_owned()),
                        status: Some("Success".to_owned()),
                        ..Status::default()
                    })),
                    None => Err(fault(404, "NotFound", &kind, name)),
                }
            }
            Verb::List | Verb::ListForAllNamespaces => {
                let items = store
                    .iter()
                    .filter(|((item_kind, item_namespace, _), _)| {
                        *item_kind == kind
                            && (verb == Verb::ListForAllNamespaces || *item_namespace == namespace)
                    })
                    .map(|(_, model)| model.clone())
                    .collect();
                let list = self.lists.get(&kind).expect("list type must be registered");
                Ok(list(items))
            }
        }
    }
}

fn resource_version(model: &dyn Model) -> u64 {
    model
        .metadata()
        .and_then(|metadata| metadata.resource_version.as_deref())
        .and_then(|version| version.parse().ok())
        .unwrap_or_default()
}

/// Builds a fault carrying a serialized [`Status`], like the API server does.
fn fault(code: u16, reason: &str, kind: &str, name: &str) -> ApiException {
    let status = Status {
        api_version: Some("v1".to_owned()),
        kind: Some("Status".to_owned()),
        status: Some("Failure".to_owned()),
        message: Some(format!("{kind} {name:?}: {reason}")),
        reason: Some(reason.to_owned()),
        code: Some(i32::from(code)),
        ..Status::default()
    };
    let body = serde_json::to_string(&status.to_document()).expect("status must serialize");

    ApiException::new(code, reason, Some(body))
}

fn pod_list(items: Vec<Box<dyn Model>>) -> Box<dyn Model> {
    Box::new(PodList {
        api_version: Some("v1".to_owned()),
        kind: Some("PodList".to_owned()),
        metadata: Some(ListMeta::default()),
        items: Some(
            items
                .into_iter()
                .filter_map(|item| item.downcast::<Pod>())
                .map(|pod| *pod)
                .collect(),
        ),
    })
}

fn empty_list(_: Vec<Box<dyn Model>>) -> Box<dyn Model> {
    Box::new(Status {
        api_version: Some("v1".to_owned()),
        kind: Some("Status".to_owned()),
        status: Some("Success".to_owned()),
        ..Status::default()
    })
}

/// The clients of a small cluster, shared with the registry under test so
/// their recorded calls can be inspected.
pub struct Cluster {
    pub core: Arc<InMemoryApi>,
    pub apps: Arc<InMemoryApi>,
    pub apps_v1beta1: Arc<InMemoryApi>,
    pub batch: Arc<InMemoryApi>,
    pub cron_tabs: Arc<InMemoryApi>,
}

impl Cluster {
    /// The surface of the core, apps and batch clients. The custom resource
    /// client is registered separately.
    pub fn surface(&self) -> ClientSurface {
        ClientSurface::new()
            .with_shared_api(self.core.clone())
            .with_shared_api(self.apps.clone())
            .with_shared_api(self.apps_v1beta1.clone())
            .with_shared_api(self.batch.clone())
            .with_api(InMemoryApi::new("CoreApi").with_methods(&["get_api_versions"]))
            .with_model::<Pod>()
            .with_model::<PodSpec>()
            .with_model::<Container>()
            .with_model::<ContainerPort>()
            .with_model::<PodList>()
            .with_model::<Namespace>()
            .with_model::<ConfigMap>()
            .with_model::<Deployment>()
            .with_model::<DeploymentV1beta1>()
            .with_model::<DeploymentSpec>()
    }
}

#[fixture]
pub fn cluster() -> Cluster {
    let core = InMemoryApi::new("CoreV1Api")
        .with_methods(&[
            "create_namespaced_pod",
            "create_namespaced_pod_with_http_info",
            "read_namespaced_pod",
            "replace_namespaced_pod",
            "delete_namespaced_pod",
            "delete_collection_namespaced_pod",
            "list_namespaced_pod",
            "list_pod_for_all_namespaces",
            "list_pod_for_all_namespaces_with_http_info",
            "patch_namespaced_pod",
            "read_namespaced_pod_status",
            "replace_namespaced_pod_status",
            "read_namespaced_pod_log",
            "create_namespaced_pod_binding",
            "connect_get_namespaced_pod_proxy",
            "create_namespace",
            "read_namespace",
            "replace_namespace",
            "delete_namespace",
            "list_namespace",
            "create_namespaced_config_map",
            "read_namespaced_config_map",
            "replace_namespaced_config_map",
            "delete_namespaced_config_map",
            "list_namespaced_config_map",
            "list_config_map_for_all_namespaces",
            "get_api_resources",
        ])
        .with_list("Pod", pod_list)
        .with_list("Namespace", empty_list)
        .with_list("ConfigMap", empty_list);

    let apps = InMemoryApi::new("AppsV1Api").with_methods(&[
        "create_namespaced_deployment",
        "read_namespaced_deployment",
        "replace_namespaced_deployment",
        "delete_namespaced_deployment",
        "list_namespaced_deployment",
        "list_deployment_for_all_namespaces",
    ]);

    let apps_v1beta1 = InMemoryApi::new("AppsV1beta1Api").with_methods(&[
        "create_namespaced_deployment",
        "read_namespaced_deployment",
        "replace_namespaced_deployment",
        "delete_namespaced_deployment",
        "list_namespaced_deployment",
        "list_deployment_for_all_namespaces",
    ]);

    let batch = InMemoryApi::new("BatchV1Api").with_methods(&[
        "create_namespaced_job",
        "read_namespaced_job",
        "replace_namespaced_job",
        "delete_namespaced_job",
    ]);

    let cron_tabs = InMemoryApi::new("StableExampleComV1Api").with_methods(&[
        "create_namespaced_cron_tab",
        "read_namespaced_cron_tab",
        "replace_namespaced_cron_tab",
        "delete_namespaced_cron_tab",
        "list_namespaced_cron_tab",
    ]);

    Cluster {
        core: Arc::new(core),
        apps: Arc::new(apps),
        apps_v1beta1: Arc::new(apps_v1beta1),
        batch: Arc::new(batch),
        cron_tabs: Arc::new(cron_tabs),
    }
}
