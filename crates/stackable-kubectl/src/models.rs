//! Meta models shared by every resource kind.
//!
//! These are part of every registry regardless of the client surface:
//! [`ObjectMeta`] carries the name and namespace the dispatcher needs,
//! [`Status`] is the typed form of remote faults and [`DeleteOptions`] is the
//! body of every delete call.
use std::collections::BTreeMap;

use jiff::Timestamp;

use crate::model::{ModelDefinition, ModelType};

/// The reason of a [`Status`] signaling that the requested resource does not
/// exist.
pub const REASON_NOT_FOUND: &str = "NotFound";

crate::model! {
    /// Metadata all persisted resources must have.
    pub struct ObjectMeta => "V1ObjectMeta" {
        name: String => "name",
        generate_name: String => "generateName",
        namespace: String => "namespace",
        uid: String => "uid",
        /// An opaque value that represents the internal version of this
        /// object. Set by the server and required for replace calls.
        resource_version: String => "resourceVersion",
        generation: i64 => "generation",
        creation_timestamp: Timestamp => "creationTimestamp",
        deletion_timestamp: Timestamp => "deletionTimestamp",
        labels: BTreeMap<String, String> => "labels",
        annotations: BTreeMap<String, String> => "annotations",
        owner_references: Vec<OwnerReference> => "ownerReferences",
        finalizers: Vec<String> => "finalizers",
    }
}

crate::model! {
    pub struct OwnerReference => "V1OwnerReference" {
        api_version: String => "apiVersion",
        kind: String => "kind",
        name: String => "name",
        uid: String => "uid",
        controller: bool => "controller",
        block_owner_deletion: bool => "blockOwnerDeletion",
    }
}

crate::model! {
    /// Metadata of list responses.
    pub struct ListMeta => "V1ListMeta" {
        continue_: String => "continue",
        remaining_item_count: i64 => "remainingItemCount",
        resource_version: String => "resourceVersion",
        self_link: String => "selfLink",
    }
}

crate::model! {
    /// The result of calls which don't return other objects, most notably
    /// failed calls.
    pub typed Status => "V1Status" {
        metadata: ListMeta => "metadata",
        /// Either `Success` or `Failure`.
        status: String => "status",
        message: String => "message",
        /// A machine-readable description, for example `NotFound`.
        reason: String => "reason",
        details: StatusDetails => "details",
        code: i32 => "code",
    }
}

crate::model! {
    pub struct StatusDetails => "V1StatusDetails" {
        name: String => "name",
        group: String => "group",
        kind: String => "kind",
        uid: String => "uid",
        causes: Vec<StatusCause> => "causes",
        retry_after_seconds: i32 => "retryAfterSeconds",
    }
}

crate::model! {
    pub struct StatusCause => "V1StatusCause" {
        reason: String => "reason",
        message: String => "message",
        field: String => "field",
    }
}

crate::model! {
    /// Options of delete calls.
    pub typed DeleteOptions => "V1DeleteOptions" {
        grace_period_seconds: i64 => "gracePeriodSeconds",
        /// One of `Orphan`, `Background` or `Foreground`.
        propagation_policy: String => "propagationPolicy",
        dry_run: Vec<String> => "dryRun",
    }
}

impl Status {
    pub fn is_not_found(&self) -> bool {
        self.reason.as_deref() == Some(REASON_NOT_FOUND)
    }
}

/// Returns the definitions of all meta models.
pub fn definitions() -> Vec<ModelDefinition> {
    vec![
        ObjectMeta::definition(),
        OwnerReference::definition(),
        ListMeta::definition(),
        Status::definition(),
        StatusDetails::definition(),
        StatusCause::definition(),
        DeleteOptions::definition(),
    ]
}
