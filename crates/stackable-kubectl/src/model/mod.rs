//! Structural metadata of model types and the typed instances built from it.
//!
//! Every generated model type implements [`Model`] (the object-safe instance
//! side) and [`ModelType`] (the static side, which provides the
//! [`ModelDefinition`] and the factory). Model types are usually declared
//! with the [`model!`](crate::model!) macro, which derives both from a single
//! attribute table.
use std::{any::Any, fmt};

use crate::{document::Document, models::ObjectMeta};

mod definition;
mod field;
mod macros;

pub use definition::*;
pub use field::*;

/// A typed instance of a model type.
///
/// All attributes of a model are optional. The accessors for the well-known
/// `kind`, `apiVersion` and `metadata` attributes return [`None`] for model
/// types which don't carry them.
pub trait Model: Any + fmt::Debug + Send + Sync {
    /// The name of the generated type, for example `V1Pod`.
    fn type_name(&self) -> &'static str;

    /// Serializes the instance into a document keyed by wire names. Omitted
    /// attributes are omitted from the document as well.
    fn to_document(&self) -> Document;

    fn kind(&self) -> Option<&str> {
        None
    }

    fn api_version(&self) -> Option<&str> {
        None
    }

    fn metadata(&self) -> Option<&ObjectMeta> {
        None
    }

    /// Replaces the metadata of the instance. This is a no-op for model types
    /// without object metadata.
    fn set_metadata(&mut self, _metadata: Option<ObjectMeta>) {}

    fn clone_model(&self) -> Box<dyn Model>;

    fn eq_model(&self, other: &dyn Model) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl dyn Model {
    /// Returns `metadata.name`, if present.
    pub fn name(&self) -> Option<&str> {
        self.metadata()?.name.as_deref()
    }

    /// Returns `metadata.namespace`, if present.
    pub fn namespace(&self) -> Option<&str> {
        self.metadata()?.namespace.as_deref()
    }

    pub fn is<T: Model>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Model>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Converts the boxed instance into the concrete model type `T`.
    /// Returns [`None`] if it is of a different type.
    pub fn downcast<T: Model>(self: Box<Self>) -> Option<Box<T>> {
        self.into_any().downcast().ok()
    }
}

impl Clone for Box<dyn Model> {
    fn clone(&self) -> Self {
        self.clone_model()
    }
}

impl PartialEq for dyn Model {
    fn eq(&self, other: &Self) -> bool {
        self.eq_model(other)
    }
}

/// The static side of a model type: its structural metadata and its factory.
pub trait ModelType: Model + Field + Clone + Default {
    /// The name of the generated type, for example `V1Pod`.
    const TYPE_NAME: &'static str;

    fn definition() -> ModelDefinition;

    /// Builds an instance from a sparse set of attribute values. Attributes
    /// which are absent stay [`None`].
    fn from_attributes(attributes: Attributes) -> Result<Self, FieldError>;
}
