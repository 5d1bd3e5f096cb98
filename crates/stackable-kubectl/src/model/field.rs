use std::collections::BTreeMap;

use indexmap::IndexMap;
use jiff::{Timestamp, civil::Date};
use snafu::{OptionExt, ResultExt, Snafu};

use crate::model::{FieldType, Model, ModelType};

#[derive(Debug, Snafu)]
pub enum FieldError {
    #[snafu(display("expected a value of type {expected}, found {found}"))]
    TypeMismatch {
        expected: FieldType,
        found: &'static str,
    },

    #[snafu(display("value {value} is out of range for {expected}"))]
    OutOfRange { value: i64, expected: &'static str },

    #[snafu(display("failed to convert mapping"))]
    ConvertMapping { source: serde_json::Error },

    #[snafu(display("invalid attribute {name:?}"))]
    Attribute {
        name: String,
        #[snafu(source(from(FieldError, Box::new)))]
        source: Box<FieldError>,
    },

    #[snafu(display("invalid list item at index {index}"))]
    ListItem {
        index: usize,
        #[snafu(source(from(FieldError, Box::new)))]
        source: Box<FieldError>,
    },
}

/// A typed attribute value, as produced by the parser from a raw document
/// value and consumed by model factories.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    Date(Date),
    DateTime(Timestamp),
    Object(serde_json::Value),
    List(Vec<Value>),
    Model(Box<dyn Model>),
}

impl Value {
    /// Returns a short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Number(_) => "number",
            Self::Boolean(_) => "boolean",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::Object(_) => "object",
            Self::List(_) => "list",
            Self::Model(model) => model.type_name(),
        }
    }

    /// Converts a [`Value::Model`] into the concrete model type `T`.
    pub fn into_model<T: ModelType>(self) -> Result<T, FieldError> {
        match self {
            Self::Model(model) => {
                let found = model.type_name();
                model
                    .downcast::<T>()
                    .map(|model| *model)
                    .context(TypeMismatchSnafu {
                        expected: T::field_type(),
                        found,
                    })
            }
            other => Err(mismatch::<T>(&other)),
        }
    }
}

fn mismatch<T: Field>(value: &Value) -> FieldError {
    TypeMismatchSnafu {
        expected: T::field_type(),
        found: value.kind_name(),
    }
    .build()
}

/// A Rust type which can be used as a model attribute.
pub trait Field: Sized {
    /// The declared type of attributes of this Rust type.
    fn field_type() -> FieldType;

    fn from_value(value: Value) -> Result<Self, FieldError>;

    /// Serializes the attribute into its wire representation.
    fn to_json(&self) -> serde_json::Value;
}

impl Field for String {
    fn field_type() -> FieldType {
        FieldType::String
    }

    fn from_value(value: Value) -> Result<Self, FieldError> {
        match value {
            Value::String(value) => Ok(value),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::String(self.clone())
    }
}

impl Field for i64 {
    fn field_type() -> FieldType {
        FieldType::Integer
    }

    fn from_value(value: Value) -> Result<Self, FieldError> {
        match value {
            Value::Integer(value) => Ok(value),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        (*self).into()
    }
}

impl Field for i32 {
    fn field_type() -> FieldType {
        FieldType::Integer
    }

    fn from_value(value: Value) -> Result<Self, FieldError> {
        match value {
            Value::Integer(value) => Self::try_from(value).map_err(|_| {
                OutOfRangeSnafu {
                    value,
                    expected: "int32",
                }
                .build()
            }),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        (*self).into()
    }
}

impl Field for f64 {
    fn field_type() -> FieldType {
        FieldType::Number
    }

    fn from_value(value: Value) -> Result<Self, FieldError> {
        match value {
            Value::Number(value) => Ok(value),
            Value::Integer(value) => Ok(value as f64),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::Number::from_f64(*self).map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}

impl Field for bool {
    fn field_type() -> FieldType {
        FieldType::Boolean
    }

    fn from_value(value: Value) -> Result<Self, FieldError> {
        match value {
            Value::Boolean(value) => Ok(value),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Bool(*self)
    }
}

impl Field for Date {
    fn field_type() -> FieldType {
        FieldType::Date
    }

    fn from_value(value: Value) -> Result<Self, FieldError> {
        match value {
            Value::Date(value) => Ok(value),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::String(self.to_string())
    }
}

impl Field for Timestamp {
    fn field_type() -> FieldType {
        FieldType::DateTime
    }

    fn from_value(value: Value) -> Result<Self, FieldError> {
        match value {
            Value::DateTime(value) => Ok(value),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::String(self.to_string())
    }
}

impl Field for serde_json::Value {
    fn field_type() -> FieldType {
        FieldType::Object
    }

    fn from_value(value: Value) -> Result<Self, FieldError> {
        match value {
            Value::Object(value) => Ok(value),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        self.clone()
    }
}

impl Field for BTreeMap<String, String> {
    fn field_type() -> FieldType {
        FieldType::Map
    }

    fn from_value(value: Value) -> Result<Self, FieldError> {
        match value {
            Value::Object(value) => serde_json::from_value(value).context(ConvertMappingSnafu),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.iter()
                .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
                .collect(),
        )
    }
}

impl<T: Field> Field for Vec<T> {
    fn field_type() -> FieldType {
        FieldType::List(Box::new(T::field_type()))
    }

    fn from_value(value: Value) -> Result<Self, FieldError> {
        match value {
            Value::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| T::from_value(item).context(ListItemSnafu { index }))
                .collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.iter().map(Field::to_json).collect())
    }
}

/// A sparse set of attribute values, keyed by attribute (not wire) name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attributes(IndexMap<String, Value>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Removes the attribute `name` and converts it into `T`.
    ///
    /// Absent and [`Value::Null`] attributes yield [`None`], they are never
    /// defaulted.
    pub fn take<T: Field>(&mut self, name: &str) -> Result<Option<T>, FieldError> {
        match self.0.shift_remove(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::from_value(value).map(Some).context(AttributeSnafu { name }),
        }
    }
}

impl FromIterator<(String, Value)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
