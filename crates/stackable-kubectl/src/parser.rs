//! Deserialization of untyped documents into typed model instances, driven
//! purely by the structural catalog of a [`ModelRegistry`].
use jiff::{
    Timestamp,
    civil::{Date, DateTime},
    tz::TimeZone,
};
use snafu::{OptionExt, ResultExt, Snafu};
use tracing::debug;

use crate::{
    document::{self, Document},
    identity::{self, identity_of},
    model::{Attributes, FieldError, FieldType, Model, ModelDefinition, Value},
    registry::ModelRegistry,
};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to parse document"))]
    ParseDocument { source: document::Error },

    #[snafu(display("failed to resolve document identity"))]
    ResolveIdentity { source: identity::Error },

    #[snafu(display("invalid value for attribute {attribute:?} of {type_name}"))]
    Attribute {
        type_name: String,
        attribute: String,
        #[snafu(source(from(Error, Box::new)))]
        source: Box<Error>,
    },

    #[snafu(display("invalid list item at index {index}"))]
    ListItem {
        index: usize,
        #[snafu(source(from(Error, Box::new)))]
        source: Box<Error>,
    },

    #[snafu(display("expected a value of type {expected}, found {found}"))]
    UnexpectedValue {
        expected: FieldType,
        found: &'static str,
    },

    #[snafu(display("failed to parse {input:?} as {expected}"))]
    ParseScalar {
        input: String,
        expected: FieldType,
    },

    #[snafu(display("failed to parse {input:?} into a date"))]
    ParseDate { source: jiff::Error, input: String },

    #[snafu(display("failed to parse {input:?} into a datetime"))]
    ParseDateTime { source: jiff::Error, input: String },

    #[snafu(display("failed to construct {type_name}"))]
    ConstructModel {
        source: FieldError,
        type_name: String,
    },
}

/// Builds typed instances from documents.
///
/// Attributes missing from a document (or explicitly `null`) are omitted
/// from the instance. Documents of unknown kinds yield [`None`].
#[derive(Clone, Copy, Debug)]
pub struct Parser<'a> {
    registry: &'a ModelRegistry,
}

impl<'a> Parser<'a> {
    pub fn new(registry: &'a ModelRegistry) -> Self {
        Self { registry }
    }

    /// Deserializes `document` into an instance of the model type registered
    /// for its identity.
    ///
    /// Returns [`None`] if the document is empty or no model type is
    /// registered for its identity.
    pub fn parse(&self, document: &Document) -> Result<Option<Box<dyn Model>>> {
        if document.is_empty() {
            return Ok(None);
        }

        let gvk = identity_of(document).context(ResolveIdentitySnafu)?;
        let Some(definition) = self.registry.model_definition(&gvk) else {
            debug!(%gvk, "no model type is registered for document");
            return Ok(None);
        };

        self.build(definition, document).map(Some)
    }

    /// Parses a serialized YAML or JSON document, then deserializes it like
    /// [`Parser::parse`].
    pub fn parse_str(&self, text: &str) -> Result<Option<Box<dyn Model>>> {
        match document::parse(text).context(ParseDocumentSnafu)? {
            Some(document) => self.parse(&document),
            None => Ok(None),
        }
    }

    fn build(&self, definition: &ModelDefinition, document: &Document) -> Result<Box<dyn Model>> {
        let mut attributes = Attributes::new();

        for (attribute, field_type, wire_name) in definition.fields() {
            let Some(raw) = document.get(wire_name).filter(|raw| !raw.is_null()) else {
                continue;
            };

            let value = self
                .convert(field_type, raw)
                .with_context(|_| AttributeSnafu {
                    type_name: definition.type_name(),
                    attribute,
                })?;
            attributes.insert(attribute, value);
        }

        definition
            .create_model(attributes)
            .with_context(|_| ConstructModelSnafu {
                type_name: definition.type_name(),
            })
    }

    fn convert(&self, field_type: &FieldType, raw: &serde_json::Value) -> Result<Value> {
        use serde_json::Value as Raw;

        if raw.is_null() {
            return Ok(Value::Null);
        }

        let value = match (field_type, raw) {
            (FieldType::String, Raw::String(value)) => Value::String(value.clone()),
            (FieldType::String, Raw::Number(value)) => Value::String(value.to_string()),
            (FieldType::String, Raw::Bool(value)) => Value::String(value.to_string()),

            (FieldType::Integer, Raw::Number(value)) => {
                Value::Integer(integer_from_number(value).context(ParseScalarSnafu {
                    input: value.to_string(),
                    expected: FieldType::Integer,
                })?)
            }
            (FieldType::Integer, Raw::String(value)) => {
                Value::Integer(value.trim().parse::<i64>().ok().context(ParseScalarSnafu {
                    input: value,
                    expected: FieldType::Integer,
                })?)
            }

            (FieldType::Number, Raw::Number(value)) => {
                Value::Number(value.as_f64().context(ParseScalarSnafu {
                    input: value.to_string(),
                    expected: FieldType::Number,
                })?)
            }
            (FieldType::Number, Raw::String(value)) => {
                Value::Number(value.trim().parse::<f64>().ok().context(ParseScalarSnafu {
                    input: value,
                    expected: FieldType::Number,
                })?)
            }

            (FieldType::Boolean, Raw::Bool(value)) => Value::Boolean(*value),
            (FieldType::Boolean, Raw::String(value)) => {
                let value = value.trim();
                let boolean = if value.eq_ignore_ascii_case("true") {
                    true
                } else if value.eq_ignore_ascii_case("false") {
                    false
                } else {
                    return ParseScalarSnafu {
                        input: value,
                        expected: FieldType::Boolean,
                    }
                    .fail();
                };
                Value::Boolean(boolean)
            }
            (FieldType::Boolean, Raw::Number(value)) => {
                Value::Boolean(value.as_f64().is_some_and(|value| value != 0.0))
            }

            (FieldType::Date, Raw::String(value)) => parse_date(value)?,
            (FieldType::DateTime, Raw::String(value)) => parse_datetime(value)?,

            (FieldType::Object, raw) => Value::Object(raw.clone()),

            (FieldType::Map, Raw::Object(entries)) => Value::Object(Raw::Object(
                entries
                    .iter()
                    .filter(|(_, value)| !value.is_null())
                    .map(|(key, value)| {
                        let value = match value {
                            Raw::String(value) => value.clone(),
                            other => other.to_string(),
                        };
                        (key.clone(), Raw::String(value))
                    })
                    .collect(),
            )),

            // Null items and items of unknown nested types are skipped
            (FieldType::List(inner), Raw::Array(items)) => {
                let mut values = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    match self
                        .convert(inner, item)
                        .context(ListItemSnafu { index })?
                    {
                        Value::Null => {}
                        value => values.push(value),
                    }
                }
                Value::List(values)
            }

            (FieldType::Model(type_name), Raw::Object(document)) => {
                let Some(definition) = self.registry.resolve_model_for_type(type_name) else {
                    debug!(
                        type_name = type_name.as_str(),
                        "no model type is registered for nested type"
                    );
                    return Ok(Value::Null);
                };
                Value::Model(self.build(definition, document)?)
            }

            (expected, raw) => {
                return UnexpectedValueSnafu {
                    expected: expected.clone(),
                    found: document::json_type(raw),
                }
                .fail();
            }
        };

        Ok(value)
    }
}

/// Returns the integral part of `number`, or [`None`] if it doesn't fit into
/// an `i64`.
fn integer_from_number(number: &serde_json::Number) -> Option<i64> {
    // 2^63, exactly representable as f64
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    number.as_i64().or_else(|| {
        let value = number.as_f64()?.trunc();
        (-LIMIT..LIMIT)
            .contains(&value)
            .then_some(value as i64)
    })
}

/// Parses an ISO 8601 date. Full datetimes are accepted as well and keep the
/// calendar date they are written in, so `2024-02-29T23:30:00-05:00` is
/// `2024-02-29`. Datetimes in UTC (`Z`) are not civil datetimes and are read
/// as timestamps instead.
fn parse_date(input: &str) -> Result<Value> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(Value::Null);
    }

    match input.parse::<Date>() {
        Ok(date) => Ok(Value::Date(date)),
        Err(source) => input
            .parse::<Timestamp>()
            .map(|timestamp| Value::Date(timestamp.to_zoned(TimeZone::UTC).date()))
            .map_err(|_| source)
            .context(ParseDateSnafu { input }),
    }
}

/// Parses an ISO 8601 datetime. Datetimes without an offset are read as UTC.
fn parse_datetime(input: &str) -> Result<Value> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(Value::Null);
    }

    match input.parse::<Timestamp>() {
        Ok(timestamp) => Ok(Value::DateTime(timestamp)),
        Err(source) => input
            .parse::<DateTime>()
            .and_then(|datetime| datetime.to_zoned(TimeZone::UTC))
            .map(|zoned| Value::DateTime(zoned.timestamp()))
            .map_err(|_| source)
            .context(ParseDateTimeSnafu { input }),
    }
}
