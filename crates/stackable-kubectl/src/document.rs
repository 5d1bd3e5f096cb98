//! Untyped resource documents, as parsed from their serialized YAML or JSON
//! form.
//!
//! A [`Document`] is an ordered mapping of wire names to arbitrary nested
//! values. JSON is a subset of YAML, so both serialized forms go through the
//! same YAML parser.
use serde::Deserialize;
use snafu::{ResultExt, Snafu};

type Result<T, E = Error> = std::result::Result<T, E>;

/// An ordered mapping of wire names to arbitrary nested values.
pub type Document = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to parse YAML document"))]
    ParseYaml { source: serde_yaml::Error },

    #[snafu(display("document must be a mapping, found {found}"))]
    NotAMapping { found: &'static str },
}

/// Parses a single serialized document.
///
/// Returns [`None`] if the text contains no document or an explicit `null`.
pub fn parse(text: &str) -> Result<Option<Document>> {
    if text.trim().is_empty() {
        return Ok(None);
    }

    let value: serde_json::Value = serde_yaml::from_str(text).context(ParseYamlSnafu)?;
    from_value(value)
}

/// Parses a stream of `---` separated documents. Empty documents are skipped.
pub fn parse_all(text: &str) -> Result<Vec<Document>> {
    let mut documents = Vec::new();

    for deserializer in serde_yaml::Deserializer::from_str(text) {
        let value = serde_json::Value::deserialize(deserializer).context(ParseYamlSnafu)?;
        if let Some(document) = from_value(value)? {
            documents.push(document);
        }
    }

    Ok(documents)
}

/// Converts an already parsed value into a [`Document`].
pub fn from_value(value: serde_json::Value) -> Result<Option<Document>> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(document) => Ok(Some(document)),
        other => NotAMappingSnafu {
            found: json_type(&other),
        }
        .fail(),
    }
}

/// Returns a human readable name of the JSON type of `value`.
pub(crate) fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "sequence",
        serde_json::Value::Object(_) => "mapping",
    }
}
