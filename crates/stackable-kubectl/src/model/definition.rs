use std::{fmt, str::FromStr, sync::LazyLock};

use indexmap::IndexMap;
use regex::Regex;
use snafu::{Snafu, ensure};

use crate::model::{Attributes, FieldError, Model, ModelType};

static MODEL_TYPE_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][A-Za-z0-9]*$").expect("failed to compile model type name regex")
});

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum ParseFieldTypeError {
    #[snafu(display("field type cannot be empty"))]
    Empty,

    #[snafu(display("{input:?} is neither a primitive, a list nor a model type name"))]
    InvalidFormat { input: String },
}

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum DefinitionError {
    #[snafu(display("attribute {attribute:?} of {type_name} has no wire name"))]
    MissingWireName { type_name: String, attribute: String },
}

/// The declared type of a model attribute.
///
/// The textual form follows the type tags of generated clients: `str`, `int`,
/// `float`, `bool`, `date`, `datetime`, `object`, `dict(str, str)`, `list[T]`
/// and the name of a model type, like `V1ObjectMeta`.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Date,
    DateTime,

    /// An arbitrary value which is passed through as-is.
    Object,

    /// A mapping of strings to strings.
    Map,

    List(Box<FieldType>),

    /// A nested model, referenced by its type name and resolved at
    /// deserialization time.
    Model(String),
}

impl FromStr for FieldType {
    type Err = ParseFieldTypeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        ensure!(!input.is_empty(), EmptySnafu);

        if let Some(inner) = input
            .strip_prefix("list[")
            .and_then(|rest| rest.strip_suffix(']'))
        {
            return Ok(Self::List(Box::new(Self::from_str(inner)?)));
        }

        let field_type = match input {
            "str" => Self::String,
            "int" => Self::Integer,
            "float" => Self::Number,
            "bool" => Self::Boolean,
            "date" => Self::Date,
            "datetime" => Self::DateTime,
            "object" => Self::Object,
            "dict(str, str)" => Self::Map,
            name => {
                ensure!(
                    MODEL_TYPE_NAME_REGEX.is_match(name),
                    InvalidFormatSnafu { input }
                );
                Self::Model(name.to_owned())
            }
        };

        Ok(field_type)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("str"),
            Self::Integer => f.write_str("int"),
            Self::Number => f.write_str("float"),
            Self::Boolean => f.write_str("bool"),
            Self::Date => f.write_str("date"),
            Self::DateTime => f.write_str("datetime"),
            Self::Object => f.write_str("object"),
            Self::Map => f.write_str("dict(str, str)"),
            Self::List(inner) => write!(f, "list[{inner}]"),
            Self::Model(type_name) => f.write_str(type_name),
        }
    }
}

/// Builds an instance of a model type from attribute values.
pub type Factory = fn(Attributes) -> Result<Box<dyn Model>, FieldError>;

fn construct<T: ModelType>(attributes: Attributes) -> Result<Box<dyn Model>, FieldError> {
    let model = T::from_attributes(attributes)?;
    Ok(Box::new(model))
}

/// The structural metadata of one model type: the declared type of every
/// attribute, the wire name each attribute serializes under and a factory
/// which builds an instance from attribute values.
///
/// Every attribute has a wire name. This is enforced on construction.
#[derive(Clone, Debug)]
pub struct ModelDefinition {
    type_name: String,
    fields: IndexMap<String, FieldType>,
    attribute_map: IndexMap<String, String>,
    factory: Factory,
}

impl ModelDefinition {
    /// Creates a definition from separate field and wire name tables, as
    /// exposed by generated model types.
    pub fn new(
        type_name: impl Into<String>,
        fields: IndexMap<String, FieldType>,
        attribute_map: IndexMap<String, String>,
        factory: Factory,
    ) -> Result<Self, DefinitionError> {
        let type_name = type_name.into();

        if let Some(attribute) = fields
            .keys()
            .find(|attribute| !attribute_map.contains_key(*attribute))
        {
            return MissingWireNameSnafu {
                type_name,
                attribute,
            }
            .fail();
        }

        Ok(Self {
            type_name,
            fields,
            attribute_map,
            factory,
        })
    }

    pub fn builder(type_name: impl Into<String>) -> ModelDefinitionBuilder {
        ModelDefinitionBuilder {
            type_name: type_name.into(),
            fields: IndexMap::new(),
            attribute_map: IndexMap::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Iterates over all declared attributes as `(attribute, type, wire name)`
    /// in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldType, &str)> {
        self.fields.iter().filter_map(|(attribute, field_type)| {
            let wire_name = self.attribute_map.get(attribute)?;
            Some((attribute.as_str(), field_type, wire_name.as_str()))
        })
    }

    pub fn field_type(&self, attribute: &str) -> Option<&FieldType> {
        self.fields.get(attribute)
    }

    pub fn wire_name(&self, attribute: &str) -> Option<&str> {
        self.attribute_map.get(attribute).map(String::as_str)
    }

    pub fn create_model(&self, attributes: Attributes) -> Result<Box<dyn Model>, FieldError> {
        (self.factory)(attributes)
    }
}

/// Declares attributes one by one, so the wire name invariant of
/// [`ModelDefinition`] holds by construction.
#[derive(Debug)]
pub struct ModelDefinitionBuilder {
    type_name: String,
    fields: IndexMap<String, FieldType>,
    attribute_map: IndexMap<String, String>,
}

impl ModelDefinitionBuilder {
    pub fn field(
        mut self,
        attribute: impl Into<String>,
        field_type: FieldType,
        wire_name: impl Into<String>,
    ) -> Self {
        let attribute = attribute.into();
        self.attribute_map.insert(attribute.clone(), wire_name.into());
        self.fields.insert(attribute, field_type);
        self
    }

    /// Finishes the definition using the factory of the model type `T`.
    pub fn build<T: ModelType>(self) -> ModelDefinition {
        self.build_with(construct::<T>)
    }

    pub fn build_with(self, factory: Factory) -> ModelDefinition {
        ModelDefinition {
            type_name: self.type_name,
            fields: self.fields,
            attribute_map: self.attribute_map,
            factory,
        }
    }
}
