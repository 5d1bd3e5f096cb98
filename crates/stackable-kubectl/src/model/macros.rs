/// Declares a model type together with its structural metadata.
///
/// Each attribute is declared as `name: Type => "wireName"`. The macro
/// generates a struct with one optional public field per attribute and
/// implements [`Model`](crate::model::Model),
/// [`ModelType`](crate::model::ModelType) and [`Field`](crate::model::Field)
/// for it, so the type can be registered and nested in other models.
///
/// There are three shapes:
///
/// - `struct` declares a plain model with exactly the listed attributes.
/// - `typed` additionally declares `api_version` and `kind`, and exposes them
///   through the [`Model`](crate::model::Model) accessors.
/// - `resource` additionally declares `api_version`, `kind` and `metadata`
///   (of type [`ObjectMeta`](crate::models::ObjectMeta)).
///
/// ```
/// use stackable_kubectl::model::{ModelType, FieldType};
///
/// stackable_kubectl::model! {
///     /// A custom resource.
///     pub resource CronTab => "StableExampleComV1CronTab" {
///         spec: CronTabSpec => "spec",
///     }
/// }
///
/// stackable_kubectl::model! {
///     pub struct CronTabSpec => "StableExampleComV1CronTabSpec" {
///         cron_spec: String => "cronSpec",
///         replicas: i32 => "replicas",
///     }
/// }
///
/// let definition = CronTab::definition();
/// assert_eq!(definition.wire_name("api_version"), Some("apiVersion"));
/// assert_eq!(
///     definition.field_type("spec"),
///     Some(&FieldType::Model("StableExampleComV1CronTabSpec".into()))
/// );
/// ```
#[macro_export]
macro_rules! model {
    (
        @define [$($attr:tt)*] $vis:vis $name:ident => $type_name:literal {
            $($(#[$field_attr:meta])* $field:ident: $ty:ty => $wire:literal),* $(,)?
        }
        { $($accessors:tt)* }
    ) => {
        $($attr)*
        #[derive(Clone, Debug, Default, PartialEq)]
        #[allow(clippy::derive_partial_eq_without_eq)]
        $vis struct $name {
            $($(#[$field_attr])* pub $field: ::std::option::Option<$ty>,)*
        }

        impl $crate::model::ModelType for $name {
            const TYPE_NAME: &'static str = $type_name;

            fn definition() -> $crate::model::ModelDefinition {
                $crate::model::ModelDefinition::builder($type_name)
                    $(.field(
                        ::std::stringify!($field),
                        <$ty as $crate::model::Field>::field_type(),
                        $wire,
                    ))*
                    .build::<Self>()
            }

            #[allow(unused_mut, unused_variables)]
            fn from_attributes(
                mut attributes: $crate::model::Attributes,
            ) -> ::std::result::Result<Self, $crate::model::FieldError> {
                ::std::result::Result::Ok(Self {
                    $($field: attributes.take(::std::stringify!($field))?,)*
                })
            }
        }

        impl $crate::model::Model for $name {
            fn type_name(&self) -> &'static str {
                $type_name
            }

            #[allow(unused_mut)]
            fn to_document(&self) -> $crate::document::Document {
                let mut document = $crate::document::Document::new();
                $(
                    if let ::std::option::Option::Some(value) = &self.$field {
                        document.insert(
                            ::std::string::String::from($wire),
                            $crate::model::Field::to_json(value),
                        );
                    }
                )*
                document
            }

            fn clone_model(&self) -> ::std::boxed::Box<dyn $crate::model::Model> {
                ::std::boxed::Box::new(::std::clone::Clone::clone(self))
            }

            fn eq_model(&self, other: &dyn $crate::model::Model) -> bool {
                other
                    .as_any()
                    .downcast_ref::<Self>()
                    .is_some_and(|other| self == other)
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }

            $($accessors)*
        }

        impl $crate::model::Field for $name {
            fn field_type() -> $crate::model::FieldType {
                $crate::model::FieldType::Model(::std::string::String::from($type_name))
            }

            fn from_value(
                value: $crate::model::Value,
            ) -> ::std::result::Result<Self, $crate::model::FieldError> {
                value.into_model::<Self>()
            }

            fn to_json(&self) -> $crate::serde_json::Value {
                $crate::serde_json::Value::Object($crate::model::Model::to_document(self))
            }
        }
    };

    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident => $type_name:literal {
            $($(#[$field_attr:meta])* $field:ident: $ty:ty => $wire:literal),* $(,)?
        }
    ) => {
        $crate::model! {
            @define [$(#[$attr])*] $vis $name => $type_name {
                $($(#[$field_attr])* $field: $ty => $wire),*
            }
            {}
        }
    };

    (
        $(#[$attr:meta])*
        $vis:vis typed $name:ident => $type_name:literal {
            $($(#[$field_attr:meta])* $field:ident: $ty:ty => $wire:literal),* $(,)?
        }
    ) => {
        $crate::model! {
            @define [$(#[$attr])*] $vis $name => $type_name {
                /// The versioned schema of this representation of an object.
                api_version: ::std::string::String => "apiVersion",
                /// The REST resource this object represents.
                kind: ::std::string::String => "kind",
                $($(#[$field_attr])* $field: $ty => $wire),*
            }
            {
                fn kind(&self) -> ::std::option::Option<&str> {
                    self.kind.as_deref()
                }

                fn api_version(&self) -> ::std::option::Option<&str> {
                    self.api_version.as_deref()
                }
            }
        }
    };

    (
        $(#[$attr:meta])*
        $vis:vis resource $name:ident => $type_name:literal {
            $($(#[$field_attr:meta])* $field:ident: $ty:ty => $wire:literal),* $(,)?
        }
    ) => {
        $crate::model! {
            @define [$(#[$attr])*] $vis $name => $type_name {
                /// The versioned schema of this representation of an object.
                api_version: ::std::string::String => "apiVersion",
                /// The REST resource this object represents.
                kind: ::std::string::String => "kind",
                /// Standard object metadata.
                metadata: $crate::models::ObjectMeta => "metadata",
                $($(#[$field_attr])* $field: $ty => $wire),*
            }
            {
                fn kind(&self) -> ::std::option::Option<&str> {
                    self.kind.as_deref()
                }

                fn api_version(&self) -> ::std::option::Option<&str> {
                    self.api_version.as_deref()
                }

                fn metadata(&self) -> ::std::option::Option<&$crate::models::ObjectMeta> {
                    self.metadata.as_ref()
                }

                fn set_metadata(
                    &mut self,
                    metadata: ::std::option::Option<$crate::models::ObjectMeta>,
                ) {
                    self.metadata = metadata;
                }
            }
        }
    };
}
