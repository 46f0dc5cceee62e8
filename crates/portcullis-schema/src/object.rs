//! Object schemas with per-field validation and unknown-key policies.

use crate::schema::{expected, BoxedSchema, Schema};
use async_trait::async_trait;
use portcullis_core::{Issue, IssuePath, ValidationError};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Message attached to a missing required field.
pub const REQUIRED_MESSAGE: &str = "Required";

/// Policy for keys present in the input but not declared on the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeys {
    /// Drop undeclared keys from the output (the default).
    #[default]
    Strip,
    /// Keep undeclared keys in the output, unvalidated.
    Passthrough,
    /// Fail validation when an undeclared key is present.
    Deny,
}

/// A declared field on an [`ObjectSchema`].
struct Field {
    name: String,
    schema: BoxedSchema,
    required: bool,
}

/// Schema for JSON objects.
///
/// Fields are validated in declaration order, so issue ordering is
/// deterministic. All field failures within one object are collected into a
/// single [`ValidationError`] - short-circuiting happens between request
/// slots, not within a schema.
///
/// # Example
///
/// ```
/// use portcullis_schema::{ObjectSchema, Schema, StringSchema, IntegerSchema, UnknownKeys};
/// use serde_json::json;
///
/// # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// # rt.block_on(async {
/// let schema = ObjectSchema::builder()
///     .field("name", StringSchema::new())
///     .optional_field("age", IntegerSchema::new())
///     .unknown_keys(UnknownKeys::Strip)
///     .build();
///
/// let out = schema.parse(json!({"name": "Ann", "note": "dropped"})).await.unwrap();
/// assert_eq!(out, json!({"name": "Ann"}));
/// # });
/// ```
pub struct ObjectSchema {
    fields: Vec<Field>,
    unknown_keys: UnknownKeys,
}

impl ObjectSchema {
    /// Creates a new object schema builder.
    #[must_use]
    pub fn builder() -> ObjectSchemaBuilder {
        ObjectSchemaBuilder::default()
    }

    /// Creates a schema accepting any object, passing all keys through.
    #[must_use]
    pub fn any() -> Self {
        Self {
            fields: Vec::new(),
            unknown_keys: UnknownKeys::Passthrough,
        }
    }
}

impl std::fmt::Debug for ObjectSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectSchema")
            .field(
                "fields",
                &self.fields.iter().map(|fld| &fld.name).collect::<Vec<_>>(),
            )
            .field("unknown_keys", &self.unknown_keys)
            .finish()
    }
}

#[async_trait]
impl Schema for ObjectSchema {
    async fn parse(&self, value: Value) -> Result<Value, ValidationError> {
        let mut input = match value {
            Value::Object(input) => input,
            other => {
                return Err(ValidationError::single(
                    IssuePath::root(),
                    expected("object", &other),
                ));
            }
        };

        let mut output = Map::with_capacity(self.fields.len());
        let mut issues = Vec::new();

        for field in &self.fields {
            match input.remove(&field.name) {
                Some(raw) => match field.schema.parse(raw).await {
                    Ok(parsed) => {
                        output.insert(field.name.clone(), parsed);
                    }
                    Err(err) => {
                        issues.extend(err.prefixed(field.name.as_str()).issues().iter().cloned());
                    }
                },
                None if field.required => {
                    issues.push(Issue::new(IssuePath::key(&field.name), REQUIRED_MESSAGE));
                }
                None => {}
            }
        }

        // Whatever remains in the input is undeclared.
        match self.unknown_keys {
            UnknownKeys::Strip => {}
            UnknownKeys::Passthrough => {
                for (key, raw) in input {
                    output.insert(key, raw);
                }
            }
            UnknownKeys::Deny => {
                for key in input.keys() {
                    issues.push(Issue::new(IssuePath::key(key), "Unrecognized key"));
                }
            }
        }

        if issues.is_empty() {
            Ok(Value::Object(output))
        } else {
            Err(ValidationError::new(issues))
        }
    }
}

/// Builder for [`ObjectSchema`].
#[derive(Default)]
pub struct ObjectSchemaBuilder {
    fields: Vec<Field>,
    unknown_keys: UnknownKeys,
}

impl ObjectSchemaBuilder {
    /// Declares a required field validated by `schema`.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, schema: impl Schema + 'static) -> Self {
        self.fields.push(Field {
            name: name.into(),
            schema: Arc::new(schema),
            required: true,
        });
        self
    }

    /// Declares an optional field validated by `schema` when present.
    #[must_use]
    pub fn optional_field(
        mut self,
        name: impl Into<String>,
        schema: impl Schema + 'static,
    ) -> Self {
        self.fields.push(Field {
            name: name.into(),
            schema: Arc::new(schema),
            required: false,
        });
        self
    }

    /// Sets the policy for undeclared keys.
    #[must_use]
    pub fn unknown_keys(mut self, policy: UnknownKeys) -> Self {
        self.unknown_keys = policy;
        self
    }

    /// Builds the schema.
    #[must_use]
    pub fn build(self) -> ObjectSchema {
        ObjectSchema {
            fields: self.fields,
            unknown_keys: self.unknown_keys,
        }
    }
}
