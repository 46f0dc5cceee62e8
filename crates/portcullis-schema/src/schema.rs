//! The core schema capability.
//!
//! [`Schema`] is the one interface the gateway's validator knows about:
//! validate-and-transform an input value, or fail with structured issues.

use async_trait::async_trait;
use portcullis_core::ValidationError;
use serde_json::Value;
use std::sync::Arc;

/// A shared, type-erased schema as stored in route declarations.
pub type BoxedSchema = Arc<dyn Schema>;

/// A capability that validates and optionally transforms a JSON value.
///
/// Parsing is asynchronous: a schema is free to suspend (e.g. to consult an
/// external registry) and the validator awaits each slot in turn. Most
/// built-in schemas complete synchronously.
///
/// # Contract
///
/// - On success, the returned value replaces the input wherever the schema
///   was applied; schemas may coerce types or strip fields, so callers must
///   use the output, not the raw input.
/// - On failure, the [`ValidationError`] carries at least one issue, ordered
///   by field declaration order.
#[async_trait]
pub trait Schema: Send + Sync {
    /// Validates `value`, returning the transformed value on success.
    async fn parse(&self, value: Value) -> Result<Value, ValidationError>;
}

#[async_trait]
impl<S: Schema + ?Sized> Schema for Arc<S> {
    async fn parse(&self, value: Value) -> Result<Value, ValidationError> {
        (**self).parse(value).await
    }
}

/// Returns the JSON type name of a value, as used in mismatch messages.
#[must_use]
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "integer"
            } else {
                "number"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Builds the standard type-mismatch message.
#[must_use]
pub(crate) fn expected(expected: &str, actual: &Value) -> String {
    format!("Expected {expected}, received {}", type_name(actual))
}
