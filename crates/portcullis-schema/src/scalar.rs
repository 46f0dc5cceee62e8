//! Scalar schemas: strings, integers, numbers, booleans, and any.
//!
//! The numeric and boolean schemas support an opt-in coerce mode that
//! accepts string-encoded values. Query strings and path parameters arrive
//! as strings, so routes validating those slots typically declare coercing
//! schemas to receive properly typed values.

use crate::schema::{expected, Schema};
use async_trait::async_trait;
use portcullis_core::{IssuePath, ValidationError};
use serde_json::{Number, Value};

/// Schema accepting JSON strings, with optional length bounds.
///
/// # Example
///
/// ```
/// use portcullis_schema::{Schema, StringSchema};
/// use serde_json::json;
///
/// # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// # rt.block_on(async {
/// let schema = StringSchema::new().min_length(1);
/// assert!(schema.parse(json!("Ann")).await.is_ok());
/// assert!(schema.parse(json!("")).await.is_err());
/// assert!(schema.parse(json!(42)).await.is_err());
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct StringSchema {
    min_length: Option<usize>,
    max_length: Option<usize>,
}

impl StringSchema {
    /// Creates a schema accepting any JSON string.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires at least `min` characters.
    #[must_use]
    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    /// Requires at most `max` characters.
    #[must_use]
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }
}

#[async_trait]
impl Schema for StringSchema {
    async fn parse(&self, value: Value) -> Result<Value, ValidationError> {
        let s = match value {
            Value::String(s) => s,
            other => {
                return Err(ValidationError::single(
                    IssuePath::root(),
                    expected("string", &other),
                ));
            }
        };

        let chars = s.chars().count();
        if let Some(min) = self.min_length {
            if chars < min {
                return Err(ValidationError::single(
                    IssuePath::root(),
                    format!("String must contain at least {min} character(s)"),
                ));
            }
        }
        if let Some(max) = self.max_length {
            if chars > max {
                return Err(ValidationError::single(
                    IssuePath::root(),
                    format!("String must contain at most {max} character(s)"),
                ));
            }
        }

        Ok(Value::String(s))
    }
}

/// Schema accepting JSON integers, optionally coercing from strings.
#[derive(Debug, Clone, Default)]
pub struct IntegerSchema {
    coerce: bool,
}

impl IntegerSchema {
    /// Creates a schema accepting JSON integers only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also accepts string-encoded integers (e.g. `"42"` from a query).
    #[must_use]
    pub fn coercing() -> Self {
        Self { coerce: true }
    }
}

#[async_trait]
impl Schema for IntegerSchema {
    async fn parse(&self, value: Value) -> Result<Value, ValidationError> {
        match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::Number(n)),
            Value::String(s) if self.coerce => match s.parse::<i64>() {
                Ok(n) => Ok(Value::Number(Number::from(n))),
                Err(_) => Err(ValidationError::single(
                    IssuePath::root(),
                    expected("integer", &Value::String(s)),
                )),
            },
            other => Err(ValidationError::single(
                IssuePath::root(),
                expected("integer", &other),
            )),
        }
    }
}

/// Schema accepting any JSON number, optionally coercing from strings.
#[derive(Debug, Clone, Default)]
pub struct NumberSchema {
    coerce: bool,
}

impl NumberSchema {
    /// Creates a schema accepting JSON numbers only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also accepts string-encoded numbers.
    #[must_use]
    pub fn coercing() -> Self {
        Self { coerce: true }
    }
}

#[async_trait]
impl Schema for NumberSchema {
    async fn parse(&self, value: Value) -> Result<Value, ValidationError> {
        match value {
            Value::Number(n) => Ok(Value::Number(n)),
            Value::String(s) if self.coerce => {
                match s.parse::<f64>().ok().and_then(Number::from_f64) {
                    Some(n) => Ok(Value::Number(n)),
                    None => Err(ValidationError::single(
                        IssuePath::root(),
                        expected("number", &Value::String(s)),
                    )),
                }
            }
            other => Err(ValidationError::single(
                IssuePath::root(),
                expected("number", &other),
            )),
        }
    }
}

/// Schema accepting JSON booleans, optionally coercing from `"true"`/`"false"`.
#[derive(Debug, Clone, Default)]
pub struct BooleanSchema {
    coerce: bool,
}

impl BooleanSchema {
    /// Creates a schema accepting JSON booleans only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also accepts the strings `"true"` and `"false"`.
    #[must_use]
    pub fn coercing() -> Self {
        Self { coerce: true }
    }
}

#[async_trait]
impl Schema for BooleanSchema {
    async fn parse(&self, value: Value) -> Result<Value, ValidationError> {
        match value {
            Value::Bool(b) => Ok(Value::Bool(b)),
            Value::String(s) if self.coerce => {
                if s == "true" {
                    Ok(Value::Bool(true))
                } else if s == "false" {
                    Ok(Value::Bool(false))
                } else {
                    Err(ValidationError::single(
                        IssuePath::root(),
                        expected("boolean", &Value::String(s)),
                    ))
                }
            }
            other => Err(ValidationError::single(
                IssuePath::root(),
                expected("boolean", &other),
            )),
        }
    }
}

/// Schema that accepts any value unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnySchema;

impl AnySchema {
    /// Creates the pass-through schema.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Schema for AnySchema {
    async fn parse(&self, value: Value) -> Result<Value, ValidationError> {
        Ok(value)
    }
}
