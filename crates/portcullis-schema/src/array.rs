//! Array schemas with element-wise validation.

use crate::schema::{expected, BoxedSchema, Schema};
use async_trait::async_trait;
use portcullis_core::{IssuePath, ValidationError};
use serde_json::Value;
use std::sync::Arc;

/// Schema for JSON arrays where every element matches one element schema.
///
/// Element failures are relocated under the offending index, so a bad third
/// element of `tags` surfaces as `tags.2 <message>` once the enclosing
/// object prefixes its key.
pub struct ArraySchema {
    element: BoxedSchema,
    min_items: Option<usize>,
}

impl ArraySchema {
    /// Creates an array schema with the given element schema.
    #[must_use]
    pub fn new(element: impl Schema + 'static) -> Self {
        Self {
            element: Arc::new(element),
            min_items: None,
        }
    }

    /// Requires at least `min` elements.
    #[must_use]
    pub fn min_items(mut self, min: usize) -> Self {
        self.min_items = Some(min);
        self
    }
}

impl std::fmt::Debug for ArraySchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArraySchema")
            .field("min_items", &self.min_items)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Schema for ArraySchema {
    async fn parse(&self, value: Value) -> Result<Value, ValidationError> {
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(ValidationError::single(
                    IssuePath::root(),
                    expected("array", &other),
                ));
            }
        };

        if let Some(min) = self.min_items {
            if items.len() < min {
                return Err(ValidationError::single(
                    IssuePath::root(),
                    format!("Array must contain at least {min} element(s)"),
                ));
            }
        }

        let mut output = Vec::with_capacity(items.len());
        let mut issues = Vec::new();

        for (index, item) in items.into_iter().enumerate() {
            match self.element.parse(item).await {
                Ok(parsed) => output.push(parsed),
                Err(err) => issues.extend(err.prefixed(index).issues().iter().cloned()),
            }
        }

        if issues.is_empty() {
            Ok(Value::Array(output))
        } else {
            Err(ValidationError::new(issues))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::StringSchema;
    use serde_json::json;

    #[tokio::test]
    async fn test_valid_array_passes() {
        let schema = ArraySchema::new(StringSchema::new());
        let out = schema.parse(json!(["a", "b"])).await.unwrap();
        assert_eq!(out, json!(["a", "b"]));
    }

    #[tokio::test]
    async fn test_bad_element_reported_by_index() {
        let schema = ArraySchema::new(StringSchema::new());
        let err = schema.parse(json!(["a", 2, "c"])).await.unwrap_err();
        assert_eq!(err.first().render(), "1 Expected string, received integer");
    }

    #[tokio::test]
    async fn test_non_array_rejected() {
        let schema = ArraySchema::new(StringSchema::new());
        let err = schema.parse(json!("not-an-array")).await.unwrap_err();
        assert_eq!(err.first().message, "Expected array, received string");
    }

    #[tokio::test]
    async fn test_min_items() {
        let schema = ArraySchema::new(StringSchema::new()).min_items(1);
        let err = schema.parse(json!([])).await.unwrap_err();
        assert_eq!(err.first().message, "Array must contain at least 1 element(s)");
    }
}
