//! # Portcullis Schema
//!
//! The schema-validation engine behind the gateway's request validator.
//!
//! A [`Schema`] is a single capability: asynchronously validate-and-transform
//! an input [`serde_json::Value`] into a typed value, or fail with a
//! structured [`ValidationError`](portcullis_core::ValidationError) carrying
//! ordered issues (path + message).
//!
//! Concrete variants compose into the shapes routes declare:
//!
//! - [`ObjectSchema`] - required/optional fields, unknown-key policy
//!   (strip by default), per-field schemas
//! - [`StringSchema`], [`IntegerSchema`], [`NumberSchema`], [`BooleanSchema`]
//!   - scalar checks, with opt-in coercion from string-encoded values
//! - [`ArraySchema`] - element-wise validation with indexed issue paths
//! - [`AnySchema`] - accepts and passes anything through
//!
//! ## Example
//!
//! ```
//! use portcullis_schema::{ObjectSchema, Schema, StringSchema};
//! use serde_json::json;
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let schema = ObjectSchema::builder()
//!     .field("name", StringSchema::new())
//!     .build();
//!
//! // Unknown keys are stripped by default.
//! let value = schema.parse(json!({"name": "Ann", "extra": 1})).await.unwrap();
//! assert_eq!(value, json!({"name": "Ann"}));
//!
//! // A missing required field fails with path `name`, message `Required`.
//! let err = schema.parse(json!({})).await.unwrap_err();
//! assert_eq!(err.first().render(), "name Required");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/portcullis-schema/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod array;
pub mod object;
pub mod scalar;
pub mod schema;

pub use array::ArraySchema;
pub use object::{ObjectSchema, ObjectSchemaBuilder, UnknownKeys};
pub use scalar::{AnySchema, BooleanSchema, IntegerSchema, NumberSchema, StringSchema};
pub use schema::{BoxedSchema, Schema};
