//! The gateway's middleware stages.
//!
//! Two stages make up the standard chain:
//!
//! 1. [`ErrorNormalizer`] - outermost; converts any failure into the
//!    normalized JSON envelope
//! 2. [`SchemaValidator`] - validates the request slots before the handler

pub mod error_normalizer;
pub mod validator;

pub use error_normalizer::{ErrorNormalizer, NormalizedError, SuppressedFailure};
pub use validator::{RouteSchemas, RouteSchemasBuilder, SchemaValidator};
