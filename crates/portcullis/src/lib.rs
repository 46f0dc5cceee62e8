//! # Portcullis
//!
//! **Request-validation and error-normalization gateway**
//!
//! Portcullis puts a gate in front of route handlers:
//!
//! - **Schema validation** - each route declares optional schemas for its
//!   body, params, and query; the validator enforces and type-narrows them
//!   before the handler runs, replacing the slots with the transformed
//!   values.
//! - **Error normalization** - every failure anywhere in the chain
//!   (validation, handler error, panic) becomes one deterministic JSON
//!   envelope: `{ "statusCode": ..., "message": ..., "errorCode": ... }`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use portcullis::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schemas = RouteSchemas::builder()
//!         .body(ObjectSchema::builder().field("name", StringSchema::new()).build())
//!         .build();
//!
//!     let gateway = Gateway::builder()
//!         .route(http::Method::POST, "/users", "createUser", schemas, |req| async move {
//!             Ok(Response::json(http::StatusCode::CREATED, req.body()))
//!         })
//!         .build();
//!
//!     Server::new(ServerConfig::from_env(), gateway).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → ErrorNormalizer → SchemaValidator → Handler
//!                                                  ↓
//! Response ← ErrorNormalizer ←──────(Ok | Err)────┘
//! ```

#![doc(html_root_url = "https://docs.rs/portcullis/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export component crates
pub use portcullis_core as core;
pub use portcullis_middleware as middleware;
pub use portcullis_schema as schema;
pub use portcullis_server as server;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use portcullis::prelude::*;
///
/// let schemas = RouteSchemas::builder()
///     .body(ObjectSchema::builder().field("name", StringSchema::new()).build())
///     .build();
/// assert!(schemas.body().is_some());
/// ```
pub mod prelude {
    pub use portcullis_core::{
        GatewayError, GatewayResult, Issue, IssuePath, RequestId, ResponseError, ValidationError,
    };

    pub use portcullis_schema::{
        AnySchema, ArraySchema, BooleanSchema, IntegerSchema, NumberSchema, ObjectSchema, Schema,
        StringSchema, UnknownKeys,
    };

    pub use portcullis_middleware::{
        ErrorNormalizer, GatewayContext, Middleware, Next, Pipeline, Request, Response,
        ResponseExt, RouteSchemas, SchemaValidator,
    };

    pub use portcullis_server::{
        Gateway, HandlerRegistry, RouteRequest, Router, Server, ServerConfig, ShutdownSignal,
    };
}
