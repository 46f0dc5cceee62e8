//! # Portcullis Middleware
//!
//! The request-lifecycle chain of the Portcullis gateway.
//!
//! Stages wrap each other onion-style and either produce a response or
//! propagate a [`GatewayError`](portcullis_core::GatewayError) outward:
//!
//! ```text
//! Request → ErrorNormalizer → SchemaValidator → Handler
//!                                                  ↓
//! Response ← ErrorNormalizer ←──────(Ok | Err)────┘
//! ```
//!
//! Two stages are provided:
//!
//! - [`SchemaValidator`](stages::SchemaValidator) runs before the handler,
//!   validating and replacing the request's body/params/query slots against
//!   the route's declared schemas. It short-circuits on the first failing
//!   slot.
//! - [`ErrorNormalizer`](stages::ErrorNormalizer) is the terminal (outermost)
//!   stage: every `Err` and every panic escaping the stages it wraps is
//!   classified, logged, and converted into the fixed three-field JSON
//!   envelope - unless the response was already committed, in which case it
//!   yields nothing further.
//!
//! On the success path the handler's response travels outward untouched and
//! the normalizer only records the response commit.

#![doc(html_root_url = "https://docs.rs/portcullis-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

// Re-export main types at crate root
pub use context::{GatewayContext, RequestSlots, ResponseState};
pub use middleware::{BoxFuture, FnMiddleware, Middleware, Next};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use stages::{ErrorNormalizer, RouteSchemas, RouteSchemasBuilder, SchemaValidator};
pub use types::{Request, Response, ResponseExt};
