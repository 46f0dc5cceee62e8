//! Handler registration and dispatch.
//!
//! Each operation resolved by the [`Router`](crate::Router) maps to a
//! [`HandlerRegistry`] entry: the route's middleware chain (normalizer +
//! validator over its declared schemas) plus the handler itself.
//!
//! Handlers receive a [`RouteRequest`] carrying the post-validation slots.
//! Because the validator has already replaced the slots with its transformed
//! output, a handler reading them observes coerced and stripped values, not
//! the raw input.

use portcullis_core::{GatewayError, GatewayResult, RequestId};
use portcullis_middleware::{BoxFuture, Pipeline, Request, RequestSlots, Response, RouteSchemas};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// A type-erased route handler.
pub(crate) type ErasedHandler =
    Arc<dyn Fn(RouteRequest) -> BoxFuture<'static, GatewayResult<Response>> + Send + Sync>;

/// What a handler receives: request metadata plus the validated slots.
#[derive(Debug)]
pub struct RouteRequest {
    request_id: RequestId,
    slots: RequestSlots,
    inner: Request,
}

impl RouteRequest {
    /// Creates a route request. Called by the gateway at dispatch time.
    #[must_use]
    pub fn new(request_id: RequestId, slots: RequestSlots, inner: Request) -> Self {
        Self {
            request_id,
            slots,
            inner,
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the validated body.
    #[must_use]
    pub fn body(&self) -> &Value {
        self.slots.body()
    }

    /// Returns the validated path parameters.
    #[must_use]
    pub fn params(&self) -> &Value {
        self.slots.params()
    }

    /// Returns the validated query.
    #[must_use]
    pub fn query(&self) -> &Value {
        self.slots.query()
    }

    /// Deserializes the validated body into a typed value.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, GatewayError> {
        self.slots.body_as()
    }

    /// Deserializes the validated params into a typed value.
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, GatewayError> {
        self.slots.params_as()
    }

    /// Deserializes the validated query into a typed value.
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, GatewayError> {
        self.slots.query_as()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &http::HeaderMap {
        self.inner.headers()
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &http::Method {
        self.inner.method()
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &http::Uri {
        self.inner.uri()
    }
}

/// A registered route: its middleware chain and handler.
pub(crate) struct RouteEntry {
    pub(crate) pipeline: Arc<Pipeline>,
    pub(crate) handler: ErasedHandler,
}

/// Registry mapping operation IDs to their chains and handlers.
///
/// # Example
///
/// ```rust
/// use portcullis_middleware::{Response, ResponseExt, RouteSchemas};
/// use portcullis_server::HandlerRegistry;
///
/// let mut registry = HandlerRegistry::new();
/// registry.register("createUser", RouteSchemas::none(), |req| async move {
///     Ok(Response::json(http::StatusCode::CREATED, req.body()))
/// });
///
/// assert!(registry.contains("createUser"));
/// ```
#[derive(Default)]
pub struct HandlerRegistry {
    entries: HashMap<String, RouteEntry>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for an operation.
    ///
    /// The operation's chain is built here: error normalizer outermost,
    /// schema validator over `schemas` inside it. Registering the same
    /// operation twice replaces the previous entry.
    pub fn register<F, Fut>(
        &mut self,
        operation_id: impl Into<String>,
        schemas: RouteSchemas,
        handler: F,
    ) where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = GatewayResult<Response>> + Send + 'static,
    {
        let entry = RouteEntry {
            pipeline: Arc::new(Pipeline::standard(schemas)),
            handler: Arc::new(move |request| Box::pin(handler(request))),
        };
        self.entries.insert(operation_id.into(), entry);
    }

    /// Returns the entry for an operation.
    pub(crate) fn get(&self, operation_id: &str) -> Option<&RouteEntry> {
        self.entries.get(operation_id)
    }

    /// Checks whether an operation has a handler.
    #[must_use]
    pub fn contains(&self, operation_id: &str) -> bool {
        self.entries.contains_key(operation_id)
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("operations", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
