//! Per-request context carried through the middleware chain.
//!
//! The [`GatewayContext`] owns the three request slots the validator
//! operates on, the response commit state, and a typed extension map for
//! stages to leave data in.

use portcullis_core::{GatewayError, RequestId};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Instant;

/// Whether a response has begun for the current request.
///
/// Each request transitions `NotStarted` → `Committed` exactly once: either
/// the handler's success response or the normalizer's error envelope, never
/// both. A handler that starts writing its own response marks the context
/// committed first, which tells the normalizer a later failure can no longer
/// be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseState {
    /// No response bytes produced yet.
    #[default]
    NotStarted,
    /// A response has been (or is being) sent; nothing further may be written.
    Committed,
}

/// The three validated request facets: body, params, and query.
///
/// The server populates these from the raw request (JSON body, router path
/// parameters, urlencoded query string) before the chain runs. The validator
/// replaces each slot with its schema's transformed output, so handlers
/// always read post-validation values.
#[derive(Debug, Clone)]
pub struct RequestSlots {
    body: Value,
    params: Value,
    query: Value,
}

impl RequestSlots {
    /// Creates slots from already-parsed values.
    #[must_use]
    pub fn new(body: Value, params: Value, query: Value) -> Self {
        Self {
            body,
            params,
            query,
        }
    }

    /// Returns the request body value.
    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Returns the path-parameter value.
    #[must_use]
    pub fn params(&self) -> &Value {
        &self.params
    }

    /// Returns the query value.
    #[must_use]
    pub fn query(&self) -> &Value {
        &self.query
    }

    /// Replaces the body with a validated value.
    pub fn set_body(&mut self, value: Value) {
        self.body = value;
    }

    /// Replaces the params with a validated value.
    pub fn set_params(&mut self, value: Value) {
        self.params = value;
    }

    /// Replaces the query with a validated value.
    pub fn set_query(&mut self, value: Value) {
        self.query = value;
    }

    /// Deserializes the body into a typed value.
    ///
    /// Intended for handlers, after validation has shaped the slot.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, GatewayError> {
        serde_json::from_value(self.body.clone()).map_err(GatewayError::handler_from)
    }

    /// Deserializes the params into a typed value.
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, GatewayError> {
        serde_json::from_value(self.params.clone()).map_err(GatewayError::handler_from)
    }

    /// Deserializes the query into a typed value.
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, GatewayError> {
        serde_json::from_value(self.query.clone()).map_err(GatewayError::handler_from)
    }
}

impl Default for RequestSlots {
    fn default() -> Self {
        Self {
            body: Value::Object(Map::new()),
            params: Value::Object(Map::new()),
            query: Value::Object(Map::new()),
        }
    }
}

/// Context that flows through the middleware chain for one request.
///
/// Each request owns its context exclusively; no locking is needed.
///
/// # Example
///
/// ```
/// use portcullis_middleware::GatewayContext;
/// use serde_json::json;
///
/// let mut ctx = GatewayContext::new();
/// ctx.slots_mut().set_body(json!({"name": "Ann"}));
///
/// assert_eq!(ctx.slots().body(), &json!({"name": "Ann"}));
/// assert!(!ctx.response_committed());
/// ```
#[derive(Debug)]
pub struct GatewayContext {
    /// Unique identifier for this request.
    request_id: RequestId,

    /// The operation resolved by routing, when known.
    operation: Option<String>,

    /// The body/params/query slots.
    slots: RequestSlots,

    /// Response commit state.
    response_state: ResponseState,

    /// When the request started processing.
    started_at: Instant,

    /// Type-erased extension data left by stages.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl GatewayContext {
    /// Creates a new context with a fresh request ID and empty slots.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with a specific request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            operation: None,
            slots: RequestSlots::default(),
            response_state: ResponseState::NotStarted,
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the resolved operation ID, if routing has set one.
    #[must_use]
    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    /// Sets the resolved operation ID.
    pub fn set_operation(&mut self, operation: impl Into<String>) {
        self.operation = Some(operation.into());
    }

    /// Returns the request slots.
    #[must_use]
    pub fn slots(&self) -> &RequestSlots {
        &self.slots
    }

    /// Returns the request slots mutably.
    pub fn slots_mut(&mut self) -> &mut RequestSlots {
        &mut self.slots
    }

    /// Replaces the slots wholesale (used by the server after parsing).
    pub fn set_slots(&mut self, slots: RequestSlots) {
        self.slots = slots;
    }

    /// Returns `true` once a response has been committed for this request.
    #[must_use]
    pub fn response_committed(&self) -> bool {
        self.response_state == ResponseState::Committed
    }

    /// Marks the response as committed.
    ///
    /// Idempotent: the state machine has a single transition.
    pub fn mark_committed(&mut self) {
        self.response_state = ResponseState::Committed;
    }

    /// Returns when the request started processing.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }
}

impl Default for GatewayContext {
    fn default() -> Self {
        Self::new()
    }
}
