//! Request dispatch: from a raw HTTP request to a middleware-chain run.
//!
//! The [`Gateway`] is the glue between the HTTP server and the chain:
//!
//! 1. Resolve the route (method + path → operation ID, path params).
//! 2. Parse the three request slots: JSON body (an empty body parses as
//!    `{}`), router path params, urlencoded query string.
//! 3. Run the route's chain - error normalizer outermost, schema validator
//!    inside - ending at the registered handler.
//! 4. Stamp the response with the request ID.
//!
//! A request matching no route is answered with the normalized envelope
//! directly: status 404, message `"Cannot <METHOD> <path>"`. A body that is
//! not valid JSON becomes a validation failure fed through the normalizer,
//! so clients see the same envelope shape for every failure mode.

use crate::handler::{HandlerRegistry, RouteRequest};
use crate::router::Router;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use portcullis_core::{GatewayError, GatewayResult, IssuePath, ResponseError, ValidationError};
use portcullis_middleware::{
    ErrorNormalizer, GatewayContext, Pipeline, Request, RequestSlots, Response, ResponseExt,
    RouteSchemas,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Header carrying the request ID on every response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Dispatches requests through routing, slot parsing, and the middleware
/// chain.
///
/// One `Gateway` serves all requests; each request gets its own
/// [`GatewayContext`], so no state is shared between requests.
pub struct Gateway {
    router: Router,
    registry: HandlerRegistry,
    /// Chain used for failures raised before a route's own chain can run
    /// (malformed body JSON). Holds only the error normalizer.
    error_pipeline: Pipeline,
}

impl Gateway {
    /// Creates a new gateway builder.
    #[must_use]
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::default()
    }

    /// Creates a gateway from an already-populated router and registry.
    #[must_use]
    pub fn new(router: Router, registry: HandlerRegistry) -> Self {
        Self {
            router,
            registry,
            error_pipeline: Pipeline::builder().add_stage(ErrorNormalizer::new()).build(),
        }
    }

    /// Handles one request end-to-end, always producing a response.
    pub async fn handle(&self, request: Request) -> Response {
        let mut ctx = GatewayContext::new();
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let Some(matched) = self.router.match_route(&method, &path) else {
            tracing::debug!(
                request_id = %ctx.request_id(),
                %method,
                %path,
                "no route matched"
            );
            let envelope = ResponseError::not_found(format!("Cannot {method} {path}"));
            return Self::finalize(&ctx, Ok(Response::json_error(&envelope)));
        };

        ctx.set_operation(matched.operation_id());

        let Some(entry) = self.registry.get(matched.operation_id()) else {
            // A route without a registered handler is indistinguishable from
            // an unknown route as far as clients are concerned.
            let envelope = ResponseError::not_found(format!("Cannot {method} {path}"));
            return Self::finalize(&ctx, Ok(Response::json_error(&envelope)));
        };

        let (parts, body) = request.into_parts();
        let bytes = body
            .collect()
            .await
            .expect("buffered body collection is infallible")
            .to_bytes();

        let slots = Self::parse_slots(&parts, &bytes, matched.params());
        let request = Request::from_parts(parts, Full::new(bytes));

        let result = match slots {
            Ok(slots) => {
                ctx.set_slots(slots);
                let handler = entry.handler.clone();
                entry
                    .pipeline
                    .process(&mut ctx, request, move |ctx, request| {
                        let input =
                            RouteRequest::new(ctx.request_id(), ctx.slots().clone(), request);
                        handler(input)
                    })
                    .await
            }
            Err(error) => {
                self.error_pipeline
                    .process(&mut ctx, request, move |_ctx, _request| {
                        Box::pin(async move { Err(GatewayError::from(error)) })
                    })
                    .await
            }
        };

        Self::finalize(&ctx, result)
    }

    /// Parses the three request slots from the raw request.
    fn parse_slots(
        parts: &http::request::Parts,
        body: &Bytes,
        params: &HashMap<String, String>,
    ) -> Result<RequestSlots, ValidationError> {
        let body = if body.is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_slice(body).map_err(|e| {
                ValidationError::single(IssuePath::root(), format!("Invalid JSON: {e}"))
            })?
        };

        let params = Value::Object(
            params
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        );

        let query = match parts.uri.query() {
            None => Value::Object(Map::new()),
            Some(raw) => {
                let pairs: Vec<(String, String)> =
                    serde_urlencoded::from_str(raw).map_err(|e| {
                        ValidationError::single(
                            IssuePath::root(),
                            format!("Invalid query string: {e}"),
                        )
                    })?;
                Value::Object(
                    pairs
                        .into_iter()
                        .map(|(k, v)| (k, Value::String(v)))
                        .collect(),
                )
            }
        };

        Ok(RequestSlots::new(body, params, query))
    }

    /// Stamps the request ID onto the outgoing response.
    fn finalize(ctx: &GatewayContext, result: GatewayResult<Response>) -> Response {
        // The normalizer recovers every failure, so the error arm only fires
        // for chains assembled without it.
        let mut response =
            result.unwrap_or_else(|err| Response::json_error(&err.to_response_error()));
        response.headers_mut().insert(
            REQUEST_ID_HEADER,
            ctx.request_id()
                .to_string()
                .parse()
                .expect("valid header value"),
        );
        response
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("routes", &self.router.route_count())
            .field("handlers", &self.registry.len())
            .finish()
    }
}

/// Builder wiring routes and handlers into a [`Gateway`].
///
/// # Example
///
/// ```rust
/// use portcullis_middleware::{Response, ResponseExt, RouteSchemas};
/// use portcullis_server::Gateway;
///
/// let gateway = Gateway::builder()
///     .route(
///         http::Method::POST,
///         "/users",
///         "createUser",
///         RouteSchemas::none(),
///         |req| async move { Ok(Response::json(http::StatusCode::CREATED, req.body())) },
///     )
///     .build();
/// ```
#[derive(Default)]
pub struct GatewayBuilder {
    router: Router,
    registry: HandlerRegistry,
}

impl GatewayBuilder {
    /// Declares a route: its method + path template, operation ID, schema
    /// set, and handler.
    #[must_use]
    pub fn route<F, Fut>(
        mut self,
        method: http::Method,
        pattern: &str,
        operation_id: &str,
        schemas: RouteSchemas,
        handler: F,
    ) -> Self
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = GatewayResult<Response>> + Send + 'static,
    {
        self.router.add_route(method, pattern, operation_id);
        self.registry.register(operation_id, schemas, handler);
        self
    }

    /// Builds the gateway.
    #[must_use]
    pub fn build(self) -> Gateway {
        Gateway::new(self.router, self.registry)
    }
}

/// Shared gateway handle, as held by server connections.
pub type SharedGateway = Arc<Gateway>;
