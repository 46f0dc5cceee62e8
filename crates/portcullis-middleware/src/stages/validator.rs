//! Request validation middleware.
//!
//! [`SchemaValidator`] runs before a route's handler. It checks the three
//! request slots - body, then params, then query, in that fixed order -
//! against the route's declared [`RouteSchemas`], replacing each slot's
//! value with the schema's transformed output.
//!
//! A slot with no declared schema is never touched: absence means "accept
//! anything, pass through unchanged".
//!
//! The first failing slot aborts validation: remaining slots are not
//! checked, and the [`ValidationError`](portcullis_core::ValidationError)
//! propagates outward to the error normalizer. The check order therefore
//! decides which error surfaces when several slots are invalid.
//!
//! # Example
//!
//! ```
//! use portcullis_middleware::RouteSchemas;
//! use portcullis_schema::{ObjectSchema, StringSchema};
//!
//! let schemas = RouteSchemas::builder()
//!     .body(
//!         ObjectSchema::builder()
//!             .field("name", StringSchema::new())
//!             .build(),
//!     )
//!     .build();
//!
//! assert!(schemas.body().is_some());
//! assert!(schemas.params().is_none());
//! ```

use crate::context::GatewayContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use portcullis_core::GatewayResult;
use portcullis_schema::{BoxedSchema, Schema};
use std::sync::Arc;

/// Per-route schema declaration: three independently optional slots.
#[derive(Clone, Default)]
pub struct RouteSchemas {
    body: Option<BoxedSchema>,
    params: Option<BoxedSchema>,
    query: Option<BoxedSchema>,
}

impl RouteSchemas {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> RouteSchemasBuilder {
        RouteSchemasBuilder::default()
    }

    /// Creates a declaration with no constraints on any slot.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns the body schema, if declared.
    #[must_use]
    pub fn body(&self) -> Option<&BoxedSchema> {
        self.body.as_ref()
    }

    /// Returns the params schema, if declared.
    #[must_use]
    pub fn params(&self) -> Option<&BoxedSchema> {
        self.params.as_ref()
    }

    /// Returns the query schema, if declared.
    #[must_use]
    pub fn query(&self) -> Option<&BoxedSchema> {
        self.query.as_ref()
    }
}

impl std::fmt::Debug for RouteSchemas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteSchemas")
            .field("body", &self.body.is_some())
            .field("params", &self.params.is_some())
            .field("query", &self.query.is_some())
            .finish()
    }
}

/// Builder for [`RouteSchemas`].
#[derive(Default)]
pub struct RouteSchemasBuilder {
    body: Option<BoxedSchema>,
    params: Option<BoxedSchema>,
    query: Option<BoxedSchema>,
}

impl RouteSchemasBuilder {
    /// Declares the body schema.
    #[must_use]
    pub fn body(mut self, schema: impl Schema + 'static) -> Self {
        self.body = Some(Arc::new(schema));
        self
    }

    /// Declares the params schema.
    #[must_use]
    pub fn params(mut self, schema: impl Schema + 'static) -> Self {
        self.params = Some(Arc::new(schema));
        self
    }

    /// Declares the query schema.
    #[must_use]
    pub fn query(mut self, schema: impl Schema + 'static) -> Self {
        self.query = Some(Arc::new(schema));
        self
    }

    /// Builds the declaration.
    #[must_use]
    pub fn build(self) -> RouteSchemas {
        RouteSchemas {
            body: self.body,
            params: self.params,
            query: self.query,
        }
    }
}

/// Middleware enforcing a route's [`RouteSchemas`] before its handler runs.
#[derive(Clone)]
pub struct SchemaValidator {
    schemas: Arc<RouteSchemas>,
}

impl SchemaValidator {
    /// Creates a validator for the given route declaration.
    #[must_use]
    pub fn new(schemas: RouteSchemas) -> Self {
        Self {
            schemas: Arc::new(schemas),
        }
    }
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schemas", &self.schemas)
            .finish()
    }
}

impl Middleware for SchemaValidator {
    fn name(&self) -> &'static str {
        "schema_validator"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut GatewayContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, GatewayResult<Response>> {
        Box::pin(async move {
            // Diagnostic trace of the pre-validation body.
            tracing::debug!(
                request_id = %ctx.request_id(),
                body = %ctx.slots().body(),
                "raw request body"
            );

            if let Some(schema) = self.schemas.body() {
                let validated = schema.parse(ctx.slots().body().clone()).await?;
                ctx.slots_mut().set_body(validated);
            }
            if let Some(schema) = self.schemas.params() {
                let validated = schema.parse(ctx.slots().params().clone()).await?;
                ctx.slots_mut().set_params(validated);
            }
            if let Some(schema) = self.schemas.query() {
                let validated = schema.parse(ctx.slots().query().clone()).await?;
                ctx.slots_mut().set_query(validated);
            }

            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
    use http_body_util::Full;
    use portcullis_core::GatewayError;
    use portcullis_schema::{IntegerSchema, ObjectSchema, StringSchema};
    use serde_json::json;

    fn test_request() -> Request {
        HttpRequest::builder()
            .method("POST")
            .uri("/users")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn ok_handler(
    ) -> impl FnOnce(&mut GatewayContext, Request) -> BoxFuture<'static, GatewayResult<Response>>
    {
        |_ctx, _req| {
            Box::pin(async {
                Ok(HttpResponse::builder()
                    .status(StatusCode::OK)
                    .body(Full::new(Bytes::new()))
                    .unwrap())
            })
        }
    }

    fn body_schema() -> RouteSchemas {
        RouteSchemas::builder()
            .body(
                ObjectSchema::builder()
                    .field("name", StringSchema::new())
                    .build(),
            )
            .build()
    }

    #[test]
    fn test_middleware_name() {
        let validator = SchemaValidator::new(RouteSchemas::none());
        assert_eq!(validator.name(), "schema_validator");
    }

    #[tokio::test]
    async fn test_no_schemas_passes_and_leaves_slots_untouched() {
        let validator = SchemaValidator::new(RouteSchemas::none());
        let mut ctx = GatewayContext::new();
        ctx.slots_mut().set_body(json!({"anything": ["goes", 1]}));

        let result = validator
            .process(&mut ctx, test_request(), Next::handler(ok_handler()))
            .await;

        assert!(result.is_ok());
        assert_eq!(ctx.slots().body(), &json!({"anything": ["goes", 1]}));
    }

    #[tokio::test]
    async fn test_valid_body_is_replaced_with_transform() {
        let validator = SchemaValidator::new(body_schema());
        let mut ctx = GatewayContext::new();
        ctx.slots_mut().set_body(json!({"name": "Ann", "extra": 1}));

        validator
            .process(&mut ctx, test_request(), Next::handler(ok_handler()))
            .await
            .unwrap();

        // The stripping schema removed the undeclared key.
        assert_eq!(ctx.slots().body(), &json!({"name": "Ann"}));
    }

    #[tokio::test]
    async fn test_invalid_body_propagates_validation_error() {
        let validator = SchemaValidator::new(body_schema());
        let mut ctx = GatewayContext::new();
        ctx.slots_mut().set_body(json!({}));

        let err = validator
            .process(&mut ctx, test_request(), Next::handler(ok_handler()))
            .await
            .unwrap_err();

        match err {
            GatewayError::Validation(err) => {
                assert_eq!(err.first().path.to_string(), "name");
                assert_eq!(err.first().render(), "name Required");
            }
            GatewayError::Handler { .. } => panic!("expected validation failure"),
        }
    }

    #[tokio::test]
    async fn test_handler_does_not_run_on_failure() {
        let validator = SchemaValidator::new(body_schema());
        let mut ctx = GatewayContext::new();

        let result = validator
            .process(
                &mut ctx,
                test_request(),
                Next::handler(|_ctx: &mut GatewayContext, _req: Request| {
                    Box::pin(async {
                        panic!("handler must not run");
                        #[allow(unreachable_code)]
                        let out: GatewayResult<Response> = unreachable!();
                        #[allow(unreachable_code)]
                        out
                    }) as BoxFuture<'static, GatewayResult<Response>>
                }),
            )
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_body_failure_short_circuits_remaining_slots() {
        // Both body and query are invalid; only the body error surfaces,
        // and the query slot is left exactly as it came in.
        let schemas = RouteSchemas::builder()
            .body(
                ObjectSchema::builder()
                    .field("name", StringSchema::new())
                    .build(),
            )
            .query(
                ObjectSchema::builder()
                    .field("page", IntegerSchema::coercing())
                    .build(),
            )
            .build();
        let validator = SchemaValidator::new(schemas);

        let mut ctx = GatewayContext::new();
        ctx.slots_mut().set_query(json!({"page": "not-a-number"}));

        let err = validator
            .process(&mut ctx, test_request(), Next::handler(ok_handler()))
            .await
            .unwrap_err();

        assert_eq!(err.to_response_error().message, "name Required");
        assert_eq!(ctx.slots().query(), &json!({"page": "not-a-number"}));
    }

    #[tokio::test]
    async fn test_slot_order_body_params_query() {
        let schemas = RouteSchemas::builder()
            .params(
                ObjectSchema::builder()
                    .field("id", IntegerSchema::coercing())
                    .build(),
            )
            .query(
                ObjectSchema::builder()
                    .field("page", IntegerSchema::coercing())
                    .build(),
            )
            .build();
        let validator = SchemaValidator::new(schemas);

        // Params are checked before query, so the params error wins.
        let mut ctx = GatewayContext::new();
        ctx.slots_mut().set_params(json!({}));
        ctx.slots_mut().set_query(json!({}));

        let err = validator
            .process(&mut ctx, test_request(), Next::handler(ok_handler()))
            .await
            .unwrap_err();

        assert_eq!(err.to_response_error().message, "id Required");
    }

    #[tokio::test]
    async fn test_query_coercion_replaces_slot_value() {
        let schemas = RouteSchemas::builder()
            .query(
                ObjectSchema::builder()
                    .field("page", IntegerSchema::coercing())
                    .build(),
            )
            .build();
        let validator = SchemaValidator::new(schemas);

        let mut ctx = GatewayContext::new();
        ctx.slots_mut().set_query(json!({"page": "3"}));

        validator
            .process(&mut ctx, test_request(), Next::handler(ok_handler()))
            .await
            .unwrap();

        assert_eq!(ctx.slots().query(), &json!({"page": 3}));
    }
}
