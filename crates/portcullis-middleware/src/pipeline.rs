//! Middleware chain assembly.
//!
//! A [`Pipeline`] holds an ordered list of stages. The first stage added is
//! the outermost: it sees the request first and the response (or error)
//! last. The error normalizer therefore goes first, the validator after it,
//! and the handler terminates the chain.
//!
//! ```text
//! pipeline.process(ctx, request, handler)
//!   └─ ErrorNormalizer
//!        └─ SchemaValidator
//!             └─ handler
//! ```

use crate::context::GatewayContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::stages::{ErrorNormalizer, RouteSchemas, SchemaValidator};
use crate::types::{Request, Response};
use portcullis_core::GatewayResult;
use std::sync::Arc;

/// A type-erased middleware stage.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An ordered middleware chain, built once per route and shared.
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Creates the standard chain for a route: error normalizer outermost,
    /// schema validator inside it.
    #[must_use]
    pub fn standard(schemas: RouteSchemas) -> Self {
        Self::builder()
            .add_stage(ErrorNormalizer::new())
            .add_stage(SchemaValidator::new(schemas))
            .build()
    }

    /// Processes a request through the chain, ending at `handler`.
    pub async fn process<H>(
        &self,
        ctx: &mut GatewayContext,
        request: Request,
        handler: H,
    ) -> GatewayResult<Response>
    where
        H: FnOnce(&mut GatewayContext, Request) -> BoxFuture<'static, GatewayResult<Response>>
            + Send
            + 'static,
    {
        let next = self.build_chain(handler);
        next.run(ctx, request).await
    }

    /// Builds the chain back-to-front so the first stage wraps the rest.
    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut GatewayContext, Request) -> BoxFuture<'static, GatewayResult<Response>>
            + Send
            + 'a,
    {
        let mut next = Next::handler(handler);
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the names of all stages in order (outermost first).
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|m| m.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Appends a stage. Earlier stages wrap later ones.
    #[must_use]
    pub fn add_stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
    use http_body_util::Full;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct OrderTracking {
        name: &'static str,
        counter: Arc<AtomicUsize>,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Middleware for OrderTracking {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut GatewayContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, GatewayResult<Response>> {
            let counter = self.counter.clone();
            let order = self.order.clone();
            let name = self.name;

            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                order.lock().unwrap().push(name);
                next.run(ctx, request).await
            })
        }
    }

    fn test_request() -> Request {
        HttpRequest::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn ok_handler(
        _ctx: &mut GatewayContext,
        _req: Request,
    ) -> BoxFuture<'static, GatewayResult<Response>> {
        Box::pin(async {
            Ok(HttpResponse::builder()
                .status(StatusCode::OK)
                .body(Full::new(Bytes::from("OK")))
                .unwrap())
        })
    }

    #[tokio::test]
    async fn test_stages_execute_in_added_order() {
        let counter = Arc::new(AtomicUsize::new(0));
        let order = Arc::new(Mutex::new(Vec::new()));

        let pipeline = Pipeline::builder()
            .add_stage(OrderTracking {
                name: "outer",
                counter: counter.clone(),
                order: order.clone(),
            })
            .add_stage(OrderTracking {
                name: "inner",
                counter: counter.clone(),
                order: order.clone(),
            })
            .build();

        let mut ctx = GatewayContext::new();
        let response = pipeline
            .process(&mut ctx, test_request(), ok_handler)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(*order.lock().unwrap(), vec!["outer", "inner"]);
    }

    #[tokio::test]
    async fn test_empty_pipeline_runs_handler() {
        let pipeline = Pipeline::builder().build();
        let mut ctx = GatewayContext::new();

        let response = pipeline
            .process(&mut ctx, test_request(), ok_handler)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_standard_pipeline_stage_order() {
        let pipeline = Pipeline::standard(RouteSchemas::none());
        assert_eq!(
            pipeline.stage_names(),
            vec!["error_normalizer", "schema_validator"]
        );
        assert_eq!(pipeline.stage_count(), 2);
    }
}
