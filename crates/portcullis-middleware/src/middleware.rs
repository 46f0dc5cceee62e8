//! Core middleware trait and chain types.
//!
//! A [`Middleware`] receives the request, the mutable [`GatewayContext`],
//! and a [`Next`] continuation. It either produces a response, forwards to
//! the next stage, or propagates a [`GatewayError`] outward to the stage
//! that wraps it. The error normalizer sits outermost and is the single
//! point of recovery for the whole chain.
//!
//! # Example
//!
//! ```
//! use portcullis_core::GatewayResult;
//! use portcullis_middleware::{BoxFuture, GatewayContext, Middleware, Next, Request, Response};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut GatewayContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, GatewayResult<Response>> {
//!         Box::pin(async move {
//!             let response = next.run(ctx, request).await?;
//!             tracing::debug!(elapsed = ?ctx.elapsed(), "request finished");
//!             Ok(response)
//!         })
//!     }
//! }
//! ```

use crate::context::GatewayContext;
use crate::types::{Request, Response};
use portcullis_core::GatewayResult;
use std::future::Future;
use std::pin::Pin;

/// A boxed future, as returned by middleware stages.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The terminal handler invoked when the chain is exhausted.
pub type Handler<'a> =
    Box<dyn FnOnce(&mut GatewayContext, Request) -> BoxFuture<'static, GatewayResult<Response>> + Send + 'a>;

/// A single stage in the middleware chain.
///
/// # Invariants
///
/// - A stage calls `next.run()` at most once; not calling it short-circuits
///   the chain with the stage's own result.
/// - A stage must not swallow errors from downstream unless it is the
///   designated recovery point (the error normalizer).
pub trait Middleware: Send + Sync + 'static {
    /// Returns the unique name of this stage, used for logging.
    fn name(&self) -> &'static str;

    /// Processes the request through this stage.
    fn process<'a>(
        &'a self,
        ctx: &'a mut GatewayContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, GatewayResult<Response>>;
}

/// Continuation invoking the rest of the chain.
///
/// Consumed by `run`, so a stage can only forward once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    /// More stages to process.
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    /// End of chain - invoke the handler.
    Handler(Handler<'a>),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that will invoke the given stage.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal `Next` that invokes the handler.
    pub(crate) fn handler<F>(f: F) -> Self
    where
        F: FnOnce(&mut GatewayContext, Request) -> BoxFuture<'static, GatewayResult<Response>>
            + Send
            + 'a,
    {
        Self {
            inner: NextInner::Handler(Box::new(f)),
        }
    }

    /// Invokes the next stage or the handler.
    pub async fn run(self, ctx: &mut GatewayContext, request: Request) -> GatewayResult<Response> {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(ctx, request, *next).await,
            NextInner::Handler(handler) => handler(ctx, request).await,
        }
    }
}

/// A middleware built from an async closure.
///
/// Lets callers add simple stages (request logging, header stamping) without
/// implementing the trait.
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a new function-based middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(
            &'a mut GatewayContext,
            Request,
            Next<'a>,
        ) -> BoxFuture<'a, GatewayResult<Response>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut GatewayContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, GatewayResult<Response>> {
        (self.func)(ctx, request, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
    use http_body_util::Full;

    struct TagMiddleware {
        name: &'static str,
    }

    impl Middleware for TagMiddleware {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut GatewayContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, GatewayResult<Response>> {
            Box::pin(async move {
                ctx.set_extension(format!("visited:{}", self.name));
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
    ) -> impl FnOnce(&mut GatewayContext, Request) -> BoxFuture<'static, GatewayResult<Response>> {
        |_ctx, _req| {
            Box::pin(async {
                Ok(HttpResponse::builder()
                    .status(StatusCode::OK)
                    .body(Full::new(Bytes::from("OK")))
                    .unwrap())
            })
        }
    }

    #[tokio::test]
    async fn test_terminal_handler_runs() {
        let mut ctx = GatewayContext::new();
        let next = Next::handler(ok_handler());

        let response = next.run(&mut ctx, test_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_chain_runs_stages_in_order() {
        let first = TagMiddleware { name: "first" };
        let second = TagMiddleware { name: "second" };

        let mut ctx = GatewayContext::new();
        let chain = Next::new(&first, Next::new(&second, Next::handler(ok_handler())));

        let response = chain.run(&mut ctx, test_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        // Last writer wins - the innermost stage ran after the outermost.
        assert_eq!(
            ctx.get_extension::<String>(),
            Some(&"visited:second".to_string())
        );
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let mut ctx = GatewayContext::new();
        let next = Next::handler(|_ctx: &mut GatewayContext, _req: Request| {
            Box::pin(async { Err(portcullis_core::GatewayError::handler("boom")) })
                as BoxFuture<'static, GatewayResult<Response>>
        });

        let err = next.run(&mut ctx, test_request()).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[tokio::test]
    async fn test_fn_middleware() {
        fn forward<'a>(
            ctx: &'a mut GatewayContext,
            req: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, GatewayResult<Response>> {
            Box::pin(next.run(ctx, req))
        }

        let stage = FnMiddleware::new("noop", forward);
        assert_eq!(stage.name(), "noop");

        let mut ctx = GatewayContext::new();
        let next = Next::handler(ok_handler());
        let response = stage.process(&mut ctx, test_request(), next).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
