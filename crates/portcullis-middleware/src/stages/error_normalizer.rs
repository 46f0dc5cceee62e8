//! Error normalization middleware.
//!
//! [`ErrorNormalizer`] is the terminal (outermost) stage of the chain. It is
//! the single point of recovery: every failure raised anywhere inside -
//! validator, handler, or a panic - is classified and answered with the
//! fixed three-field envelope:
//!
//! ```json
//! { "statusCode": 400, "message": "name Required", "errorCode": "Bad Request" }
//! ```
//!
//! Classification, first matching rule wins:
//!
//! 1. Validation failure → 400, message is the first issue rendered as
//!    `"<path> <message>"`.
//! 2. Any other error value → 500, the error's own message, verbatim.
//! 3. A panic → 500, `"Something went wrong"`; the panic payload is never
//!    exposed.
//!
//! If a response has already been committed for the request (a handler
//! started writing before failing), the normalizer does nothing further: no
//! envelope, no error log. The suppressed response carries a
//! [`SuppressedFailure`] marker so the connection layer knows there is
//! nothing left to write.
//!
//! One `error!` event is emitted per normalized failure, carrying the error
//! code and message; the subscriber supplies the timestamp.

use crate::context::GatewayContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};
use bytes::Bytes;
use futures_util::FutureExt;
use http_body_util::Full;
use portcullis_core::{GatewayResult, ResponseError};
use std::panic::AssertUnwindSafe;

/// Middleware converting any upstream failure into the normalized envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorNormalizer;

impl ErrorNormalizer {
    /// Creates the error normalizer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Record of a normalized failure, stored in the context for observability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedError {
    /// The HTTP status code sent to the client.
    pub status_code: u16,
    /// The reason phrase sent as `errorCode`.
    pub error_code: String,
    /// The client-visible message.
    pub message: String,
}

impl From<&ResponseError> for NormalizedError {
    fn from(envelope: &ResponseError) -> Self {
        Self {
            status_code: envelope.status_code,
            error_code: envelope.error_code.clone(),
            message: envelope.message.clone(),
        }
    }
}

/// Marker placed on a response whose failure was suppressed because the
/// request's response had already been committed. Nothing further may be
/// written for such a request.
#[derive(Debug, Clone, Copy)]
pub struct SuppressedFailure;

impl Middleware for ErrorNormalizer {
    fn name(&self) -> &'static str {
        "error_normalizer"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut GatewayContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, GatewayResult<Response>> {
        Box::pin(async move {
            let outcome = AssertUnwindSafe(next.run(ctx, request)).catch_unwind().await;

            let envelope = match outcome {
                Ok(Ok(response)) => {
                    ctx.mark_committed();
                    return Ok(response);
                }
                Ok(Err(error)) => error.to_response_error(),
                Err(_panic) => ResponseError::fallback(),
            };

            if ctx.response_committed() {
                // The client already received bytes for this request; a
                // second response cannot be written safely.
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    "failure after response commit, suppressing"
                );
                let mut response = Response::new(Full::new(Bytes::new()));
                response.extensions_mut().insert(SuppressedFailure);
                return Ok(response);
            }

            tracing::error!(
                request_id = %ctx.request_id(),
                error_code = %envelope.error_code,
                message = %envelope.message,
                "request failed"
            );

            ctx.set_extension(NormalizedError::from(&envelope));
            ctx.mark_committed();
            Ok(Response::json_error(&envelope))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Request as HttpRequest, Response as HttpResponse, StatusCode};
    use http_body_util::BodyExt;
    use portcullis_core::{GatewayError, IssuePath, ValidationError};
    use serde_json::json;

    fn test_request() -> Request {
        HttpRequest::builder()
            .method("POST")
            .uri("/users")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn failing_handler(
        error: GatewayError,
    ) -> impl FnOnce(&mut GatewayContext, Request) -> BoxFuture<'static, GatewayResult<Response>>
    {
        move |_ctx, _req| Box::pin(async move { Err(error) })
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_middleware_name() {
        assert_eq!(ErrorNormalizer::new().name(), "error_normalizer");
    }

    #[tokio::test]
    async fn test_success_passes_through_and_commits() {
        let normalizer = ErrorNormalizer::new();
        let mut ctx = GatewayContext::new();

        let response = normalizer
            .process(
                &mut ctx,
                test_request(),
                Next::handler(|_ctx: &mut GatewayContext, _req: Request| {
                    Box::pin(async {
                        Ok(HttpResponse::builder()
                            .status(StatusCode::CREATED)
                            .body(Full::new(Bytes::from("created")))
                            .unwrap())
                    }) as BoxFuture<'static, GatewayResult<Response>>
                }),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(ctx.response_committed());
        assert!(ctx.get_extension::<NormalizedError>().is_none());
    }

    #[tokio::test]
    async fn test_validation_failure_becomes_400() {
        let normalizer = ErrorNormalizer::new();
        let mut ctx = GatewayContext::new();

        let error = ValidationError::single(IssuePath::key("name"), "Required");
        let response = normalizer
            .process(
                &mut ctx,
                test_request(),
                Next::handler(failing_handler(error.into())),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"statusCode": 400, "message": "name Required", "errorCode": "Bad Request"})
        );

        let recorded = ctx.get_extension::<NormalizedError>().unwrap();
        assert_eq!(recorded.status_code, 400);
        assert_eq!(recorded.error_code, "Bad Request");
    }

    #[tokio::test]
    async fn test_only_first_issue_is_reported() {
        let normalizer = ErrorNormalizer::new();
        let mut ctx = GatewayContext::new();

        let error = ValidationError::new(vec![
            portcullis_core::Issue::new(IssuePath::key("name"), "Required"),
            portcullis_core::Issue::new(IssuePath::key("email"), "Required"),
        ]);
        let response = normalizer
            .process(
                &mut ctx,
                test_request(),
                Next::handler(failing_handler(error.into())),
            )
            .await
            .unwrap();

        assert_eq!(body_json(response).await["message"], "name Required");
    }

    #[tokio::test]
    async fn test_handler_error_becomes_500_verbatim() {
        let normalizer = ErrorNormalizer::new();
        let mut ctx = GatewayContext::new();

        let response = normalizer
            .process(
                &mut ctx,
                test_request(),
                Next::handler(failing_handler(GatewayError::handler("boom"))),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"statusCode": 500, "message": "boom", "errorCode": "Internal Server Error"})
        );
    }

    #[tokio::test]
    async fn test_panic_becomes_500_fallback() {
        let normalizer = ErrorNormalizer::new();
        let mut ctx = GatewayContext::new();

        let response = normalizer
            .process(
                &mut ctx,
                test_request(),
                Next::handler(|_ctx: &mut GatewayContext, _req: Request| {
                    Box::pin(async {
                        panic!("raw panic payload");
                        #[allow(unreachable_code)]
                        let out: GatewayResult<Response> = unreachable!();
                        #[allow(unreachable_code)]
                        out
                    }) as BoxFuture<'static, GatewayResult<Response>>
                }),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        // The panic payload is never exposed.
        assert_eq!(
            body,
            json!({
                "statusCode": 500,
                "message": "Something went wrong",
                "errorCode": "Internal Server Error"
            })
        );
    }

    #[tokio::test]
    async fn test_committed_response_suppresses_failure() {
        let normalizer = ErrorNormalizer::new();
        let mut ctx = GatewayContext::new();

        // A handler that began writing its response before failing.
        let response = normalizer
            .process(
                &mut ctx,
                test_request(),
                Next::handler(|ctx: &mut GatewayContext, _req: Request| {
                    ctx.mark_committed();
                    Box::pin(async { Err(GatewayError::handler("late failure")) })
                        as BoxFuture<'static, GatewayResult<Response>>
                }),
            )
            .await
            .unwrap();

        assert!(response.extensions().get::<SuppressedFailure>().is_some());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
        // No normalized record either - the failure is swallowed.
        assert!(ctx.get_extension::<NormalizedError>().is_none());
    }
}
