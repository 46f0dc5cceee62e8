//! Common HTTP types used throughout the middleware chain.

use bytes::Bytes;
use http_body_util::Full;
use portcullis_core::ResponseError;
use serde::Serialize;

/// The HTTP request type used in the middleware chain.
///
/// A standard `http::Request` with a buffered `Full<Bytes>` body.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the middleware chain.
pub type Response = http::Response<Full<Bytes>>;

/// Extension trait for building JSON responses.
pub trait ResponseExt {
    /// Creates a JSON response with the given status and body.
    fn json<T: Serialize>(status: http::StatusCode, body: &T) -> Response;

    /// Creates a response carrying the normalized error envelope.
    ///
    /// The HTTP status equals the envelope's `statusCode` field.
    fn json_error(envelope: &ResponseError) -> Response;
}

impl ResponseExt for Response {
    fn json<T: Serialize>(status: http::StatusCode, body: &T) -> Response {
        let bytes = serde_json::to_vec(body).expect("failed to serialize JSON response");

        http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(bytes)))
            .expect("failed to build JSON response")
    }

    fn json_error(envelope: &ResponseError) -> Response {
        Self::json(envelope.status(), envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use http_body_util::BodyExt;
    use serde_json::json;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_json_response() {
        let response = Response::json(StatusCode::CREATED, &json!({"ok": true}));

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(body_json(response).await, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_json_error_response() {
        let envelope = ResponseError::new(StatusCode::BAD_REQUEST, "name Required");
        let response = Response::json_error(&envelope);

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"statusCode": 400, "message": "name Required", "errorCode": "Bad Request"})
        );
    }
}
