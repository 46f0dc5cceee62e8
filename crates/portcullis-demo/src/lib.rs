//! Reference users API built on the Portcullis gateway.
//!
//! One route: `POST /users` expects a body of `{ "name": <string> }` and
//! answers `201 Created` echoing the validated request facets:
//!
//! ```json
//! { "body": { "name": "Ann" }, "params": {}, "query": {} }
//! ```
//!
//! Anything else - a missing `name`, a handler failure, an unknown path -
//! comes back as the normalized error envelope.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use portcullis::prelude::*;
use serde::Deserialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// The validated shape of a `POST /users` body.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    /// The user's name.
    pub name: String,
}

/// Schema set for `POST /users`: body must be `{ name: string }`, unknown
/// keys are stripped; params and query are unconstrained.
#[must_use]
pub fn create_user_schemas() -> RouteSchemas {
    RouteSchemas::builder()
        .body(
            ObjectSchema::builder()
                .field("name", StringSchema::new())
                .build(),
        )
        .build()
}

/// Handler for `POST /users`: echoes the validated slots back.
async fn create_user(req: RouteRequest) -> GatewayResult<Response> {
    // The slot deserializes cleanly because validation already ran.
    let user: CreateUser = req.body_as()?;
    tracing::info!(request_id = %req.request_id(), name = %user.name, "creating user");

    let echo = json!({
        "body": req.body(),
        "params": req.params(),
        "query": req.query(),
    });
    Ok(Response::json(http::StatusCode::CREATED, &echo))
}

/// Builds the demo gateway with its single route.
#[must_use]
pub fn build_gateway() -> Gateway {
    Gateway::builder()
        .route(
            http::Method::POST,
            "/users",
            "createUser",
            create_user_schemas(),
            create_user,
        )
        .build()
}

/// Initializes logging from `RUST_LOG`, defaulting to `info`.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
