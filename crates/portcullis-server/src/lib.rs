//! # Portcullis Server
//!
//! HTTP server and request dispatch for the Portcullis gateway.
//!
//! This crate turns raw HTTP traffic into middleware-chain invocations:
//!
//! - [`Router`] matches method + path templates to operation IDs
//! - [`HandlerRegistry`] maps operation IDs to route schemas and handlers
//! - [`Gateway`] parses the request slots (JSON body, path params, query
//!   string), runs the standard chain, and produces the response
//! - [`Server`] binds a TCP listener (Hyper, HTTP/1.1) with graceful
//!   shutdown
//!
//! ## Example
//!
//! ```rust,ignore
//! use portcullis_server::{Gateway, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = Gateway::builder()
//!         .route(http::Method::POST, "/users", "createUser", schemas, create_user)
//!         .build();
//!
//!     Server::new(ServerConfig::from_env(), gateway).run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/portcullis-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod gateway;
pub mod handler;
pub mod router;
pub mod server;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use error::ServerError;
pub use gateway::{Gateway, GatewayBuilder};
pub use handler::{HandlerRegistry, RouteRequest};
pub use router::{RouteMatch, Router};
pub use server::Server;
pub use shutdown::ShutdownSignal;
