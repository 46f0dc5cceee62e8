//! HTTP server implementation.
//!
//! Binds a TCP listener and serves HTTP/1.1 connections with Hyper, handing
//! each request to the [`Gateway`]. Incoming bodies are buffered before
//! dispatch, matching the buffered `Full<Bytes>` body type the middleware
//! chain operates on.
//!
//! # Example
//!
//! ```rust,ignore
//! use portcullis_server::{Gateway, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::new(ServerConfig::from_env(), gateway);
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::gateway::Gateway;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;

/// The Portcullis HTTP server.
pub struct Server {
    config: ServerConfig,
    gateway: Arc<Gateway>,
}

impl Server {
    /// Creates a server for the given configuration and gateway.
    #[must_use]
    pub fn new(config: ServerConfig, gateway: Gateway) -> Self {
        Self {
            config,
            gateway: Arc::new(gateway),
        }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Runs the server until ctrl-c.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Runs the server with a custom shutdown signal.
    ///
    /// Useful for tests and programmatic shutdown.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self.config.socket_addr().map_err(|e| {
            ServerError::Bind(format!("invalid address '{}': {e}", self.config.http_addr()))
        })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(format!("failed to bind to {addr}: {e}")))?;

        tracing::info!("Server listening on {addr}");

        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let gateway = Arc::clone(&self.gateway);
                            let token = tracker.acquire();
                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                let service = service_fn(move |request| {
                                    let gateway = Arc::clone(&gateway);
                                    async move { serve_request(&gateway, request).await }
                                });

                                if let Err(e) = http1::Builder::new()
                                    .serve_connection(io, service)
                                    .await
                                {
                                    tracing::debug!("connection error from {remote_addr}: {e}");
                                }
                                drop(token);
                            });
                        }
                        Err(e) => {
                            tracing::error!("failed to accept connection: {e}");
                        }
                    }
                }

                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, stopping server");
                    break;
                }
            }
        }

        // Let in-flight requests finish, up to the configured timeout.
        let timeout = self.config.shutdown_timeout();
        tokio::select! {
            () = tracker.wait_for_idle() => {
                tracing::info!("all connections closed");
            }
            () = tokio::time::sleep(timeout) => {
                tracing::warn!(
                    "shutdown timeout reached, {} connections still active",
                    tracker.active_connections()
                );
            }
        }

        tracing::info!("Server stopped");
        Ok(())
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("addr", &self.config.http_addr())
            .finish_non_exhaustive()
    }
}

/// Buffers the incoming body and dispatches through the gateway.
async fn serve_request(
    gateway: &Gateway,
    request: http::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = request.into_parts();

    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::debug!("failed to read request body: {e}");
            Bytes::new()
        }
    };

    let request = http::Request::from_parts(parts, Full::new(bytes));
    Ok(gateway.handle(request).await)
}
