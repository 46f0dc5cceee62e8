//! Server configuration.
//!
//! Configuration is an explicit struct built once at startup and passed into
//! the server, never read from global state after that. [`ServerConfig::from_env`]
//! consults the `PORT` environment variable the way the reference deployment
//! does.

use std::net::SocketAddr;
use std::time::Duration;

/// Default listen port when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 3000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Server configuration.
///
/// Use [`ServerConfig::builder()`] or [`ServerConfig::from_env()`] to
/// construct instances.
///
/// # Example
///
/// ```rust
/// use portcullis_server::ServerConfig;
///
/// let config = ServerConfig::builder()
///     .http_addr("127.0.0.1:8080")
///     .build();
///
/// assert_eq!(config.http_addr(), "127.0.0.1:8080");
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP bind address (e.g. "0.0.0.0:3000").
    http_addr: String,

    /// How long to wait for in-flight requests during shutdown.
    shutdown_timeout: Duration,
}

impl ServerConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Builds a configuration from the environment.
    ///
    /// Reads `PORT`; an unset or unparseable value falls back to
    /// [`DEFAULT_PORT`].
    #[must_use]
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|raw| raw.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        Self::builder().port(port).build()
    }

    /// Returns the HTTP bind address.
    #[must_use]
    pub fn http_addr(&self) -> &str {
        &self.http_addr
    }

    /// Parses the bind address as a [`SocketAddr`].
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.http_addr.parse()
    }

    /// Returns the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    http_addr: String,
    shutdown_timeout: Duration,
}

impl ServerConfigBuilder {
    /// Creates a builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            http_addr: format!("0.0.0.0:{DEFAULT_PORT}"),
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
        }
    }

    /// Sets the full HTTP bind address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.http_addr = addr.into();
        self
    }

    /// Sets the port, binding on all interfaces.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.http_addr = format!("0.0.0.0:{port}");
        self
    }

    /// Sets the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            http_addr: self.http_addr,
            shutdown_timeout: self.shutdown_timeout,
        }
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
