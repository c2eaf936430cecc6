//! Node runtime.
//!
//! [`Node`] owns the sidecar configuration, collects handler registrations
//! during startup and then hands the frozen registry to the dispatcher.
//! `run` consumes the node, so nothing can be registered once serving has
//! started.

use reqwest::{Method, Url};
use serde::Serialize;
use serde_json::Value;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::dispatcher::{BoundDispatcher, Dispatcher};
use crate::gateway::{Gateway, GatewayError};
use crate::infrastructure::config::Settings;
use crate::registry::{ChannelHandler, HandlerRegistry, RouteHandler};
use crate::transport::{HttpTransport, TransportConfig, TransportError, TransportResponse};
use crate::types::{ChannelName, RouteName, ValidationError};

/// Errors raised by the node runtime.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    /// A channel or route name was rejected.
    #[error("Invalid name: {0}")]
    Validation(#[from] ValidationError),
    /// The HTTP transport could not be set up.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    /// The sidecar write address is not a valid URL.
    #[error("Invalid write address '{address}': {reason}")]
    InvalidWriteAddress {
        /// The rejected address.
        address: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The read port could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address that failed to bind.
        addr: SocketAddr,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The dispatcher stopped serving.
    #[error("Dispatcher stopped: {0}")]
    Serve(#[source] std::io::Error),
}

/// Process-wide sidecar settings, fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SidecarConfig {
    /// Address the dispatcher binds to.
    pub read_host: IpAddr,
    /// Port the dispatcher binds to.
    pub read_port: u16,
    /// Base URL of the sidecar's write endpoint.
    pub write_address: Url,
    /// Timeout for outbound requests. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl SidecarConfig {
    /// Creates a config reading on `read_port` and writing to
    /// `http://localhost:<write_port>`.
    ///
    /// # Errors
    ///
    /// Returns `NodeError::InvalidWriteAddress` if the address cannot be built.
    pub fn new(read_port: u16, write_port: u16) -> Result<Self, NodeError> {
        let address = format!("http://localhost:{write_port}");
        let write_address = Url::parse(&address).map_err(|e| NodeError::InvalidWriteAddress {
            address,
            reason: e.to_string(),
        })?;

        Ok(Self {
            read_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            read_port,
            write_address,
            request_timeout: None,
        })
    }

    /// Sets the address the dispatcher binds to.
    #[must_use]
    pub fn with_read_host(mut self, host: IpAddr) -> Self {
        self.read_host = host;
        self
    }

    /// Overrides the sidecar write address.
    #[must_use]
    pub fn with_write_address(mut self, address: Url) -> Self {
        self.write_address = address;
        self
    }

    /// Sets the outbound request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Socket address the dispatcher binds to.
    #[must_use]
    pub fn read_addr(&self) -> SocketAddr {
        SocketAddr::new(self.read_host, self.read_port)
    }
}

/// A node of the application mesh.
#[derive(Debug)]
pub struct Node {
    config: SidecarConfig,
    registry: HandlerRegistry,
    gateway: Gateway,
}

impl Node {
    /// Creates a node with an empty registry.
    ///
    /// # Errors
    ///
    /// Returns `NodeError::Transport` if the HTTP client cannot be built.
    pub fn new(config: SidecarConfig) -> Result<Self, NodeError> {
        let mut transport_config = TransportConfig::new();
        if let Some(timeout) = config.request_timeout {
            transport_config = transport_config.with_timeout(timeout);
        }
        let transport = HttpTransport::new(transport_config)?;
        let gateway = Gateway::new(config.write_address.clone(), transport);

        Ok(Self {
            config,
            registry: HandlerRegistry::new(),
            gateway,
        })
    }

    /// Creates a node configured from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `NodeError::Config` if the environment is incomplete.
    pub fn from_env() -> Result<Self, NodeError> {
        let settings = Settings::new()?;
        Self::new(settings.sidecar_config()?)
    }

    /// The node's sidecar configuration.
    #[must_use]
    pub fn config(&self) -> &SidecarConfig {
        &self.config
    }

    /// Registers a handler for messages on `channel` and returns it.
    ///
    /// # Errors
    ///
    /// Returns `NodeError::Validation` if the channel name is invalid.
    pub fn handle_channel<H>(&mut self, channel: &str, handler: H) -> Result<Arc<H>, NodeError>
    where
        H: ChannelHandler,
    {
        let channel = ChannelName::new(channel)?;
        Ok(self.registry.register_channel(&channel, handler))
    }

    /// Registers a handler for requests on `path` and returns it.
    ///
    /// A single leading `/` is stripped from `path`.
    ///
    /// # Errors
    ///
    /// Returns `NodeError::Validation` if the path is empty.
    pub fn handle_route<H>(&mut self, path: &str, handler: H) -> Result<Arc<H>, NodeError>
    where
        H: RouteHandler,
    {
        let route = RouteName::new(path)?;
        Ok(self.registry.register_route(&route, handler))
    }

    /// Endpoints registered so far, in registration order.
    #[must_use]
    pub fn registered_endpoints(&self) -> &[String] {
        self.registry.endpoints()
    }

    /// A handle for outbound calls, usable from inside handlers.
    #[must_use]
    pub fn gateway(&self) -> Gateway {
        self.gateway.clone()
    }

    /// Publishes `msg` on `channel` through the sidecar.
    ///
    /// # Errors
    ///
    /// See [`Gateway::publish`].
    pub async fn write_message<T>(&self, channel: &str, msg: &T) -> Result<(), GatewayError>
    where
        T: Serialize + ?Sized,
    {
        self.gateway.publish(channel, msg).await
    }

    /// Calls `path` on node `node_name` through the sidecar.
    ///
    /// # Errors
    ///
    /// See [`Gateway::call`].
    pub async fn send_request(
        &self,
        node_name: &str,
        path: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<TransportResponse, GatewayError> {
        self.gateway.call(node_name, path, method, body).await
    }

    /// Freezes the registry and binds the dispatcher to the read port.
    ///
    /// # Errors
    ///
    /// Returns `NodeError::Bind` if the read port is unavailable.
    pub async fn bind(self) -> Result<BoundDispatcher, NodeError> {
        let addr = self.config.read_addr();
        Dispatcher::new(self.registry)
            .bind(addr)
            .await
            .map_err(|source| NodeError::Bind { addr, source })
    }

    /// Binds the read port and serves sidecar calls until the process exits.
    ///
    /// # Errors
    ///
    /// Returns `NodeError::Bind` if the read port is unavailable and
    /// `NodeError::Serve` if the server stops.
    pub async fn run(self) -> Result<(), NodeError> {
        let bound = self.bind().await.inspect_err(|e| {
            error!(error = %e, "cannot start dispatcher");
        })?;

        info!("dApp client listener is up...");
        bound.serve().await.map_err(NodeError::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Request;
    use axum::http::StatusCode;

    fn config() -> SidecarConfig {
        SidecarConfig::new(0, 3047).unwrap()
    }

    #[test]
    fn test_sidecar_config_new() {
        let config = SidecarConfig::new(3046, 3047).unwrap();
        assert_eq!(config.read_port, 3046);
        assert_eq!(config.write_address.as_str(), "http://localhost:3047/");
        assert_eq!(config.read_addr(), "127.0.0.1:3046".parse().unwrap());
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    fn test_config_is_kept_as_given() {
        let given = SidecarConfig::new(3046, 3047)
            .unwrap()
            .with_read_host(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
            .with_request_timeout(Duration::from_secs(3));

        let node = Node::new(given.clone()).unwrap();
        assert_eq!(node.config(), &given);
        assert_eq!(node.config().read_addr(), "0.0.0.0:3046".parse().unwrap());
    }

    #[test]
    fn test_gateway_uses_write_address() {
        let node = Node::new(config()).unwrap();
        assert_eq!(
            node.gateway().write_address().as_str(),
            "http://localhost:3047/"
        );
    }

    #[test]
    fn test_registration_validates_names() {
        let mut node = Node::new(config()).unwrap();
        let result = node.handle_channel("", |_d: Value| async { Ok(()) });
        assert!(matches!(
            result,
            Err(NodeError::Validation(ValidationError::EmptyName))
        ));

        let result = node.handle_route("/", |_r: Request| async { StatusCode::OK });
        assert!(matches!(result, Err(NodeError::Validation(_))));
        assert!(node.registered_endpoints().is_empty());
    }

    #[test]
    fn test_registration_order_is_reported() {
        let mut node = Node::new(config()).unwrap();
        node.handle_channel("orders", |_d: Value| async { Ok(()) })
            .unwrap();
        node.handle_route("/status", |_r: Request| async { StatusCode::OK })
            .unwrap();

        assert_eq!(
            node.registered_endpoints(),
            ["/channel/orders", "/route/status"]
        );
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let node = Node::new(SidecarConfig::new(port, 3047).unwrap()).unwrap();
        let err = node.run().await.unwrap_err();
        assert!(matches!(err, NodeError::Bind { .. }));
    }

    #[tokio::test]
    async fn test_bind_on_ephemeral_port() {
        let node = Node::new(config()).unwrap();
        let bound = node.bind().await.unwrap();
        assert_ne!(bound.local_addr().unwrap().port(), 0);
    }
}
