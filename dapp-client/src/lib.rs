//! dApp client - node-side library for talking to a co-located mesh sidecar.
//!
//! A node never opens sockets to its peers. Instead it:
//!
//! - receives channel messages and route requests as HTTP calls from the
//!   sidecar, dispatched to handlers registered at startup, and
//! - publishes messages and calls routes on other nodes by issuing HTTP
//!   requests against the sidecar's write address.
//!
//! # Example
//!
//! ```no_run
//! use dapp_client::{Node, SidecarConfig};
//! use serde_json::Value;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut node = Node::new(SidecarConfig::new(3046, 3047)?)?;
//!
//! node.handle_channel("orders", |data: Value| async move {
//!     tracing::info!(%data, "order received");
//!     Ok(())
//! })?;
//!
//! node.run().await?;
//! # Ok(())
//! # }
//! ```

/// Alias management client built on the shared transport.
pub mod alias;
/// Inbound HTTP dispatcher invoked by the sidecar.
pub mod dispatcher;
/// Channel message envelope.
pub mod envelope;
/// Outbound calls from the node to the sidecar.
pub mod gateway;
/// Infrastructure components (config, telemetry).
pub mod infrastructure;
/// Node runtime composing registry, dispatcher and gateway.
pub mod node;
/// Handler traits and the registration registry.
pub mod registry;
/// Shared HTTP transport primitives.
pub mod transport;
/// Validated names for channels, routes and nodes.
pub mod types;

pub use alias::{Alias, AliasClient, AliasError, Change, Changelog, Difference, Metadata};
pub use dispatcher::{BoundDispatcher, DispatchError, Dispatcher};
pub use envelope::Envelope;
pub use gateway::{DeliveryFailure, Gateway, GatewayError};
pub use node::{Node, NodeError, SidecarConfig};
pub use registry::{ChannelHandler, HandlerError, HandlerRegistry, RouteHandler};
pub use transport::{HttpTransport, TransportConfig, TransportError, TransportResponse};
pub use types::{ChannelName, NodeName, RouteName, ValidationError};
