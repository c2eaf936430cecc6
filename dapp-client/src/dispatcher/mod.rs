//! Inbound dispatcher.
//!
//! An embedded HTTP server the sidecar calls into. It exposes
//! `POST /channel/{name}` for channel messages and
//! `GET|POST|PUT|DELETE /route/{*path}` for route requests, resolving the
//! target handler from the [`HandlerRegistry`] on every call.
//!
//! The dispatcher goes from [`Dispatcher`] (unstarted) to
//! [`BoundDispatcher`] (listening). There is no way back; serving only ends
//! when the process does or the listener fails.

mod error;
pub mod handlers;

pub use error::DispatchError;

use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::registry::HandlerRegistry;
use handlers::{dispatch_channel, dispatch_route};

/// Dispatcher that has not started listening yet.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
}

impl Dispatcher {
    /// Creates a dispatcher over a fully populated registry.
    ///
    /// The registry is frozen from here on.
    #[must_use]
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// The registry this dispatcher serves.
    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Builds the axum router exposing the channel and route endpoints.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/channel/{name}", post(dispatch_channel))
            .route(
                "/route/{*path}",
                get(dispatch_route)
                    .post(dispatch_route)
                    .put(dispatch_route)
                    .delete(dispatch_route),
            )
            .with_state(self.registry.clone())
    }

    /// Binds the listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn bind(self, addr: SocketAddr) -> std::io::Result<BoundDispatcher> {
        let listener = TcpListener::bind(addr).await?;
        Ok(BoundDispatcher {
            listener,
            dispatcher: self,
        })
    }
}

/// Dispatcher bound to its read port.
#[derive(Debug)]
pub struct BoundDispatcher {
    listener: TcpListener,
    dispatcher: Dispatcher,
}

impl BoundDispatcher {
    /// Address the listener is bound to.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be queried.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Logs the registered endpoints and serves until the listener fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the server stops on an I/O failure.
    pub async fn serve(self) -> std::io::Result<()> {
        let registry = self.dispatcher.registry();
        info!(routes = ?registry.endpoints(), "registered routes");

        let addr = self.listener.local_addr()?;
        let app = self.dispatcher.router();

        info!("dApp client listening on {}", addr);

        axum::serve(self.listener, app).await
    }
}
