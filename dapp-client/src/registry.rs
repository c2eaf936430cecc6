//! Handler registration.
//!
//! Handlers are registered against the [`HandlerRegistry`] while the node is
//! starting up. Once the dispatcher begins serving, the registry is frozen
//! behind an `Arc` and only read.
//!
//! Channel names and route paths live in separate namespaces. Registering a
//! second handler under an existing name replaces the first one.

use async_trait::async_trait;
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

use crate::types::{ChannelName, RouteName};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error returned by a channel handler.
///
/// Any error type convertible into a boxed error converts into this, so
/// handlers can use `?` freely.
pub struct HandlerError(BoxError);

impl HandlerError {
    /// Creates a handler error from a plain message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self(message.to_string().into())
    }

    /// Returns the wrapped error.
    #[must_use]
    pub fn into_inner(self) -> BoxError {
        self.0
    }
}

impl<E> From<E> for HandlerError
where
    E: Into<BoxError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Handles messages delivered on a channel.
///
/// Receives the payload already unwrapped from its envelope.
#[async_trait]
pub trait ChannelHandler: Send + Sync + 'static {
    /// Processes one message.
    async fn handle(&self, data: Value) -> Result<(), HandlerError>;
}

#[async_trait]
impl<F, Fut> ChannelHandler for F
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(&self, data: Value) -> Result<(), HandlerError> {
        (self)(data).await
    }
}

/// Handles synchronous requests on a route.
///
/// The raw inbound request is passed through and the returned response is
/// sent back as is.
#[async_trait]
pub trait RouteHandler: Send + Sync + 'static {
    /// Produces the response for one request.
    async fn handle(&self, request: Request) -> Response;
}

#[async_trait]
impl<F, Fut, R> RouteHandler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + 'static,
{
    async fn handle(&self, request: Request) -> Response {
        (self)(request).await.into_response()
    }
}

/// In-memory mapping from channel and route names to handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    channels: HashMap<String, Arc<dyn ChannelHandler>>,
    routes: HashMap<String, Arc<dyn RouteHandler>>,
    endpoints: Vec<String>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for a channel and returns it.
    ///
    /// A handler already registered under the same name is replaced.
    pub fn register_channel<H>(&mut self, channel: &ChannelName, handler: H) -> Arc<H>
    where
        H: ChannelHandler,
    {
        let handler = Arc::new(handler);
        let endpoint = format!("/channel/{channel}");
        if self
            .channels
            .insert(channel.to_string(), handler.clone())
            .is_some()
        {
            warn!(%endpoint, "channel handler replaced by a later registration");
        } else {
            self.endpoints.push(endpoint);
        }
        handler
    }

    /// Registers a handler for a route and returns it.
    ///
    /// The route is stored under `route/<path>`. A handler already registered
    /// under the same path is replaced.
    pub fn register_route<H>(&mut self, route: &RouteName, handler: H) -> Arc<H>
    where
        H: RouteHandler,
    {
        let handler = Arc::new(handler);
        let key = route.key();
        let endpoint = format!("/{key}");
        if self.routes.insert(key, handler.clone()).is_some() {
            warn!(%endpoint, "route handler replaced by a later registration");
        } else {
            self.endpoints.push(endpoint);
        }
        handler
    }

    /// Looks up the handler for a channel.
    #[must_use]
    pub fn channel(&self, name: &str) -> Option<Arc<dyn ChannelHandler>> {
        self.channels.get(name).cloned()
    }

    /// Looks up the handler for a route path, given without a leading `/`.
    #[must_use]
    pub fn route(&self, path: &str) -> Option<Arc<dyn RouteHandler>> {
        self.routes.get(&format!("route/{path}")).cloned()
    }

    /// Registered endpoints in registration order.
    #[must_use]
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Number of registered endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}
