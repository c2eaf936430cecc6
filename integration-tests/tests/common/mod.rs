//! Shared helpers for the integration tests.
//!
//! Every test runs a real node on an ephemeral port, with a wiremock server
//! standing in for the sidecar's write endpoint.

#![allow(dead_code)]

use anyhow::Result;
use dapp_client::{Node, SidecarConfig};
use reqwest::Url;
use serde_json::Value;
use std::net::SocketAddr;
use wiremock::MockServer;

/// Creates a node that reads on an ephemeral port and writes to `sidecar`.
pub fn node_for(sidecar: &MockServer) -> Result<Node> {
    let config = SidecarConfig::new(0, 1)?.with_write_address(Url::parse(&sidecar.uri())?);
    Ok(Node::new(config)?)
}

/// Binds the node, serves it in the background and returns its address.
pub async fn start(node: Node) -> Result<SocketAddr> {
    let bound = node.bind().await?;
    let addr = bound.local_addr()?;
    tokio::spawn(bound.serve());
    Ok(addr)
}

/// Delivers a raw channel body to a running node, as the sidecar would.
pub async fn deliver(addr: SocketAddr, channel: &str, body: &Value) -> Result<reqwest::Response> {
    Ok(reqwest::Client::new()
        .post(format!("http://{addr}/channel/{channel}"))
        .json(body)
        .send()
        .await?)
}
