//! Integration tests for outbound traffic through the sidecar.

use anyhow::Result;
use axum::http::StatusCode;
use dapp_client::{DeliveryFailure, GatewayError, HandlerError, Node, SidecarConfig};
use reqwest::Method;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

/// A payload published by one node reaches another node's handler unchanged.
#[tokio::test]
async fn test_envelope_round_trip_through_sidecar() -> Result<()> {
    let payload = json!({
        "id": 42,
        "items": [{"sku": "a-1", "qty": 2}, {"sku": "b-7", "qty": 1}],
        "note": null,
        "express": true
    });

    let sidecar = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/channel/orders"))
        .and(body_json(json!({ "data": payload.clone() })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&sidecar)
        .await;

    let received = Arc::new(Mutex::new(None::<Value>));
    let sink = received.clone();

    let mut consumer = common::node_for(&sidecar)?;
    consumer.handle_channel("orders", move |data: Value| {
        let sink = sink.clone();
        async move {
            *sink.lock().unwrap() = Some(data);
            Ok::<(), HandlerError>(())
        }
    })?;
    let consumer_addr = common::start(consumer).await?;

    let producer = common::node_for(&sidecar)?;
    producer.write_message("orders", &payload).await?;

    // Redeliver what the sidecar received, as it would after routing.
    let requests = sidecar.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    let forwarded: Value = serde_json::from_slice(&requests[0].body)?;

    let res = common::deliver(consumer_addr, "orders", &forwarded).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let got = received.lock().unwrap().take();
    assert_eq!(got, Some(payload));
    Ok(())
}

/// A rejected publish reports the channel it was meant for.
#[tokio::test]
async fn test_failed_publish_names_channel() -> Result<()> {
    let sidecar = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/channel/orders"))
        .respond_with(ResponseTemplate::new(503).set_body_string("broker unavailable"))
        .mount(&sidecar)
        .await;

    let node = common::node_for(&sidecar)?;
    let err = node
        .write_message("orders", &json!({"id": 1}))
        .await
        .expect_err("publish should fail");

    assert!(err.to_string().contains("orders"));
    assert!(matches!(
        err,
        GatewayError::Publish {
            source: DeliveryFailure::Status { status, .. },
            ..
        } if status == StatusCode::SERVICE_UNAVAILABLE
    ));
    Ok(())
}

/// Publishing with no sidecar listening fails with a transport error.
#[tokio::test]
async fn test_publish_without_sidecar() -> Result<()> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let write_port = listener.local_addr()?.port();
    drop(listener);

    let node = Node::new(SidecarConfig::new(0, write_port)?)?;

    let err = node
        .write_message("orders", &json!({"id": 1}))
        .await
        .expect_err("publish should fail");

    assert_eq!(err.to_string(), "failed to deliver message: channel: orders");
    assert!(matches!(err.failure(), DeliveryFailure::Transport(_)));
    Ok(())
}

/// A route call hands back the remote status and body untouched.
#[tokio::test]
async fn test_call_returns_remote_response() -> Result<()> {
    let sidecar = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/route/inventory/reserve"))
        .and(body_json(json!({"sku": "a-1"})))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"reason": "out of stock"})),
        )
        .expect(1)
        .mount(&sidecar)
        .await;

    let node = common::node_for(&sidecar)?;
    let res = node
        .send_request(
            "inventory",
            "/reserve",
            Method::POST,
            Some(&json!({"sku": "a-1"})),
        )
        .await?;

    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.json::<Value>()?, json!({"reason": "out of stock"}));
    Ok(())
}

/// Handlers can publish through a gateway handle captured at startup.
#[tokio::test]
async fn test_handler_publishes_through_gateway() -> Result<()> {
    let sidecar = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/channel/echo-out"))
        .and(body_json(json!({"data": "ping"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&sidecar)
        .await;

    let mut node = common::node_for(&sidecar)?;
    let gateway = node.gateway();
    node.handle_channel("echo", move |data: Value| {
        let gateway = gateway.clone();
        async move {
            gateway.publish("echo-out", &data).await?;
            Ok::<(), HandlerError>(())
        }
    })?;

    let addr = common::start(node).await?;
    let res = common::deliver(addr, "echo", &json!({"data": "ping"})).await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

/// A channel name with URL-reserved characters reaches the matching handler.
#[tokio::test]
async fn test_reserved_characters_survive_round_trip() -> Result<()> {
    let channel = "orders?region=eu#1";

    let sidecar = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&sidecar)
        .await;

    let received = Arc::new(Mutex::new(None::<Value>));
    let sink = received.clone();

    let mut consumer = common::node_for(&sidecar)?;
    consumer.handle_channel("orders", |_data: Value| async {
        Err::<(), _>(HandlerError::msg("wrong channel"))
    })?;
    consumer.handle_channel(channel, move |data: Value| {
        let sink = sink.clone();
        async move {
            *sink.lock().unwrap() = Some(data);
            Ok::<(), HandlerError>(())
        }
    })?;
    let consumer_addr = common::start(consumer).await?;

    let producer = common::node_for(&sidecar)?;
    producer.write_message(channel, &json!("hello")).await?;

    // Forward to the exact path the sidecar was given.
    let requests = sidecar.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.query(), None);

    let res = reqwest::Client::new()
        .post(format!("http://{consumer_addr}{}", requests[0].url.path()))
        .body(requests[0].body.clone())
        .header("content-type", "application/json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    assert_eq!(received.lock().unwrap().take(), Some(json!("hello")));
    Ok(())
}
