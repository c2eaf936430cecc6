//! Demo node: republishes every message from `echo` on `echo-out` and answers
//! `GET /status`.

use axum::Json;
use axum::extract::Request;
use dapp_client::{HandlerError, Node};
use dapp_client::infrastructure::{config::Settings, telemetry::TelemetryBuilder};
use serde_json::{Value, json};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::new()?;

    let mut telemetry = TelemetryBuilder::new("echo-node", env!("CARGO_PKG_VERSION"));
    if let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        telemetry = telemetry.with_tracing(endpoint);
    }
    telemetry.init()?;

    let mut node = Node::new(settings.sidecar_config()?)?;
    let gateway = node.gateway();

    node.handle_channel("echo", move |data: Value| {
        let gateway = gateway.clone();
        async move {
            info!(%data, "echoing message");
            gateway.publish("echo-out", &data).await?;
            Ok::<_, HandlerError>(())
        }
    })?;

    node.handle_route("/status", |_req: Request| async {
        Json(json!({"status": "ok"}))
    })?;

    node.run().await?;
    Ok(())
}
