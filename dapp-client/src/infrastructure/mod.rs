/// Configuration loaded from the environment.
pub mod config;
/// Telemetry setup for logging and tracing.
pub mod telemetry;
