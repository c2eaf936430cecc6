//! Configuration for a node, read from the environment.
//!
//! The sidecar injects two variables into every node:
//!
//! - `INSPR_SCCLIENT_READ_PORT`: port the dispatcher listens on.
//! - `INSPR_LBSIDECAR_WRITE_PORT`: port of the sidecar on `localhost`.
//!
//! Two optional variables tune the client:
//!
//! - `INSPR_SCCLIENT_READ_HOST`: bind address, `127.0.0.1` by default.
//! - `INSPR_SCCLIENT_REQUEST_TIMEOUT_SECS`: outbound request timeout.
//!
//! # Example
//!
//! ```
//! use dapp_client::infrastructure::config::Settings;
//!
//! let settings = Settings::from_map([
//!     ("INSPR_SCCLIENT_READ_PORT".to_string(), "3046".to_string()),
//!     ("INSPR_LBSIDECAR_WRITE_PORT".to_string(), "3047".to_string()),
//! ])
//! .expect("Failed to load configuration");
//! assert_eq!(settings.read_port, 3046);
//! ```

use config::{Config, ConfigError, Environment, Map};
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

use crate::node::SidecarConfig;

/// Environment variable holding the dispatcher's port.
pub const READ_PORT_VAR: &str = "INSPR_SCCLIENT_READ_PORT";
/// Environment variable holding the sidecar's write port.
pub const WRITE_PORT_VAR: &str = "INSPR_LBSIDECAR_WRITE_PORT";

const ENV_PREFIX: &str = "INSPR";

/// Raw settings as read from the environment.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Port the dispatcher binds to.
    #[serde(rename = "scclient_read_port")]
    pub read_port: u16,
    /// Port of the sidecar's write endpoint on `localhost`.
    #[serde(rename = "lbsidecar_write_port")]
    pub write_port: u16,
    /// Address the dispatcher binds to.
    #[serde(rename = "scclient_read_host")]
    pub read_host: String,
    /// Timeout for outbound requests, in seconds.
    #[serde(rename = "scclient_request_timeout_secs", default)]
    pub request_timeout_secs: Option<u64>,
}

impl Settings {
    /// Loads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or malformed.
    pub fn new() -> Result<Self, ConfigError> {
        Self::build(None)
    }

    /// Loads settings from an explicit set of environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or malformed.
    pub fn from_map<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self::build(Some(vars.into_iter().collect()))
    }

    fn build(source: Option<Map<String, String>>) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("scclient_read_host", "127.0.0.1")?
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(source),
            )
            .build()?;

        s.try_deserialize()
    }

    /// Validates the settings and converts them into a [`SidecarConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the bind address is not an IP address or a port
    /// is zero.
    pub fn sidecar_config(&self) -> Result<SidecarConfig, ConfigError> {
        if self.write_port == 0 {
            return Err(ConfigError::Message(format!(
                "{WRITE_PORT_VAR} must not be 0"
            )));
        }

        let read_host: IpAddr = self.read_host.parse().map_err(|e| {
            ConfigError::Message(format!("Invalid read host '{}': {e}", self.read_host))
        })?;

        let mut config = SidecarConfig::new(self.read_port, self.write_port)
            .map_err(|e| ConfigError::Message(e.to_string()))?
            .with_read_host(read_host);

        if let Some(secs) = self.request_timeout_secs {
            config = config.with_request_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }
}
