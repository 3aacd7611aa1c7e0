//! Gateway configuration, read from a JSON file.
//!
//! Required values are optional at the serde level so that a missing one is
//! reported by [`GatewayConfig::validate`] as a configuration failure (the
//! indicator blinks) rather than a parse error.

use crate::connection::encryption::AesKey;
use crate::error::RadarError;
use crate::gateway::GatewayOptions;
use crate::radar::serial::SerialConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Serial port section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialSettings {
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default = "default_baudrate")]
    pub baudrate: u32,
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
    #[serde(default = "default_byte_timeout_ms")]
    pub byte_timeout_ms: u64,
}

fn default_port() -> String {
    "/dev/ttyUSB0".to_string()
}

fn default_baudrate() -> u32 {
    115_200
}

fn default_response_timeout_ms() -> u64 {
    10_000
}

fn default_byte_timeout_ms() -> u64 {
    100
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_heartbeat_interval_ms() -> u64 {
    600_000
}

fn default_buffer_capacity() -> usize {
    64
}

impl Default for SerialSettings {
    fn default() -> Self {
        SerialSettings {
            port: default_port(),
            baudrate: default_baudrate(),
            response_timeout_ms: default_response_timeout_ms(),
            byte_timeout_ms: default_byte_timeout_ms(),
        }
    }
}

impl SerialSettings {
    pub fn to_serial_config(&self) -> SerialConfig {
        SerialConfig {
            port: self.port.clone(),
            baudrate: self.baudrate,
            response_timeout: Duration::from_millis(self.response_timeout_ms),
            byte_timeout: Duration::from_millis(self.byte_timeout_ms),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Where the sensor is installed, reported with every registration.
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub server_ip: Option<String>,
    #[serde(default)]
    pub server_port: Option<u16>,
    /// 64 hex digits.
    #[serde(default)]
    pub aes_key: Option<String>,
    /// Board unique id (MAC style, colons allowed) the device UUID is derived from.
    #[serde(default)]
    pub unique_id: Option<String>,
    /// Wireless credentials, kept for boards that join a network themselves.
    #[serde(default)]
    pub ssid: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub serial: SerialSettings,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            location: None,
            server_ip: None,
            server_port: None,
            aes_key: None,
            unique_id: None,
            ssid: None,
            password: None,
            serial: SerialSettings::default(),
            poll_interval_ms: default_poll_interval_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            buffer_capacity: default_buffer_capacity(),
        }
    }
}

fn required<'a, T>(value: &'a Option<T>, name: &str) -> Result<&'a T, RadarError> {
    value
        .as_ref()
        .ok_or_else(|| RadarError::Config(format!("missing {name}")))
}

impl GatewayConfig {
    /// Parse configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, RadarError> {
        serde_json::from_str(json_str).map_err(|e| RadarError::Config(e.to_string()))
    }

    /// Read configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RadarError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| RadarError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&content)
    }

    /// Convert to a JSON string
    pub fn to_json(&self) -> Result<String, RadarError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks that everything the gateway needs is present and well formed.
    pub fn validate(&self) -> Result<(), RadarError> {
        let location = required(&self.location, "location")?;
        if location.trim().is_empty() {
            return Err(RadarError::Config("empty location".into()));
        }
        required(&self.server_ip, "server_ip")?;
        required(&self.server_port, "server_port")?;
        required(&self.unique_id, "unique_id")?;
        self.key()?;
        if self.poll_interval_ms == 0 || self.heartbeat_interval_ms == 0 {
            return Err(RadarError::Config("intervals must be non-zero".into()));
        }
        if self.buffer_capacity == 0 {
            return Err(RadarError::Config("buffer_capacity must be non-zero".into()));
        }
        Ok(())
    }

    pub fn key(&self) -> Result<AesKey, RadarError> {
        let text = required(&self.aes_key, "aes_key")?;
        AesKey::from_hex(text).map_err(|e| RadarError::Config(format!("aes_key: {e}")))
    }

    pub fn location(&self) -> Result<&str, RadarError> {
        required(&self.location, "location").map(String::as_str)
    }

    pub fn server(&self) -> Result<(&str, u16), RadarError> {
        let ip = required(&self.server_ip, "server_ip")?;
        let port = required(&self.server_port, "server_port")?;
        Ok((ip.as_str(), *port))
    }

    pub fn unique_id(&self) -> Result<&str, RadarError> {
        required(&self.unique_id, "unique_id").map(String::as_str)
    }

    pub fn gateway_options(&self) -> GatewayOptions {
        GatewayOptions {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            heartbeat_interval: Duration::from_millis(self.heartbeat_interval_ms),
            buffer_capacity: self.buffer_capacity,
        }
    }
}
