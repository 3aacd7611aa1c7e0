//! # radar-rs - A Rust Crate for Seeed Studio mmWave Radar Sensors
//!
//! The radar-rs crate talks to Seeed Studio 60 GHz / 24 GHz mmWave presence
//! and vital-sign radar modules (MR60BHA1, MR24HPC1) over their UART frame
//! protocol, and forwards the readings to a collector over an encrypted TCP
//! connection.
//!
//! ## Features
//!
//! - Encode and decode radar frames with checksum and end-marker validation
//! - Bounded-timeout serial transport, safe to share a thread with other tasks
//! - Request/response engine with bounded retries and sensor reset
//! - Typed interpretation of every supported response into telemetry readings
//! - Model detection and per-model setup and poll sequences
//! - Gateway loop with a bounded outbound buffer, heartbeat and AES-256-CBC
//!   encrypted collector connection
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! radar-rs = "0.3.0"
//! ```
//!
//! ```rust,no_run
//! use radar_rs::{open_sensor, SerialConfig};
//!
//! # async fn example() -> Result<(), radar_rs::RadarError> {
//! let mut sensor = open_sensor(&SerialConfig::default())?;
//! let model = sensor.init().await?;
//! let record = sensor.poll().await?;
//! println!("{model}: {}", record.to_json()?);
//! # Ok(())
//! # }
//! ```

pub mod board;
pub mod config;
pub mod connection;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod radar;
pub mod telemetry;
pub mod update;

pub use crate::error::RadarError;
pub use crate::logging::{init_logger, log_info};

// Core radar types
pub use radar::{
    decode_frame, encode_frame, interpret, interpret_for_model, ControlWord, DecodeError, Frame,
    LinkEngine, LinkState, LinkStats, LinkTimeouts, LinkTransport, RadarSensor, SensorModel,
    SerialConfig, SerialLink,
};
pub use telemetry::{DeviceIdentity, Reading, ReadingValue, TelemetryRecord};

// Collector side
pub use board::{derive_device_uuid, signal_failure, FailureSignal, LogIndicator, StatusIndicator};
pub use config::GatewayConfig;
pub use connection::encryption::AesKey;
pub use connection::{register, Connection, TcpConnection};
pub use gateway::{Gateway, GatewayOptions, OutboundBuffer};

use log::info;
use tokio_serial::SerialStream;

/// A sensor attached to a real serial port.
pub type SerialSensor = RadarSensor<SerialLink<SerialStream>>;

/// Opens the serial port and wraps it in a sensor session.
///
/// The sensor is not initialised; call [`RadarSensor::init`] next.
pub fn open_sensor(config: &SerialConfig) -> Result<SerialSensor, RadarError> {
    let link = SerialLink::open(config)?;
    Ok(RadarSensor::new(LinkEngine::new(link, config.timeouts())))
}

/// Boots and runs the full gateway described by `config`.
///
/// Follows the board's boot order: validate the configuration, initialise
/// the sensor, derive the device UUID, connect and register with the
/// collector, then run the task loop. Only returns on failure.
pub async fn run_gateway(config: &GatewayConfig) -> Result<(), RadarError> {
    config.validate()?;
    let key = config.key()?;

    let mut sensor = open_sensor(&config.serial.to_serial_config())?;
    let model = sensor.init().await?;
    let info = sensor.product_info().await?;
    info!("Sensor product info: {}", info.to_json()?);

    let identity = DeviceIdentity {
        id: derive_device_uuid(config.unique_id()?)?,
        model: model.name().to_string(),
        location: config.location()?.to_string(),
    };

    let (ip, port) = config.server()?;
    let mut connection = TcpConnection::connect(ip, port).await?;
    register(&mut connection, &identity, Some(&key)).await?;
    info!("Registered with collector as {}", identity.id);

    let gateway = Gateway::new(sensor, connection, identity, Some(key), config.gateway_options());
    gateway.run().await
}
