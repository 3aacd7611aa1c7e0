//! # Radar Model Dispatcher and Poll Sequencer
//!
//! [`RadarSensor`] owns the link session and knows, per detected sensor
//! model, how to configure the module and which readings to request each
//! poll cycle.

use crate::constants::*;
use crate::error::RadarError;
use crate::radar::link::{LinkEngine, LinkStats};
use crate::radar::response::{interpret, interpret_for_model, ControlWord};
use crate::radar::serial::LinkTransport;
use crate::telemetry::TelemetryRecord;
use log::{debug, info, warn};

/// Supported Seeed Studio radar modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorModel {
    /// MR60BHA1 60 GHz breathing and heartbeat radar (hardware model `R60A`).
    Mr60bha1,
    /// MR24HPC1 24 GHz human presence radar (hardware model `R24D`).
    Mr24hpc1,
    Unknown,
}

/// One request frame's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub control: u8,
    pub command: u8,
    pub payload: &'static [u8],
}

const fn request(control: u8, command: u8, payload: &'static [u8]) -> Request {
    Request {
        control,
        command,
        payload,
    }
}

const MR60BHA1_SETUP: &[Request] = &[
    request(CONTROL_PRESENCE, TOGGLE_PRESENCE_MONITORING, &[TURN_OFF]),
    request(CONTROL_HEART, TOGGLE_HEART_MONITORING, &[TURN_OFF]),
    request(CONTROL_RESPIRATORY, TOGGLE_RESPIRATORY_MONITORING, &[TURN_ON]),
    request(CONTROL_SLEEP, TOGGLE_SLEEP_MONITORING, &[TURN_OFF]),
    request(CONTROL_SLEEP, SLEEP_REPORTING_MODE, &[0x00]),
];

const MR24HPC1_SETUP: &[Request] = &[
    request(CONTROL_UNDERLYING_FUNCTION, TOGGLE_UNDERLYING_OPEN_FUNCTION, &[TURN_ON]),
    request(CONTROL_PRESENCE, SET_EXISTENCE_TIME, &[0x00]),
];

const MR60BHA1_POLL: &[Request] = &[
    request(CONTROL_PRESENCE, EXISTENCE_STATUS, &[NO_DATA]),
    request(CONTROL_HEART, HEART_RATE, &[NO_DATA]),
    request(CONTROL_RESPIRATORY, RESPIRATORY_RATE, &[NO_DATA]),
];

const MR24HPC1_POLL: &[Request] = &[request(CONTROL_PRESENCE, EXISTENCE_STATUS, &[NO_DATA])];

impl SensorModel {
    /// Identifies the model from the hardware-model product info string.
    pub fn from_hardware_model(payload: &[u8]) -> Self {
        let end = payload
            .iter()
            .rposition(|b| *b != 0x00)
            .map_or(0, |i| i + 1);
        match &payload[..end] {
            b"R60A" => SensorModel::Mr60bha1,
            b"R24D" => SensorModel::Mr24hpc1,
            _ => SensorModel::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SensorModel::Mr60bha1 => "MR60BHA1",
            SensorModel::Mr24hpc1 => "MR24HPC1",
            SensorModel::Unknown => "unknown",
        }
    }

    /// Whether the module has the subsystem behind a control word.
    pub fn supports(&self, word: ControlWord) -> bool {
        match self {
            SensorModel::Mr60bha1 => word != ControlWord::UnderlyingFunction,
            SensorModel::Mr24hpc1 => !matches!(
                word,
                ControlWord::Respiratory | ControlWord::Sleep | ControlWord::Heart
            ),
            SensorModel::Unknown => true,
        }
    }

    /// Toggles sent once after the model is known.
    pub fn setup_sequence(&self) -> &'static [Request] {
        match self {
            SensorModel::Mr60bha1 => MR60BHA1_SETUP,
            SensorModel::Mr24hpc1 => MR24HPC1_SETUP,
            SensorModel::Unknown => &[],
        }
    }

    /// Readings requested every poll cycle.
    pub fn poll_sequence(&self) -> &'static [Request] {
        match self {
            SensorModel::Mr60bha1 => MR60BHA1_POLL,
            SensorModel::Mr24hpc1 => MR24HPC1_POLL,
            SensorModel::Unknown => &[],
        }
    }
}

impl std::fmt::Display for SensorModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A radar module attached over a link, with its session state.
pub struct RadarSensor<T> {
    engine: LinkEngine<T>,
    model: SensorModel,
}

impl<T: LinkTransport> RadarSensor<T> {
    /// Wraps an engine; the model stays `Unknown` until [`RadarSensor::init`].
    pub fn new(engine: LinkEngine<T>) -> Self {
        RadarSensor {
            engine,
            model: SensorModel::Unknown,
        }
    }

    pub fn model(&self) -> SensorModel {
        self.model
    }

    pub fn link_stats(&self) -> LinkStats {
        self.engine.stats()
    }

    /// Resets the module, detects its model and applies the model's setup.
    pub async fn init(&mut self) -> Result<SensorModel, RadarError> {
        self.engine.reset().await?;

        let hardware = self
            .engine
            .send_receive(CONTROL_PRODUCT_INFO, HARDWARE_MODEL, &[NO_DATA])
            .await?;
        self.model = SensorModel::from_hardware_model(&hardware);

        match self.model {
            SensorModel::Unknown => warn!(
                "Unrecognised hardware model {:?}, polling disabled",
                String::from_utf8_lossy(&hardware)
            ),
            model => info!("Detected {model} radar"),
        }

        for req in self.model.setup_sequence() {
            self.engine
                .send_receive(req.control, req.command, req.payload)
                .await?;
        }
        Ok(self.model)
    }

    /// Runs one poll cycle and assembles the readings into a record.
    ///
    /// Decode errors are recorded in the result; only fatal link errors fail.
    pub async fn poll(&mut self) -> Result<TelemetryRecord, RadarError> {
        let mut record = TelemetryRecord::new();
        for req in self.model.poll_sequence() {
            let payload = self
                .engine
                .send_receive(req.control, req.command, req.payload)
                .await?;
            record.merge(interpret_for_model(self.model, req.control, req.command, &payload));
        }
        debug!("Poll cycle produced {} readings", record.len());
        Ok(record)
    }

    /// Asks the module for a heartbeat; true when it echoes the query.
    pub async fn heartbeat(&mut self) -> Result<bool, RadarError> {
        let payload = self
            .engine
            .send_receive(CONTROL_SYSTEM_FUNCTIONS, SYSTEM_HEARTBEAT_REPORT, &[NO_DATA])
            .await?;
        Ok(interpret(CONTROL_SYSTEM_FUNCTIONS, SYSTEM_HEARTBEAT_REPORT, &payload)
            .ok()
            .and_then(|reading| reading.value.as_flag())
            .unwrap_or(false))
    }

    /// Reads the product model, id, hardware model and firmware version.
    pub async fn product_info(&mut self) -> Result<TelemetryRecord, RadarError> {
        let mut record = TelemetryRecord::new();
        for command in [PRODUCT_MODEL, PRODUCT_ID, HARDWARE_MODEL, FIRMWARE_VERSION] {
            let payload = self
                .engine
                .send_receive(CONTROL_PRODUCT_INFO, command, &[NO_DATA])
                .await?;
            record.merge(interpret(CONTROL_PRODUCT_INFO, command, &payload));
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_detection() {
        assert_eq!(SensorModel::from_hardware_model(b"R60A\x00"), SensorModel::Mr60bha1);
        assert_eq!(SensorModel::from_hardware_model(b"R60A"), SensorModel::Mr60bha1);
        assert_eq!(SensorModel::from_hardware_model(b"R24D"), SensorModel::Mr24hpc1);
        assert_eq!(SensorModel::from_hardware_model(b"R24D\x00\x00"), SensorModel::Mr24hpc1);
        assert_eq!(SensorModel::from_hardware_model(b"XYZ"), SensorModel::Unknown);
        assert_eq!(SensorModel::from_hardware_model(b""), SensorModel::Unknown);
    }

    #[test]
    fn test_model_gating() {
        assert!(SensorModel::Mr60bha1.supports(ControlWord::Heart));
        assert!(!SensorModel::Mr60bha1.supports(ControlWord::UnderlyingFunction));
        assert!(!SensorModel::Mr24hpc1.supports(ControlWord::Respiratory));
        assert!(SensorModel::Mr24hpc1.supports(ControlWord::Presence));
        assert!(SensorModel::Unknown.supports(ControlWord::Sleep));
    }

    #[test]
    fn test_unknown_model_has_no_sequences() {
        assert!(SensorModel::Unknown.setup_sequence().is_empty());
        assert!(SensorModel::Unknown.poll_sequence().is_empty());
    }

    #[test]
    fn test_poll_sequences() {
        let controls: Vec<u8> = SensorModel::Mr60bha1
            .poll_sequence()
            .iter()
            .map(|r| r.control)
            .collect();
        assert_eq!(controls, vec![CONTROL_PRESENCE, CONTROL_HEART, CONTROL_RESPIRATORY]);
        assert_eq!(SensorModel::Mr24hpc1.poll_sequence().len(), 1);
    }
}
