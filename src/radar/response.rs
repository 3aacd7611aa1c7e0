//! # Radar Response Interpreter
//!
//! Maps a (control word, command, payload) triple from the radar module into
//! a typed [`Reading`]. The tables follow the MR24HPC1 (user manual V1.5) and
//! MR60BHA1 (user manual V1.9) datasheets; only the commands this gateway
//! cares about are covered.
//!
//! Dispatch is an exhaustive `match` on `(ControlWord, command)`. Binding the
//! same pair twice is an unreachable pattern, which this module denies.
//!
//! Interpretation never fails the poll cycle: unknown or malformed input is
//! returned as a [`DecodeError`] value that ends up in the telemetry record.

use crate::constants::*;
use crate::radar::sensor::SensorModel;
use crate::telemetry::{Reading, ReadingValue};
use thiserror::Error;

const SCENE_SETTINGS: &[&str] = &["Not set", "Living Room", "Bedroom", "Bathroom", "Area Detection"];
const SENSITIVITY_SETTINGS: &[&str] = &["Not set", "2 meter", "3 meter", "4 meter"];
const MOVEMENT_STATUS_LABELS: &[&str] = &["None", "Stationary", "Active"];
const PRESENCE_TIMES: &[&str] = &["None", "10s", "30s", "1m", "2m", "5m", "10m", "30m", "60m"];
const RESPIRATORY_SPEEDS: &[&str] = &["Normal", "Fast", "Slow", "None"];
const BED_STATUS: &[&str] = &["Out Bed", "In Bed", "None"];
const SLEEP_STATUS: &[&str] = &["Deep Sleep", "Light Sleep", "Awake", "None"];

/// Why a response could not be turned into a reading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Invalid Control Word")]
    InvalidControlWord(u8),

    #[error("Invalid {subsystem} Command: 0x{command:02X} {payload:02X?}")]
    InvalidCommand {
        subsystem: &'static str,
        command: u8,
        payload: Vec<u8>,
    },

    #[error("{subsystem} is not available on the {model}")]
    UnsupportedByModel {
        model: &'static str,
        subsystem: &'static str,
    },

    #[error("Label index {index} out of range for {key}")]
    LabelOutOfRange { key: &'static str, index: u64 },

    #[error("Payload of {len} bytes is too wide for {key}")]
    IntegerTooWide { key: &'static str, len: usize },
}

/// Functional subsystems addressed by the control word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlWord {
    SystemFunctions,
    ProductInfo,
    OperationStatus,
    DetectionRange,
    UnderlyingFunction,
    Presence,
    Respiratory,
    Sleep,
    Heart,
}

impl ControlWord {
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            CONTROL_SYSTEM_FUNCTIONS => ControlWord::SystemFunctions,
            CONTROL_PRODUCT_INFO => ControlWord::ProductInfo,
            CONTROL_OPERATION_STATUS => ControlWord::OperationStatus,
            CONTROL_DETECTION_RANGE => ControlWord::DetectionRange,
            CONTROL_UNDERLYING_FUNCTION => ControlWord::UnderlyingFunction,
            CONTROL_PRESENCE => ControlWord::Presence,
            CONTROL_RESPIRATORY => ControlWord::Respiratory,
            CONTROL_SLEEP => ControlWord::Sleep,
            CONTROL_HEART => ControlWord::Heart,
            _ => return None,
        })
    }

    pub fn as_byte(self) -> u8 {
        match self {
            ControlWord::SystemFunctions => CONTROL_SYSTEM_FUNCTIONS,
            ControlWord::ProductInfo => CONTROL_PRODUCT_INFO,
            ControlWord::OperationStatus => CONTROL_OPERATION_STATUS,
            ControlWord::DetectionRange => CONTROL_DETECTION_RANGE,
            ControlWord::UnderlyingFunction => CONTROL_UNDERLYING_FUNCTION,
            ControlWord::Presence => CONTROL_PRESENCE,
            ControlWord::Respiratory => CONTROL_RESPIRATORY,
            ControlWord::Sleep => CONTROL_SLEEP,
            ControlWord::Heart => CONTROL_HEART,
        }
    }

    /// Human readable subsystem name used in error messages.
    pub fn subsystem(self) -> &'static str {
        match self {
            ControlWord::SystemFunctions => "System Function",
            ControlWord::ProductInfo => "Product Info",
            ControlWord::OperationStatus => "Operation Status",
            ControlWord::DetectionRange => "Detection Range",
            ControlWord::UnderlyingFunction => "Underlying Open Function",
            ControlWord::Presence => "Presence Monitoring",
            ControlWord::Respiratory => "Respiratory Monitoring",
            ControlWord::Sleep => "Sleep Monitoring",
            ControlWord::Heart => "Heart Rate Monitoring",
        }
    }
}

impl TryFrom<u8> for ControlWord {
    type Error = DecodeError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        ControlWord::from_byte(byte).ok_or(DecodeError::InvalidControlWord(byte))
    }
}

/// Where a label table starts counting.
#[derive(Debug, Clone, Copy)]
enum IndexBase {
    Zero,
    One,
}

fn flag(key: &'static str, payload: &[u8], on: u8) -> Result<Reading, DecodeError> {
    Ok(Reading::new(key, ReadingValue::Flag(payload == [on])))
}

fn be_uint(key: &'static str, payload: &[u8]) -> Result<u64, DecodeError> {
    if payload.len() > 8 {
        return Err(DecodeError::IntegerTooWide {
            key,
            len: payload.len(),
        });
    }
    Ok(payload.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

fn integer(key: &'static str, payload: &[u8]) -> Result<Reading, DecodeError> {
    be_uint(key, payload).map(|v| Reading::new(key, ReadingValue::Integer(v)))
}

fn bytes(key: &'static str, payload: &[u8]) -> Result<Reading, DecodeError> {
    Ok(Reading::new(key, ReadingValue::Bytes(payload.to_vec())))
}

fn label(
    key: &'static str,
    payload: &[u8],
    table: &'static [&'static str],
    base: IndexBase,
) -> Result<Reading, DecodeError> {
    let index = be_uint(key, payload)?;
    let slot = match base {
        IndexBase::Zero => Some(index),
        IndexBase::One => index.checked_sub(1),
    };
    slot.and_then(|i| usize::try_from(i).ok())
        .and_then(|i| table.get(i))
        .map(|text| Reading::new(key, ReadingValue::Label(*text)))
        .ok_or(DecodeError::LabelOutOfRange { key, index })
}

/// Interprets a response using the union of both sensor models' tables.
#[deny(unreachable_patterns)]
pub fn interpret(control: u8, command: u8, payload: &[u8]) -> Result<Reading, DecodeError> {
    use ControlWord::*;

    let word = ControlWord::try_from(control)?;
    match (word, command) {
        (SystemFunctions, SYSTEM_HEARTBEAT_REPORT | SYSTEM_HEARTBEAT_QUERY) => {
            flag("heartbeat", payload, NO_DATA)
        }
        (SystemFunctions, SYSTEM_RESET) => flag("reset", payload, NO_DATA),

        (ProductInfo, PRODUCT_MODEL) => bytes("model", payload),
        (ProductInfo, PRODUCT_ID) => bytes("product_id", payload),
        (ProductInfo, HARDWARE_MODEL) => bytes("hardware_model", payload),
        (ProductInfo, FIRMWARE_VERSION) => bytes("firmware_version", payload),

        (OperationStatus, INIT_COMPLETE_REPORT | INIT_COMPLETE_QUERY) => {
            flag("init_complete", payload, TURN_ON)
        }
        (OperationStatus, SCENE_SETTINGS_REPORT | SCENE_SETTINGS_QUERY) => {
            label("scene_settings", payload, SCENE_SETTINGS, IndexBase::Zero)
        }
        (OperationStatus, SENSITIVITY_REPORT | SENSITIVITY_QUERY) => {
            label("sensitivity_settings", payload, SENSITIVITY_SETTINGS, IndexBase::Zero)
        }

        (DetectionRange, OUT_OF_BOUNDS_REPORT | OUT_OF_BOUNDS_QUERY) => flag("in_range", payload, TURN_ON),

        (UnderlyingFunction, TOGGLE_UNDERLYING_OPEN_FUNCTION) => {
            flag("underlying_open_function", payload, TURN_ON)
        }
        (UnderlyingFunction, UNDERLYING_VALUES) => bytes("underlying_values", payload),

        (Presence, TOGGLE_PRESENCE_MONITORING | PRESENCE_MONITORING_STATUS) => {
            flag("presence_monitoring", payload, TURN_ON)
        }
        (Presence, EXISTENCE_REPORT | EXISTENCE_STATUS) => flag("existence_status", payload, TURN_ON),
        (Presence, MOVEMENT_STATUS_REPORT | MOVEMENT_STATUS) => {
            label("movement_status", payload, MOVEMENT_STATUS_LABELS, IndexBase::Zero)
        }
        (Presence, MOVEMENT_ENERGY_REPORT | MOVEMENT_ENERGY) => integer("movement_energy", payload),
        (Presence, EXISTENCE_DISTANCE_REPORT | EXISTENCE_DISTANCE) => integer("presence_distance", payload),
        (Presence, EXISTENCE_ORIENTATION_REPORT) => integer("presence_orientation", payload),
        (Presence, SET_EXISTENCE_TIME) => label("set_presence_time", payload, PRESENCE_TIMES, IndexBase::Zero),

        (Respiratory, TOGGLE_RESPIRATORY_MONITORING | RESPIRATORY_MONITORING_STATUS) => {
            flag("respiratory_monitoring", payload, TURN_ON)
        }
        (Respiratory, RESPIRATORY_SPEED_REPORT | RESPIRATORY_SPEED) => {
            label("respiratory_speed", payload, RESPIRATORY_SPEEDS, IndexBase::One)
        }
        (Respiratory, RESPIRATORY_RATE_REPORT | RESPIRATORY_RATE) => integer("respiratory_rate", payload),
        (Respiratory, RESPIRATORY_WAVEFORM_REPORT | RESPIRATORY_WAVEFORM) => {
            bytes("respiratory_waveform", payload)
        }

        (Sleep, TOGGLE_SLEEP_MONITORING | SLEEP_MONITORING_STATUS) => flag("sleep_monitoring", payload, TURN_ON),
        (Sleep, BED_STATUS_REPORT) => label("bed_status", payload, BED_STATUS, IndexBase::Zero),
        (Sleep, SLEEP_STATUS_REPORT) => label("sleep_status", payload, SLEEP_STATUS, IndexBase::Zero),
        (Sleep, AWAKE_DURATION_REPORT) => integer("awake_duration", payload),
        (Sleep, LIGHT_SLEEP_DURATION_REPORT) => integer("light_sleep_duration", payload),
        (Sleep, DEEP_SLEEP_DURATION_REPORT) => integer("deep_sleep_duration", payload),

        (Heart, TOGGLE_HEART_MONITORING | HEART_MONITORING_STATUS) => flag("heart_monitoring", payload, TURN_ON),
        (Heart, HEART_RATE_REPORT | HEART_RATE) => integer("heart_rate", payload),
        (Heart, HEART_WAVEFORM_REPORT | HEART_WAVEFORM) => bytes("heart_waveform", payload),

        (word, command) => Err(DecodeError::InvalidCommand {
            subsystem: word.subsystem(),
            command,
            payload: payload.to_vec(),
        }),
    }
}

/// Interprets a response as the given sensor model understands it.
///
/// Subsystems the model does not have are rejected before lookup.
pub fn interpret_for_model(
    model: SensorModel,
    control: u8,
    command: u8,
    payload: &[u8],
) -> Result<Reading, DecodeError> {
    let word = ControlWord::try_from(control)?;
    if !model.supports(word) {
        return Err(DecodeError::UnsupportedByModel {
            model: model.name(),
            subsystem: word.subsystem(),
        });
    }
    interpret(control, command, payload)
}
