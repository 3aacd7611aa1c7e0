//! Radar Link Protocol Constants
//!
//! This module defines constants used by the framed serial protocol of the
//! Seeed Studio MR24HPC1 and MR60BHA1 mmWave radar modules, based on the
//! tables in their user manuals.
//!
//! Commands in the `0x0N` range are reports/settings, the `0x8N` range are
//! the matching queries.

// ----------------------------------------------------------------------------
// Framing
// ----------------------------------------------------------------------------

/// Start marker opening every frame
pub const FRAME_START: [u8; 2] = [0x53, 0x59];

/// End marker closing every frame
pub const FRAME_END: [u8; 2] = [0x54, 0x43];

/// Bytes before the payload: start(2) + control(1) + command(1) + length(2)
pub const FRAME_HEADER_LEN: usize = 6;

/// Bytes after the payload: checksum(1) + end(2)
pub const FRAME_TRAILER_LEN: usize = 3;

/// Total framing overhead around the payload
pub const FRAME_OVERHEAD: usize = FRAME_HEADER_LEN + FRAME_TRAILER_LEN;

// ----------------------------------------------------------------------------
// Sentinel payload bytes
// ----------------------------------------------------------------------------

/// "No data" / query placeholder
pub const NO_DATA: u8 = 0x0F;
pub const TURN_ON: u8 = 0x01;
pub const TURN_OFF: u8 = 0x00;

// ----------------------------------------------------------------------------
// Link engine bounds
// ----------------------------------------------------------------------------

/// Consecutive failed reads tolerated before the reset sub-procedure runs
pub const MAX_FAILED_ATTEMPTS: u32 = 5;

/// Extra reads allowed after a stale (non-matching) frame before resending
pub const MAX_STALE_READS: u32 = 2;

/// Request resends allowed for stale responses before escalating to a reset
pub const MAX_REQUEST_RESTARTS: u32 = 3;

/// Resets a single request may trigger before the sensor is declared unresponsive
pub const MAX_RESETS_PER_REQUEST: u32 = 2;

// ----------------------------------------------------------------------------
// Control words
// ----------------------------------------------------------------------------

pub const CONTROL_SYSTEM_FUNCTIONS: u8 = 0x01;
pub const CONTROL_PRODUCT_INFO: u8 = 0x02;
pub const CONTROL_OPERATION_STATUS: u8 = 0x05;
pub const CONTROL_DETECTION_RANGE: u8 = 0x07;
pub const CONTROL_UNDERLYING_FUNCTION: u8 = 0x08;
pub const CONTROL_PRESENCE: u8 = 0x80;
pub const CONTROL_RESPIRATORY: u8 = 0x81;
pub const CONTROL_SLEEP: u8 = 0x84;
pub const CONTROL_HEART: u8 = 0x85;

// System functions
pub const SYSTEM_HEARTBEAT_REPORT: u8 = 0x01;
pub const SYSTEM_RESET: u8 = 0x02;
pub const SYSTEM_HEARTBEAT_QUERY: u8 = 0x80;

// Product info
pub const PRODUCT_MODEL: u8 = 0xA1;
pub const PRODUCT_ID: u8 = 0xA2;
pub const HARDWARE_MODEL: u8 = 0xA3;
pub const FIRMWARE_VERSION: u8 = 0xA4;

// Operation status
pub const INIT_COMPLETE_REPORT: u8 = 0x01;
pub const SCENE_SETTINGS_REPORT: u8 = 0x07;
pub const SENSITIVITY_REPORT: u8 = 0x08;
pub const INIT_COMPLETE_QUERY: u8 = 0x81;
pub const SCENE_SETTINGS_QUERY: u8 = 0x87;
pub const SENSITIVITY_QUERY: u8 = 0x88;

// Detection range
pub const OUT_OF_BOUNDS_REPORT: u8 = 0x07;
pub const OUT_OF_BOUNDS_QUERY: u8 = 0x87;

// Underlying open function
pub const TOGGLE_UNDERLYING_OPEN_FUNCTION: u8 = 0x00;
pub const UNDERLYING_VALUES: u8 = 0x01;

// Presence
pub const TOGGLE_PRESENCE_MONITORING: u8 = 0x00;
pub const EXISTENCE_REPORT: u8 = 0x01;
pub const MOVEMENT_STATUS_REPORT: u8 = 0x02;
pub const MOVEMENT_ENERGY_REPORT: u8 = 0x03;
pub const EXISTENCE_DISTANCE_REPORT: u8 = 0x04;
pub const EXISTENCE_ORIENTATION_REPORT: u8 = 0x05;
pub const SET_EXISTENCE_TIME: u8 = 0x0A;
pub const PRESENCE_MONITORING_STATUS: u8 = 0x80;
pub const EXISTENCE_STATUS: u8 = 0x81;
pub const MOVEMENT_STATUS: u8 = 0x82;
pub const MOVEMENT_ENERGY: u8 = 0x83;
pub const EXISTENCE_DISTANCE: u8 = 0x84;

// Respiratory
pub const TOGGLE_RESPIRATORY_MONITORING: u8 = 0x00;
pub const RESPIRATORY_SPEED_REPORT: u8 = 0x01;
pub const RESPIRATORY_RATE_REPORT: u8 = 0x02;
pub const RESPIRATORY_WAVEFORM_REPORT: u8 = 0x05;
pub const RESPIRATORY_MONITORING_STATUS: u8 = 0x80;
pub const RESPIRATORY_SPEED: u8 = 0x81;
pub const RESPIRATORY_RATE: u8 = 0x82;
pub const RESPIRATORY_WAVEFORM: u8 = 0x85;

// Sleep
pub const TOGGLE_SLEEP_MONITORING: u8 = 0x00;
pub const BED_STATUS_REPORT: u8 = 0x01;
pub const SLEEP_STATUS_REPORT: u8 = 0x02;
pub const AWAKE_DURATION_REPORT: u8 = 0x03;
pub const LIGHT_SLEEP_DURATION_REPORT: u8 = 0x04;
pub const DEEP_SLEEP_DURATION_REPORT: u8 = 0x05;
pub const SLEEP_REPORTING_MODE: u8 = 0x0F;
pub const SLEEP_MONITORING_STATUS: u8 = 0x80;

// Heart
pub const TOGGLE_HEART_MONITORING: u8 = 0x00;
pub const HEART_RATE_REPORT: u8 = 0x02;
pub const HEART_WAVEFORM_REPORT: u8 = 0x05;
pub const HEART_MONITORING_STATUS: u8 = 0x80;
pub const HEART_RATE: u8 = 0x82;
pub const HEART_WAVEFORM: u8 = 0x85;
