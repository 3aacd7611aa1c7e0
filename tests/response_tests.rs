//! Tests for the response interpreter tables and the model-keyed resolution.

use radar_rs::constants::*;
use radar_rs::radar::response::{interpret, interpret_for_model, ControlWord, DecodeError};
use radar_rs::radar::SensorModel;
use radar_rs::telemetry::{ReadingValue, TelemetryRecord};

fn value(control: u8, command: u8, payload: &[u8]) -> ReadingValue {
    interpret(control, command, payload).unwrap().value
}

/// Tests the existence status query answered with "present".
#[test]
fn test_existence_status_present() {
    let reading = interpret(CONTROL_PRESENCE, EXISTENCE_STATUS, &[0x01]).unwrap();
    assert_eq!(reading.key, "existence_status");
    assert_eq!(reading.value, ReadingValue::Flag(true));
    assert_eq!(value(CONTROL_PRESENCE, EXISTENCE_REPORT, &[0x00]), ReadingValue::Flag(false));
}

/// Tests a two-byte big-endian heart rate.
#[test]
fn test_heart_rate_is_big_endian() {
    let reading = interpret(CONTROL_HEART, HEART_RATE, &[0x00, 0x48]).unwrap();
    assert_eq!(reading.key, "heart_rate");
    assert_eq!(reading.value, ReadingValue::Integer(72));
    assert_eq!(value(CONTROL_HEART, HEART_RATE_REPORT, &[0x01, 0x00]), ReadingValue::Integer(256));
}

/// Tests that an unknown control word gives the exact error text.
#[test]
fn test_unknown_control_word() {
    let err = interpret(0xFF, 0x01, &[0x00]).unwrap_err();
    assert_eq!(err, DecodeError::InvalidControlWord(0xFF));
    assert_eq!(err.to_string(), "Invalid Control Word");
}

/// Tests that the interpreter is pure: same input, same output.
#[test]
fn test_interpretation_is_deterministic() {
    let inputs: &[(u8, u8, &[u8])] = &[
        (CONTROL_PRESENCE, MOVEMENT_STATUS, &[0x02]),
        (CONTROL_SLEEP, BED_STATUS_REPORT, &[0x07]),
        (0x42, 0x00, &[]),
    ];
    for (control, command, payload) in inputs {
        assert_eq!(
            interpret(*control, *command, payload),
            interpret(*control, *command, payload)
        );
    }
}

#[test]
fn test_system_functions() {
    assert_eq!(value(CONTROL_SYSTEM_FUNCTIONS, SYSTEM_HEARTBEAT_QUERY, &[NO_DATA]), ReadingValue::Flag(true));
    let reset = interpret(CONTROL_SYSTEM_FUNCTIONS, SYSTEM_RESET, &[NO_DATA]).unwrap();
    assert_eq!(reset.key, "reset");
    assert_eq!(reset.value, ReadingValue::Flag(true));
}

#[test]
fn test_product_info_strings() {
    let reading = interpret(CONTROL_PRODUCT_INFO, HARDWARE_MODEL, b"R60A\x00").unwrap();
    assert_eq!(reading.key, "hardware_model");
    assert_eq!(reading.value.as_bytes(), Some(&b"R60A\x00"[..]));
    assert_eq!(
        interpret(CONTROL_PRODUCT_INFO, FIRMWARE_VERSION, b"G60SM1SYv010009").unwrap().key,
        "firmware_version"
    );
}

#[test]
fn test_operation_status_labels() {
    assert_eq!(value(CONTROL_OPERATION_STATUS, SCENE_SETTINGS_QUERY, &[0x02]), ReadingValue::Label("Bedroom"));
    assert_eq!(value(CONTROL_OPERATION_STATUS, SENSITIVITY_REPORT, &[0x03]), ReadingValue::Label("4 meter"));
    assert_eq!(value(CONTROL_OPERATION_STATUS, INIT_COMPLETE_QUERY, &[0x01]), ReadingValue::Flag(true));
}

#[test]
fn test_presence_table() {
    assert_eq!(value(CONTROL_PRESENCE, MOVEMENT_STATUS_REPORT, &[0x02]), ReadingValue::Label("Active"));
    assert_eq!(value(CONTROL_PRESENCE, MOVEMENT_ENERGY, &[0x37]), ReadingValue::Integer(0x37));
    assert_eq!(value(CONTROL_PRESENCE, EXISTENCE_DISTANCE, &[0x01, 0x2C]), ReadingValue::Integer(300));
    assert_eq!(value(CONTROL_PRESENCE, SET_EXISTENCE_TIME, &[0x08]), ReadingValue::Label("60m"));
}

#[test]
fn test_respiratory_table() {
    let speed = interpret(CONTROL_RESPIRATORY, RESPIRATORY_SPEED, &[0x03]).unwrap();
    assert_eq!(speed.key, "respiratory_speed");
    assert_eq!(speed.value, ReadingValue::Label("Slow"));

    let rate = interpret(CONTROL_RESPIRATORY, RESPIRATORY_RATE, &[0x12]).unwrap();
    assert_eq!(rate.key, "respiratory_rate");
    assert_eq!(rate.value, ReadingValue::Integer(18));

    let wave = interpret(CONTROL_RESPIRATORY, RESPIRATORY_WAVEFORM_REPORT, &[1, 2, 3, 4, 5]).unwrap();
    assert_eq!(wave.key, "respiratory_waveform");
    assert_eq!(wave.value, ReadingValue::Bytes(vec![1, 2, 3, 4, 5]));
}

#[test]
fn test_sleep_table() {
    assert_eq!(value(CONTROL_SLEEP, BED_STATUS_REPORT, &[0x01]), ReadingValue::Label("In Bed"));
    assert_eq!(value(CONTROL_SLEEP, SLEEP_STATUS_REPORT, &[0x00]), ReadingValue::Label("Deep Sleep"));
    assert_eq!(value(CONTROL_SLEEP, AWAKE_DURATION_REPORT, &[0x00, 0x1E]), ReadingValue::Integer(30));
    assert_eq!(value(CONTROL_SLEEP, SLEEP_MONITORING_STATUS, &[TURN_OFF]), ReadingValue::Flag(false));
}

#[test]
fn test_label_out_of_range_is_not_clamped() {
    assert_eq!(
        interpret(CONTROL_SLEEP, BED_STATUS_REPORT, &[0x03]),
        Err(DecodeError::LabelOutOfRange {
            key: "bed_status",
            index: 3
        })
    );
}

#[test]
fn test_unknown_command_keeps_subsystem_and_payload() {
    let err = interpret(CONTROL_HEART, 0x42, &[0xAB, 0x01]).unwrap_err();
    assert_eq!(err.to_string(), "Invalid Heart Rate Monitoring Command: 0x42 [AB, 01]");
}

#[test]
fn test_model_gating() {
    assert_eq!(
        interpret_for_model(SensorModel::Mr24hpc1, CONTROL_HEART, HEART_RATE, &[0x48]),
        Err(DecodeError::UnsupportedByModel {
            model: "MR24HPC1",
            subsystem: "Heart Rate Monitoring"
        })
    );
    assert!(interpret_for_model(SensorModel::Mr60bha1, CONTROL_HEART, HEART_RATE, &[0x48]).is_ok());
    assert!(interpret_for_model(
        SensorModel::Mr60bha1,
        CONTROL_UNDERLYING_FUNCTION,
        TOGGLE_UNDERLYING_OPEN_FUNCTION,
        &[TURN_ON]
    )
    .is_err());
    assert_eq!(
        interpret_for_model(SensorModel::Unknown, 0x99, 0x00, &[]),
        Err(DecodeError::InvalidControlWord(0x99))
    );
}

#[test]
fn test_control_word_conversion() {
    assert_eq!(ControlWord::try_from(0x85), Ok(ControlWord::Heart));
    assert_eq!(ControlWord::try_from(0x03), Err(DecodeError::InvalidControlWord(0x03)));
}

/// Tests that a decode error lands in the record instead of aborting.
#[test]
fn test_errors_become_record_values() {
    let mut record = TelemetryRecord::new();
    record.merge(interpret(CONTROL_PRESENCE, EXISTENCE_STATUS, &[0x01]));
    record.merge(interpret(0xFF, 0x00, &[]));
    assert_eq!(record.get("existence_status"), Some(&ReadingValue::Flag(true)));
    assert_eq!(record.error(), Some("Invalid Control Word"));
}
