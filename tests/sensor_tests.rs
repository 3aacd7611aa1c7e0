//! Tests for model detection, setup and poll sequencing against simulated
//! radar modules.


use mock_support::{mock_sensor, written_requests, SimulatedRadar};
use radar_rs::constants::*;
use radar_rs::radar::serial_mock::MockSerialPort;
use radar_rs::radar::SensorModel;
use radar_rs::telemetry::ReadingValue;

#[tokio::test]
async fn test_init_detects_mr60bha1_and_applies_setup() {
    let mock = MockSerialPort::new();
    SimulatedRadar::mr60bha1().attach(&mock);
    let mut sensor = mock_sensor(&mock);

    assert_eq!(sensor.init().await.unwrap(), SensorModel::Mr60bha1);
    assert_eq!(sensor.model(), SensorModel::Mr60bha1);
    assert_eq!(
        written_requests(&mock),
        vec![
            (CONTROL_SYSTEM_FUNCTIONS, SYSTEM_RESET, vec![NO_DATA]),
            (CONTROL_PRODUCT_INFO, HARDWARE_MODEL, vec![NO_DATA]),
            (CONTROL_PRESENCE, TOGGLE_PRESENCE_MONITORING, vec![TURN_OFF]),
            (CONTROL_HEART, TOGGLE_HEART_MONITORING, vec![TURN_OFF]),
            (CONTROL_RESPIRATORY, TOGGLE_RESPIRATORY_MONITORING, vec![TURN_ON]),
            (CONTROL_SLEEP, TOGGLE_SLEEP_MONITORING, vec![TURN_OFF]),
            (CONTROL_SLEEP, SLEEP_REPORTING_MODE, vec![0x00]),
        ]
    );
}

#[tokio::test]
async fn test_init_detects_mr24hpc1_and_applies_setup() {
    let mock = MockSerialPort::new();
    SimulatedRadar::mr24hpc1().attach(&mock);
    let mut sensor = mock_sensor(&mock);

    assert_eq!(sensor.init().await.unwrap(), SensorModel::Mr24hpc1);
    let requests = written_requests(&mock);
    assert_eq!(
        requests[2..],
        [
            (CONTROL_UNDERLYING_FUNCTION, TOGGLE_UNDERLYING_OPEN_FUNCTION, vec![TURN_ON]),
            (CONTROL_PRESENCE, SET_EXISTENCE_TIME, vec![0x00]),
        ]
    );
}

#[tokio::test]
async fn test_unknown_model_sends_no_setup_and_polls_nothing() {
    let mock = MockSerialPort::new();
    SimulatedRadar::mr60bha1()
        .with_hardware_model(b"X99Z")
        .attach(&mock);
    let mut sensor = mock_sensor(&mock);

    assert_eq!(sensor.init().await.unwrap(), SensorModel::Unknown);
    assert_eq!(written_requests(&mock).len(), 2);

    let record = sensor.poll().await.unwrap();
    assert!(record.is_empty());
    assert_eq!(written_requests(&mock).len(), 2);
}

#[tokio::test]
async fn test_mr60bha1_poll_cycle() {
    let mock = MockSerialPort::new();
    SimulatedRadar::mr60bha1().attach(&mock);
    let mut sensor = mock_sensor(&mock);
    sensor.init().await.unwrap();

    let record = sensor.poll().await.unwrap();
    assert_eq!(record.len(), 3);
    assert_eq!(record.get("existence_status"), Some(&ReadingValue::Flag(true)));
    assert_eq!(record.get("heart_rate"), Some(&ReadingValue::Integer(72)));
    assert_eq!(record.get("respiratory_rate"), Some(&ReadingValue::Integer(18)));
    assert!(record.error().is_none());

    let stats = sensor.link_stats();
    assert_eq!(stats.resets, 1);
    assert_eq!(stats.matched, stats.requests);
    assert_eq!(stats.decode_failures, 0);
}

#[tokio::test]
async fn test_mr24hpc1_poll_cycle() {
    let mock = MockSerialPort::new();
    let sim = SimulatedRadar::mr24hpc1().attach(&mock);
    let mut sensor = mock_sensor(&mock);
    sensor.init().await.unwrap();

    sim.lock().unwrap().present = false;
    let record = sensor.poll().await.unwrap();
    assert_eq!(record.len(), 1);
    assert_eq!(record.get("existence_status"), Some(&ReadingValue::Flag(false)));
}

#[tokio::test]
async fn test_bad_reading_degrades_record() {
    let mock = MockSerialPort::new();
    let sim = SimulatedRadar::mr60bha1().attach(&mock);
    let mut sensor = mock_sensor(&mock);
    sensor.init().await.unwrap();

    sim.lock().unwrap().heart_rate = vec![0x01; 9];
    let record = sensor.poll().await.unwrap();
    assert_eq!(record.get("existence_status"), Some(&ReadingValue::Flag(true)));
    assert_eq!(record.get("respiratory_rate"), Some(&ReadingValue::Integer(18)));
    assert!(record.get("heart_rate").is_none());
    assert!(record.error().unwrap().contains("heart_rate"));
}

#[tokio::test]
async fn test_heartbeat() {
    let mock = MockSerialPort::new();
    let sim = SimulatedRadar::mr24hpc1().attach(&mock);
    let mut sensor = mock_sensor(&mock);

    assert!(sensor.heartbeat().await.unwrap());
    sim.lock().unwrap().heartbeat_broken = true;
    assert!(!sensor.heartbeat().await.unwrap());
}

#[tokio::test]
async fn test_product_info() {
    let mock = MockSerialPort::new();
    SimulatedRadar::mr60bha1().attach(&mock);
    let mut sensor = mock_sensor(&mock);

    let info = sensor.product_info().await.unwrap();
    assert_eq!(info.len(), 4);
    assert_eq!(
        info.get("hardware_model").and_then(ReadingValue::as_bytes),
        Some(&b"R60A\x00"[..])
    );
    assert_eq!(
        info.get("firmware_version").and_then(ReadingValue::as_bytes),
        Some(&b"G60SM1SYv010009"[..])
    );
}

#[tokio::test]
async fn test_silent_module_fails_init() {
    let mock = MockSerialPort::new();
    let mut sensor = mock_sensor(&mock);
    let result = sensor.init().await;
    assert!(matches!(result, Err(radar_rs::RadarError::SensorUnresponsive)));
}
