//! Board-level helpers: the status indicator and the device identity.

use crate::error::RadarError;
use crate::logging::log_error;
use async_trait::async_trait;
use log::{error, info};
use std::convert::Infallible;
use std::time::Duration;
use uuid::Uuid;

/// Blink period used for configuration and fatal sensor failures.
pub const FAILURE_BLINK_INTERVAL: Duration = Duration::from_millis(100);

/// Blinks shown for a fatal failure before the process exits.
pub const FATAL_FAILURE_BLINKS: u32 = 10;

/// Multiplier applied to the unique id when deriving the device UUID
/// (the ASCII codes of "eyasolution" written as one decimal number).
const UUID_SALT: u128 = 10112197115111108117116105111110;

/// The on-board status LED.
#[async_trait]
pub trait StatusIndicator: Send {
    fn on(&mut self);

    fn off(&mut self);

    /// Blinks `times` times with the given half-period, ending dark.
    async fn blink(&mut self, times: u32, interval: Duration) {
        for _ in 0..times {
            self.on();
            tokio::time::sleep(interval).await;
            self.off();
            tokio::time::sleep(interval).await;
        }
    }

    /// Blinks with the given half-period and never returns.
    async fn blink_forever(&mut self, interval: Duration) -> Infallible {
        error!("Unrecoverable failure, blinking status LED every {interval:?}");
        loop {
            self.on();
            tokio::time::sleep(interval).await;
            self.off();
            tokio::time::sleep(interval).await;
        }
    }
}

/// How the indicator reports an error that stopped the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSignal {
    /// Configuration is wrong; restarting will not help.
    BlinkForever,
    /// Fatal runtime failure: blink, stay lit, then exit for a restart.
    Blink(u32),
}

impl FailureSignal {
    pub fn for_error(err: &RadarError) -> Self {
        match err {
            RadarError::Config(_) => FailureSignal::BlinkForever,
            _ => FailureSignal::Blink(FATAL_FAILURE_BLINKS),
        }
    }
}

/// Shows `err` on the indicator.
///
/// Returns only for errors that end in a restart.
pub async fn signal_failure<I: StatusIndicator>(led: &mut I, err: &RadarError, interval: Duration) {
    match FailureSignal::for_error(err) {
        FailureSignal::BlinkForever => {
            log_error(&format!("Configuration error: {err}"));
            match led.blink_forever(interval).await {}
        }
        FailureSignal::Blink(times) => {
            log_error(&format!("Fatal failure: {err}"));
            led.blink(times, interval).await;
            led.on();
        }
    }
}

/// Indicator for hosts without an LED: state changes go to the log.
#[derive(Debug, Default)]
pub struct LogIndicator {
    lit: bool,
    toggles: u64,
}

impl LogIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on(&self) -> bool {
        self.lit
    }

    pub fn toggles(&self) -> u64 {
        self.toggles
    }
}

impl StatusIndicator for LogIndicator {
    fn on(&mut self) {
        if !self.lit {
            self.toggles += 1;
        }
        self.lit = true;
    }

    fn off(&mut self) {
        if self.lit {
            self.toggles += 1;
        }
        self.lit = false;
    }
}

/// Parses hex digits into little-endian 32-bit limbs.
fn parse_limbs(digits: &str) -> Result<Vec<u32>, RadarError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(RadarError::InvalidHexString);
    }
    let bytes = digits.as_bytes();
    let mut limbs = Vec::with_capacity(bytes.len() / 8 + 1);
    let mut end = bytes.len();
    while end > 0 {
        let start = end.saturating_sub(8);
        let chunk = std::str::from_utf8(&bytes[start..end]).map_err(|_| RadarError::InvalidHexString)?;
        limbs.push(u32::from_str_radix(chunk, 16).map_err(|_| RadarError::InvalidHexString)?);
        end = start;
    }
    Ok(limbs)
}

fn multiply(limbs: &[u32], factor: u128) -> Vec<u32> {
    let factor_limbs = [
        factor as u32,
        (factor >> 32) as u32,
        (factor >> 64) as u32,
        (factor >> 96) as u32,
    ];
    let mut out = vec![0u32; limbs.len() + factor_limbs.len()];
    for (i, &a) in limbs.iter().enumerate() {
        let mut carry = 0u64;
        for (j, &b) in factor_limbs.iter().enumerate() {
            let acc = out[i + j] as u64 + a as u64 * b as u64 + carry;
            out[i + j] = acc as u32;
            carry = acc >> 32;
        }
        out[i + factor_limbs.len()] = carry as u32;
    }
    out
}

fn to_upper_hex(limbs: &[u32]) -> String {
    let mut significant = limbs.iter().rev().skip_while(|limb| **limb == 0);
    let Some(first) = significant.next() else {
        return "0".to_string();
    };
    let mut text = format!("{first:X}");
    for limb in significant {
        text.push_str(&format!("{limb:08X}"));
    }
    text
}

/// Derives the device UUID from the board's unique id.
///
/// The id's hex digits (colons ignored) are multiplied by a fixed salt. The
/// product's upper-case hex digits are right-padded with zeros to 32, the
/// version and variant digits are forced to `4` and `8`, and the result is
/// formatted 8-4-4-4-12.
pub fn derive_device_uuid(unique_id: &str) -> Result<String, RadarError> {
    let digits: String = unique_id.chars().filter(|c| *c != ':').collect();
    let product = to_upper_hex(&multiply(&parse_limbs(&digits)?, UUID_SALT));

    let mut raw: Vec<u8> = product.into_bytes();
    raw.resize(32, b'0');
    raw[12] = b'4';
    raw[16] = b'8';

    let simple = std::str::from_utf8(&raw).map_err(|_| RadarError::InvalidHexString)?;
    let uuid = Uuid::parse_str(simple).map_err(|_| RadarError::InvalidHexString)?;
    let id = uuid
        .hyphenated()
        .encode_upper(&mut Uuid::encode_buffer())
        .to_string();
    info!("Device UUID {id}");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_uuids() {
        assert_eq!(
            derive_device_uuid("A4:CF:12:34:56:78").unwrap(),
            "522B31BF-DE5A-41E8-8C30-D01134BEF017"
        );
        assert_eq!(derive_device_uuid("1").unwrap(), "7FA24567-6841-457C-8336-D1B646000000");
        assert_eq!(derive_device_uuid("0").unwrap(), "00000000-0000-4000-8000-000000000000");
    }

    #[test]
    fn test_colons_ignored() {
        assert_eq!(
            derive_device_uuid("a4cf12345678").unwrap(),
            derive_device_uuid("A4:CF:12:34:56:78").unwrap()
        );
    }

    #[test]
    fn test_invalid_unique_id() {
        assert!(matches!(derive_device_uuid(""), Err(RadarError::InvalidHexString)));
        assert!(matches!(derive_device_uuid("xyz"), Err(RadarError::InvalidHexString)));
        assert!(matches!(derive_device_uuid("+1"), Err(RadarError::InvalidHexString)));
    }

    #[test]
    fn test_limb_arithmetic() {
        assert_eq!(parse_limbs("123456789").unwrap(), vec![0x2345_6789, 0x1]);
        assert_eq!(to_upper_hex(&multiply(&[0xFFFF_FFFF], 2)), "1FFFFFFFE");
    }

    #[test]
    fn test_failure_signal_mapping() {
        assert_eq!(
            FailureSignal::for_error(&RadarError::Config("no key".into())),
            FailureSignal::BlinkForever
        );
        for err in [
            RadarError::SensorUnresponsive,
            RadarError::SerialPort("unplugged".into()),
            RadarError::Connection("refused".into()),
        ] {
            assert_eq!(FailureSignal::for_error(&err), FailureSignal::Blink(FATAL_FAILURE_BLINKS));
        }
    }

    #[tokio::test]
    async fn test_fatal_failure_blinks_then_stays_lit() {
        let mut led = LogIndicator::new();
        signal_failure(&mut led, &RadarError::SensorUnresponsive, Duration::from_millis(1)).await;
        assert!(led.is_on());
        assert_eq!(led.toggles(), 2 * u64::from(FATAL_FAILURE_BLINKS) + 1);
    }

    #[tokio::test]
    async fn test_config_failure_never_returns() {
        let mut led = LogIndicator::new();
        let err = RadarError::Config("missing server_ip".into());
        let outcome = tokio::time::timeout(
            Duration::from_millis(50),
            signal_failure(&mut led, &err, Duration::from_millis(1)),
        )
        .await;
        assert!(outcome.is_err());
        assert!(led.toggles() > 2);
    }

    #[test]
    fn test_log_indicator_tracks_toggles() {
        let mut led = LogIndicator::new();
        led.on();
        led.on();
        led.off();
        assert!(!led.is_on());
        assert_eq!(led.toggles(), 2);
    }
}
