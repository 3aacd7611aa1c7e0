//! Firmware image verification.
//!
//! Images are published next to a SHA-256 digest file. An image is only
//! accepted when its digest matches; fetching and installing stay with the
//! board's own tooling.

use crate::error::RadarError;
use sha2::{Digest, Sha256};

/// Lower-case hex SHA-256 of `payload`.
pub fn firmware_digest(payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    hex::encode(hasher.finalize())
}

/// Checks `payload` against the published digest.
///
/// The digest file may carry a trailing newline or upper-case digits.
pub fn verify_firmware(payload: &[u8], expected_sha256_hex: &str) -> Result<(), RadarError> {
    let expected = expected_sha256_hex.trim().to_ascii_lowercase();
    let calculated = firmware_digest(payload);
    if expected != calculated {
        return Err(RadarError::DigestMismatch {
            expected,
            calculated,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIRMWARE_SHA256: &str = "c3bf47ea1f4a4a605470313cacb3a44f4a461f68c6faeab07e737610cb5ac835";

    #[test]
    fn test_digest() {
        assert_eq!(firmware_digest(b"firmware"), FIRMWARE_SHA256);
    }

    #[test]
    fn test_verify_accepts_published_digest() {
        verify_firmware(b"firmware", FIRMWARE_SHA256).unwrap();
        verify_firmware(b"firmware", &format!("{}\n", FIRMWARE_SHA256.to_uppercase())).unwrap();
    }

    #[test]
    fn test_verify_rejects_tampered_image() {
        match verify_firmware(b"firmwarf", FIRMWARE_SHA256) {
            Err(RadarError::DigestMismatch { expected, calculated }) => {
                assert_eq!(expected, FIRMWARE_SHA256);
                assert_ne!(calculated, FIRMWARE_SHA256);
            }
            other => panic!("expected digest mismatch, got {other:?}"),
        }
    }
}
