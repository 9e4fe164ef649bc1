//! Secure random number generation.
//!
//! Uses the operating system's cryptographic random source via `rand`.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{Result, RotatorError};

/// Fill a buffer with cryptographically secure random bytes.
pub fn fill_random(buf: &mut [u8]) -> Result<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| RotatorError::Crypto(format!("random source failed: {e}")))
}

/// Draw a uniformly random 128-bit serial number.
///
/// Returned as the minimal big-endian encoding of a positive integer:
/// leading zero bytes are stripped and a zero byte is prepended when the
/// high bit is set, so the value never reads as negative in DER.
pub fn serial_number() -> Result<Vec<u8>> {
    let mut raw = [0u8; 16];
    fill_random(&mut raw)?;

    let first = raw.iter().position(|&b| b != 0).unwrap_or(raw.len() - 1);
    let mut serial = Vec::with_capacity(17);
    if raw[first] & 0x80 != 0 {
        serial.push(0);
    }
    serial.extend_from_slice(&raw[first..]);
    Ok(serial)
}
