//! Model artifact layout.
//!
//! ```text
//! offset  size  field
//! 0       4     magic "VTLM"
//! 4       1     format major version
//! 5       1     format minor version
//! 6       4     payload length (u32 LE)
//! 10      4     CRC32 of the payload (u32 LE)
//! 14      n     bincode payload
//! ```

use crate::error::{Result, VitalisError};
use serde::{de::DeserializeOwned, Serialize};

/// Magic bytes at the start of every artifact.
pub const MAGIC: [u8; 4] = *b"VTLM";

/// Format version written by this build (major, minor).
pub const FORMAT_VERSION: (u8, u8) = (1, 0);

/// Size of the fixed header in bytes.
pub const HEADER_SIZE: usize = 14;

/// CRC32 checksum (IEEE polynomial)
pub(crate) fn crc32(data: &[u8]) -> u32 {
    // CRC32 lookup table (IEEE polynomial 0xEDB88320)
    const TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let idx = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ TABLE[idx];
    }
    !crc
}

/// Serializes `value` behind a checked header.
///
/// # Errors
///
/// Returns [`VitalisError::Io`] if serialization fails or the payload does
/// not fit a 32-bit length.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let payload = bincode::serialize(value).map_err(std::io::Error::other)?;
    let len = u32::try_from(payload.len())
        .map_err(|_| std::io::Error::other("model payload exceeds 4 GiB"))?;

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&MAGIC);
    out.push(FORMAT_VERSION.0);
    out.push(FORMAT_VERSION.1);
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&crc32(&payload).to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Verifies the header of `bytes` and deserializes the payload.
///
/// # Errors
///
/// Returns [`VitalisError::CorruptModel`] (tagged with `key`) for a bad
/// magic, a newer major version, a truncated or oversized payload, a
/// checksum mismatch or an undecodable payload.
pub fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T> {
    let corrupt = |message: String| VitalisError::CorruptModel {
        key: key.to_string(),
        message,
    };

    if bytes.len() < HEADER_SIZE {
        return Err(corrupt(format!(
            "file is {} bytes, shorter than the {HEADER_SIZE}-byte header",
            bytes.len()
        )));
    }
    if bytes[0..4] != MAGIC {
        return Err(corrupt(format!(
            "bad magic {:?}, expected {:?}",
            &bytes[0..4],
            MAGIC
        )));
    }

    let (major, minor) = (bytes[4], bytes[5]);
    if major > FORMAT_VERSION.0 {
        return Err(corrupt(format!(
            "format version {major}.{minor} is newer than supported {}.{}",
            FORMAT_VERSION.0, FORMAT_VERSION.1
        )));
    }

    let declared = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize;
    let checksum = u32::from_le_bytes([bytes[10], bytes[11], bytes[12], bytes[13]]);
    let payload = &bytes[HEADER_SIZE..];
    if payload.len() != declared {
        return Err(corrupt(format!(
            "payload is {} bytes, header declares {declared}",
            payload.len()
        )));
    }

    let actual = crc32(payload);
    if actual != checksum {
        return Err(corrupt(format!(
            "checksum mismatch: stored {checksum:#010x}, computed {actual:#010x}"
        )));
    }

    bincode::deserialize(payload).map_err(|e| corrupt(format!("cannot decode payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_known_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(b""), 0);
    }

    #[test]
    fn test_header_layout() {
        let bytes = encode(&vec![1u32, 2, 3]).expect("encode");
        assert_eq!(&bytes[0..4], b"VTLM");
        assert_eq!((bytes[4], bytes[5]), FORMAT_VERSION);
        let len = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize;
        assert_eq!(len, bytes.len() - HEADER_SIZE);
        let decoded: Vec<u32> = decode("k", &bytes).expect("decode");
        assert_eq!(decoded, vec![1, 2, 3]);
    }

    #[test]
    fn test_decode_rejects_flipped_payload_byte() {
        let mut bytes = encode(&"payload".to_string()).expect("encode");
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let err = decode::<String>("k", &bytes).unwrap_err();
        assert!(err.is_corrupt());
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn test_decode_rejects_newer_major() {
        let mut bytes = encode(&7u8).expect("encode");
        bytes[4] = FORMAT_VERSION.0 + 1;
        assert!(decode::<u8>("k", &bytes).unwrap_err().is_corrupt());
    }

    #[test]
    fn test_decode_rejects_truncation() {
        let bytes = encode(&vec![0u64; 16]).expect("encode");
        assert!(decode::<Vec<u64>>("k", &bytes[..8]).unwrap_err().is_corrupt());
        assert!(decode::<Vec<u64>>("k", &bytes[..bytes.len() - 3])
            .unwrap_err()
            .is_corrupt());
    }

    #[test]
    fn test_decode_rejects_bad_magic() {
        let mut bytes = encode(&1u8).expect("encode");
        bytes[0] = b'X';
        let err = decode::<u8>("k", &bytes).unwrap_err();
        assert!(err.to_string().contains("magic"));
    }
}
