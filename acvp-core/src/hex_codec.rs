// ── ACVP Core: Hex Codec ───────────────────────────────────────────────────
// bytes ↔ lowercase hex, bit-length aware for sub-byte algorithms (CFB1).
// Thin wrapper over the `hex` crate so every caller gets the same error
// mapping and the same bit/byte rounding rule.

use crate::error::{AcvpError, AcvpResult};

/// Encode `src` as lowercase hex, no separators, no `0x` prefix.
pub fn bytes_to_hex(src: &[u8]) -> String {
    hex::encode(src)
}

/// Decode a lowercase (or mixed-case) hex string into bytes.
/// Fails on non-hex characters or odd length.
pub fn hex_to_bytes(src: &str) -> AcvpResult<Vec<u8>> {
    hex::decode(src).map_err(|e| AcvpError::InvalidArg(format!("invalid hex string: {e}")))
}

/// Decode a hex string into a buffer whose authoritative length is a *bit*
/// count (CFB1 payloads). Rounds up to `(bits + 7) / 8` bytes and validates
/// the supplied hex is at least that long.
pub fn hex_to_bytes_bitlen(src: &str, bits: usize) -> AcvpResult<Vec<u8>> {
    let bytes = hex_to_bytes(src)?;
    let needed = (bits + 7) / 8;
    if bytes.len() < needed {
        return Err(AcvpError::InvalidArg(format!(
            "hex string too short for {bits}-bit payload: got {} bytes, need {needed}",
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// Encode `bits` significant bits of `src` as `(bits + 7) / 8` hex bytes.
pub fn bytes_to_hex_bitlen(src: &[u8], bits: usize) -> String {
    let needed = (bits + 7) / 8;
    bytes_to_hex(&src[..needed.min(src.len())])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_even_length() {
        let data = [0x01, 0xAB, 0xFF, 0x00];
        let hex_str = bytes_to_hex(&data);
        assert_eq!(hex_str, "01abff00");
        assert_eq!(hex_to_bytes(&hex_str).unwrap(), data);
    }

    #[test]
    fn odd_length_rejected() {
        assert!(hex_to_bytes("abc").is_err());
    }

    #[test]
    fn non_hex_rejected() {
        assert!(hex_to_bytes("zz").is_err());
    }

    #[test]
    fn cfb1_bit_rounding() {
        // 5 significant bits -> 1 byte.
        let bytes = hex_to_bytes_bitlen("f8", 5).unwrap();
        assert_eq!(bytes, vec![0xf8]);
        assert_eq!(bytes_to_hex_bitlen(&bytes, 5), "f8");
    }

    #[test]
    fn bitlen_too_short_rejected() {
        // 9 bits needs 2 bytes; only one supplied.
        assert!(hex_to_bytes_bitlen("f8", 9).is_err());
    }
}
