// ── ACVP Core: Symmetric Cipher Metadata ───────────────────────────────────
// Mode table, direction/test-type tags, and the DES odd-parity lookup used
// by the MCT key-mutation step (§4.E step 4).

use crate::error::{AcvpError, AcvpResult};
use serde::{Deserialize, Serialize};

/// Triple-DES mode under test. `Kw` (key wrap) is AFT-only — it never drives
/// the MCT engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TdesMode {
    TdesEcb,
    TdesCbc,
    TdesOfb,
    TdesCfb1,
    TdesCfb8,
    TdesCfb64,
    TdesKw,
}

impl TdesMode {
    /// Map an ACVP `algorithm` string (e.g. `"ACVP-TDES-CBC"`) to a mode.
    pub fn from_algorithm(algorithm: &str) -> AcvpResult<Self> {
        match algorithm {
            "ACVP-TDES-ECB" => Ok(Self::TdesEcb),
            "ACVP-TDES-CBC" => Ok(Self::TdesCbc),
            "ACVP-TDES-OFB" => Ok(Self::TdesOfb),
            "ACVP-TDES-CFB1" => Ok(Self::TdesCfb1),
            "ACVP-TDES-CFB8" => Ok(Self::TdesCfb8),
            "ACVP-TDES-CFB64" => Ok(Self::TdesCfb64),
            "ACVP-TDES-KW" => Ok(Self::TdesKw),
            other => Err(AcvpError::UnsupportedOp(format!(
                "unrecognized symmetric algorithm: {other}"
            ))),
        }
    }

    /// `true` unless this mode is ECB (no IV field in the wire JSON).
    pub fn has_iv(self) -> bool {
        !matches!(self, Self::TdesEcb | Self::TdesKw)
    }

    /// MCT shift-register feed width in bits, per §4.E.
    pub fn mct_bit_len(self) -> usize {
        match self {
            Self::TdesEcb | Self::TdesCbc | Self::TdesOfb | Self::TdesCfb64 => 64,
            Self::TdesCfb8 => 8,
            Self::TdesCfb1 => 1,
            Self::TdesKw => 0,
        }
    }

    /// `true` if this mode participates in the Monte-Carlo state machine at all.
    pub fn supports_mct(self) -> bool {
        !matches!(self, Self::TdesKw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Encrypt,
    Decrypt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestType {
    #[serde(rename = "AFT")]
    Aft,
    #[serde(rename = "MCT")]
    Mct,
    #[serde(rename = "CTR")]
    Ctr,
}

/// 256-entry DES odd-parity lookup table, computed at compile time.
/// `PARITY_TABLE[b]` is `b` with bit 0 set so the byte's total population
/// count is odd.
pub const PARITY_TABLE: [u8; 256] = build_parity_table();

const fn build_parity_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0usize;
    while i < 256 {
        let b = i as u8;
        let mut ones: u32 = 0;
        let mut bit: u8 = 1;
        while bit < 0x80 {
            bit <<= 1;
            if b & bit != 0 {
                ones += 1;
            }
        }
        let parity_bit: u8 = if ones % 2 == 0 { 1 } else { 0 };
        table[i] = (b & 0xFE) | parity_bit;
        i += 1;
    }
    table
}

/// Reapply odd parity to every byte of a 24-byte TDES key in place (§4.E step 4).
pub fn odd_parity_adjust(key: &mut [u8; 24]) {
    for byte in key.iter_mut() {
        *byte = PARITY_TABLE[*byte as usize];
    }
}

/// `true` if every byte of `key` already has odd parity (§8 invariant).
pub fn has_odd_parity(key: &[u8; 24]) -> bool {
    key.iter().all(|&b| PARITY_TABLE[b as usize] == b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity_table_is_idempotent() {
        // Applying the table twice must be a no-op: once a byte has odd
        // parity, re-adjusting leaves it unchanged.
        for b in 0u16..256 {
            let adjusted = PARITY_TABLE[b as usize];
            assert_eq!(PARITY_TABLE[adjusted as usize], adjusted);
        }
    }

    #[test]
    fn parity_table_sets_odd_population_count() {
        for b in 0u16..256 {
            let adjusted = PARITY_TABLE[b as usize];
            assert_eq!(adjusted.count_ones() % 2, 1);
        }
    }

    #[test]
    fn odd_parity_adjust_adjusts_whole_key() {
        let mut key = [0u8; 24];
        odd_parity_adjust(&mut key);
        assert!(has_odd_parity(&key));
        assert!(key.iter().all(|&b| b.count_ones() % 2 == 1));
    }

    #[test]
    fn mode_mapping_round_trips_known_algorithms() {
        assert_eq!(TdesMode::from_algorithm("ACVP-TDES-OFB").unwrap(), TdesMode::TdesOfb);
        assert!(TdesMode::from_algorithm("not-a-thing").is_err());
    }

    #[test]
    fn bit_lengths_match_table() {
        assert_eq!(TdesMode::TdesEcb.mct_bit_len(), 64);
        assert_eq!(TdesMode::TdesCbc.mct_bit_len(), 64);
        assert_eq!(TdesMode::TdesOfb.mct_bit_len(), 64);
        assert_eq!(TdesMode::TdesCfb64.mct_bit_len(), 64);
        assert_eq!(TdesMode::TdesCfb8.mct_bit_len(), 8);
        assert_eq!(TdesMode::TdesCfb1.mct_bit_len(), 1);
    }

    #[test]
    fn ecb_has_no_iv() {
        assert!(!TdesMode::TdesEcb.has_iv());
        assert!(TdesMode::TdesCbc.has_iv());
    }
}
