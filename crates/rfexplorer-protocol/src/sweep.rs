//! Sweep payload decoder.
//!
//! The firmware sends each power reading as one unsigned byte holding
//! `-2 × dBm`, giving half-dB resolution from 0 to −127.5 dBm. No other
//! calibration is applied on the host.

/// Convert one raw sample byte to dBm.
pub fn decode_sample(raw: u8) -> f32 {
    -(f32::from(raw) / 2.0)
}

/// Decode a sweep payload into power readings in dBm, one per byte.
///
/// Every byte value is a legal reading, so this never fails. The frame
/// scanner guarantees the payload has exactly the device's point count.
pub fn decode_sweep(payload: &[u8]) -> Vec<f32> {
    payload.iter().map(|&raw| decode_sample(raw)).collect()
}

/// Quantize a reading in dBm back to the wire byte.
///
/// Levels are rounded to the nearest half dB and clamped to 0 … −127.5 dBm,
/// so arbitrary inputs lose precision; every decoded value maps back to the
/// byte it came from.
pub fn encode_dbm(dbm: f32) -> u8 {
    (-dbm * 2.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn decode_known_values() {
        assert_eq!(decode_sample(0), 0.0);
        assert_eq!(decode_sample(1), -0.5);
        assert_eq!(decode_sample(120), -60.0);
        assert_eq!(decode_sample(255), -127.5);
    }

    #[test]
    fn decode_sweep_preserves_order() {
        assert_eq!(decode_sweep(&[200, 80, 81]), vec![-100.0, -40.0, -40.5]);
    }

    #[test]
    fn encode_clamps_out_of_range() {
        assert_eq!(encode_dbm(3.0), 0);
        assert_eq!(encode_dbm(-140.0), 255);
    }

    #[test]
    fn encode_quantizes_to_half_db() {
        // -60.3 dBm is not representable; nearest step is -60.5.
        assert_eq!(encode_dbm(-60.3), 121);
        assert_eq!(decode_sample(encode_dbm(-60.3)), -60.5);
    }

    proptest! {
        #[test]
        fn decode_is_negated_half(raw in any::<u8>()) {
            prop_assert_eq!(decode_sample(raw), -(raw as f32) / 2.0);
        }

        #[test]
        fn even_bytes_round_trip(half in 0u8..=127) {
            let raw = half * 2;
            prop_assert_eq!(encode_dbm(decode_sample(raw)), raw);
        }

        #[test]
        fn decode_sweep_length_matches(payload in proptest::collection::vec(any::<u8>(), 0..300)) {
            prop_assert_eq!(decode_sweep(&payload).len(), payload.len());
        }
    }
}
