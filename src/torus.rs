//! Fixed-point representation of the real torus R/Z.
//!
//! A torus element is stored in a signed 32-bit integer with unit 2^-32;
//! addition and subtraction are the native wrapping operations. Multiplying
//! two torus elements is meaningless, but an integer times a torus element is
//! well defined and also wraps.

/// Discretised torus element.
pub type Torus32 = i32;

const TWO_32: f64 = 4294967296.0;

/// Maps mu in Z_msize to the torus element mu/msize.
///
/// `msize` must be a power of two.
pub fn encode_message(mu: i32, msize: u32) -> Torus32 {
    assert!(msize.is_power_of_two(), "message space {msize} must be a power of two");
    let bits = msize.trailing_zeros();
    mu.wrapping_shl(32 - bits)
}

/// Rounds a torus element to the nearest multiple of 1/msize and returns the
/// numerator in [0, msize).
pub fn decode_message(x: Torus32, msize: u32) -> i32 {
    assert!(msize.is_power_of_two(), "message space {msize} must be a power of two");
    let bits = msize.trailing_zeros();
    let rounded = (x.wrapping_add(1i32 << (32 - bits - 1))) as u32;
    (rounded >> (32 - bits)) as i32
}

/// Maps a torus element to one of `positions` rotation slots (nearest).
///
/// Used to switch LWE coefficients to exponents of X in Z[X]/(X^N + 1), with
/// `positions` = 2N.
pub fn mod_switch_from_torus32(x: Torus32, positions: u32) -> usize {
    decode_message(x, positions) as usize
}

/// Truncates a real number to the 2^-32 grid.
pub fn f64_to_torus32(d: f64) -> Torus32 {
    let frac = d - d.floor();
    ((frac * TWO_32) as u64) as u32 as i32
}

/// Real representative of a torus element, in [-1/2, 1/2).
pub fn torus32_to_f64(x: Torus32) -> f64 {
    x as f64 / TWO_32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        for msize in [2u32, 4, 8, 16, 1024, 2048] {
            for mu in 0..msize as i32 {
                let t = encode_message(mu, msize);
                assert_eq!(decode_message(t, msize), mu, "msize {msize} mu {mu}");
            }
        }
    }

    #[test]
    fn decode_rounds_to_nearest() {
        let t = encode_message(1, 8);
        assert_eq!(decode_message(t.wrapping_add(1 << 20), 8), 1);
        assert_eq!(decode_message(t.wrapping_sub(1 << 20), 8), 1);
        // exactly halfway between 1/8 and 2/8 rounds up
        assert_eq!(decode_message(t.wrapping_add(1 << 28), 8), 2);
    }

    #[test]
    fn f64_conversion_wraps() {
        assert_eq!(f64_to_torus32(0.0), 0);
        assert_eq!(f64_to_torus32(0.125), 1 << 29);
        assert_eq!(f64_to_torus32(-0.125), -(1 << 29));
        assert_eq!(f64_to_torus32(1.125), 1 << 29);
        assert!((torus32_to_f64(f64_to_torus32(0.3)) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn mod_switch_hits_expected_slot() {
        // 1/8 of the torus is 1/8 * 2048 = 256 positions
        assert_eq!(mod_switch_from_torus32(encode_message(1, 8), 2048), 256);
        assert_eq!(mod_switch_from_torus32(encode_message(-1, 8), 2048), 2048 - 256);
        assert_eq!(mod_switch_from_torus32(0, 2048), 0);
    }
}
