/*! Bit and soft-bit helpers.

Hard bits are `u8` values 0 or 1, unpacked MSB first, matching the
transmission order of every M17 field. Soft bits are 16-bit
confidences: 0 is a certain 0, 0xFFFF a certain 1, and 0x7FFF maximum
uncertainty (an erasure).
 */

/// A certain 0, as a soft bit.
pub const SOFT_ZERO: u16 = 0x0000;

/// A certain 1, as a soft bit.
pub const SOFT_ONE: u16 = 0xFFFF;

/// Maximum uncertainty. Depuncturing inserts these.
pub const SOFT_ERASURE: u16 = 0x7FFF;

/// Unpack `nbits` bits from `data`, MSB first. Bits past the end of
/// `data` are zero.
#[must_use]
pub fn unpack(data: &[u8], nbits: usize) -> Vec<u8> {
    (0..nbits)
        .map(|i| match data.get(i / 8) {
            Some(byte) => (byte >> (7 - (i % 8))) & 1,
            None => 0,
        })
        .collect()
}

/// Pack bits into bytes, MSB first. A trailing partial byte is
/// zero-padded on the right.
#[must_use]
pub fn pack(bits: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; bits.len().div_ceil(8)];
    for (i, &bit) in bits.iter().enumerate() {
        if bit != 0 {
            out[i / 8] |= 1 << (7 - (i % 8));
        }
    }
    out
}

/// Promote hard bits to certain soft bits.
#[must_use]
pub fn to_soft(bits: &[u8]) -> Vec<u16> {
    bits.iter()
        .map(|&b| if b != 0 { SOFT_ONE } else { SOFT_ZERO })
        .collect()
}

/// Slice soft bits at the 0x7FFF midpoint. An exact erasure slices to 0.
#[must_use]
pub fn to_hard(soft: &[u16]) -> Vec<u8> {
    soft.iter().map(|&s| u8::from(s > SOFT_ERASURE)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_msb_first() {
        assert_eq!(unpack(&[0xA5], 8), vec![1, 0, 1, 0, 0, 1, 0, 1]);
        // Short input zero-extends.
        assert_eq!(unpack(&[0x80], 10), vec![1, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn pack_round_trip() {
        let data = [0xD6, 0xB5, 0x00, 0xFF, 0x12];
        assert_eq!(pack(&unpack(&data, 40)), data);
    }

    #[test]
    fn pack_pads_partial_byte() {
        assert_eq!(pack(&[1, 1, 1]), vec![0xE0]);
    }

    #[test]
    fn soft_hard_round_trip() {
        let bits = [1, 0, 0, 1, 1, 0];
        assert_eq!(to_hard(&to_soft(&bits)), bits);
        assert_eq!(to_hard(&[SOFT_ERASURE]), vec![0]);
        assert_eq!(to_hard(&[SOFT_ERASURE + 1]), vec![1]);
    }
}
