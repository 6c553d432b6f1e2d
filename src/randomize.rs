/*! Frame randomizer.

Every RF frame payload is XORed with a fixed 368-bit pseudo-random
sequence for DC balance. The 46-byte mask is read MSB first. XOR is
its own inverse, so derandomizing is the same operation; for soft
bits the equivalent is flipping the confidence about the 0x7FFF
midpoint wherever the mask bit is set, which leaves erasures almost
in place (0x7FFF maps to 0x8000, still maximally uncertain).
 */

/// The 46-byte randomizing sequence.
pub const RAND_SEQ: [u8; 46] = [
    0xD6, 0xB5, 0xE2, 0x30, 0x82, 0xFF, 0x84, 0x62, 0xBA, 0x4E, 0x96, 0x90, //.
    0xD8, 0x98, 0xDD, 0x5D, 0x0C, 0xC8, 0x52, 0x43, 0x91, 0x1D, 0xF8, 0x6E, //.
    0x68, 0x2F, 0x35, 0xDA, 0x14, 0xEA, 0xCD, 0x76, 0x19, 0x8D, 0xD5, 0x80, //.
    0xD1, 0x33, 0x87, 0x13, 0x57, 0x18, 0x2D, 0x29, 0x78, 0xC3, //.
];

fn mask_bit(i: usize) -> bool {
    (RAND_SEQ[i / 8] >> (7 - (i % 8))) & 1 != 0
}

/// XOR hard bits with the randomizing sequence, in place.
///
/// # Panics
///
/// Panics if `bits` is not 368 elements.
pub fn randomize(bits: &mut [u8]) {
    assert_eq!(bits.len(), 368, "randomizer operates on 368 bits");
    for (i, b) in bits.iter_mut().enumerate() {
        if mask_bit(i) {
            *b ^= 1;
        }
    }
}

/// Flip soft-bit confidences where the sequence is set, in place.
///
/// # Panics
///
/// Panics if `bits` is not 368 elements.
pub fn randomize_soft(bits: &mut [u16]) {
    assert_eq!(bits.len(), 368, "randomizer operates on 368 bits");
    for (i, b) in bits.iter_mut().enumerate() {
        if mask_bit(i) {
            *b = 0xFFFF - *b;
        }
    }
}
