/*! Puncture patterns.

Puncturing drops coded bits at fixed pattern positions to raise the
code rate; the receive side reinserts erasures at the dropped
positions before Viterbi decoding. M17 uses three schedules:

* P1, 61 positions keeping 46: LSF, 488 → 368 bits.
* P2, 12 positions keeping 11: stream (296 → 272) and BERT
  (402 → 368).
* P3, 8 positions keeping 7: packet, 420 → 368.

Depuncturing always emits an even number of bits, covering whole
pattern cycles and trimming at most one trailing erasure, so its
output can go straight into the pair-oriented Viterbi decoder
regardless of the input length.
 */

/// Puncture pattern for Link Setup Frames.
pub const P1: [u8; 61] = [
    1, 1, 0, 1, 1, 1, 0, 1, 1, 1, 0, 1, 1, 1, 0, 1, 1, //.
    1, 0, 1, 1, 1, 0, 1, 1, 1, 0, 1, 1, 1, 0, 1, 1, //.
    1, 0, 1, 1, 1, 0, 1, 1, 1, 0, 1, 1, 1, 0, 1, 1, //.
    1, 0, 1, 1, 1, 0, 1, 1, 1, 0, 1, 1, //.
];

/// Puncture pattern for stream and BERT frames.
pub const P2: [u8; 12] = [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0];

/// Puncture pattern for packet frames.
pub const P3: [u8; 8] = [1, 1, 1, 1, 1, 1, 1, 0];

/// Drop the bits at pattern-0 positions, cycling the pattern over the
/// input.
#[must_use]
pub fn puncture(bits: &[u8], pattern: &[u8]) -> Vec<u8> {
    bits.iter()
        .zip(pattern.iter().cycle())
        .filter(|&(_, &keep)| keep != 0)
        .map(|(&b, _)| b)
        .collect()
}

/// Reinsert `erasure` at the dropped positions.
///
/// The output length is fixed by the input length and the pattern:
/// ⌈len · pattern_len / kept⌉ rounded down to even. Input bits beyond
/// the pattern alignment would be ignored, but every M17 framing
/// aligns exactly.
#[must_use]
pub fn depuncture(bits: &[u16], pattern: &[u8], erasure: u16) -> Vec<u16> {
    let kept = pattern.iter().filter(|&&p| p != 0).count();
    let want = (bits.len() * pattern.len()).div_ceil(kept) & !1;

    let mut out = Vec::with_capacity(want);
    let mut input = bits.iter();
    for &keep in pattern.iter().cycle() {
        if out.len() == want {
            break;
        }
        if keep != 0 {
            out.push(input.next().copied().unwrap_or(erasure));
        } else {
            out.push(erasure);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::SOFT_ERASURE;

    #[test]
    fn pattern_shapes() {
        assert_eq!(P1.iter().filter(|&&p| p != 0).count(), 46);
        assert_eq!(P2.iter().filter(|&&p| p != 0).count(), 11);
        assert_eq!(P3.iter().filter(|&&p| p != 0).count(), 7);
    }

    #[test]
    fn frame_lengths() {
        assert_eq!(puncture(&vec![1; 488], &P1).len(), 368);
        assert_eq!(puncture(&vec![1; 296], &P2).len(), 272);
        assert_eq!(puncture(&vec![1; 420], &P3).len(), 368);
        assert_eq!(puncture(&vec![1; 402], &P2).len(), 368);
    }

    #[test]
    fn depuncture_lengths_are_even() {
        assert_eq!(depuncture(&vec![0; 368], &P1, SOFT_ERASURE).len(), 488);
        assert_eq!(depuncture(&vec![0; 272], &P2, SOFT_ERASURE).len(), 296);
        assert_eq!(depuncture(&vec![0; 368], &P3, SOFT_ERASURE).len(), 420);
        assert_eq!(depuncture(&vec![0; 368], &P2, SOFT_ERASURE).len(), 402);
    }

    #[test]
    fn all_keep_pattern_is_identity() {
        let data = [0u8, 1, 1, 0, 1, 0, 0, 1];
        assert_eq!(puncture(&data, &[1, 1, 1]), data);
    }

    #[test]
    fn round_trip_restores_kept_positions() {
        let coded: Vec<u8> = (0..296).map(|i| (i % 3 == 0) as u8).collect();
        let punctured = puncture(&coded, &P2);
        let soft: Vec<u16> = punctured
            .iter()
            .map(|&b| if b != 0 { 0xFFFF } else { 0 })
            .collect();
        let restored = depuncture(&soft, &P2, SOFT_ERASURE);
        assert_eq!(restored.len(), coded.len());
        for (i, (&orig, &got)) in coded.iter().zip(&restored).enumerate() {
            if i % 12 == 11 {
                assert_eq!(got, SOFT_ERASURE, "position {i} should be an erasure");
            } else {
                assert_eq!(got, if orig != 0 { 0xFFFF } else { 0 }, "position {i}");
            }
        }
    }

    #[test]
    fn erasure_value_is_configurable() {
        let out = depuncture(&[1, 2, 3, 4, 5, 6, 7], &P3, 0);
        assert_eq!(out, vec![1, 2, 3, 4, 5, 6, 7, 0]);
    }
}
