/*! Scrambler encryption.

A Fibonacci LFSR keystream XORed over the payload. Three widths with
their tap sets:

* 8-bit: x⁸ + x⁶ + x⁵ + x⁴ + 1
* 16-bit: x¹⁶ + x¹⁴ + x¹³ + x¹¹ + 1
* 24-bit: x²⁴ + x²³ + x²² + x¹⁷ + 1

The register is seeded big-endian from 1..3 key bytes (padded or
truncated to the width; an all-zero seed would lock the register and
is bumped to 1). Each step emits the LSB and feeds the tap XOR back
into the MSB; eight steps make a keystream byte. Encryption and
decryption are the same XOR.

This is scrambling, not cryptography: it defeats casual listening
only.
 */

/// Register width selection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScramblerMode {
    /// 8-bit register, 1-byte seed.
    Bit8,
    /// 16-bit register, 2-byte seed.
    Bit16,
    /// 24-bit register, 3-byte seed.
    Bit24,
}

impl ScramblerMode {
    /// Register width in bits.
    #[must_use]
    pub fn width(self) -> u32 {
        match self {
            ScramblerMode::Bit8 => 8,
            ScramblerMode::Bit16 => 16,
            ScramblerMode::Bit24 => 24,
        }
    }

    /// Seed size in bytes.
    #[must_use]
    pub fn seed_bytes(self) -> usize {
        self.width() as usize / 8
    }

    // Tap positions, 1-indexed from the feedback end.
    fn taps(self) -> &'static [u32] {
        match self {
            ScramblerMode::Bit8 => &[8, 6, 5, 4],
            ScramblerMode::Bit16 => &[16, 14, 13, 11],
            ScramblerMode::Bit24 => &[24, 23, 22, 17],
        }
    }
}

/// The scrambler cipher.
#[derive(Copy, Clone, Debug)]
pub struct Scrambler {
    mode: ScramblerMode,
}

impl Scrambler {
    /// A scrambler of the given width.
    #[must_use]
    pub fn new(mode: ScramblerMode) -> Self {
        Self { mode }
    }

    fn seed_state(&self, seed: &[u8]) -> u32 {
        let want = self.mode.seed_bytes();
        let mut state: u32 = 0;
        for i in 0..want {
            state = state << 8 | u32::from(seed.get(i).copied().unwrap_or(0));
        }
        if state == 0 { 1 } else { state }
    }

    fn next_byte(&self, state: &mut u32) -> u8 {
        let mut byte = 0u8;
        for i in 0..8 {
            let feedback = self
                .mode
                .taps()
                .iter()
                .fold(0u32, |acc, &t| acc ^ (*state >> (t - 1)))
                & 1;
            byte |= ((*state & 1) as u8) << i;
            *state = (*state >> 1) | (feedback << (self.mode.width() - 1));
        }
        byte
    }

    /// Raw keystream bytes for a seed.
    #[must_use]
    pub fn keystream(&self, len: usize, seed: &[u8]) -> Vec<u8> {
        let mut state = self.seed_state(seed);
        (0..len).map(|_| self.next_byte(&mut state)).collect()
    }

    /// XOR the keystream over `data`.
    #[must_use]
    pub fn encrypt(&self, data: &[u8], seed: &[u8]) -> Vec<u8> {
        data.iter()
            .zip(self.keystream(data.len(), seed))
            .map(|(&d, k)| d ^ k)
            .collect()
    }

    /// Identical to [`Self::encrypt`]; XOR is symmetric.
    #[must_use]
    pub fn decrypt(&self, data: &[u8], seed: &[u8]) -> Vec<u8> {
        self.encrypt(data, seed)
    }
}
