/*! Link Setup Frame.

The LSF opens every transmission and identifies it: destination,
source, TYPE field, and 14 bytes of META whose interpretation the
TYPE field selects. On its own frame it carries a trailing CRC-16
(30 bytes); inside IP frames the CRC is omitted and covered by the
datagram CRC instead (28 bytes). For RF streams the same 28 bytes,
padded to 30, are sliced into five 6-byte LICH chunks and rotated
through the stream frames.

META variants: GNSS position, extended callsign data, an encryption
nonce, multi-block UTF-8 text, and a 14-byte AES IV.
 */

use crate::address::Address;
use crate::consts::{LICH_CHUNK_COUNT, LICH_CHUNK_SIZE, LSF_SIZE, LSF_SIZE_WITH_CRC, META_SIZE};
use crate::crc;
use crate::{Error, Result};

/// Seconds from the Unix epoch to 2020-01-01T00:00:00Z, the M17
/// timestamp epoch.
pub const EPOCH_2020: u64 = 1_577_836_800;

/// A Link Setup Frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LinkSetupFrame {
    /// Destination address.
    pub dst: Address,
    /// Source address.
    pub src: Address,
    /// Raw 16-bit TYPE field; see [`crate::types`].
    pub type_field: u16,
    /// META field, interpreted per the TYPE field.
    pub meta: [u8; META_SIZE],
}

impl LinkSetupFrame {
    /// Create an LSF.
    #[must_use]
    pub fn new(dst: Address, src: Address, type_field: u16, meta: [u8; META_SIZE]) -> Self {
        Self {
            dst,
            src,
            type_field,
            meta,
        }
    }

    /// Create from callsign strings, with a zeroed META field.
    pub fn from_callsigns(dst: &str, src: &str, type_field: u16) -> Result<Self> {
        Ok(Self::new(
            Address::from_callsign(dst)?,
            Address::from_callsign(src)?,
            type_field,
            [0; META_SIZE],
        ))
    }

    /// CRC over the 28 CRC-less bytes.
    #[must_use]
    pub fn crc(&self) -> u16 {
        crc::crc(&self.to_bytes_without_crc())
    }

    /// Serialize without the CRC, as embedded in IP frames.
    #[must_use]
    pub fn to_bytes_without_crc(&self) -> [u8; LSF_SIZE] {
        let mut out = [0u8; LSF_SIZE];
        out[0..6].copy_from_slice(&self.dst.to_bytes());
        out[6..12].copy_from_slice(&self.src.to_bytes());
        out[12..14].copy_from_slice(&self.type_field.to_be_bytes());
        out[14..28].copy_from_slice(&self.meta);
        out
    }

    /// Serialize with the trailing CRC, the standalone frame form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; LSF_SIZE_WITH_CRC] {
        let mut out = [0u8; LSF_SIZE_WITH_CRC];
        out[..LSF_SIZE].copy_from_slice(&self.to_bytes_without_crc());
        out[LSF_SIZE..].copy_from_slice(&self.crc().to_be_bytes());
        out
    }

    /// Parse the 28-byte CRC-less form.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() != LSF_SIZE {
            return Err(Error::WrongLength {
                what: "LSF",
                want: LSF_SIZE,
                got: data.len(),
            });
        }
        let mut dst = [0u8; 6];
        dst.copy_from_slice(&data[0..6]);
        let mut src = [0u8; 6];
        src.copy_from_slice(&data[6..12]);
        let mut meta = [0u8; META_SIZE];
        meta.copy_from_slice(&data[14..28]);
        Ok(Self {
            dst: Address::from_bytes(dst),
            src: Address::from_bytes(src),
            type_field: u16::from_be_bytes([data[12], data[13]]),
            meta,
        })
    }

    /// Parse the 30-byte form and verify its CRC.
    pub fn from_bytes_with_crc(data: &[u8]) -> Result<Self> {
        if data.len() != LSF_SIZE_WITH_CRC {
            return Err(Error::WrongLength {
                what: "LSF with CRC",
                want: LSF_SIZE_WITH_CRC,
                got: data.len(),
            });
        }
        if !crc::verify(data) {
            return Err(Error::Checksum);
        }
        Self::from_bytes(&data[..LSF_SIZE])
    }

    /// Slice into the five 6-byte LICH chunks, padding the CRC-ful
    /// form's place with two zero bytes.
    #[must_use]
    pub fn chunks(&self) -> [[u8; LICH_CHUNK_SIZE]; LICH_CHUNK_COUNT] {
        let mut padded = [0u8; LSF_SIZE_WITH_CRC];
        padded[..LSF_SIZE].copy_from_slice(&self.to_bytes_without_crc());
        let mut out = [[0u8; LICH_CHUNK_SIZE]; LICH_CHUNK_COUNT];
        for (i, chunk) in out.iter_mut().enumerate() {
            chunk.copy_from_slice(&padded[6 * i..6 * (i + 1)]);
        }
        out
    }

    /// The LICH chunk a given frame number carries.
    #[must_use]
    pub fn chunk_for_frame(&self, frame_number: u16) -> [u8; LICH_CHUNK_SIZE] {
        self.chunks()[usize::from(frame_number) % LICH_CHUNK_COUNT]
    }

    /// Store a GNSS position in META.
    pub fn set_gnss(&mut self, gnss: &GnssPosition) {
        self.meta = gnss.to_bytes();
    }

    /// Read META as a GNSS position.
    #[must_use]
    pub fn gnss(&self) -> GnssPosition {
        GnssPosition::from_bytes(&self.meta)
    }

    /// Store extended callsign data in META.
    pub fn set_extended_callsign(&mut self, ecd: &ExtendedCallsign) {
        self.meta = ecd.to_bytes();
    }

    /// Read META as extended callsign data.
    #[must_use]
    pub fn extended_callsign(&self) -> ExtendedCallsign {
        ExtendedCallsign::from_bytes(&self.meta)
    }

    /// Store a nonce in META.
    pub fn set_nonce(&mut self, nonce: &Nonce) {
        self.meta = nonce.to_bytes();
    }

    /// Read META as a nonce.
    #[must_use]
    pub fn nonce(&self) -> Nonce {
        Nonce::from_bytes(&self.meta)
    }

    /// Store a single text block in META.
    pub fn set_text(&mut self, text: &TextMeta) {
        self.meta = text.to_bytes();
    }

    /// Read META as a text block.
    #[must_use]
    pub fn text(&self) -> TextMeta {
        TextMeta::from_bytes(&self.meta)
    }
}

impl std::fmt::Display for LinkSetupFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "LSF: {} -> {} [type=0x{:04x}]",
            self.src, self.dst, self.type_field
        )
    }
}

/// GNSS position META variant.
///
/// The nibble fields (`source`, `station`, `validity`) carry the
/// protocol's enumerations raw: source 1 is a GNSS fix, station 1 a
/// mobile station, validity bit 0 position, bit 1 altitude, bit 2
/// speed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GnssPosition {
    /// Data source nibble.
    pub source: u8,
    /// Station type nibble.
    pub station: u8,
    /// Validity nibble.
    pub validity: u8,
    /// Degrees, saturated to ±90.
    pub latitude: f64,
    /// Degrees, saturated to ±180.
    pub longitude: f64,
    /// Metres, representable range −500..=32267.5.
    pub altitude: f64,
    /// km/h, representable range 0..=2047.5.
    pub speed: f64,
    /// Degrees, 0..=511.
    pub bearing: u16,
    /// Position uncertainty in metres, snapped to powers of two
    /// 1..=128.
    pub radius: f64,
}

const LAT_SCALE: f64 = 8_388_607.0;

impl GnssPosition {
    /// Encode to 14 bytes. Out-of-range fields saturate.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; META_SIZE] {
        let mut out = [0u8; META_SIZE];
        out[0] = (self.source & 0x0F) << 4 | (self.station & 0x0F);

        let log_r = (0u8..8)
            .find(|&i| self.radius <= f64::from(1u32 << i))
            .unwrap_or(7);
        let bearing = self.bearing.min(511);
        out[1] = (self.validity & 0x0F) << 4 | (log_r & 0x07) << 1 | (bearing >> 8) as u8;
        out[2] = bearing as u8;

        let lat = ((self.latitude / 90.0 * LAT_SCALE) as i64).clamp(-8_388_607, 8_388_607) as i32;
        out[3..6].copy_from_slice(&lat.to_be_bytes()[1..]);
        let lon = ((self.longitude / 180.0 * LAT_SCALE) as i64).clamp(-8_388_607, 8_388_607) as i32;
        out[6..9].copy_from_slice(&lon.to_be_bytes()[1..]);

        let alt = (((self.altitude + 500.0) * 2.0) as i64).clamp(0, 0xFFFF) as u16;
        out[9..11].copy_from_slice(&alt.to_be_bytes());

        let speed = ((self.speed * 2.0) as i64).clamp(0, 0xFFF) as u16;
        out[11] = (speed >> 4) as u8;
        out[12] = (speed as u8 & 0x0F) << 4;
        out
    }

    /// Decode from 14 bytes.
    #[must_use]
    pub fn from_bytes(data: &[u8; META_SIZE]) -> Self {
        let lat_raw = i32::from_be_bytes([
            if data[3] & 0x80 != 0 { 0xFF } else { 0 },
            data[3],
            data[4],
            data[5],
        ]);
        let lon_raw = i32::from_be_bytes([
            if data[6] & 0x80 != 0 { 0xFF } else { 0 },
            data[6],
            data[7],
            data[8],
        ]);
        let alt_raw = u16::from_be_bytes([data[9], data[10]]);
        let speed_raw = u16::from(data[11]) << 4 | u16::from(data[12] >> 4);
        Self {
            source: data[0] >> 4,
            station: data[0] & 0x0F,
            validity: data[1] >> 4,
            latitude: f64::from(lat_raw) / LAT_SCALE * 90.0,
            longitude: f64::from(lon_raw) / LAT_SCALE * 180.0,
            altitude: f64::from(alt_raw) / 2.0 - 500.0,
            speed: f64::from(speed_raw) / 2.0,
            bearing: u16::from(data[1] & 0x01) << 8 | u16::from(data[2]),
            radius: f64::from(1u32 << ((data[1] >> 1) & 0x07)),
        }
    }
}

/// Extended callsign data META variant: two further addresses for
/// routing beyond SRC and DST.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ExtendedCallsign {
    /// Callsign field 1.
    pub cf1: Address,
    /// Callsign field 2.
    pub cf2: Address,
}

impl ExtendedCallsign {
    /// Build from callsign strings. An empty string encodes as a
    /// single space.
    pub fn from_callsigns(cf1: &str, cf2: &str) -> Result<Self> {
        fn fix(s: &str) -> &str {
            if s.is_empty() { " " } else { s }
        }
        Ok(Self {
            cf1: Address::from_callsign(fix(cf1))?,
            cf2: Address::from_callsign(fix(cf2))?,
        })
    }

    /// Encode to 14 bytes; the final two are reserved zero.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; META_SIZE] {
        let mut out = [0u8; META_SIZE];
        out[0..6].copy_from_slice(&self.cf1.to_bytes());
        out[6..12].copy_from_slice(&self.cf2.to_bytes());
        out
    }

    /// Decode from 14 bytes.
    #[must_use]
    pub fn from_bytes(data: &[u8; META_SIZE]) -> Self {
        let mut a = [0u8; 6];
        a.copy_from_slice(&data[0..6]);
        let mut b = [0u8; 6];
        b.copy_from_slice(&data[6..12]);
        Self {
            cf1: Address::from_bytes(a),
            cf2: Address::from_bytes(b),
        }
    }
}

/// Nonce META variant for encrypted streams: a timestamp against the
/// 2020 epoch and ten random bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Nonce {
    /// Unix timestamp in seconds. Values before the 2020 epoch
    /// serialize as zero.
    pub timestamp: u64,
    /// Random tail.
    pub random: [u8; 10],
}

impl Nonce {
    /// A nonce for `timestamp` with a freshly random tail.
    #[must_use]
    pub fn new(timestamp: u64) -> Self {
        use rand::RngCore;
        let mut random = [0u8; 10];
        rand::thread_rng().fill_bytes(&mut random);
        Self { timestamp, random }
    }

    /// Encode to 14 bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; META_SIZE] {
        let ts = self
            .timestamp
            .saturating_sub(EPOCH_2020)
            .min(u64::from(u32::MAX)) as u32;
        let mut out = [0u8; META_SIZE];
        out[0..4].copy_from_slice(&ts.to_be_bytes());
        out[4..14].copy_from_slice(&self.random);
        out
    }

    /// Decode from 14 bytes.
    #[must_use]
    pub fn from_bytes(data: &[u8; META_SIZE]) -> Self {
        let ts = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let mut random = [0u8; 10];
        random.copy_from_slice(&data[4..14]);
        Self {
            timestamp: u64::from(ts) + EPOCH_2020,
            random,
        }
    }
}

/// One text block of the META text variant.
///
/// Stream mode may carry up to 15 sequential blocks of 13 UTF-8
/// bytes, reassembled by block index; packet mode uses exactly one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextMeta {
    /// Text carried by this block.
    pub text: String,
    /// Total blocks in the message, 1..=15.
    pub block_count: u8,
    /// This block's index, 1..=15.
    pub block_index: u8,
}

/// UTF-8 bytes of text per block.
pub const TEXT_BLOCK_BYTES: usize = 13;

/// Maximum blocks per message.
pub const TEXT_MAX_BLOCKS: usize = 15;

impl TextMeta {
    /// Encode to 14 bytes: a control byte then null-padded text.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; META_SIZE] {
        let mut out = [0u8; META_SIZE];
        out[0] = (self.block_count & 0x0F) << 4 | (self.block_index & 0x0F);
        let bytes = self.text.as_bytes();
        let n = bytes.len().min(TEXT_BLOCK_BYTES);
        out[1..1 + n].copy_from_slice(&bytes[..n]);
        out
    }

    /// Decode from 14 bytes. Text stops at the first NUL; invalid
    /// UTF-8 is replaced.
    #[must_use]
    pub fn from_bytes(data: &[u8; META_SIZE]) -> Self {
        let text = &data[1..14];
        let text = match text.iter().position(|&b| b == 0) {
            Some(n) => &text[..n],
            None => text,
        };
        Self {
            text: String::from_utf8_lossy(text).into_owned(),
            block_count: data[0] >> 4,
            block_index: data[0] & 0x0F,
        }
    }

    /// Split a message of up to 195 UTF-8 bytes into numbered blocks.
    pub fn encode_blocks(text: &str) -> Result<Vec<[u8; META_SIZE]>> {
        let bytes = text.as_bytes();
        if bytes.len() > TEXT_BLOCK_BYTES * TEXT_MAX_BLOCKS {
            return Err(Error::TextTooLong(bytes.len()));
        }
        let count = bytes.len().div_ceil(TEXT_BLOCK_BYTES).max(1);
        Ok((0..count)
            .map(|i| {
                let chunk = &bytes[i * TEXT_BLOCK_BYTES..(i * TEXT_BLOCK_BYTES + TEXT_BLOCK_BYTES).min(bytes.len())];
                let mut out = [0u8; META_SIZE];
                out[0] = (count as u8) << 4 | (i as u8 + 1);
                out[1..1 + chunk.len()].copy_from_slice(chunk);
                out
            })
            .collect())
    }

    /// Reassemble received blocks: sorted by index, duplicates
    /// resolved last-writer-wins.
    #[must_use]
    pub fn decode_blocks(blocks: &[[u8; META_SIZE]]) -> String {
        let mut slots: [Option<TextMeta>; TEXT_MAX_BLOCKS + 1] = Default::default();
        for block in blocks {
            let m = TextMeta::from_bytes(block);
            let idx = usize::from(m.block_index.min(15));
            slots[idx] = Some(m);
        }
        slots
            .into_iter()
            .flatten()
            .map(|m| m.text)
            .collect()
    }
}
