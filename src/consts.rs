/*! Protocol constants shared across modules.

Sizes and sync words from the M17 specification. The sync words are
chosen so that their 4-FSK symbol sequences correlate strongly against
their own reverses, but at this layer they are just 16-bit patterns
prepended to each 368-bit FEC payload.
 */

/// Magic number opening every M17 IP frame.
pub const MAGIC: [u8; 4] = *b"M17 ";

/// Default reflector UDP port.
pub const DEFAULT_PORT: u16 = 17000;

/// LSF without CRC.
pub const LSF_SIZE: usize = 28;

/// LSF with trailing CRC-16.
pub const LSF_SIZE_WITH_CRC: usize = 30;

/// META field size.
pub const META_SIZE: usize = 14;

/// Stream payload size (one Codec2 block pair).
pub const PAYLOAD_SIZE: usize = 16;

/// LICH chunk carried in each stream frame.
pub const LICH_CHUNK_SIZE: usize = 6;

/// Number of LICH chunks that make up one LSF.
pub const LICH_CHUNK_COUNT: usize = 5;

/// Serialized RF stream frame: LICH chunk, frame number, payload, CRC.
pub const STREAM_FRAME_SIZE: usize = 26;

/// Serialized IP frame.
pub const IP_FRAME_SIZE: usize = 54;

/// FEC payload of every RF frame, in bits.
pub const RF_PAYLOAD_BITS: usize = 368;

/// Complete RF frame: 16-bit sync word plus FEC payload.
pub const RF_FRAME_BITS: usize = 16 + RF_PAYLOAD_BITS;

/// Sync word for Link Setup Frames.
pub const SYNC_LSF: u16 = 0x55F7;

/// Sync word for stream frames.
pub const SYNC_STREAM: u16 = 0xFF5D;

/// Sync word for packet frames.
pub const SYNC_PACKET: u16 = 0x75FF;

/// Sync word for BERT frames.
pub const SYNC_BERT: u16 = 0xDF55;

/// End-of-transmission marker, repeated to fill the final burst.
pub const EOT_MARKER: u16 = 0x555D;
