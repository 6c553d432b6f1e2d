/*! Packet mode.

A logical packet is a protocol identifier byte, the payload, a NUL
terminator, and a CRC-16 over everything before it. That byte string
is sliced into 26-byte chunks of 25 data bytes plus a control byte
`EOP(1) | BC(5) | reserved(2)`: EOP marks the final chunk and BC its
count of valid bytes; every earlier chunk carries 25.
 */

use crate::crc;
use crate::{Error, Result};

/// Data bytes per chunk.
pub const CHUNK_DATA_SIZE: usize = 25;

/// Serialized chunk size.
pub const CHUNK_SIZE: usize = 26;

/// Packet payload protocol identifiers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Protocol {
    /// Raw bytes.
    Raw,
    /// AX.25 frame.
    Ax25,
    /// APRS.
    Aprs,
    /// 6LoWPAN.
    SixLowPan,
    /// IPv4.
    Ipv4,
    /// SMS-style text message.
    Sms,
    /// Winlink.
    Winlink,
    /// Orbital elements (three-line TLE set).
    Tle,
    /// Any other identifier, preserved raw.
    Other(u8),
}

impl Protocol {
    /// The wire identifier byte.
    #[must_use]
    pub fn to_byte(self) -> u8 {
        match self {
            Protocol::Raw => 0,
            Protocol::Ax25 => 1,
            Protocol::Aprs => 2,
            Protocol::SixLowPan => 3,
            Protocol::Ipv4 => 4,
            Protocol::Sms => 5,
            Protocol::Winlink => 6,
            Protocol::Tle => 7,
            Protocol::Other(v) => v,
        }
    }

    /// Decode an identifier byte.
    #[must_use]
    pub fn from_byte(b: u8) -> Self {
        match b {
            0 => Protocol::Raw,
            1 => Protocol::Ax25,
            2 => Protocol::Aprs,
            3 => Protocol::SixLowPan,
            4 => Protocol::Ipv4,
            5 => Protocol::Sms,
            6 => Protocol::Winlink,
            7 => Protocol::Tle,
            other => Protocol::Other(other),
        }
    }
}

/// One 26-byte packet chunk.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PacketChunk {
    /// 25 data bytes; in a final chunk only the first `byte_count`
    /// are meaningful, but the rest are preserved on re-emit.
    pub data: [u8; CHUNK_DATA_SIZE],
    /// End-of-packet flag.
    pub is_last: bool,
    /// Valid bytes in a final chunk; always 25 otherwise.
    pub byte_count: u8,
}

impl PacketChunk {
    /// The control byte: `EOP(1) | BC(5) | reserved(2)`.
    #[must_use]
    pub fn control_byte(&self) -> u8 {
        let eop = if self.is_last { 0x80 } else { 0 };
        eop | (self.byte_count & 0x1F) << 2
    }

    /// The valid portion of the data.
    #[must_use]
    pub fn valid_data(&self) -> &[u8] {
        if self.is_last {
            &self.data[..usize::from(self.byte_count.min(25))]
        } else {
            &self.data
        }
    }

    /// Serialize to 26 bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; CHUNK_SIZE] {
        let mut out = [0u8; CHUNK_SIZE];
        out[..CHUNK_DATA_SIZE].copy_from_slice(&self.data);
        out[CHUNK_DATA_SIZE] = self.control_byte();
        out
    }

    /// Parse 26 bytes, enforcing the control-byte invariants: BC over
    /// 25 is never valid, and a non-final chunk must carry 25.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() != CHUNK_SIZE {
            return Err(Error::WrongLength {
                what: "packet chunk",
                want: CHUNK_SIZE,
                got: data.len(),
            });
        }
        let control = data[CHUNK_DATA_SIZE];
        let is_last = control & 0x80 != 0;
        let byte_count = (control >> 2) & 0x1F;
        if byte_count > 25 || (!is_last && byte_count != 25) {
            return Err(Error::WireFormat("bad packet chunk byte count"));
        }
        let mut chunk = [0u8; CHUNK_DATA_SIZE];
        chunk.copy_from_slice(&data[..CHUNK_DATA_SIZE]);
        Ok(Self {
            data: chunk,
            is_last,
            byte_count,
        })
    }
}

/// A logical packet: protocol identifier plus payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    /// Payload protocol.
    pub protocol: Protocol,
    /// Payload bytes.
    pub payload: Vec<u8>,
}

impl Packet {
    /// Create a packet.
    #[must_use]
    pub fn new(protocol: Protocol, payload: Vec<u8>) -> Self {
        Self { protocol, payload }
    }

    /// An SMS-style text packet.
    #[must_use]
    pub fn sms(text: &str) -> Self {
        Self::new(Protocol::Sms, text.as_bytes().to_vec())
    }

    /// The full framed byte string: protocol byte, payload, NUL
    /// terminator, CRC.
    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.payload.len() + 4);
        out.push(self.protocol.to_byte());
        out.extend_from_slice(&self.payload);
        out.push(0);
        let crc = crc::crc_bytes(&out);
        out.extend(crc);
        out
    }

    /// Parse a framed byte string, verifying CRC and terminator.
    pub fn from_wire(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(Error::WireFormat("packet too short"));
        }
        if !crc::verify(data) {
            return Err(Error::Checksum);
        }
        let body = &data[..data.len() - 2];
        if body[body.len() - 1] != 0 {
            return Err(Error::WireFormat("packet missing NUL terminator"));
        }
        Ok(Self {
            protocol: Protocol::from_byte(body[0]),
            payload: body[1..body.len() - 1].to_vec(),
        })
    }

    /// Slice the framed packet into transmit chunks.
    #[must_use]
    pub fn to_chunks(&self) -> Vec<PacketChunk> {
        let wire = self.to_wire();
        let nchunks = wire.len().div_ceil(CHUNK_DATA_SIZE);
        (0..nchunks)
            .map(|i| {
                let end = (i * CHUNK_DATA_SIZE + CHUNK_DATA_SIZE).min(wire.len());
                let piece = &wire[i * CHUNK_DATA_SIZE..end];
                let mut data = [0u8; CHUNK_DATA_SIZE];
                data[..piece.len()].copy_from_slice(piece);
                let is_last = i == nchunks - 1;
                PacketChunk {
                    data,
                    is_last,
                    byte_count: if is_last { piece.len() as u8 } else { 25 },
                }
            })
            .collect()
    }

    /// Reassemble a packet from received chunks.
    pub fn from_chunks(chunks: &[PacketChunk]) -> Result<Self> {
        let mut wire = Vec::with_capacity(chunks.len() * CHUNK_DATA_SIZE);
        for chunk in chunks {
            wire.extend_from_slice(chunk.valid_data());
        }
        Self::from_wire(&wire)
    }
}

/// A two-line element set distributed over packet mode, for passing
/// satellite orbits between stations.
///
/// The payload is the satellite name and the two TLE lines joined
/// with newlines.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TlePacket {
    /// Satellite name.
    pub satellite_name: String,
    /// First element line (`1 ...`, 69 characters).
    pub line1: String,
    /// Second element line (`2 ...`, 69 characters).
    pub line2: String,
}

impl TlePacket {
    /// Do the lines look like a real element set? Checks the standard
    /// 69-character length and line prefixes, not the checksums.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.line1.len() == 69
            && self.line2.len() == 69
            && self.line1.starts_with("1 ")
            && self.line2.starts_with("2 ")
    }

    /// Wrap into a packet with [`Protocol::Tle`].
    #[must_use]
    pub fn to_packet(&self) -> Packet {
        let text = format!("{}\n{}\n{}", self.satellite_name, self.line1, self.line2);
        Packet::new(Protocol::Tle, text.into_bytes())
    }

    /// Unwrap from a packet; fails on any other protocol byte.
    /// Invalid UTF-8 in the payload is replaced, not rejected.
    pub fn from_packet(packet: &Packet) -> Result<Self> {
        if packet.protocol != Protocol::Tle {
            return Err(Error::WireFormat("not a TLE packet"));
        }
        let text = String::from_utf8_lossy(&packet.payload);
        let mut lines = text.splitn(3, '\n');
        Ok(Self {
            satellite_name: lines.next().unwrap_or_default().to_string(),
            line1: lines.next().unwrap_or_default().to_string(),
            line2: lines.next().unwrap_or_default().to_string(),
        })
    }
}
