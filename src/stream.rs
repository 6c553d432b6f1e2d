/*! RF stream frames.

A stream frame carries a rotating 6-byte LICH chunk, a 16-bit frame
number, and 16 bytes of payload, followed by a CRC over all of the
above. Bit 15 of the frame number flags the end of the transmission;
the low 15 bits count frames, wrapping modulo 2¹⁵.

[`StreamFramer`] turns an outgoing payload stream into numbered
frames with the right LICH rotation, and is the byte-level half of
the RF pipeline in [`crate::rf`].
 */

use crate::consts::{LICH_CHUNK_SIZE, PAYLOAD_SIZE, STREAM_FRAME_SIZE};
use crate::crc;
use crate::lsf::LinkSetupFrame;
use crate::{Error, Result};

/// End-of-transmission flag in the frame number.
pub const EOT_FLAG: u16 = 0x8000;

/// One RF stream frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StreamFrame {
    /// This frame's slice of the LSF.
    pub lich_chunk: [u8; LICH_CHUNK_SIZE],
    /// Frame counter; bit 15 is the EOT flag.
    pub frame_number: u16,
    /// Payload (opaque Codec2 or data bytes).
    pub payload: [u8; PAYLOAD_SIZE],
}

impl StreamFrame {
    /// Sequence number without the EOT flag.
    #[must_use]
    pub fn sequence_number(&self) -> u16 {
        self.frame_number & !EOT_FLAG
    }

    /// Is this the last frame of the transmission?
    #[must_use]
    pub fn is_eot(&self) -> bool {
        self.frame_number & EOT_FLAG != 0
    }

    /// CRC over LICH chunk, frame number, and payload.
    #[must_use]
    pub fn crc(&self) -> u16 {
        let mut data = Vec::with_capacity(STREAM_FRAME_SIZE - 2);
        data.extend_from_slice(&self.lich_chunk);
        data.extend_from_slice(&self.frame_number.to_be_bytes());
        data.extend_from_slice(&self.payload);
        crc::crc(&data)
    }

    /// Serialize to 26 bytes with trailing CRC.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; STREAM_FRAME_SIZE] {
        let mut out = [0u8; STREAM_FRAME_SIZE];
        out[0..6].copy_from_slice(&self.lich_chunk);
        out[6..8].copy_from_slice(&self.frame_number.to_be_bytes());
        out[8..24].copy_from_slice(&self.payload);
        out[24..26].copy_from_slice(&self.crc().to_be_bytes());
        out
    }

    /// Parse 26 bytes and verify the CRC.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() != STREAM_FRAME_SIZE {
            return Err(Error::WrongLength {
                what: "stream frame",
                want: STREAM_FRAME_SIZE,
                got: data.len(),
            });
        }
        if !crc::verify(data) {
            return Err(Error::Checksum);
        }
        let mut lich_chunk = [0u8; LICH_CHUNK_SIZE];
        lich_chunk.copy_from_slice(&data[0..6]);
        let mut payload = [0u8; PAYLOAD_SIZE];
        payload.copy_from_slice(&data[8..24]);
        Ok(Self {
            lich_chunk,
            frame_number: u16::from_be_bytes([data[6], data[7]]),
            payload,
        })
    }
}

/// Turns payloads into a numbered frame sequence for one
/// transmission.
pub struct StreamFramer {
    lsf: LinkSetupFrame,
    counter: u16,
}

impl StreamFramer {
    /// Start a transmission described by `lsf`.
    #[must_use]
    pub fn new(lsf: LinkSetupFrame) -> Self {
        Self { lsf, counter: 0 }
    }

    /// The LSF this framer distributes.
    #[must_use]
    pub fn lsf(&self) -> &LinkSetupFrame {
        &self.lsf
    }

    /// Produce the next frame. `last` sets the EOT flag. The 15-bit
    /// counter wraps.
    pub fn next_frame(&mut self, payload: &[u8; PAYLOAD_SIZE], last: bool) -> StreamFrame {
        let seq = self.counter;
        self.counter = (self.counter + 1) & 0x7FFF;
        StreamFrame {
            lich_chunk: self.lsf.chunk_for_frame(seq),
            frame_number: if last { seq | EOT_FLAG } else { seq },
            payload: *payload,
        }
    }

    /// Slice an arbitrary payload into frames, zero-padding the last
    /// one and flagging it EOT.
    #[must_use]
    pub fn frames(&mut self, payload: &[u8]) -> Vec<StreamFrame> {
        let nframes = payload.len().div_ceil(PAYLOAD_SIZE).max(1);
        (0..nframes)
            .map(|i| {
                let mut block = [0u8; PAYLOAD_SIZE];
                let end = (i * PAYLOAD_SIZE + PAYLOAD_SIZE).min(payload.len());
                let chunk = &payload[i * PAYLOAD_SIZE..end];
                block[..chunk.len()].copy_from_slice(chunk);
                self.next_frame(&block, i == nframes - 1)
            })
            .collect()
    }
}
