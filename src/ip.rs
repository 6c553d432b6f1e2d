/*! M17-over-IP frames.

The 54-byte datagram relayed by reflectors: the `"M17 "` magic, a
stream ID, the CRC-less LSF, frame number, payload, and a CRC-16 over
DST through payload. The magic and stream ID are outside the CRC
span. This CRC is independent of the RF stream-frame CRC; the two
cover different spans and never share a value.
 */

use rand::Rng;

use crate::address::{Address, IntoAddress};
use crate::consts::{IP_FRAME_SIZE, MAGIC, META_SIZE, PAYLOAD_SIZE};
use crate::crc;
use crate::lsf::LinkSetupFrame;
use crate::stream::EOT_FLAG;
use crate::{Error, Result};

/// One M17 IP frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IpFrame {
    /// Stream identifier; non-zero on outbound traffic.
    pub stream_id: u16,
    /// The transmission's LSF (CRC-less form on the wire).
    pub lsf: LinkSetupFrame,
    /// Frame counter; bit 15 is the EOT flag.
    pub frame_number: u16,
    /// Payload.
    pub payload: [u8; PAYLOAD_SIZE],
}

impl IpFrame {
    /// Sequence number without the EOT flag.
    #[must_use]
    pub fn sequence_number(&self) -> u16 {
        self.frame_number & !EOT_FLAG
    }

    /// Is this the last frame of the stream?
    #[must_use]
    pub fn is_eot(&self) -> bool {
        self.frame_number & EOT_FLAG != 0
    }

    /// CRC over bytes 6..52: DST through payload.
    #[must_use]
    pub fn crc(&self) -> u16 {
        let mut data = Vec::with_capacity(46);
        data.extend_from_slice(&self.lsf.to_bytes_without_crc());
        data.extend_from_slice(&self.frame_number.to_be_bytes());
        data.extend_from_slice(&self.payload);
        crc::crc(&data)
    }

    /// Serialize to the 54-byte wire form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; IP_FRAME_SIZE] {
        let mut out = [0u8; IP_FRAME_SIZE];
        out[0..4].copy_from_slice(&MAGIC);
        out[4..6].copy_from_slice(&self.stream_id.to_be_bytes());
        out[6..34].copy_from_slice(&self.lsf.to_bytes_without_crc());
        out[34..36].copy_from_slice(&self.frame_number.to_be_bytes());
        out[36..52].copy_from_slice(&self.payload);
        out[52..54].copy_from_slice(&self.crc().to_be_bytes());
        out
    }

    /// Parse a 54-byte datagram: length, magic, and CRC are all
    /// enforced.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() != IP_FRAME_SIZE {
            return Err(Error::WrongLength {
                what: "IP frame",
                want: IP_FRAME_SIZE,
                got: data.len(),
            });
        }
        if data[0..4] != MAGIC {
            return Err(Error::WireFormat("bad IP frame magic"));
        }
        if !crc::verify(&data[6..]) {
            return Err(Error::Checksum);
        }
        let mut payload = [0u8; PAYLOAD_SIZE];
        payload.copy_from_slice(&data[36..52]);
        Ok(Self {
            stream_id: u16::from_be_bytes([data[4], data[5]]),
            lsf: LinkSetupFrame::from_bytes(&data[6..34])?,
            frame_number: u16::from_be_bytes([data[34], data[35]]),
            payload,
        })
    }

    /// Does this datagram start like an M17 frame?
    #[must_use]
    pub fn is_m17(data: &[u8]) -> bool {
        data.len() >= 4 && data[0..4] == MAGIC
    }

    /// Build a frame from loose parts.
    ///
    /// Callsigns may be strings or pre-encoded [`Address`]es. With no
    /// `stream_id` a random non-zero one is chosen. `nonce` and
    /// `payload` are padded or truncated to their field sizes.
    pub fn create(
        dst: impl IntoAddress,
        src: impl IntoAddress,
        stream_id: Option<u16>,
        type_field: u16,
        nonce: &[u8],
        frame_number: u16,
        payload: &[u8],
    ) -> Result<Self> {
        let mut meta = [0u8; META_SIZE];
        let n = nonce.len().min(META_SIZE);
        meta[..n].copy_from_slice(&nonce[..n]);

        let mut pl = [0u8; PAYLOAD_SIZE];
        let n = payload.len().min(PAYLOAD_SIZE);
        pl[..n].copy_from_slice(&payload[..n]);

        Ok(Self {
            stream_id: match stream_id {
                Some(id) => id,
                None => rand::thread_rng().gen_range(1..=0xFFFF),
            },
            lsf: LinkSetupFrame::new(dst.into_address()?, src.into_address()?, type_field, meta),
            frame_number,
            payload: pl,
        })
    }
}

/// Turns payloads into a numbered IP frame sequence for one stream,
/// the network-side counterpart of [`crate::stream::StreamFramer`].
pub struct IpFramer {
    lsf: LinkSetupFrame,
    stream_id: u16,
    counter: u16,
}

impl IpFramer {
    /// Start a stream described by `lsf`. With no `stream_id` a
    /// random non-zero one is chosen and kept for the whole stream.
    #[must_use]
    pub fn new(lsf: LinkSetupFrame, stream_id: Option<u16>) -> Self {
        Self {
            lsf,
            stream_id: match stream_id {
                Some(id) => id,
                None => rand::thread_rng().gen_range(1..=0xFFFF),
            },
            counter: 0,
        }
    }

    /// The stream ID in use.
    #[must_use]
    pub fn stream_id(&self) -> u16 {
        self.stream_id
    }

    /// Produce the next frame. `last` sets the EOT flag; the 15-bit
    /// counter wraps.
    pub fn next_frame(&mut self, payload: &[u8; PAYLOAD_SIZE], last: bool) -> IpFrame {
        let seq = self.counter;
        self.counter = (self.counter + 1) & 0x7FFF;
        IpFrame {
            stream_id: self.stream_id,
            lsf: self.lsf,
            frame_number: if last { seq | EOT_FLAG } else { seq },
            payload: *payload,
        }
    }

    /// Slice an arbitrary payload into frames, zero-padding the last
    /// one and flagging it EOT.
    #[must_use]
    pub fn frames(&mut self, payload: &[u8]) -> Vec<IpFrame> {
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

impl std::fmt::Display for IpFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "IP[SID={:04x}]: {} -> {} [FN={}{}]",
            self.stream_id,
            self.lsf.src,
            self.lsf.dst,
            self.sequence_number(),
            if self.is_eot() { " EOT" } else { "" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;

    #[test]
    fn reference_frame() -> Result<()> {
        let frame = IpFrame::create(
            "SP5WWP",
            "W2FBI",
            Some(0xF00D),
            5,
            b"",
            1,
            &[0xAA; 16],
        )?;
        let bytes = frame.to_bytes();
        assert_eq!(bytes.len(), 54);
        assert_eq!(&bytes[..6], &[0x4D, 0x31, 0x37, 0x20, 0xF0, 0x0D]);
        assert_eq!(IpFrame::from_bytes(&bytes)?, frame);
        Ok(())
    }

    #[test]
    fn wrong_length_rejected() {
        assert!(matches!(
            IpFrame::from_bytes(&[0; 53]),
            Err(crate::Error::WrongLength { .. })
        ));
        assert!(IpFrame::from_bytes(&[0; 55]).is_err());
    }

    #[test]
    fn bad_magic_rejected() -> Result<()> {
        let mut bytes = IpFrame::create("@ALL", "W2FBI", Some(1), 5, b"", 0, b"")?.to_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            IpFrame::from_bytes(&bytes),
            Err(crate::Error::WireFormat(_))
        ));
        Ok(())
    }

    #[test]
    fn crc_covers_dst_through_payload() -> Result<()> {
        let mut bytes = IpFrame::create("@ALL", "W2FBI", Some(1), 5, b"", 0, b"")?.to_bytes();
        // Stream ID is outside the CRC span.
        bytes[4] = 0xBE;
        bytes[5] = 0xEF;
        assert!(IpFrame::from_bytes(&bytes).is_ok());
        // Payload is inside it.
        bytes[40] ^= 1;
        assert!(matches!(
            IpFrame::from_bytes(&bytes),
            Err(crate::Error::Checksum)
        ));
        Ok(())
    }

    #[test]
    fn random_stream_id_is_nonzero() -> Result<()> {
        for _ in 0..50 {
            let frame = IpFrame::create("@ALL", "W2FBI", None, 5, b"", 0, b"")?;
            assert_ne!(frame.stream_id, 0);
        }
        Ok(())
    }

    #[test]
    fn nonce_and_payload_padded() -> Result<()> {
        let frame = IpFrame::create("@ALL", "W2FBI", Some(1), 5, b"\x01\x02", 0, b"abc")?;
        assert_eq!(&frame.lsf.meta[..2], &[1, 2]);
        assert_eq!(&frame.lsf.meta[2..], &[0; 12]);
        assert_eq!(&frame.payload[..3], b"abc");
        assert_eq!(&frame.payload[3..], &[0; 13]);
        Ok(())
    }

    #[test]
    fn framer_numbers_and_flags() -> Result<()> {
        let lsf = LinkSetupFrame::from_callsigns("@ALL", "W2FBI", 0x0005)?;
        let mut framer = IpFramer::new(lsf, Some(0xCAFE));
        let frames = framer.frames(&[0x33; 33]);
        assert_eq!(frames.len(), 3);
        for (i, f) in frames.iter().enumerate() {
            assert_eq!(f.stream_id, 0xCAFE);
            assert_eq!(f.sequence_number(), i as u16);
            assert_eq!(f.is_eot(), i == 2);
            // Every frame serializes to a valid datagram.
            assert_eq!(IpFrame::from_bytes(&f.to_bytes())?, *f);
        }
        Ok(())
    }

    #[test]
    fn framer_random_stream_id_nonzero() -> Result<()> {
        let lsf = LinkSetupFrame::from_callsigns("@ALL", "W2FBI", 0x0005)?;
        for _ in 0..20 {
            assert_ne!(IpFramer::new(lsf, None).stream_id(), 0);
        }
        Ok(())
    }

    #[test]
    fn accepts_addresses_directly() -> Result<()> {
        let frame = IpFrame::create(
            Address::BROADCAST,
            Address::from_callsign("W2FBI")?,
            Some(2),
            5,
            b"",
            0,
            b"",
        )?;
        assert!(frame.lsf.dst.is_broadcast());
        Ok(())
    }
}
