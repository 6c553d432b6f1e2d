/*! RF frame bit pipelines.

Ties the FEC stages together, one function pair per frame kind. The
on-air bit order of every frame is a 16-bit sync word followed by 368
payload bits produced by randomize ∘ interleave ∘ (frame-specific
coding):

* LSF: conv-encode the 30 bytes, puncture P1.
* Stream: Golay-protected LICH chunk (96 bits) then the P2-punctured
  coding of frame number and payload (272 bits).
* Packet: conv-encode the 26-byte chunk (206 significant bits),
  puncture P3.
* BERT: conv-encode 197 bits, puncture P2, drop the final bit to fit.

Decoders take the 368 soft payload bits with the sync word already
stripped — sync detection is the demodulator's business — and undo
the same stages. The returned cost is the Viterbi path metric after
erasure adjustment; callers decide how much error to accept.

The bit vectors here feed the symbol mapper. This library does not
touch the 4-FSK waveform itself.
 */

use crate::bits;
use crate::consts::{
    EOT_MARKER, RF_FRAME_BITS, RF_PAYLOAD_BITS, SYNC_BERT, SYNC_LSF, SYNC_PACKET, SYNC_STREAM,
};
use crate::convolutional;
use crate::golay;
use crate::interleave::interleave;
use crate::lsf::LinkSetupFrame;
use crate::packet::PacketChunk;
use crate::puncture::{P1, P2, P3, puncture};
use crate::randomize::{randomize, randomize_soft};
use crate::stream::StreamFrame;
use crate::viterbi::Viterbi;
use crate::{Error, Result};

/// The frame kind a sync word announces.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameKind {
    /// Link Setup Frame.
    Lsf,
    /// Stream frame.
    Stream,
    /// Packet frame.
    Packet,
    /// Bit error rate test frame.
    Bert,
}

/// Classify a received sync word.
#[must_use]
pub fn classify_sync(word: u16) -> Option<FrameKind> {
    match word {
        SYNC_LSF => Some(FrameKind::Lsf),
        SYNC_STREAM => Some(FrameKind::Stream),
        SYNC_PACKET => Some(FrameKind::Packet),
        SYNC_BERT => Some(FrameKind::Bert),
        _ => None,
    }
}

// Interleave, randomize, and prepend the sync word.
fn assemble(sync: u16, payload: &[u8]) -> Vec<u8> {
    let mut scrambled = interleave(payload);
    randomize(&mut scrambled);
    let mut out = bits::unpack(&sync.to_be_bytes(), 16);
    out.extend(scrambled);
    out
}

// Undo randomization and interleaving on received soft bits.
fn prepare(soft: &[u16]) -> Result<Vec<u16>> {
    if soft.len() != RF_PAYLOAD_BITS {
        return Err(Error::WireFormat("RF payload must be 368 soft bits"));
    }
    let mut s = soft.to_vec();
    randomize_soft(&mut s);
    Ok(interleave(&s))
}

/// Encode an LSF to its 384 on-air bits.
#[must_use]
pub fn encode_lsf_frame(lsf: &LinkSetupFrame) -> Vec<u8> {
    let coded = convolutional::encode_lsf(&lsf.to_bytes());
    assemble(SYNC_LSF, &puncture(&coded, &P1))
}

/// Decode an LSF from 368 received soft bits. The embedded CRC must
/// verify.
pub fn decode_lsf_frame(soft: &[u16]) -> Result<(LinkSetupFrame, u32)> {
    let prepared = prepare(soft)?;
    let (bytes, cost) = Viterbi::new().decode_punctured(&prepared, &P1)?;
    let lsf = LinkSetupFrame::from_bytes_with_crc(&bytes[..30])?;
    Ok((lsf, cost))
}

/// Encode a stream frame to its 384 on-air bits.
///
/// The CRC in the byte form is not transmitted on RF; the FEC covers
/// the frame instead.
#[must_use]
pub fn encode_stream_frame(frame: &StreamFrame) -> Vec<u8> {
    let mut payload = bits::unpack(&golay::encode_lich(&frame.lich_chunk), 96);
    let coded = convolutional::encode_stream(frame.frame_number, &frame.payload);
    payload.extend(puncture(&coded, &P2));
    assemble(SYNC_STREAM, &payload)
}

/// Decode a stream frame from 368 received soft bits.
pub fn decode_stream_frame(soft: &[u16]) -> Result<(StreamFrame, u32)> {
    let prepared = prepare(soft)?;
    let lich_chunk = golay::soft_decode_lich(&prepared[..96]).ok_or(Error::Uncorrectable)?;
    let (bytes, cost) = Viterbi::new().decode_punctured(&prepared[96..], &P2)?;
    let mut payload = [0u8; 16];
    payload.copy_from_slice(&bytes[2..18]);
    Ok((
        StreamFrame {
            lich_chunk,
            frame_number: u16::from_be_bytes([bytes[0], bytes[1]]),
            payload,
        },
        cost,
    ))
}

/// Encode a packet chunk to its 384 on-air bits.
#[must_use]
pub fn encode_packet_frame(chunk: &PacketChunk) -> Vec<u8> {
    let coded = convolutional::encode_packet(&chunk.to_bytes());
    assemble(SYNC_PACKET, &puncture(&coded, &P3))
}

/// Decode a packet chunk from 368 received soft bits.
pub fn decode_packet_frame(soft: &[u16]) -> Result<(PacketChunk, u32)> {
    let prepared = prepare(soft)?;
    let (bytes, cost) = Viterbi::new().decode_punctured(&prepared, &P3)?;
    Ok((PacketChunk::from_bytes(&bytes[..26])?, cost))
}

/// Encode a 25-byte BERT frame to its 384 on-air bits.
///
/// P2 leaves 369 bits for the 402-bit coding; the last is dropped to
/// fit the payload and comes back as an erasure.
#[must_use]
pub fn encode_bert_frame(payload: &[u8; 25]) -> Vec<u8> {
    let coded = convolutional::encode_bert(payload);
    let mut punctured = puncture(&coded, &P2);
    punctured.truncate(RF_PAYLOAD_BITS);
    assemble(SYNC_BERT, &punctured)
}

/// Decode a BERT frame from 368 received soft bits.
pub fn decode_bert_frame(soft: &[u16]) -> Result<([u8; 25], u32)> {
    let prepared = prepare(soft)?;
    let (bytes, cost) = Viterbi::new().decode_punctured(&prepared, &P2)?;
    let mut out = [0u8; 25];
    out.copy_from_slice(&bytes[..25]);
    Ok((out, cost))
}

/// The end-of-transmission burst: the EOT marker repeated across a
/// whole frame's worth of bits.
#[must_use]
pub fn eot_frame() -> Vec<u8> {
    let marker = bits::unpack(&EOT_MARKER.to_be_bytes(), 16);
    std::iter::repeat_with(|| marker.clone())
        .take(RF_FRAME_BITS / 16)
        .flatten()
        .collect()
}
