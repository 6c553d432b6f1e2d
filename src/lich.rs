/*! LICH reassembly.

Each stream frame carries one 6-byte slice of the padded 30-byte LSF,
rotated by `frame_number mod 5`. A receiver that joins mid-stream
collects the slices until all five have been seen, then reconstructs
the LSF.

The collector also tracks the transmission identity it is collecting
for; [`LichCollector::check_identity`] resets it when a different
(stream ID, DST, SRC, TYPE) shows up, so slices from two interleaved
transmissions are never mixed.
 */

use crate::address::Address;
use crate::consts::{LICH_CHUNK_COUNT, LICH_CHUNK_SIZE, LSF_SIZE};
use crate::lsf::LinkSetupFrame;
use crate::{Error, Result};

/// Collects the five LICH chunks of one inbound stream.
///
/// Not synchronized; owned by a single receive pipeline.
#[derive(Debug, Default)]
pub struct LichCollector {
    chunks: [Option<[u8; LICH_CHUNK_SIZE]>; LICH_CHUNK_COUNT],
    identity: Option<(u16, Address, Address, u16)>,
}

impl LichCollector {
    /// A fresh, empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the chunk carried by a frame. Returns true once all five
    /// slots are filled.
    pub fn add_chunk(&mut self, chunk: &[u8], frame_number: u16) -> Result<bool> {
        if chunk.len() != LICH_CHUNK_SIZE {
            return Err(Error::WrongLength {
                what: "LICH chunk",
                want: LICH_CHUNK_SIZE,
                got: chunk.len(),
            });
        }
        let mut slot = [0u8; LICH_CHUNK_SIZE];
        slot.copy_from_slice(chunk);
        self.chunks[usize::from(frame_number) % LICH_CHUNK_COUNT] = Some(slot);
        Ok(self.is_complete())
    }

    /// Reset if this frame belongs to a different transmission than
    /// the one being collected. Call before [`Self::add_chunk`] on
    /// paths that know the identity (the IP path always does).
    pub fn check_identity(&mut self, stream_id: u16, dst: Address, src: Address, type_field: u16) {
        let id = (stream_id, dst, src, type_field);
        if self.identity != Some(id) {
            if self.identity.is_some() {
                log::debug!("new transmission {src} -> {dst}, resetting LICH collector");
            }
            self.reset();
            self.identity = Some(id);
        }
    }

    /// Number of distinct slots filled so far.
    #[must_use]
    pub fn chunks_received(&self) -> usize {
        self.chunks.iter().flatten().count()
    }

    /// Are all five slots filled?
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.chunks.iter().all(Option::is_some)
    }

    /// Reconstruct the LSF, dropping the two pad bytes. `None` until
    /// complete.
    #[must_use]
    pub fn lsf(&self) -> Option<LinkSetupFrame> {
        if !self.is_complete() {
            return None;
        }
        let mut data = [0u8; LICH_CHUNK_COUNT * LICH_CHUNK_SIZE];
        for (i, chunk) in self.chunks.iter().enumerate() {
            data[6 * i..6 * (i + 1)].copy_from_slice(&(*chunk)?);
        }
        LinkSetupFrame::from_bytes(&data[..LSF_SIZE]).ok()
    }

    /// Forget everything for a new stream.
    pub fn reset(&mut self) {
        self.chunks = [None; LICH_CHUNK_COUNT];
        self.identity = None;
    }
}
