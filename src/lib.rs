#![warn(missing_docs)]
/*! This crate implements the M17 digital radio protocol, specification
v2.0.3 and v3.0.0.

M17 carries voice and data either over RF with forward error
correction, or over IP as framed UDP datagrams relayed by reflector
servers. This library covers everything between the application and
the symbol mapper / UDP socket:

* Base-40 callsign addressing ([`Address`]).
* The dual-version TYPE field ([`types`]).
* The 28-byte Link Setup Frame with its polymorphic META field
  ([`LinkSetupFrame`]).
* Stream, packet, and 54-byte IP frame serialization with CRC-16.
* The full FEC pipeline: Golay(24,12), the K=5 rate-1/2 convolutional
  code with P1/P2/P3 puncturing, the 368-bit interleaver, the 46-byte
  randomizer, and a soft-decision Viterbi decoder ([`rf`] ties these
  together per frame kind).
* LICH reassembly of the LSF from rotating 6-byte chunks
  ([`LichCollector`]).
* A UDP reflector client ([`reflector::ReflectorClient`]; a tokio
  version is available behind the `async` feature).
* The crypto layer: LFSR scrambler, AES-CTR, and ECDSA P-256
  signatures.

What this library deliberately does not do: modulate or demodulate the
4-FSK waveform (it produces and consumes bits at the symbol-mapper
boundary), and voice coding (Codec2 payloads are opaque 16-byte
blocks).

# Example

Build an IP frame and round-trip it through the wire format:

```
use m17::ip::IpFrame;
let frame = IpFrame::create("SP5WWP", "W2FBI", Some(0xF00D), 0x0005, b"", 1, b"hello")?;
let wire = frame.to_bytes();
assert_eq!(wire.len(), 54);
assert_eq!(IpFrame::from_bytes(&wire)?, frame);
# Ok::<(), m17::Error>(())
```

## Links

* M17 project: <https://m17project.org/>
* Protocol specification: <https://spec.m17project.org/>
 */

pub mod address;
pub mod aes;
pub mod bert;
pub mod bits;
pub mod config;
pub mod consts;
pub mod convolutional;
pub mod crc;
pub mod golay;
pub mod interleave;
pub mod ip;
pub mod lich;
pub mod lsf;
pub mod packet;
pub mod puncture;
pub mod randomize;
pub mod reflector;
pub mod rf;
pub mod scrambler;
pub mod signature;
pub mod stream;
pub mod types;
pub mod viterbi;

#[cfg(feature = "async")]
pub mod async_reflector;

pub use address::Address;
pub use lich::LichCollector;
pub use lsf::LinkSetupFrame;

/// M17 error.
///
/// Pure codec functions surface all of these to the caller and never
/// log or panic on bad input. The reflector client recovers from
/// per-datagram parse errors internally and only surfaces
/// connection-level failures.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A callsign contained a character outside the base-40 alphabet.
    #[error("invalid character {0:?} in callsign")]
    InvalidCallsign(char),

    /// A callsign exceeded 9 characters (8 after a `#` prefix).
    #[error("callsign too long: {0:?}")]
    CallsignTooLong(String),

    /// A 48-bit address value falls in the reserved gap between the
    /// hash range and the broadcast address.
    #[error("invalid address 0x{0:012x}")]
    InvalidAddress(u64),

    /// An input had the wrong size for its field.
    #[error("{what} must be {want} bytes, got {got}")]
    WrongLength {
        /// Field name.
        what: &'static str,
        /// Required size.
        want: usize,
        /// Actual size.
        got: usize,
    },

    /// Channel Access Number outside 0..=15.
    #[error("CAN must be 0..=15, got {0}")]
    InvalidCan(u8),

    /// Reflector module designators are single letters A-Z.
    #[error("module must be a single letter A-Z, got {0:?}")]
    InvalidModule(String),

    /// Text META messages are limited to 15 blocks of 13 bytes.
    #[error("text too long: {0} bytes, max 195")]
    TextTooLong(usize),

    /// v3 packet mode forbids encryption and the signed flag.
    #[error("packet mode cannot carry encryption or a signature flag")]
    PacketModeRestriction,

    /// A crypto key was shorter than the selected mode requires.
    #[error("key too short: {got} bytes, need {want}")]
    KeyLength {
        /// Required size.
        want: usize,
        /// Actual size.
        got: usize,
    },

    /// A key or signature failed to parse.
    #[error("invalid key material: {0}")]
    InvalidKey(&'static str),

    /// Structural problem with a wire blob: bad magic, bad length,
    /// inconsistent control fields.
    #[error("bad wire format: {0}")]
    WireFormat(&'static str),

    /// CRC verification failed. Kept distinct from [`Error::WireFormat`]
    /// so callers can choose between discarding and logging.
    #[error("CRC mismatch")]
    Checksum,

    /// An error-correcting decoder could not correct within capacity.
    #[error("uncorrectable codeword")]
    Uncorrectable,

    /// `send_frame` or `poll` was called without a connection.
    #[error("not connected to a reflector")]
    NotConnected,

    /// The reflector replied NACK.
    #[error("connection refused by reflector")]
    ConnectionRefused,

    /// No ACKN within the connect timeout.
    #[error("timed out waiting for reflector")]
    Timeout,

    /// Socket-level failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
