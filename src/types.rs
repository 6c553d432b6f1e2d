/*! The 16-bit TYPE field.

Two wire layouts coexist. Specification v2.0.3 packs stream/packet,
data type, encryption type and subtype, and the CAN from bit 0 up.
v3.0.0 moved to a byte-oriented layout: payload kind and encryption in
the low byte, META kind and CAN in the high byte.

The two are distinguished by the high nibble of the low byte: v3 puts
its PAYLOAD kind there and reserves value 0, while in v2 those bits
are the top of the encryption subtype and the bottom of the CAN,
which are zero for the overwhelmingly common unencrypted CAN-0
configurations. [`detect_version`] applies that rule.

Unknown values in either layout decode to a `Reserved` variant
carrying the raw bits, so a parsed field always re-builds to the same
wire value.
 */

use crate::{Error, Result};

/// Which TYPE layout a wire value uses.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Version {
    /// Specification v2.0.3.
    V2,
    /// Specification v3.0.0.
    V3,
}

/// Decide which layout a raw TYPE value uses.
#[must_use]
pub fn detect_version(type_field: u16) -> Version {
    if (type_field >> 4) & 0x0F != 0 {
        Version::V3
    } else {
        Version::V2
    }
}

// ---- v2.0.3 ----

/// v2 stream/packet indicator, bit 0.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Packet mode.
    Packet,
    /// Stream mode.
    Stream,
}

/// v2 data type, bits 1..2.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DataType {
    /// Reserved value 0.
    Reserved,
    /// Data only.
    Data,
    /// Voice only.
    Voice,
    /// Voice and data.
    VoiceData,
}

/// v2 encryption type, bits 3..4.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EncryptionType {
    /// No encryption.
    None,
    /// LFSR scrambler.
    Scrambler,
    /// AES-CTR.
    Aes,
    /// Reserved value 3.
    Reserved,
}

/// v2 encryption subtype, bits 5..6. With no encryption this selects
/// the META interpretation instead.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EncryptionSubtype {
    /// META carries UTF-8 text.
    Text,
    /// META carries a GNSS position.
    Gnss,
    /// META carries extended callsign data.
    ExtendedCallsign,
    /// Reserved value 3.
    Reserved,
}

/// A parsed v2 TYPE field.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TypeFieldV2 {
    /// Stream or packet.
    pub mode: Mode,
    /// Payload content kind.
    pub data_type: DataType,
    /// Encryption method.
    pub encryption: EncryptionType,
    /// Encryption subtype / META interpretation.
    pub subtype: EncryptionSubtype,
    /// Channel Access Number, 0..=15.
    pub can: u8,
    /// Reserved bits 11..15, preserved for round-tripping.
    pub reserved: u8,
}

/// Parse a v2 TYPE value.
#[must_use]
pub fn parse_v2(type_field: u16) -> TypeFieldV2 {
    TypeFieldV2 {
        mode: if type_field & 1 != 0 {
            Mode::Stream
        } else {
            Mode::Packet
        },
        data_type: match (type_field >> 1) & 0x03 {
            0b01 => DataType::Data,
            0b10 => DataType::Voice,
            0b11 => DataType::VoiceData,
            _ => DataType::Reserved,
        },
        encryption: match (type_field >> 3) & 0x03 {
            0b00 => EncryptionType::None,
            0b01 => EncryptionType::Scrambler,
            0b10 => EncryptionType::Aes,
            _ => EncryptionType::Reserved,
        },
        subtype: match (type_field >> 5) & 0x03 {
            0b00 => EncryptionSubtype::Text,
            0b01 => EncryptionSubtype::Gnss,
            0b10 => EncryptionSubtype::ExtendedCallsign,
            _ => EncryptionSubtype::Reserved,
        },
        can: ((type_field >> 7) & 0x0F) as u8,
        reserved: ((type_field >> 11) & 0x1F) as u8,
    }
}

/// Build a v2 TYPE value.
pub fn build_v2(
    mode: Mode,
    data_type: DataType,
    encryption: EncryptionType,
    subtype: EncryptionSubtype,
    can: u8,
) -> Result<u16> {
    if can > 15 {
        return Err(Error::InvalidCan(can));
    }
    Ok(u16::from(mode == Mode::Stream)
        | (data_type as u16) << 1
        | (encryption as u16) << 3
        | (subtype as u16) << 5
        | u16::from(can) << 7)
}

// ---- v3.0.0 ----

/// v3 payload kind, byte 0 bits 7..4.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// Data only.
    DataOnly,
    /// Codec2 3200 voice.
    Voice3200,
    /// Codec2 1600 voice plus data.
    Voice1600Data,
    /// Packet mode.
    Packet,
    /// Any other value, preserved raw.
    Reserved(u8),
}

impl Payload {
    fn from_bits(v: u8) -> Self {
        match v {
            0x1 => Payload::DataOnly,
            0x2 => Payload::Voice3200,
            0x3 => Payload::Voice1600Data,
            0xF => Payload::Packet,
            other => Payload::Reserved(other),
        }
    }

    fn bits(self) -> u8 {
        match self {
            Payload::DataOnly => 0x1,
            Payload::Voice3200 => 0x2,
            Payload::Voice1600Data => 0x3,
            Payload::Packet => 0xF,
            Payload::Reserved(v) => v & 0x0F,
        }
    }
}

/// v3 encryption, byte 0 bits 3..1.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Encryption {
    /// No encryption.
    None,
    /// 8-bit scrambler.
    Scrambler8,
    /// 16-bit scrambler.
    Scrambler16,
    /// 24-bit scrambler.
    Scrambler24,
    /// AES-128.
    Aes128,
    /// AES-192.
    Aes192,
    /// AES-256.
    Aes256,
    /// Reserved value 7.
    Reserved,
}

impl Encryption {
    fn from_bits(v: u8) -> Self {
        match v {
            0 => Encryption::None,
            1 => Encryption::Scrambler8,
            2 => Encryption::Scrambler16,
            3 => Encryption::Scrambler24,
            4 => Encryption::Aes128,
            5 => Encryption::Aes192,
            6 => Encryption::Aes256,
            _ => Encryption::Reserved,
        }
    }

    fn bits(self) -> u8 {
        match self {
            Encryption::None => 0,
            Encryption::Scrambler8 => 1,
            Encryption::Scrambler16 => 2,
            Encryption::Scrambler24 => 3,
            Encryption::Aes128 => 4,
            Encryption::Aes192 => 5,
            Encryption::Aes256 => 6,
            Encryption::Reserved => 7,
        }
    }
}

/// v3 META kind, byte 1 bits 15..12.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MetaKind {
    /// META unused.
    None,
    /// GNSS position.
    Gnss,
    /// Extended callsign data.
    ExtendedCallsign,
    /// UTF-8 text block.
    Text,
    /// AES initialization vector.
    AesIv,
    /// Any other value, preserved raw.
    Reserved(u8),
}

impl MetaKind {
    fn from_bits(v: u8) -> Self {
        match v {
            0x0 => MetaKind::None,
            0x1 => MetaKind::Gnss,
            0x2 => MetaKind::ExtendedCallsign,
            0x3 => MetaKind::Text,
            0xF => MetaKind::AesIv,
            other => MetaKind::Reserved(other),
        }
    }

    fn bits(self) -> u8 {
        match self {
            MetaKind::None => 0x0,
            MetaKind::Gnss => 0x1,
            MetaKind::ExtendedCallsign => 0x2,
            MetaKind::Text => 0x3,
            MetaKind::AesIv => 0xF,
            MetaKind::Reserved(v) => v & 0x0F,
        }
    }
}

/// A parsed v3 TYPE field.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TypeFieldV3 {
    /// Payload kind.
    pub payload: Payload,
    /// Encryption method.
    pub encryption: Encryption,
    /// Digital signature flag.
    pub signed: bool,
    /// META interpretation.
    pub meta: MetaKind,
    /// Channel Access Number, 0..=15.
    pub can: u8,
}

/// Parse a v3 TYPE value.
#[must_use]
pub fn parse_v3(type_field: u16) -> TypeFieldV3 {
    TypeFieldV3 {
        payload: Payload::from_bits(((type_field >> 4) & 0x0F) as u8),
        encryption: Encryption::from_bits(((type_field >> 1) & 0x07) as u8),
        signed: type_field & 0x01 != 0,
        meta: MetaKind::from_bits(((type_field >> 12) & 0x0F) as u8),
        can: ((type_field >> 8) & 0x0F) as u8,
    }
}

/// Build a v3 TYPE value.
///
/// Packet mode forbids encryption and the signed flag.
pub fn build_v3(
    payload: Payload,
    encryption: Encryption,
    signed: bool,
    meta: MetaKind,
    can: u8,
) -> Result<u16> {
    if can > 15 {
        return Err(Error::InvalidCan(can));
    }
    if payload == Payload::Packet && (encryption != Encryption::None || signed) {
        return Err(Error::PacketModeRestriction);
    }
    Ok(u16::from(payload.bits()) << 4
        | u16::from(encryption.bits()) << 1
        | u16::from(signed)
        | u16::from(meta.bits()) << 12
        | u16::from(can & 0x0F) << 8)
}
