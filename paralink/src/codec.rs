//! Wire message codec
//!
//! One message occupies 8 bytes, exactly [`MESSAGE_WORDS`] transfer-engine
//! words:
//!
//! ```text
//! bytes[0:4)  value    (f32 or u32 bit pattern, little endian)
//! byte[4]     msgType  (0..=17)
//! byte[5]     magic    (fixed sentinel)
//! bytes[6:8)  checksum (u16, little endian)
//! ```
//!
//! The checksum folds the 32 value bits into 16 and mixes in the type code.
//! It detects every single-bit error in the value and type fields, but a pair
//! of flips at the same bit position of the low and high value halves cancels
//! and passes undetected; the magic byte is an additional cheap alignment
//! sanity check, not an error-correcting layer.

use paralink_driver::engine::Word;

use crate::core::{MessageType, Value};

/// Fixed per-message sentinel byte.
pub const MAGIC: u8 = 0b1010_1010;

pub const MESSAGE_BYTES: usize = 8;
pub const MESSAGE_WORDS: usize = 2;

const _: () = assert!(MESSAGE_BYTES == MESSAGE_WORDS * (Word::BITS as usize / 8));

/// XOR-fold checksum over the raw value bits and the type code.
pub const fn checksum(value_bits: u32, type_code: u8) -> u16 {
    (value_bits as u16) ^ ((value_bits >> 16) as u16) ^ (type_code as u16)
}

/// A decode failure on a structurally aligned read
///
/// The codec cannot distinguish transmission bit-errors from cursor
/// misalignment after data loss or a protocol-version mismatch; all three
/// manifest here. Callers must track consecutive-failure bursts to escalate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    BadMagic,
    BadChecksum,
    /// Checksum and magic hold but the type code is outside the known range.
    BadType,
}

/// One parameter message
///
/// Immutable once constructed and copied by value across the wire. The wire
/// carries raw value bits only; on decode the value is re-tagged according to
/// [`MessageType::value_kind`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Message {
    value: Value,
    msg_type: MessageType,
}

impl Message {
    pub const fn new(value: Value, msg_type: MessageType) -> Self {
        Self { value, msg_type }
    }

    pub const fn new_float(value: f32, msg_type: MessageType) -> Self {
        Self::new(Value::Float(value), msg_type)
    }

    pub const fn new_uint(value: u32, msg_type: MessageType) -> Self {
        Self::new(Value::Uint(value), msg_type)
    }

    pub const fn value(&self) -> Value {
        self.value
    }

    pub const fn msg_type(&self) -> MessageType {
        self.msg_type
    }

    pub const fn checksum(&self) -> u16 {
        checksum(self.value.to_bits(), self.msg_type.into_u8())
    }

    pub const fn to_bytes(&self) -> [u8; MESSAGE_BYTES] {
        let value = self.value.to_bits().to_le_bytes();
        let check = self.checksum().to_le_bytes();
        [
            value[0],
            value[1],
            value[2],
            value[3],
            self.msg_type.into_u8(),
            MAGIC,
            check[0],
            check[1],
        ]
    }

    pub fn from_bytes(bytes: &[u8; MESSAGE_BYTES]) -> Result<Self, DecodeError> {
        if bytes[5] != MAGIC {
            return Err(DecodeError::BadMagic);
        }
        let bits = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let stored = u16::from_le_bytes([bytes[6], bytes[7]]);
        if stored != checksum(bits, bytes[4]) {
            return Err(DecodeError::BadChecksum);
        }
        let msg_type = MessageType::try_from_u8(bytes[4]).ok_or(DecodeError::BadType)?;
        Ok(Self {
            value: Value::from_bits(msg_type.value_kind(), bits),
            msg_type,
        })
    }

    pub const fn to_words(&self) -> [Word; MESSAGE_WORDS] {
        let bytes = self.to_bytes();
        [
            u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        ]
    }

    pub fn from_words(words: [Word; MESSAGE_WORDS]) -> Result<Self, DecodeError> {
        let value = words[0].to_le_bytes();
        let tail = words[1].to_le_bytes();
        Self::from_bytes(&[
            value[0], value[1], value[2], value[3], tail[0], tail[1], tail[2], tail[3],
        ])
    }
}
