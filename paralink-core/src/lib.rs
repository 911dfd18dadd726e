//! Paralink protocol core data types
//!
//! This crate provides basic data type definitions used by other Paralink crates.
//! Paralink users should not depend on this crate directly. Use the `paralink::core`
//! reexport instead.
#![no_std]

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidValue;

/// Parameter message type
///
/// The type has explicit numeric encoding matching the wire type byte.
/// Payload semantics are owned by the application; the link core only uses the
/// type code for checksum computation and for selecting the value kind when
/// decoding.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MessageType {
    /// Base wavetable length
    Wavelen0 = 0,
    /// Wavetable bank selector, first slot
    Bank0 = 1,
    /// Wavetable bank selector, second slot
    Bank1 = 2,
    /// Packed control word
    Ctrl = 3,
    Ctrl0 = 4,
    Ctrl1 = 5,
    Ctrl2 = 6,
    Ctrl3 = 7,
    Ctrl4 = 8,
    Ctrl5 = 9,
    /// Oscillator detune amount
    Detune = 10,
    /// Octave spread amount
    OctSpread = 11,
    MetaMod3 = 12,
    MetaMod4 = 13,
    MetaMod5 = 14,
    MetaMod6 = 15,
    MetaMod7 = 16,
    MetaMod8 = 17,
}

impl MessageType {
    pub const MIN: MessageType = MessageType::Wavelen0;
    pub const MAX: MessageType = MessageType::MetaMod8;
    pub const COUNT: usize = Self::MAX.into_u8() as usize + 1;

    pub const fn try_from_u8(code: u8) -> Option<MessageType> {
        match code {
            0 => Some(MessageType::Wavelen0),
            1 => Some(MessageType::Bank0),
            2 => Some(MessageType::Bank1),
            3 => Some(MessageType::Ctrl),
            4 => Some(MessageType::Ctrl0),
            5 => Some(MessageType::Ctrl1),
            6 => Some(MessageType::Ctrl2),
            7 => Some(MessageType::Ctrl3),
            8 => Some(MessageType::Ctrl4),
            9 => Some(MessageType::Ctrl5),
            10 => Some(MessageType::Detune),
            11 => Some(MessageType::OctSpread),
            12 => Some(MessageType::MetaMod3),
            13 => Some(MessageType::MetaMod4),
            14 => Some(MessageType::MetaMod5),
            15 => Some(MessageType::MetaMod6),
            16 => Some(MessageType::MetaMod7),
            17 => Some(MessageType::MetaMod8),
            _ => None,
        }
    }

    pub const fn into_u8(self) -> u8 {
        self as u8
    }

    /// The value representation carried by messages of this type.
    ///
    /// Bank selectors and the packed control word carry raw integers; every
    /// other type carries a continuous parameter as float32.
    pub const fn value_kind(self) -> ValueKind {
        match self {
            MessageType::Bank0 | MessageType::Bank1 | MessageType::Ctrl => ValueKind::Uint,
            _ => ValueKind::Float,
        }
    }
}

impl From<MessageType> for u8 {
    fn from(value: MessageType) -> Self {
        value.into_u8()
    }
}

impl TryFrom<u8> for MessageType {
    type Error = InvalidValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_from_u8(value).ok_or(InvalidValue)
    }
}

/// Value representation selector, see [`MessageType::value_kind`]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValueKind {
    Float,
    Uint,
}

/// Message payload value
///
/// The wire carries 32 raw value bits; this tagged representation keeps the
/// float/integer distinction explicit everywhere outside the codec. Raw bit
/// reinterpretation happens only in [`to_bits`](Value::to_bits) and
/// [`from_bits`](Value::from_bits), which the codec owns.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Value {
    Float(f32),
    Uint(u32),
}

impl Value {
    pub const fn kind(&self) -> ValueKind {
        match self {
            Value::Float(_) => ValueKind::Float,
            Value::Uint(_) => ValueKind::Uint,
        }
    }

    pub const fn to_bits(self) -> u32 {
        match self {
            Value::Float(v) => v.to_bits(),
            Value::Uint(v) => v,
        }
    }

    pub const fn from_bits(kind: ValueKind, bits: u32) -> Self {
        match kind {
            ValueKind::Float => Value::Float(f32::from_bits(bits)),
            ValueKind::Uint => Value::Uint(bits),
        }
    }

    pub const fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Uint(_) => None,
        }
    }

    pub const fn as_u32(&self) -> Option<u32> {
        match self {
            Value::Uint(v) => Some(*v),
            Value::Float(_) => None,
        }
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Uint(value)
    }
}
