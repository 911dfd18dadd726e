//! Link configuration

use embassy_time::Duration;

use crate::engine::Word;

/// Receive ring configuration
///
/// The ring consists of two channels of `1 << size_exponent` words each. The
/// capacity bound is a correctness parameter, not a tuning knob: it must exceed
/// the largest number of words the hardware can write during the worst-case
/// interval between consecutive drain polls, or messages are lost regardless of
/// software correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RingConfig {
    size_exponent: u8,
    bit_rate: u32,
}

impl RingConfig {
    /// Reference wire rate, 20 Mb/s.
    pub const DEFAULT_BIT_RATE: u32 = 20_000_000;

    /// Largest channel exponent the transfer engines are specified for.
    pub const MAX_SIZE_EXPONENT: u8 = 16;

    /// Creates a configuration with `1 << size_exponent` words per channel at
    /// the default bit rate. The exponent must allow at least one two-word
    /// message per channel.
    pub const fn new(size_exponent: u8) -> Option<Self> {
        if size_exponent >= 1 && size_exponent <= Self::MAX_SIZE_EXPONENT {
            Some(Self {
                size_exponent,
                bit_rate: Self::DEFAULT_BIT_RATE,
            })
        } else {
            None
        }
    }

    pub const fn with_bit_rate(self, bit_rate: u32) -> Self {
        Self { bit_rate, ..self }
    }

    pub const fn size_exponent(&self) -> u8 {
        self.size_exponent
    }

    /// Words per channel. Always a power of two.
    pub const fn capacity(&self) -> usize {
        1 << self.size_exponent
    }

    pub const fn bit_rate(&self) -> u32 {
        self.bit_rate
    }

    /// Words the wire can deliver per second at the configured bit rate.
    /// Callers derive their polling and pacing budgets from this.
    pub const fn words_per_second(&self) -> u32 {
        self.bit_rate / u32::BITS
    }

    /// On-wire duration of one message at the configured bit rate. The floor
    /// for a sender's pacing interval.
    pub const fn message_interval(&self) -> Duration {
        // one message is two words on the wire
        let message_bits = 2 * Word::BITS;
        let messages_per_second = self.bit_rate / message_bits;
        let messages_per_second = if messages_per_second >= 1 {
            messages_per_second
        } else {
            1
        };
        Duration::from_hz(messages_per_second as u64)
    }
}

impl Default for RingConfig {
    fn default() -> Self {
        // 256 words (128 messages) per channel
        match Self::new(8) {
            Some(config) => config,
            None => unreachable!(),
        }
    }
}
