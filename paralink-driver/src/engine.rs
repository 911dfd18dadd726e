//! Transfer engine traits and channel identity

/// One transfer-engine word. The wire moves data in 32-bit units; one protocol
/// message occupies exactly two of them.
pub type Word = u32;

/// Identity of one half of the receive double buffer.
///
/// The hardware fills exactly one channel at any instant. On filling it, the
/// chained transfer engine begins writing into the other channel automatically,
/// with no software step; the switch can occur between any two software
/// instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineError {
    /// No transfer channel or state machine is available. This is a fatal
    /// startup condition: abort initialization rather than retry.
    NoChannel,
}

/// Receive-side transfer engine
///
/// Implementations own the two channel buffers the hardware writes into and the
/// live status registers of the data mover.
///
/// Contracts:
/// * [`active_channel`](Self::active_channel) and
///   [`remaining_words`](Self::remaining_words) must be answered with a live
///   register read on every call. Caching a value across calls breaks the
///   stack's switch-detection ordering and is unsound against the autonomous
///   hardware producer.
/// * Word order within one message transfer is preserved by the hardware.
/// * [`read_word`](Self::read_word) reads buffer memory the hardware may be
///   concurrently filling; callers must only pass offsets below the fill
///   position of the confirmed channel.
pub trait RxEngine {
    /// Configures and arms both channels with cyclic chaining (A→B→A) and
    /// starts continuous reception.
    fn start(&mut self) -> Result<(), EngineError>;

    /// Stops the engine and rearms it from channel A, word 0.
    fn reset(&mut self);

    /// The channel the hardware is filling right now, from the live busy/armed
    /// status. Never inferred from a previously read word count.
    fn active_channel(&self) -> Channel;

    /// Words the given channel can still accept this epoch, from the live
    /// countdown register. A fully written channel reports 0.
    fn remaining_words(&self, channel: Channel) -> usize;

    /// One word of channel buffer memory (a volatile read on real hardware).
    fn read_word(&self, channel: Channel, offset: usize) -> Word;
}

/// Transmit-side transfer engine
///
/// Contracts:
/// * [`begin_transfer`](Self::begin_transfer) must copy the words into storage
///   the engine owns before returning; the slice is not retained. This is what
///   keeps the backing storage valid for the full asynchronous transfer.
/// * `begin_transfer` must not be called while [`is_busy`](Self::is_busy) is
///   true. There is no in-band cancellation of an in-flight transfer.
pub trait TxEngine {
    /// Claims a transfer channel and prepares the engine for transmission.
    fn start(&mut self) -> Result<(), EngineError>;

    /// Whether the previous transfer is still in flight, from the live busy
    /// status.
    fn is_busy(&self) -> bool;

    /// Begins an asynchronous transfer of `words`.
    fn begin_transfer(&mut self, words: &[Word]);
}
