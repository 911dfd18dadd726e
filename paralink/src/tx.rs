//! Transmit-side serializer
//!
//! Hands encoded messages to the transfer engine and enforces the storage
//! lifetime discipline: the words of an in-flight transfer are owned by the
//! engine (copied in at [`TxEngine::begin_transfer`]), never by a caller
//! temporary, and a new submission is gated on the completion of the previous
//! one. The completion gate replaces any fixed-duration sleep, which would
//! only be safe if provably longer than the worst-case transfer time.

use paralink_driver::engine::{EngineError, TxEngine};

use crate::codec::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SubmitError {
    /// The previous transfer is still in flight.
    Busy,
}

/// Message transmitter over an asynchronous transfer engine.
///
/// Pacing is the caller's schedule; the link provides no back-pressure from
/// the receive side, so the caller's interval together with the receiver's
/// channel capacity bound is the only overload protection. The on-wire time
/// of one message,
/// [`RingConfig::message_interval`](paralink_driver::config::RingConfig::message_interval),
/// is the floor for that interval.
#[derive(Debug)]
pub struct Serializer<E: TxEngine> {
    engine: E,
    submitted: u64,
}

impl<E: TxEngine> Serializer<E> {
    /// Claims a transfer channel. Fails with [`EngineError::NoChannel`] when
    /// none is available; treat as fatal.
    pub fn new(mut engine: E) -> Result<Self, EngineError> {
        engine.start()?;
        Ok(Self {
            engine,
            submitted: 0,
        })
    }

    /// Submits a message unless the previous transfer is still in flight.
    pub fn try_submit(&mut self, msg: &Message) -> Result<(), SubmitError> {
        if self.engine.is_busy() {
            return Err(SubmitError::Busy);
        }
        self.engine.begin_transfer(&msg.to_words());
        self.submitted += 1;
        Ok(())
    }

    /// Submits a message, spinning until the previous transfer completes.
    ///
    /// Word order within the message is guaranteed on the wire; nothing is
    /// guaranteed about inter-message gaps beyond this gate and the caller's
    /// pacing.
    pub fn submit(&mut self, msg: &Message) {
        self.flush();
        self.engine.begin_transfer(&msg.to_words());
        self.submitted += 1;
    }

    /// Spins until the engine reports the in-flight transfer complete.
    pub fn flush(&mut self) {
        while self.engine.is_busy() {
            core::hint::spin_loop();
        }
    }

    /// Messages handed to the engine since startup.
    pub fn submitted(&self) -> u64 {
        self.submitted
    }
}
