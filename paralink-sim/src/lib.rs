//! Software model of the Paralink transfer peripheral
//!
//! Fills the platform-crate slot for host-side testing: a [`SimRxEngine`]
//! models the chained two-channel receive data mover word for word, and a
//! [`SimTxEngine`] models the asynchronous transmit channel. [`SimWire`] ties
//! one of each together so a complete link can be exercised in a test.
//!
//! The receive model reproduces the property the real hardware has and that
//! the stack's correctness argument depends on: the channel switch is a pure
//! function of how many words have arrived, happens "between two software
//! instructions" (here: between any two engine calls), and involves no
//! software step. Status queries are computed from the live word count on
//! every call, matching the live-register-read contract of the traits.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use paralink_driver::config::RingConfig;
use paralink_driver::engine::{Channel, EngineError, RxEngine, TxEngine, Word};

#[derive(Debug)]
struct RxState {
    capacity: usize,
    buffers: [Vec<Word>; 2],
    /// Total words the wire has ever delivered.
    written: u64,
    channels_available: bool,
}

impl RxState {
    fn channel_index(channel: Channel) -> usize {
        match channel {
            Channel::A => 0,
            Channel::B => 1,
        }
    }

    fn active(&self) -> Channel {
        // completed epochs alternate A, B, A, ...
        if (self.written / self.capacity as u64) % 2 == 0 {
            Channel::A
        } else {
            Channel::B
        }
    }

    fn fill(&self, channel: Channel) -> usize {
        if channel == self.active() {
            (self.written % self.capacity as u64) as usize
        } else if self.written >= self.capacity as u64 {
            // the inactive channel's last epoch ran to completion
            self.capacity
        } else {
            0
        }
    }
}

/// Shared handle to a simulated receive engine.
///
/// Clones refer to the same peripheral, so a test can keep one handle for
/// producing wire traffic while the receive stack owns another.
#[derive(Clone, Debug)]
pub struct SimRxEngine(Rc<RefCell<RxState>>);

impl SimRxEngine {
    pub fn new(config: &RingConfig) -> Self {
        let capacity = config.capacity();
        Self(Rc::new(RefCell::new(RxState {
            capacity,
            buffers: [vec![0; capacity], vec![0; capacity]],
            written: 0,
            channels_available: true,
        })))
    }

    /// Makes `start` fail as if another user already claimed the transfer
    /// channels.
    pub fn exhaust_channels(&self) {
        self.0.borrow_mut().channels_available = false;
    }

    /// Delivers one word from the wire: the autonomous hardware producer.
    /// Chains to the other channel automatically when the active one fills.
    pub fn push_word(&self, word: Word) {
        let mut state = self.0.borrow_mut();
        let channel = RxState::channel_index(state.active());
        let offset = (state.written % state.capacity as u64) as usize;
        state.buffers[channel][offset] = word;
        state.written += 1;
    }

    pub fn push_words(&self, words: &[Word]) {
        for &word in words {
            self.push_word(word);
        }
    }

    /// Total words delivered since the engine was last reset.
    pub fn total_written(&self) -> u64 {
        self.0.borrow().written
    }
}

impl RxEngine for SimRxEngine {
    fn start(&mut self) -> Result<(), EngineError> {
        if !self.0.borrow().channels_available {
            return Err(EngineError::NoChannel);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.0.borrow_mut().written = 0;
    }

    fn active_channel(&self) -> Channel {
        self.0.borrow().active()
    }

    fn remaining_words(&self, channel: Channel) -> usize {
        let state = self.0.borrow();
        state.capacity - state.fill(channel)
    }

    fn read_word(&self, channel: Channel, offset: usize) -> Word {
        let state = self.0.borrow();
        state.buffers[RxState::channel_index(channel)][offset]
    }
}

#[derive(Debug)]
struct TxState {
    in_flight: VecDeque<Word>,
    channels_available: bool,
}

/// Shared handle to a simulated transmit engine.
#[derive(Clone, Debug)]
pub struct SimTxEngine(Rc<RefCell<TxState>>);

impl SimTxEngine {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(TxState {
            in_flight: VecDeque::new(),
            channels_available: true,
        })))
    }

    pub fn exhaust_channels(&self) {
        self.0.borrow_mut().channels_available = false;
    }

    /// Clocks up to `words` words out of the engine and onto the given
    /// receive engine, in submission order.
    pub fn clock(&self, rx: &SimRxEngine, words: usize) {
        let mut state = self.0.borrow_mut();
        for _ in 0..words {
            match state.in_flight.pop_front() {
                Some(word) => rx.push_word(word),
                None => break,
            }
        }
    }
}

impl Default for SimTxEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TxEngine for SimTxEngine {
    fn start(&mut self) -> Result<(), EngineError> {
        if !self.0.borrow().channels_available {
            return Err(EngineError::NoChannel);
        }
        Ok(())
    }

    fn is_busy(&self) -> bool {
        !self.0.borrow().in_flight.is_empty()
    }

    fn begin_transfer(&mut self, words: &[Word]) {
        let mut state = self.0.borrow_mut();
        debug_assert!(
            state.in_flight.is_empty(),
            "begin_transfer while a transfer is in flight"
        );
        state.in_flight.extend(words.iter().copied());
    }
}

/// A complete simulated link: one transmit engine wired to one receive engine.
pub struct SimWire {
    tx: SimTxEngine,
    rx: SimRxEngine,
}

impl SimWire {
    pub fn new(config: &RingConfig) -> Self {
        Self {
            tx: SimTxEngine::new(),
            rx: SimRxEngine::new(config),
        }
    }

    pub fn tx_engine(&self) -> SimTxEngine {
        self.tx.clone()
    }

    pub fn rx_engine(&self) -> SimRxEngine {
        self.rx.clone()
    }

    /// Moves up to `words` words across the wire.
    pub fn clock(&self, words: usize) {
        self.tx.clock(&self.rx, words);
    }

    /// Moves everything the transmit engine holds across the wire.
    pub fn clock_all(&self) {
        while self.tx.is_busy() {
            self.clock(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RingConfig {
        RingConfig::new(3).unwrap() // 8 words per channel
    }

    #[test]
    fn test_chaining_is_automatic() {
        let rx = SimRxEngine::new(&config());
        assert_eq!(rx.active_channel(), Channel::A);

        for n in 0..8 {
            rx.push_word(n);
        }
        // the eighth word completed channel A; the switch took no software step
        assert_eq!(rx.active_channel(), Channel::B);
        assert_eq!(rx.remaining_words(Channel::A), 0);
        assert_eq!(rx.remaining_words(Channel::B), 8);

        for n in 0..8 {
            rx.push_word(0x100 + n);
        }
        assert_eq!(rx.active_channel(), Channel::A);
        assert_eq!(rx.read_word(Channel::B, 7), 0x107);
    }

    #[test]
    fn test_start_fails_without_channels() {
        let mut rx = SimRxEngine::new(&config());
        rx.exhaust_channels();
        assert_eq!(rx.start(), Err(EngineError::NoChannel));
    }

    #[test]
    fn test_wire_moves_words_in_order() {
        let wire = SimWire::new(&config());
        let mut tx = wire.tx_engine();
        let rx = wire.rx_engine();

        tx.begin_transfer(&[0xAB, 0xCD]);
        assert!(tx.is_busy());
        wire.clock(1);
        assert!(tx.is_busy());
        wire.clock(1);
        assert!(!tx.is_busy());

        assert_eq!(rx.read_word(Channel::A, 0), 0xAB);
        assert_eq!(rx.read_word(Channel::A, 1), 0xCD);
    }
}
