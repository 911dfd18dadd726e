//! Receive-side double-buffer synchronization
//!
//! The transfer engine continuously fills one of two channels and, on filling
//! it, chains into the other with no software step. The [`Ring`] is the
//! software half of that protocol: it tracks which channel it is draining and
//! a word cursor into it, and recognizes the hardware's switch without any
//! shared lock.
//!
//! The `{active channel, fill position, cursor}` triple is the only state
//! shared with the hardware actor. Correctness rests on two rules, both
//! encoded in [`Ring::pop_frame`]:
//!
//! 1. The active channel is established from the live busy status *first*;
//!    fill positions are only ever interpreted relative to that confirmed
//!    channel. Inferring the switch from a previously read word count is
//!    unsound: the switch can land between the two reads and software would
//!    interpret positions against a channel the hardware is overwriting.
//! 2. The drain window is the inequality `fill − cursor >= MESSAGE_WORDS`,
//!    evaluated in a loop. An exact-equality check stalls the link permanently
//!    the first time the producer gets more than one message ahead of a poll.
//!
//! Overrun detection is positional. It catches the other channel filled past
//! the cursor at a switch, and the fill position moved backwards within one
//! epoch. A producer that writes an exact multiple of two full capacities
//! between consecutive polls returns the fill to or past the cursor and cannot
//! be told apart from normal progress, so the capacity rule on
//! [`RingConfig`] is load-bearing: each channel must out-size the worst-case
//! number of words written between polls.

use paralink_driver::config::RingConfig;
use paralink_driver::engine::{Channel, EngineError, RxEngine, Word};

use crate::codec::MESSAGE_WORDS;

/// The producer advanced more than one channel capacity past the drain cursor.
///
/// Fatal for the epoch: cursor interpretation is no longer trustworthy, so the
/// ring has already realigned itself to the live write position when this is
/// returned. The skipped-over messages are unavoidably lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Overrun;

/// Software half of the two-channel receive ring.
#[derive(Debug)]
pub struct Ring<E: RxEngine> {
    engine: E,
    capacity: usize,
    /// Channel currently being drained; the epoch state (DrainingA/DrainingB).
    draining: Channel,
    /// Word offset of the next unread word in the draining channel. Resets to
    /// 0 exactly when the switch to the other channel is recognized.
    cursor: usize,
}

impl<E: RxEngine> Ring<E> {
    /// Starts continuous reception. Fails with [`EngineError::NoChannel`] when
    /// the platform has no transfer channel left; treat as fatal.
    pub fn new(mut engine: E, config: &RingConfig) -> Result<Self, EngineError> {
        engine.start()?;
        let draining = engine.active_channel();
        Ok(Self {
            engine,
            capacity: config.capacity(),
            draining,
            cursor: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the next complete message frame, in arrival order, if one is
    /// available. Non-blocking; each call re-reads live hardware status.
    pub fn pop_frame(&mut self) -> Result<Option<[Word; MESSAGE_WORDS]>, Overrun> {
        // Rule 1: confirm the write target before interpreting any position.
        let active = self.engine.active_channel();

        if active != self.draining {
            // The hardware moved on, so the draining channel is full. Its tail
            // must be consumed before the cursor may reset (anything left when
            // the epoch flips is gone).
            //
            // If the new channel has already filled past our cursor, more than
            // one capacity of unread data exists and the tail we are about to
            // read may be from a later epoch.
            if self.fill_position(active) > self.cursor {
                self.realign();
                return Err(Overrun);
            }
            if let Some(frame) = self.take(self.draining, self.capacity) {
                return Ok(Some(frame));
            }
            // Tail exhausted: DrainingA -> DrainingB (or the reverse).
            self.draining = active;
            self.cursor = 0;
        }

        let fill = self.fill_position(self.draining);
        if fill < self.cursor {
            // The fill position moved backwards within one epoch: the engine
            // chained through the other channel and back between polls.
            self.realign();
            return Err(Overrun);
        }
        Ok(self.take(self.draining, fill))
    }

    /// Realigns the cursor to the live write position, message aligned.
    ///
    /// Used after an overrun and by the drain loop's desync escalation; words
    /// between the old cursor and the live position are abandoned.
    pub fn resync(&mut self) {
        self.realign();
    }

    /// Stops and rearms the engine from channel A, word 0. The recovery action
    /// for a dead link.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.draining = self.engine.active_channel();
        self.cursor = 0;
    }

    fn fill_position(&self, channel: Channel) -> usize {
        self.capacity - self.engine.remaining_words(channel)
    }

    fn realign(&mut self) {
        let active = self.engine.active_channel();
        let fill = self.fill_position(active);
        self.draining = active;
        self.cursor = fill & !(MESSAGE_WORDS - 1);
        debug!("ring realigned to live write position");
    }

    fn take(&mut self, channel: Channel, fill: usize) -> Option<[Word; MESSAGE_WORDS]> {
        // Rule 2: ">=", never "==". The producer may be any number of whole
        // messages ahead by the time a poll lands.
        if fill - self.cursor >= MESSAGE_WORDS {
            let frame = [
                self.engine.read_word(channel, self.cursor),
                self.engine.read_word(channel, self.cursor + 1),
            ];
            self.cursor += MESSAGE_WORDS;
            Some(frame)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec::Vec;

    use paralink_sim::SimRxEngine;

    use super::*;

    fn make_ring(size_exponent: u8) -> (SimRxEngine, Ring<SimRxEngine>) {
        let config = RingConfig::new(size_exponent).unwrap();
        let wire = SimRxEngine::new(&config);
        let ring = Ring::new(wire.clone(), &config).unwrap();
        (wire, ring)
    }

    fn drain_all(ring: &mut Ring<SimRxEngine>) -> Result<Vec<[Word; MESSAGE_WORDS]>, Overrun> {
        let mut frames = Vec::new();
        while let Some(frame) = ring.pop_frame()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    #[test]
    fn test_empty_ring_yields_nothing() {
        let (_, mut ring) = make_ring(4);
        assert_eq!(ring.pop_frame(), Ok(None));
    }

    #[test]
    fn test_partial_message_withheld() {
        let (wire, mut ring) = make_ring(4);
        wire.push_word(0x1111_1111);
        // one word is half a message; nothing may be read yet
        assert_eq!(ring.pop_frame(), Ok(None));
        wire.push_word(0x2222_2222);
        assert_eq!(ring.pop_frame(), Ok(Some([0x1111_1111, 0x2222_2222])));
    }

    #[test]
    fn test_backlog_drains_in_order() {
        // Producer several whole messages ahead of the last poll: the
        // inequality window must yield all of them (equality would stall).
        let (wire, mut ring) = make_ring(4);
        for n in 0..5u32 {
            wire.push_word(n);
            wire.push_word(n | 0x100);
        }
        let frames = drain_all(&mut ring).unwrap();
        assert_eq!(frames.len(), 5);
        for (n, frame) in frames.iter().enumerate() {
            assert_eq!(*frame, [n as u32, n as u32 | 0x100]);
        }
        assert_eq!(ring.pop_frame(), Ok(None));
    }

    #[test]
    fn test_switch_after_exact_fill() {
        // Fill channel A exactly (capacity 16 words = 8 messages) with no
        // intervening drain. The switch to B happens in hardware; one drain
        // pass extracts everything and continues into B seamlessly.
        let (wire, mut ring) = make_ring(4);
        for n in 0..8u32 {
            wire.push_word(n);
            wire.push_word(!n);
        }
        assert_eq!(wire.active_channel(), Channel::B);

        let frames = drain_all(&mut ring).unwrap();
        assert_eq!(frames.len(), 8);
        assert_eq!(frames[7], [7, !7u32]);

        // Cursor reset to 0 for channel B: the next message lands at its base.
        wire.push_word(0xB0);
        wire.push_word(0xB1);
        assert_eq!(ring.pop_frame(), Ok(Some([0xB0, 0xB1])));
    }

    #[test]
    fn test_switch_with_pending_tail() {
        // Leave half of A undrained, then let the producer run into B. The
        // tail of A must come out before any word of B.
        let (wire, mut ring) = make_ring(4);
        for n in 0..8u32 {
            wire.push_word(0xA000 + n);
            wire.push_word(0xA100 + n);
        }
        // consume 4 of the 8 messages in A
        for _ in 0..4 {
            assert!(ring.pop_frame().unwrap().is_some());
        }
        // producer moves into B
        wire.push_word(0xB000);
        wire.push_word(0xB001);

        let frames = drain_all(&mut ring).unwrap();
        assert_eq!(frames.len(), 5);
        assert_eq!(frames[0], [0xA004, 0xA104]);
        assert_eq!(frames[3], [0xA007, 0xA107]);
        assert_eq!(frames[4], [0xB000, 0xB001]);
    }

    #[test]
    fn test_overrun_on_full_wrap() {
        // Producer writes both channels and wraps back into A between polls:
        // the fill position moves backwards past the cursor.
        let (wire, mut ring) = make_ring(4);
        wire.push_word(1);
        wire.push_word(2);
        assert!(ring.pop_frame().unwrap().is_some());

        // 30 more words: through the rest of A, all of B, and back to the
        // base of A, leaving the fill position behind the cursor
        for n in 0..30u32 {
            wire.push_word(0xDEAD_0000 + n);
        }
        assert_eq!(ring.pop_frame(), Err(Overrun));

        // realigned: the ring keeps working at the live position
        wire.push_word(0xF0);
        wire.push_word(0xF1);
        let frames = drain_all(&mut ring).unwrap();
        assert_eq!(frames.last(), Some(&[0xF0, 0xF1]));
    }

    #[test]
    fn test_overrun_on_switch_gap() {
        // Switch observed while the new channel already filled past the old
        // cursor: more than one capacity of unread data.
        let (wire, mut ring) = make_ring(4);
        for n in 0..10u32 {
            wire.push_word(n);
        }
        assert!(ring.pop_frame().unwrap().is_some()); // cursor = 2

        // finish A (6 words) and fill B past offset 2
        for n in 0..10u32 {
            wire.push_word(0xBB00 + n);
        }
        assert_eq!(ring.pop_frame(), Err(Overrun));
    }

    #[test]
    fn test_reset_rearms_from_channel_a() {
        let (wire, mut ring) = make_ring(4);
        for n in 0..20u32 {
            wire.push_word(n);
        }
        let _ = drain_all(&mut ring);
        ring.reset();
        assert_eq!(wire.active_channel(), Channel::A);
        wire.push_word(0xC0);
        wire.push_word(0xC1);
        assert_eq!(ring.pop_frame(), Ok(Some([0xC0, 0xC1])));
    }
}
