//! # Paralink
//!
//! A point-to-point streaming link that carries fixed-size parameter messages
//! between two execution domains (two cores, possibly on two boards) over a
//! hardware serializer at wire rate, with no lock shared between the hardware
//! data mover and the software that drains it.
//!
//! ## Architecture
//!
//! ```text
//!  sender domain                                receiver domain
//!
//!  application ──► Message ──► Serializer ──► TxEngine
//!                   (codec)        │              │ wire
//!                                  │              ▼
//!                                  │          RxEngine ── channel A ─┐
//!                                  │           (chained)  channel B ─┤
//!                                  │                                 ▼
//!                                  │                               Ring
//!                                  │                                 │
//!                                  │                             DrainLoop ──► callback
//!                                  │                                 │
//!                                  └───── pacing is caller-side  HealthMonitor ──► telemetry
//! ```
//!
//! Components:
//! * The _codec_ defines the 8-byte wire message: a 32-bit value, a type code,
//!   a magic sentinel and an XOR-fold checksum.
//! * The _[`Serializer`](tx::Serializer)_ hands encoded messages to the
//!   transmit engine and gates each submission on the completion of the
//!   previous transfer, so in-flight word storage is never reused early.
//! * The _[`Ring`](ring::Ring)_ is the receive-side synchronization engine:
//!   the hardware fills two chained channels continuously and switches between
//!   them with no software step; the ring recognizes the switch from live
//!   status reads alone and never reads a word the hardware still owns.
//! * The _[`DrainLoop`](drain::DrainLoop)_ polls the ring, validates frames
//!   through the codec, forwards good payloads and escalates sustained
//!   failure bursts.
//! * The _[`HealthMonitor`](health::HealthMonitor)_ turns drain outcomes into
//!   periodic statistics and a one-shot link-down report.
//!
//! ## Concurrency model
//!
//! Three actors: two non-preemptive software polling loops (one per domain)
//! and the autonomous hardware producer, which behaves as a continuous
//! wire-speed data mover and takes no lock. The only shared state on the
//! receive side is the `{active channel, fill position, drain cursor}` triple;
//! correctness rests on the read-ordering and inequality-drain rules of the
//! [`ring`] module, not on mutual exclusion. Every poll re-reads live hardware
//! status through the [`paralink_driver::engine`] traits; nothing is cached
//! across iterations.
//!
//! There is no in-band cancellation of an in-flight transfer; the health
//! monitor's stall timeout is the sole recovery path for a dead or
//! desynchronized link.
#![no_std]

pub use paralink_core as core;
pub use paralink_driver as driver;
pub use paralink_driver::time;

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod codec;
pub mod drain;
pub mod health;
pub mod ring;
pub mod tx;

pub use codec::{DecodeError, MAGIC, MESSAGE_BYTES, MESSAGE_WORDS, Message};
pub use drain::{DrainLoop, DrainOutcome, LinkCounters};
pub use health::{HealthEvent, HealthMonitor, StatsReport};
pub use ring::{Overrun, Ring};
pub use tx::{Serializer, SubmitError};
