//! Paralink driver interface
//!
//! The crate provides an interface between a transfer-peripheral driver and the
//! Paralink stack. Limited scope facilitates compatibility across versions.
//! Driver crates should depend on this crate. Paralink stack users should depend
//! on the `paralink` crate instead.
//!
//! A driver wraps the platform's serializer/deserializer peripheral and its
//! transfer engine (a DMA-like data mover) behind two traits:
//! * [`engine::RxEngine`] exposes the receive-side double-buffer ring: which
//!   channel the hardware is currently filling, how far it has filled it, and
//!   the words it has written.
//! * [`engine::TxEngine`] accepts word blocks for asynchronous transmission and
//!   reports whether a prior transfer is still in flight.
//!
//! Unlike channel-based network stacks, Paralink pulls data out of the hardware
//! by polling. The hardware producer participates in no software lock; the
//! stack's correctness rests on the register-read ordering contracts documented
//! on the traits, so implementations must answer every status query with a live
//! register read and never a cached value.

#![no_std]

pub mod config;
pub mod engine;

pub mod time {
    pub use embassy_time::{Duration, Instant};
}
