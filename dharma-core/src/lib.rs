//! Board-agnostic core logic for the Dharma Counter firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (button pins, distance sensor, storage, power)
//! - Debounced button sources
//! - Prostration detection from distance samples
//! - Counter store with persistence records
//! - Mode engine state machine
//! - Power management state machine
//! - The control loop tying them together
//! - Configuration type definitions and the `counter.toml` parser

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod counter;
pub mod device;
pub mod error;
pub mod input;
pub mod mode;
pub mod power;
pub mod prostration;
pub mod time;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use device::{BootReport, Device, Snapshot, TickReport};
pub use error::Fault;
pub use time::Instant;
