//! RP2040-specific HAL for the counter firmware
//!
//! This crate provides RP2040 implementations of the `dharma-core`
//! platform traits that need chip peripherals directly:
//!
//! - Flash storage driver (implements `dharma_core::traits::SettingsStorage`)
//! - Wake-from-sleep handling on the watchdog scratch registers

#![no_std]
#![deny(unsafe_code)]

pub mod flash;
pub mod sleep;

pub use flash::Rp2040FlashStorage;
pub use sleep::{WakeControl, WakePin};
