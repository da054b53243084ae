//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in dharma-core, written against `embedded-hal` 1.0 so they work with
//! any chip HAL:
//!
//! - Debounce-ready GPIO button adapter
//! - VL53L0X time-of-flight distance sensor
//! - PWM display backlight

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod backlight;
pub mod button;
pub mod sensor;
