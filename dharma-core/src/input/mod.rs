//! Button input
//!
//! Turns raw, bouncing pin levels into clean press events. One
//! [`DebouncedButton`] exists per physical button; they share no state.

pub mod buttons;
pub mod debounce;

pub use buttons::{ButtonId, PressEvent, PressKind, BUTTON_COUNT};
pub use debounce::DebouncedButton;
