//! Counter slots and their persistence
//!
//! The store is mutated only by the mode engine. Everything else reads
//! snapshots.

pub mod slot;
pub mod store;

pub use slot::{CounterSlot, Decrement, Increment};
pub use store::{CounterError, CounterStore, LoadReport, SlotLoad};
