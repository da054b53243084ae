//! Monotonic time
//!
//! The core never reads a hardware clock itself. The control loop owner
//! passes the current [`Instant`] into every tick, so tests can drive time
//! deterministically.

/// A point on the monotonic clock, in milliseconds since boot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Instant(u64);

impl Instant {
    /// The clock origin
    pub const ZERO: Instant = Instant(0);

    /// Create an instant from milliseconds since boot
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Milliseconds since boot
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Milliseconds elapsed from `earlier` to `self`
    ///
    /// Returns 0 if `earlier` is actually later.
    pub const fn millis_since(self, earlier: Instant) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Offset this instant forward
    pub const fn plus_millis(self, ms: u64) -> Self {
        Self(self.0.saturating_add(ms))
    }
}
