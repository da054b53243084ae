//! Display brightness and deep-sleep control

/// Trait for the platform's power controls
pub trait PowerControl {
    /// Set the display backlight level (0 = off, 255 = full)
    fn set_brightness(&mut self, level: u8);

    /// Enter deep sleep, waking only on the pins set in `wake_mask`
    ///
    /// Called once, after the backlight is off and pending state has been
    /// flushed. The caller stops ticking afterwards; the platform restarts
    /// from boot when a wake pin fires, so an implementation may either
    /// never return or return and let the platform finish the shutdown.
    fn deep_sleep(&mut self, wake_mask: u64);
}
