//! Raw button pin access

/// Errors that can occur reading a button pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin is not configured or has been released
    Unavailable,
    /// The read itself failed (e.g. I/O expander did not answer)
    ReadFailed,
}

/// Trait for a raw, undebounced button level
///
/// Implementations translate pin polarity, so `true` always means
/// "held down" regardless of pull-up or pull-down wiring.
pub trait ButtonPin {
    /// Read the current raw level
    ///
    /// Must not block; this is called once per control-loop tick.
    fn is_pressed(&mut self) -> Result<bool, PinError>;
}

/// Any closure returning a raw level can act as a button pin
impl<F> ButtonPin for F
where
    F: FnMut() -> Result<bool, PinError>,
{
    fn is_pressed(&mut self) -> Result<bool, PinError> {
        self()
    }
}
