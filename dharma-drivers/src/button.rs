//! GPIO button adapter
//!
//! Wraps an `embedded-hal` input pin so the core's debouncer can read it.
//! Polarity is resolved here: the core only ever sees "pressed".

use dharma_core::traits::{ButtonPin, PinError};
use embedded_hal::digital::InputPin;

/// Which level means "pressed"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Button pulls the pin to ground (pull-up wiring)
    ActiveLow,
    /// Button pulls the pin high (pull-down wiring)
    ActiveHigh,
}

/// A push button on a GPIO input
pub struct GpioButton<P> {
    pin: P,
    polarity: Polarity,
}

impl<P: InputPin> GpioButton<P> {
    /// Create a button on `pin`
    pub fn new(pin: P, polarity: Polarity) -> Self {
        Self { pin, polarity }
    }

    /// Button wired to ground with a pull-up
    pub fn active_low(pin: P) -> Self {
        Self::new(pin, Polarity::ActiveLow)
    }

    /// Give the pin back
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: InputPin> ButtonPin for GpioButton<P> {
    fn is_pressed(&mut self) -> Result<bool, PinError> {
        let high = self.pin.is_high().map_err(|_| PinError::ReadFailed)?;
        Ok(match self.polarity {
            Polarity::ActiveLow => !high,
            Polarity::ActiveHigh => high,
        })
    }
}
