//! PWM display backlight
//!
//! Maps the core's 0-255 brightness scale onto whatever duty-cycle range
//! the PWM channel has.

use embedded_hal::pwm::SetDutyCycle;

/// Backlight LED driven by one PWM channel
pub struct PwmBacklight<P> {
    pwm: P,
    level: u8,
}

impl<P: SetDutyCycle> PwmBacklight<P> {
    /// Create a backlight, initially off
    pub fn new(pwm: P) -> Self {
        Self { pwm, level: 0 }
    }

    /// Set brightness (0 = off, 255 = full)
    pub fn set_level(&mut self, level: u8) -> Result<(), P::Error> {
        self.pwm.set_duty_cycle_fraction(u16::from(level), 255)?;
        self.level = level;
        Ok(())
    }

    /// Last brightness applied
    pub fn level(&self) -> u8 {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::pwm::ErrorType;

    struct FakePwm {
        duty: u16,
    }

    impl ErrorType for FakePwm {
        type Error = Infallible;
    }

    impl SetDutyCycle for FakePwm {
        fn max_duty_cycle(&self) -> u16 {
            1000
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
            self.duty = duty;
            Ok(())
        }
    }

    #[test]
    fn test_levels_scale_to_duty() {
        let mut backlight = PwmBacklight::new(FakePwm { duty: 0 });
        backlight.set_level(255).unwrap();
        assert_eq!(backlight.pwm.duty, 1000);
        backlight.set_level(24).unwrap();
        assert_eq!(backlight.pwm.duty, 94);
        assert_eq!(backlight.level(), 24);
        backlight.set_level(0).unwrap();
        assert_eq!(backlight.pwm.duty, 0);
    }
}
