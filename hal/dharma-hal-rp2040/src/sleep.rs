//! Deep sleep and wake detection
//!
//! The RP2040 has no wake-to-resume path that keeps embassy state, so
//! sleeping means: mark the watchdog scratch register, wait with the
//! executor idle until a wake button goes low, then reset. The next boot
//! reads the marker to tell a button wake from a cold power-on.

use dharma_core::power::WakeCause;
use embassy_futures::select::select_array;
use embassy_rp::gpio::Input;
use embassy_rp::peripherals::WATCHDOG;
use embassy_rp::watchdog::Watchdog;
use embassy_rp::Peri;

/// Scratch register holding the sleep marker
const MARKER_SCRATCH: usize = 0;
/// Written before sleeping; survives the watchdog reset
const SLEEP_MARKER: u32 = 0xD4A2_5EE9;

/// A button input tagged with its GPIO number
pub struct WakePin<'d> {
    pub gpio: u8,
    pub input: Input<'d>,
}

impl<'d> WakePin<'d> {
    pub fn new(gpio: u8, input: Input<'d>) -> Self {
        Self { gpio, input }
    }

    fn armed(&self, wake_mask: u64) -> bool {
        self.gpio < 64 && wake_mask & (1 << self.gpio) != 0
    }
}

/// Owns the watchdog for sleep markers and restart
pub struct WakeControl {
    watchdog: Watchdog,
}

impl WakeControl {
    pub fn new(watchdog: Peri<'static, WATCHDOG>) -> Self {
        Self {
            watchdog: Watchdog::new(watchdog),
        }
    }

    /// Why this boot happened
    ///
    /// Consumes the marker, so a later reset for any other reason reads
    /// as a power-on.
    pub fn take_wake_cause(&mut self) -> WakeCause {
        let marker = self.watchdog.get_scratch(MARKER_SCRATCH);
        self.watchdog.set_scratch(MARKER_SCRATCH, 0);
        if marker == SLEEP_MARKER {
            WakeCause::WakeButton
        } else {
            WakeCause::PowerOn
        }
    }

    /// Sleep until a pin in `wake_mask` is pressed, then restart
    ///
    /// Buttons are active low. If no pin matches the mask, any button
    /// wakes the device.
    pub async fn sleep_until_wake<const N: usize>(
        mut self,
        pins: &mut [WakePin<'_>; N],
        wake_mask: u64,
    ) -> ! {
        let any_armed = pins.iter().any(|p| p.armed(wake_mask));
        let waits = pins.each_mut().map(|pin| {
            let armed = !any_armed || pin.armed(wake_mask);
            wait_pressed(pin, armed)
        });

        self.watchdog.set_scratch(MARKER_SCRATCH, SLEEP_MARKER);
        select_array(waits).await;

        self.watchdog.trigger_reset();
        loop {
            cortex_m::asm::wfi();
        }
    }
}

async fn wait_pressed(pin: &mut WakePin<'_>, armed: bool) {
    if armed {
        pin.input.wait_for_low().await;
    } else {
        core::future::pending::<()>().await;
    }
}
