//! Control task
//!
//! Owns the [`CounterDevice`] and ticks it at a fixed cadence. Sound cues
//! go to the buzzer task; configuration commands are applied between
//! ticks, so counter state has a single writer.
//!
//! When the device requests deep sleep the task stops ticking, takes the
//! button pins back and parks until a wake button restarts the chip.

use defmt::*;
use embassy_time::{Duration, Ticker};

use dharma_core::mode::Notification;
use dharma_core::TickReport;
use dharma_hal_rp2040::{WakeControl, WakePin};

use crate::board::{self, CounterDevice, BUTTON_GPIOS};
use crate::channels::{CONFIG_CHANNEL, SOUND_CHANNEL};

/// Tick interval in milliseconds
pub const TICK_INTERVAL_MS: u64 = 10;

#[embassy_executor::task]
pub async fn control_task(mut device: CounterDevice, wake: WakeControl) {
    info!("Control task started");

    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));

    loop {
        ticker.next().await;
        let now = board::now();

        while let Ok(command) = CONFIG_CHANNEL.try_receive() {
            match device.apply_config(&command, now) {
                Ok(report) => dispatch(&device, &report),
                Err(e) => warn!("Config command rejected: {}", e),
            }
        }

        let report = device.tick(now);
        dispatch(&device, &report);
        if report.slept {
            break;
        }
    }

    sleep(device, wake).await
}

/// Forward one report's effects to the other tasks
fn dispatch(device: &CounterDevice, report: &TickReport) {
    if let Some(transition) = report.power {
        info!("Power {} -> {}", transition.from, transition.to);
    }

    for notification in &report.notifications {
        match notification {
            Notification::Sound(sound) => {
                if SOUND_CHANNEL.try_send(*sound).is_err() {
                    debug!("Sound queue full, dropped {}", sound);
                }
            }
            Notification::ModeChanged(mode) => info!("Mode {}", mode),
            Notification::Fault(fault) => warn!("Fault: {}", fault),
            Notification::Refresh => {}
        }
    }

    if report.needs_refresh() {
        let snapshot = device.snapshot();
        debug!(
            "[{}] {} {}/{} ({})",
            snapshot.active_mode,
            snapshot.slot.title.as_str(),
            snapshot.slot.value,
            snapshot.slot.max_value,
            snapshot.run
        );
    }
}

async fn sleep(device: CounterDevice, wake: WakeControl) -> ! {
    let (buttons, mut sensor, _storage, power) = device.into_hardware();
    if sensor.is_running() && sensor.stop().is_err() {
        warn!("Distance sensor did not stop");
    }

    let wake_mask = power.sleep_request().unwrap_or(0);
    info!("Entering deep sleep, wake mask {=u64:#x}", wake_mask);

    let [inc, dec, prs, nxt, prv] = buttons.map(|button| button.release());
    let [g_inc, g_dec, g_prs, g_nxt, g_prv] = BUTTON_GPIOS;
    let mut pins = [
        WakePin::new(g_inc, inc),
        WakePin::new(g_dec, dec),
        WakePin::new(g_prs, prs),
        WakePin::new(g_nxt, nxt),
        WakePin::new(g_prv, prv),
    ];

    wake.sleep_until_wake(&mut pins, wake_mask).await
}
