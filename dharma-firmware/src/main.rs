//! Dharma Counter - Handheld Repetition Counter Firmware
//!
//! Main firmware binary for RP2040-based counters. Counts mantra
//! repetitions on buttons and prostrations on a time-of-flight sensor,
//! keeps every counter in flash across power cycles, and dims then
//! sleeps the device when idle.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_time::Delay;
use {defmt_rtt as _, panic_probe as _};

use dharma_core::config::{parse_config, DeviceConfig, SettingsLoad};
use dharma_core::{BootReport, Device};
use dharma_drivers::sensor::Vl53l0x;

mod board;
mod channels;
mod tasks;

/// Embedded configuration (compiled into firmware)
/// Edit counter.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../counter.toml");

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Dharma Counter firmware starting...");

    let p = embassy_rp::init(Default::default());
    let mut board = board::Board::init(p);

    let wake_cause = board.wake.take_wake_cause();

    let config = match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            // build.rs validates the file, so this only trips on parser drift
            error!("counter.toml line {}: {}, using defaults", e.line, e.kind);
            DeviceConfig::default()
        }
    };

    let mut sensor = Vl53l0x::new(board.sensor_bus);
    match sensor.init(&mut Delay).await {
        Ok(()) => info!("VL53L0X ranging"),
        Err(e) => warn!("VL53L0X unavailable: {}", e),
    }

    let (device, report) = Device::boot(
        config,
        board.buttons,
        sensor,
        board.storage,
        board.power,
        board::now(),
        wake_cause,
    );
    log_boot(&report);

    spawner.spawn(tasks::buzzer_task(board.buzzer)).unwrap();
    spawner.spawn(tasks::control_task(device, board.wake)).unwrap();

    info!("All tasks spawned, firmware running");
}

fn log_boot(report: &BootReport) {
    info!(
        "Boot #{} ({}), slots restored {}/{}",
        report.boot_count,
        report.wake_cause,
        report.slots.restored(),
        report.slots.slots.len()
    );

    match report.settings {
        SettingsLoad::Restored => {}
        SettingsLoad::Missing => info!("No device record, first boot"),
        other => warn!("Device record unusable: {}", other),
    }
    if report.slots.corrupted() > 0 || report.slots.failed() > 0 {
        warn!(
            "Slots reset to defaults: {} corrupted, {} unreadable",
            report.slots.corrupted(),
            report.slots.failed()
        );
    }
    if let Some(e) = report.boot_persist {
        warn!("Boot counter not saved: {}", e);
    }
}
