//! The control loop
//!
//! [`Device`] owns every piece of device state and all hardware handles.
//! The platform calls [`Device::tick`] at a fixed cadence with the current
//! time and applies configuration-server commands between ticks with
//! [`Device::apply_config`], so counter state has exactly one writer.
//!
//! Each tick polls, in this order:
//!
//! 1. buttons `Increment`, `Decrement`, `Prostration`, `Next`, `Previous`,
//!    at most one event each
//! 2. the distance sensor, only while the active mode is sensor-driven
//! 3. the autosave timer
//! 4. the power manager
//!
//! Deep sleep ends execution on real hardware. The next boot runs
//! [`Device::boot`] again, which bumps the boot counter and reloads every
//! slot from storage.

use heapless::Vec;

use crate::config::{ApCredentials, DeviceConfig, DeviceSettings, SettingsLoad};
use crate::counter::{CounterError, CounterSlot, CounterStore, LoadReport};
use crate::error::{Fault, HardwareSource, PersistError};
use crate::input::{ButtonId, DebouncedButton, BUTTON_COUNT};
use crate::mode::{
    ConfigCommand, Event, ModeEngine, ModePolicy, Notification, Outcome, RunState, SoundId, View,
};
use crate::power::{PowerManager, PowerState, PowerTransition, WakeCause};
use crate::prostration::{DetectorEvent, DistanceSample, ProstrationDetector};
use crate::time::Instant;
use crate::traits::{ButtonPin, DistanceSensor, PowerControl, SettingsStorage};

/// Maximum notifications reported by one tick
pub const MAX_TICK_NOTIFICATIONS: usize = 24;

/// Flush attempts before sleeping with unsaved counts
pub const SLEEP_FLUSH_ATTEMPTS: u8 = 3;

/// What happened during boot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootReport {
    /// Boot counter after this boot
    pub boot_count: u32,
    /// Why the device started
    pub wake_cause: WakeCause,
    /// Outcome of loading the settings record
    pub settings: SettingsLoad,
    /// Outcome of loading each slot
    pub slots: LoadReport,
    /// Writing the new boot counter failed
    pub boot_persist: Option<PersistError>,
}

/// What happened during one tick or command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Notifications in the order they were produced
    pub notifications: Vec<Notification, MAX_TICK_NOTIFICATIONS>,
    /// Power state change, if any
    pub power: Option<PowerTransition>,
    /// Deep sleep was requested
    pub slept: bool,
}

impl TickReport {
    fn push(&mut self, notification: Notification) {
        let _ = self.notifications.push(notification);
    }

    /// Sound cues requested this tick
    pub fn sounds(&self) -> impl Iterator<Item = SoundId> + '_ {
        self.notifications.iter().filter_map(|n| match n {
            Notification::Sound(id) => Some(*id),
            _ => None,
        })
    }

    /// Check if the display should be redrawn
    pub fn needs_refresh(&self) -> bool {
        self.power.is_some()
            || self
                .notifications
                .iter()
                .any(|n| matches!(n, Notification::Refresh | Notification::ModeChanged(_)))
    }
}

/// Read-only view for rendering and the configuration server
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Snapshot {
    /// Active slot index
    pub active_mode: u8,
    /// Copy of the active slot
    pub slot: CounterSlot,
    /// Power state
    pub power: PowerState,
    /// Edit session state
    pub view: View,
    /// Prostration run state
    pub run: RunState,
    /// Audio feedback enabled
    pub sound_on: bool,
    /// Boot counter
    pub boot_count: u32,
}

/// Faults already reported, so each is notified once per episode
#[derive(Debug, Clone, Default)]
struct FaultLatch {
    buttons: [bool; BUTTON_COUNT],
    sensor: bool,
    persistence: bool,
}

/// The complete device: counting engine plus its hardware
pub struct Device<B, S, St, P> {
    config: DeviceConfig,
    buttons: [DebouncedButton<B>; BUTTON_COUNT],
    sensor: S,
    storage: St,
    power_ctl: P,
    engine: ModeEngine,
    detector: ProstrationDetector,
    power: PowerManager,
    settings: DeviceSettings,
    settings_dirty: bool,
    server_active: bool,
    last_flush: Instant,
    sleep_flush_failures: u8,
    slept: bool,
    faults: FaultLatch,
}

impl<B, S, St, P> Device<B, S, St, P>
where
    B: ButtonPin,
    S: DistanceSensor,
    St: SettingsStorage,
    P: PowerControl,
{
    /// Start the device
    ///
    /// `pins` are in [`ButtonId::ALL`] order. Never fails: unreadable
    /// storage falls back to defaults and is reported in the
    /// [`BootReport`].
    pub fn boot(
        config: DeviceConfig,
        pins: [B; BUTTON_COUNT],
        sensor: S,
        mut storage: St,
        mut power_ctl: P,
        now: Instant,
        wake_cause: WakeCause,
    ) -> (Self, BootReport) {
        let (mut settings, settings_load) = DeviceSettings::load(&mut storage);
        settings.boot_count = settings.boot_count.saturating_add(1);
        let boot_persist = settings.persist(&mut storage).err();

        let (store, slots) = CounterStore::load(&config.slots, &mut storage);
        let engine = ModeEngine::new(store, usize::from(settings.active_mode), settings.sound_on);
        settings.active_mode = engine.active() as u8;

        let long_press_ms = engine.long_press_ms(config.buttons.long_press_ms);
        let mut next_id = ButtonId::ALL.into_iter();
        let mut buttons = pins.map(|pin| {
            let id = next_id.next().unwrap_or(ButtonId::Increment);
            DebouncedButton::new(id, pin, config.buttons.debounce_ms, long_press_ms)
        });
        // Adopt the current levels; the button that woke us is still held
        for button in buttons.iter_mut() {
            let _ = button.poll(now);
        }

        power_ctl.set_brightness(config.power.brightness_max);

        let report = BootReport {
            boot_count: settings.boot_count,
            wake_cause,
            settings: settings_load,
            slots,
            boot_persist,
        };

        let device = Self {
            detector: ProstrationDetector::new(config.prostration),
            power: PowerManager::new(config.power, now),
            config,
            buttons,
            sensor,
            storage,
            power_ctl,
            engine,
            settings,
            settings_dirty: boot_persist.is_some(),
            server_active: false,
            last_flush: now,
            sleep_flush_failures: 0,
            slept: false,
            faults: FaultLatch::default(),
        };

        (device, report)
    }

    /// Run one control-loop iteration
    pub fn tick(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport::default();

        for i in 0..BUTTON_COUNT {
            let id = self.buttons[i].id();
            match self.buttons[i].poll(now) {
                Ok(event) => {
                    self.faults.buttons[i] = false;
                    if let Some(press) = event {
                        self.activity(now, &mut report);
                        if let Some(event) = self.engine.map_press(press) {
                            self.apply_event(event, now, &mut report);
                        }
                    }
                }
                Err(_) => {
                    if !self.faults.buttons[i] {
                        self.faults.buttons[i] = true;
                        report.push(Notification::Fault(Fault::Hardware(HardwareSource::Button(
                            id,
                        ))));
                    }
                }
            }
        }

        if self.engine.policy() == ModePolicy::SensorDriven {
            self.poll_sensor(now, &mut report);
        }

        if (self.engine.store().has_dirty() || self.settings_dirty)
            && now.millis_since(self.last_flush) >= u64::from(self.config.storage.autosave_ms)
        {
            self.flush(now, &mut report);
        }

        let inhibited = self.server_active
            || matches!(self.engine.view(), View::Editing(_))
            || self.engine.is_counting();
        if let Some(transition) = self.power.update(now, inhibited) {
            self.power_changed(transition, &mut report);
        }
        if self.power.state() == PowerState::Sleeping {
            self.enter_sleep(now, &mut report);
        }

        report
    }

    /// Apply a command from the configuration server
    ///
    /// Counts as activity. Rejected slot edits leave everything unchanged.
    pub fn apply_config(
        &mut self,
        command: &ConfigCommand,
        now: Instant,
    ) -> Result<TickReport, CounterError> {
        let mut report = TickReport::default();
        self.activity(now, &mut report);

        match command {
            ConfigCommand::Slot(slot_command) => {
                let before = (self.engine.active(), self.engine.run_state());
                let outcome = self.engine.apply_command(slot_command)?;
                self.absorb(outcome, before, now, &mut report);
            }
            ConfigCommand::SetCredentials(credentials) => {
                self.settings.credentials = credentials.clone();
                self.settings_dirty = true;
                self.flush(now, &mut report);
            }
            ConfigCommand::SetServerActive(active) => {
                self.server_active = *active;
            }
        }

        Ok(report)
    }

    /// Current state for rendering
    pub fn snapshot(&self) -> Snapshot {
        let active = self.engine.active();
        Snapshot {
            active_mode: active as u8,
            slot: self.engine.store().slots()[active].clone(),
            power: self.power.state(),
            view: self.engine.view(),
            run: self.engine.run_state(),
            sound_on: self.engine.sound_on(),
            boot_count: self.settings.boot_count,
        }
    }

    /// All slots, for the configuration server
    pub fn slots(&self) -> &[CounterSlot] {
        self.engine.store().slots()
    }

    /// Current access point credentials
    pub fn credentials(&self) -> &ApCredentials {
        &self.settings.credentials
    }

    /// Time of the last button, sensor or web activity
    pub fn last_activity(&self) -> Instant {
        self.power.last_activity()
    }

    /// Check if the configuration server holds off power saving
    pub fn server_active(&self) -> bool {
        self.server_active
    }

    /// Write everything that changed, now
    ///
    /// Returns false if storage rejected a write; dirty state is kept for
    /// the next attempt.
    pub fn flush_now(&mut self, now: Instant) -> (bool, TickReport) {
        let mut report = TickReport::default();
        let ok = self.flush(now, &mut report);
        (ok, report)
    }

    /// Release the hardware handles, buttons in [`ButtonId::ALL`] order
    ///
    /// Used once deep sleep has been requested and the platform needs the
    /// wake pins back.
    pub fn into_hardware(self) -> ([B; BUTTON_COUNT], S, St, P) {
        (
            self.buttons.map(DebouncedButton::into_pin),
            self.sensor,
            self.storage,
            self.power_ctl,
        )
    }

    fn poll_sensor(&mut self, now: Instant, report: &mut TickReport) {
        let sample = match self.sensor.poll_mm() {
            Ok(Some(mm)) => {
                self.faults.sensor = false;
                DistanceSample::valid(mm, now)
            }
            Ok(None) => return,
            Err(_) => {
                if !self.faults.sensor {
                    self.faults.sensor = true;
                    report.push(Notification::Fault(Fault::Hardware(
                        HardwareSource::DistanceSensor,
                    )));
                }
                DistanceSample::invalid(now)
            }
        };

        match self.detector.update(sample) {
            Some(DetectorEvent::RepetitionCompleted) => {
                self.activity(now, report);
                self.apply_event(Event::RepetitionCompleted, now, report);
            }
            Some(DetectorEvent::LowReached) => report.push(Notification::Refresh),
            None => {}
        }
    }

    fn apply_event(&mut self, event: Event, now: Instant, report: &mut TickReport) {
        let before = (self.engine.active(), self.engine.run_state());
        let outcome = self.engine.apply_event(event);
        self.absorb(outcome, before, now, report);
    }

    /// Fold an engine outcome into the report and keep collaborators in sync
    fn absorb(
        &mut self,
        outcome: Outcome,
        before: (usize, RunState),
        now: Instant,
        report: &mut TickReport,
    ) {
        for notification in outcome.notifications {
            report.push(notification);
        }

        if self.engine.active() != before.0 {
            let long_press_ms = self.engine.long_press_ms(self.config.buttons.long_press_ms);
            for button in self.buttons.iter_mut() {
                button.set_long_press_ms(long_press_ms);
            }
        }
        if self.engine.active() != before.0 || self.engine.run_state() != before.1 {
            if self.engine.is_counting() {
                self.detector.resume(now);
            } else {
                self.detector.pause();
            }
        }

        if outcome.settings_changed {
            self.settings.active_mode = self.engine.active() as u8;
            self.settings.sound_on = self.engine.sound_on();
            self.settings_dirty = true;
        }
        if outcome.flush || outcome.settings_changed {
            self.flush(now, report);
        }
    }

    fn flush(&mut self, now: Instant, report: &mut TickReport) -> bool {
        self.last_flush = now;

        let mut result = Ok(());
        if self.settings_dirty {
            result = self.settings.persist(&mut self.storage);
            if result.is_ok() {
                self.settings_dirty = false;
            }
        }
        if result.is_ok() {
            result = self
                .engine
                .store_mut()
                .persist(&mut self.storage)
                .map(|_| ());
        }

        match result {
            Ok(()) => {
                self.faults.persistence = false;
                true
            }
            Err(e) => {
                if !self.faults.persistence {
                    self.faults.persistence = true;
                    report.push(Notification::Fault(Fault::Persistence(e)));
                }
                false
            }
        }
    }

    fn activity(&mut self, now: Instant, report: &mut TickReport) {
        if let Some(transition) = self.power.record_activity(now) {
            self.power_changed(transition, report);
        }
        self.slept = false;
        self.sleep_flush_failures = 0;
    }

    fn power_changed(&mut self, transition: PowerTransition, report: &mut TickReport) {
        self.power_ctl
            .set_brightness(self.power.brightness_for(transition.to));
        report.power = Some(transition);
    }

    fn enter_sleep(&mut self, now: Instant, report: &mut TickReport) {
        if self.slept {
            return;
        }
        let pending = self.engine.store().has_dirty() || self.settings_dirty;
        if pending && !self.flush(now, report) {
            self.sleep_flush_failures = self.sleep_flush_failures.saturating_add(1);
            if self.sleep_flush_failures < SLEEP_FLUSH_ATTEMPTS {
                return;
            }
        }

        self.slept = true;
        report.slept = true;
        self.power_ctl.set_brightness(0);
        self.power_ctl.deep_sleep(self.config.buttons.wake_mask());
    }
}
