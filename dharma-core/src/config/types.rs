//! Configuration type definitions
//!
//! Defaults match the reference device. Any of them can be overridden in
//! `counter.toml`.

use heapless::String;

use super::slots::{default_slots, SlotDefault, MODES};

/// Maximum slot title length in bytes (UTF-8)
pub const MAX_TITLE_LEN: usize = 32;

/// Slot title storage
pub type Title = String<MAX_TITLE_LEN>;

/// Build a title from text, truncating at a character boundary
pub fn make_title(text: &str) -> Title {
    let mut title = Title::new();
    for ch in text.chars() {
        if title.push(ch).is_err() {
            break;
        }
    }
    title
}

/// Button timing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonConfig {
    /// Raw level must stay unchanged this long to be accepted (ms)
    pub debounce_ms: u16,
    /// Hold time that turns a press into a long press (ms)
    ///
    /// Doubled for tally counter modes.
    pub long_press_ms: u16,
    /// GPIO number of the button that wakes the device from deep sleep
    pub wake_pin: u8,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 35,
            long_press_ms: 700,
            wake_pin: 2,
        }
    }
}

impl ButtonConfig {
    /// Wake pin as a deep-sleep pin mask
    pub fn wake_mask(&self) -> u64 {
        1u64 << (self.wake_pin & 63)
    }
}

/// Prostration detection configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProstrationConfig {
    /// Maximum distance for low position detection (mm)
    pub distance_mm: u16,
    /// Minimum time in low position (ms)
    pub low_time_ms: u16,
    /// Minimum time in stand-up position (ms)
    pub stand_up_time_ms: u16,
}

impl Default for ProstrationConfig {
    fn default() -> Self {
        Self {
            distance_mm: 700,
            low_time_ms: 300,
            stand_up_time_ms: 500,
        }
    }
}

/// Power saving configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerConfig {
    /// Enable dimming and deep sleep on inactivity
    pub power_save: bool,
    /// Idle time before dimming the display (ms)
    pub dim_time_ms: u32,
    /// Further idle time after dimming before deep sleep (ms)
    pub sleep_time_ms: u32,
    /// Backlight level while active
    pub brightness_max: u8,
    /// Backlight level while dimmed
    pub brightness_dim: u8,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            power_save: true,
            dim_time_ms: 20_000,
            sleep_time_ms: 20_000,
            brightness_max: 255,
            brightness_dim: 24,
        }
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StorageConfig {
    /// Flush dirty counters at most this often (ms)
    pub autosave_ms: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { autosave_ms: 60_000 }
    }
}

/// Complete device configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfig {
    /// Button timing
    pub buttons: ButtonConfig,
    /// Prostration detection
    pub prostration: ProstrationConfig,
    /// Power saving
    pub power: PowerConfig,
    /// Persistence
    pub storage: StorageConfig,
    /// Initial slot table, used when nothing is persisted yet
    pub slots: [SlotDefault; MODES],
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            buttons: ButtonConfig::default(),
            prostration: ProstrationConfig::default(),
            power: PowerConfig::default(),
            storage: StorageConfig::default(),
            slots: default_slots(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_title_truncates_on_char_boundary() {
        // 11 three-byte bullets = 33 bytes, one too many
        let text = "•••••••••••";
        let title = make_title(text);
        assert_eq!(title.len(), 30);
        assert_eq!(title.chars().count(), 10);
    }

    #[test]
    fn test_wake_mask() {
        let buttons = ButtonConfig::default();
        assert_eq!(buttons.wake_mask(), 0x4);
    }
}
