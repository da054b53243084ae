//! Minimal TOML parser for `counter.toml`
//!
//! Handles only the subset the counter configuration needs. It does NOT
//! support the full TOML spec.
//!
//! Supported features:
//! - Key = value pairs (string, integer, boolean)
//! - [section] headers
//! - [slot.N] headers for per-slot overrides
//! - Comments (# ...), including trailing comments
//!
//! NOT supported:
//! - Arrays and inline tables
//! - Multi-line strings and escape sequences
//! - Dotted keys outside section headers
//!
//! Anything not mentioned in the file keeps its default from
//! [`DeviceConfig::default`].

use super::slots::MODES;
use super::types::{DeviceConfig, Title, MAX_TITLE_LEN};

/// What went wrong on a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseErrorKind {
    /// Unknown or malformed section header
    InvalidSection,
    /// Slot index outside the slot table
    SlotOutOfRange,
    /// Key not valid in the current section
    UnknownKey,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// Line is neither a header nor a `key = value` pair
    InvalidLine,
}

/// Parse error with the 1-based line it occurred on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigParseError {
    /// Line number, starting at 1
    pub line: usize,
    /// Error kind
    pub kind: ParseErrorKind,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Buttons,
    Prostration,
    Power,
    Storage,
    Slot(usize),
}

/// Parse TOML configuration into a DeviceConfig
pub fn parse_config(input: &str) -> Result<DeviceConfig, ConfigParseError> {
    let mut config = DeviceConfig::default();
    let mut section = Section::Root;

    for (number, line) in input.lines().enumerate() {
        let at = |kind| ConfigParseError {
            line: number + 1,
            kind,
        };
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            let header = strip_comment(line);
            if !header.ends_with(']') {
                return Err(at(ParseErrorKind::InvalidSection));
            }
            section = parse_section_header(&header[1..header.len() - 1]).map_err(at)?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(at(ParseErrorKind::InvalidLine))?;
        apply_value(section, key, value, &mut config).map_err(at)?;
    }

    Ok(config)
}

/// Parse a section header like "power" or "slot.4"
fn parse_section_header(header: &str) -> Result<Section, ParseErrorKind> {
    let header = header.trim();

    if let Some(index) = header.strip_prefix("slot.") {
        let index: usize = index
            .trim()
            .parse()
            .map_err(|_| ParseErrorKind::InvalidSection)?;
        if index >= MODES {
            return Err(ParseErrorKind::SlotOutOfRange);
        }
        return Ok(Section::Slot(index));
    }

    match header {
        "buttons" => Ok(Section::Buttons),
        "prostration" => Ok(Section::Prostration),
        "power" => Ok(Section::Power),
        "storage" => Ok(Section::Storage),
        _ => Err(ParseErrorKind::InvalidSection),
    }
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut DeviceConfig,
) -> Result<(), ParseErrorKind> {
    match section {
        Section::Root => return Err(ParseErrorKind::UnknownKey),
        Section::Buttons => {
            let buttons = &mut config.buttons;
            match key {
                "debounce_ms" => buttons.debounce_ms = parse_int(value)?,
                "long_press_ms" => buttons.long_press_ms = parse_nonzero(value)?,
                "wake_pin" => {
                    let pin: u8 = parse_int(value)?;
                    if pin > 63 {
                        return Err(ParseErrorKind::InvalidValue);
                    }
                    buttons.wake_pin = pin;
                }
                _ => return Err(ParseErrorKind::UnknownKey),
            }
        }
        Section::Prostration => {
            let prostration = &mut config.prostration;
            match key {
                "distance_mm" => prostration.distance_mm = parse_nonzero(value)?,
                "low_time_ms" => prostration.low_time_ms = parse_int(value)?,
                "stand_up_time_ms" => prostration.stand_up_time_ms = parse_int(value)?,
                _ => return Err(ParseErrorKind::UnknownKey),
            }
        }
        Section::Power => {
            let power = &mut config.power;
            match key {
                "power_save" => power.power_save = parse_bool(value)?,
                "dim_time_ms" => power.dim_time_ms = parse_int(value)?,
                "sleep_time_ms" => power.sleep_time_ms = parse_int(value)?,
                "brightness_max" => power.brightness_max = parse_int(value)?,
                "brightness_dim" => power.brightness_dim = parse_int(value)?,
                _ => return Err(ParseErrorKind::UnknownKey),
            }
        }
        Section::Storage => match key {
            "autosave_ms" => config.storage.autosave_ms = parse_nonzero(value)?,
            _ => return Err(ParseErrorKind::UnknownKey),
        },
        Section::Slot(index) => {
            let slot = &mut config.slots[index];
            match key {
                "title" => slot.title = parse_title(value)?,
                "max" => slot.max_value = parse_nonzero(value)?,
                "visible" => slot.visible = parse_bool(value)?,
                _ => return Err(ParseErrorKind::UnknownKey),
            }
        }
    }
    Ok(())
}

/// Drop a trailing comment that is not inside a string
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (pos, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return line[..pos].trim_end(),
            _ => {}
        }
    }
    line
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let line = strip_comment(line);
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a quoted string value
fn parse_string(value: &str) -> Result<&str, ParseErrorKind> {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        Ok(&value[1..value.len() - 1])
    } else {
        Err(ParseErrorKind::InvalidValue)
    }
}

fn parse_title(value: &str) -> Result<Title, ParseErrorKind> {
    let text = parse_string(value)?;
    if text.is_empty() || text.len() > MAX_TITLE_LEN {
        return Err(ParseErrorKind::InvalidValue);
    }
    Title::try_from(text).map_err(|_| ParseErrorKind::InvalidValue)
}

/// Parse an integer value, allowing `_` digit separators
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseErrorKind> {
    let mut digits = heapless::String::<20>::new();
    for ch in value.chars().filter(|&c| c != '_') {
        digits.push(ch).map_err(|_| ParseErrorKind::InvalidValue)?;
    }
    digits.parse().map_err(|_| ParseErrorKind::InvalidValue)
}

fn parse_nonzero<T>(value: &str) -> Result<T, ParseErrorKind>
where
    T: core::str::FromStr + Default + PartialEq,
{
    let n: T = parse_int(value)?;
    if n == T::default() {
        return Err(ParseErrorKind::InvalidValue);
    }
    Ok(n)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ParseErrorKind> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseErrorKind::InvalidValue),
    }
}
