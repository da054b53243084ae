//! Build script for dharma-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates counter.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Counter modes on the device
const MODES: i64 = 14;

/// Longest slot title in bytes
const MAX_TITLE_LEN: usize = 32;

/// Keys accepted per section, with their inclusive integer range
/// (`None` for booleans)
const BUTTON_KEYS: &[(&str, Option<(i64, i64)>)] = &[
    ("debounce_ms", Some((1, 1_000))),
    ("long_press_ms", Some((100, 10_000))),
    ("wake_pin", Some((0, 29))),
];

const PROSTRATION_KEYS: &[(&str, Option<(i64, i64)>)] = &[
    ("distance_mm", Some((50, 2_000))),
    ("low_time_ms", Some((1, 10_000))),
    ("stand_up_time_ms", Some((1, 10_000))),
];

const POWER_KEYS: &[(&str, Option<(i64, i64)>)] = &[
    ("power_save", None),
    ("dim_time_ms", Some((1_000, 3_600_000))),
    ("sleep_time_ms", Some((1_000, 3_600_000))),
    ("brightness_max", Some((1, 255))),
    ("brightness_dim", Some((0, 255))),
];

const STORAGE_KEYS: &[(&str, Option<(i64, i64)>)] = &[("autosave_ms", Some((1_000, 3_600_000)))];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate counter.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=counter.toml");

    let config_path = Path::new("counter.toml");
    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read counter.toml", &[e.to_string()]),
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => fail(
            "Invalid TOML syntax in counter.toml",
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    };

    let root = match config.as_table() {
        Some(t) => t,
        None => fail("counter.toml must be a table", &[]),
    };

    let mut errors = Vec::new();
    for (section, value) in root {
        match section.as_str() {
            "buttons" => check_section(section, value, BUTTON_KEYS, &mut errors),
            "prostration" => check_section(section, value, PROSTRATION_KEYS, &mut errors),
            "power" => check_section(section, value, POWER_KEYS, &mut errors),
            "storage" => check_section(section, value, STORAGE_KEYS, &mut errors),
            "slot" => check_slots(value, &mut errors),
            other => errors.push(format!("unknown section [{}]", other)),
        }
    }

    if let Some(power) = root.get("power") {
        let max = power.get("brightness_max").and_then(|v| v.as_integer());
        let dim = power.get("brightness_dim").and_then(|v| v.as_integer());
        if let (Some(max), Some(dim)) = (max, dim) {
            if dim > max {
                errors.push("[power] brightness_dim must not exceed brightness_max".into());
            }
        }
    }

    if !errors.is_empty() {
        fail("Invalid configuration in counter.toml", &errors);
    }

    println!("cargo:warning=counter.toml validated successfully");
}

fn check_section(
    section: &str,
    value: &toml::Value,
    keys: &[(&str, Option<(i64, i64)>)],
    errors: &mut Vec<String>,
) {
    let table = match value.as_table() {
        Some(t) => t,
        None => {
            errors.push(format!("[{}] must be a table", section));
            return;
        }
    };

    for (key, value) in table {
        let range = match keys.iter().find(|(name, _)| *name == key.as_str()) {
            Some((_, range)) => *range,
            None => {
                errors.push(format!("[{}] unknown key '{}'", section, key));
                continue;
            }
        };

        match (range, value) {
            (None, toml::Value::Boolean(_)) => {}
            (None, _) => errors.push(format!("[{}] {} must be true or false", section, key)),
            (Some((lo, hi)), toml::Value::Integer(n)) => {
                if *n < lo || *n > hi {
                    errors.push(format!("[{}] {} must be {}-{}", section, key, lo, hi));
                }
            }
            (Some(_), _) => errors.push(format!("[{}] {} must be an integer", section, key)),
        }
    }
}

fn check_slots(value: &toml::Value, errors: &mut Vec<String>) {
    let slots = match value.as_table() {
        Some(t) => t,
        None => {
            errors.push("[slot] must contain [slot.N] tables".into());
            return;
        }
    };

    for (index, slot) in slots {
        let name = format!("[slot.{}]", index);
        match index.parse::<i64>() {
            Ok(i) if (0..MODES).contains(&i) => {}
            _ => errors.push(format!("{} index must be 0-{}", name, MODES - 1)),
        }

        let slot = match slot.as_table() {
            Some(t) => t,
            None => {
                errors.push(format!("{} must be a table", name));
                continue;
            }
        };

        for (key, value) in slot {
            match (key.as_str(), value) {
                ("title", toml::Value::String(title)) => {
                    if title.is_empty() || title.len() > MAX_TITLE_LEN {
                        errors.push(format!("{} title must be 1-{} bytes", name, MAX_TITLE_LEN));
                    }
                }
                ("max", toml::Value::Integer(max)) => {
                    if *max < 1 || *max > i64::from(u32::MAX) {
                        errors.push(format!("{} max must be at least 1", name));
                    }
                }
                ("visible", toml::Value::Boolean(_)) => {}
                ("title" | "max" | "visible", _) => {
                    errors.push(format!("{} {} has the wrong type", name, key))
                }
                _ => errors.push(format!("{} unknown key '{}'", name, key)),
            }
        }
    }
}

/// Abort the build with a boxed report
fn fail(title: &str, lines: &[String]) -> ! {
    let body = lines
        .iter()
        .map(|line| {
            let truncated = if line.chars().count() > 62 {
                format!("{}...", line.chars().take(59).collect::<String>())
            } else {
                line.to_string()
            };
            format!("║  • {:<62} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n");

    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title, body
    );
}
