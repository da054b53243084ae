//! Configuration types
//!
//! Tunables come from the embedded `counter.toml`; runtime state that must
//! survive power cycles is stored as postcard-encoded records with a CRC.

pub mod credentials;
pub mod record;
pub mod settings;
pub mod slots;
pub mod toml;
pub mod types;

pub use credentials::{ApCredentials, CredentialsError, MAX_PASSWORD_LEN, MAX_SSID_LEN};
pub use record::{DeviceRecord, RecordError, SlotRecord, MAX_RECORD_SIZE};
pub use settings::{DeviceSettings, SettingsLoad};
pub use slots::{default_slots, SlotDefault, SlotKind, MODES, PROSTRATIONS};
pub use toml::{parse_config, ConfigParseError, ParseErrorKind};
pub use types::*;
