//! Persisted record formats
//!
//! Each counter slot and the device settings are stored as one complete
//! postcard-encoded record with a header and CRC, so a record is either
//! read back whole or rejected.

use serde::{Deserialize, Serialize};

use super::credentials::ApCredentials;
use super::types::Title;

/// Magic number to identify valid records
pub const RECORD_MAGIC: u16 = 0x4443; // "DC"

/// Current record format version
pub const RECORD_VERSION: u8 = 2;

/// Maximum encoded record size
pub const MAX_RECORD_SIZE: usize = 192;

/// Record encoding and validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordError {
    /// Serialization failed
    Serialize,
    /// Deserialization failed
    Deserialize,
    /// Invalid magic or version
    InvalidFormat,
    /// CRC check failed
    CrcMismatch,
    /// Record belongs to a different slot
    WrongSlot,
}

/// One counter slot as stored in flash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRecord {
    magic: u16,
    version: u8,
    /// Slot index this record belongs to
    pub index: u8,
    /// Display title
    pub title: Title,
    /// Current count
    pub value: u32,
    /// Goal value
    pub max_value: u32,
    /// Shown in mode navigation
    pub visible: bool,
    /// Goal cue already given since the last reset
    pub goal_reached: bool,
    /// Overflow already reported
    pub saturated: bool,
    crc: u32,
}

impl SlotRecord {
    /// Create a record with a valid header and CRC
    ///
    /// The latches start as a fresh slot at `value` would have them; use
    /// [`SlotRecord::with_latches`] to carry a live slot's state.
    pub fn new(index: u8, title: Title, value: u32, max_value: u32, visible: bool) -> Self {
        let mut record = Self {
            magic: RECORD_MAGIC,
            version: RECORD_VERSION,
            index,
            title,
            value,
            max_value,
            visible,
            goal_reached: value >= max_value,
            saturated: value == u32::MAX,
            crc: 0,
        };
        record.crc = record.calculate_crc();
        record
    }

    /// Replace the goal and overflow latches, keeping the CRC valid
    pub fn with_latches(mut self, goal_reached: bool, saturated: bool) -> Self {
        self.goal_reached = goal_reached;
        self.saturated = saturated;
        self.crc = self.calculate_crc();
        self
    }

    /// Calculate CRC32 over all fields except the crc itself
    pub fn calculate_crc(&self) -> u32 {
        let mut crc: u32 = 0xFFFFFFFF;
        crc = crc32_update(crc, &self.magic.to_le_bytes());
        crc = crc32_update(crc, &[self.version, self.index]);
        crc = crc32_update(crc, self.title.as_bytes());
        crc = crc32_update(crc, &self.value.to_le_bytes());
        crc = crc32_update(crc, &self.max_value.to_le_bytes());
        crc = crc32_update(
            crc,
            &[self.visible as u8, self.goal_reached as u8, self.saturated as u8],
        );
        !crc
    }

    /// Encode into `buffer`, returning the used bytes
    pub fn encode<'a>(&self, buffer: &'a mut [u8]) -> Result<&'a [u8], RecordError> {
        postcard::to_slice(self, buffer)
            .map(|bytes| &*bytes)
            .map_err(|_| RecordError::Serialize)
    }

    /// Decode and validate a record for slot `index`
    pub fn decode(bytes: &[u8], index: u8) -> Result<Self, RecordError> {
        let record: SlotRecord =
            postcard::from_bytes(bytes).map_err(|_| RecordError::Deserialize)?;

        if record.magic != RECORD_MAGIC || record.version != RECORD_VERSION {
            return Err(RecordError::InvalidFormat);
        }
        if record.crc != record.calculate_crc() {
            return Err(RecordError::CrcMismatch);
        }
        if record.index != index {
            return Err(RecordError::WrongSlot);
        }
        Ok(record)
    }
}

/// Device-wide settings as stored in flash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    magic: u16,
    version: u8,
    /// Last active mode index
    pub active_mode: u8,
    /// Audio feedback enabled
    pub sound_on: bool,
    /// Number of boots, including wakes from deep sleep
    pub boot_count: u32,
    /// Configuration access point credentials
    pub credentials: ApCredentials,
    crc: u32,
}

impl DeviceRecord {
    /// Create a record with a valid header and CRC
    pub fn new(
        active_mode: u8,
        sound_on: bool,
        boot_count: u32,
        credentials: ApCredentials,
    ) -> Self {
        let mut record = Self {
            magic: RECORD_MAGIC,
            version: RECORD_VERSION,
            active_mode,
            sound_on,
            boot_count,
            credentials,
            crc: 0,
        };
        record.crc = record.calculate_crc();
        record
    }

    /// Calculate CRC32 over all fields except the crc itself
    pub fn calculate_crc(&self) -> u32 {
        let mut crc: u32 = 0xFFFFFFFF;
        crc = crc32_update(crc, &self.magic.to_le_bytes());
        crc = crc32_update(crc, &[self.version, self.active_mode, self.sound_on as u8]);
        crc = crc32_update(crc, &self.boot_count.to_le_bytes());
        crc = crc32_update(crc, self.credentials.ssid().as_bytes());
        // Separator so ("ab", "c") and ("a", "bc") differ
        crc = crc32_update(crc, &[0]);
        crc = crc32_update(crc, self.credentials.password().as_bytes());
        !crc
    }

    /// Encode into `buffer`, returning the used bytes
    pub fn encode<'a>(&self, buffer: &'a mut [u8]) -> Result<&'a [u8], RecordError> {
        postcard::to_slice(self, buffer)
            .map(|bytes| &*bytes)
            .map_err(|_| RecordError::Serialize)
    }

    /// Decode and validate a device record
    pub fn decode(bytes: &[u8]) -> Result<Self, RecordError> {
        let record: DeviceRecord =
            postcard::from_bytes(bytes).map_err(|_| RecordError::Deserialize)?;

        if record.magic != RECORD_MAGIC || record.version != RECORD_VERSION {
            return Err(RecordError::InvalidFormat);
        }
        if record.crc != record.calculate_crc() {
            return Err(RecordError::CrcMismatch);
        }
        Ok(record)
    }
}

/// Simple CRC32 update function (IEEE 802.3 polynomial)
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB88320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}
