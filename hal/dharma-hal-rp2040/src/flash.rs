//! Flash storage driver for RP2040
//!
//! Uses sequential-storage for wear-leveled key-value storage in the
//! last 64KB of flash. Each slot and the device record are one map item,
//! so a write either lands completely or leaves the previous item intact.
//!
//! The core calls storage synchronously at flush points, so every
//! operation runs to completion with `block_on`.

use dharma_core::config::MAX_RECORD_SIZE;
use dharma_core::traits::{SettingsStorage, StorageError, StorageKey};
use embassy_futures::block_on;
use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use sequential_storage::cache::NoCache;
use sequential_storage::map;

/// Flash storage layout
pub const FLASH_SIZE: usize = 2 * 1024 * 1024; // 2MB on the Pico
pub const SETTINGS_PARTITION_SIZE: usize = 64 * 1024;
pub const SETTINGS_PARTITION_START: usize = FLASH_SIZE - SETTINGS_PARTITION_SIZE;

/// Flash range for the settings partition
pub const SETTINGS_RANGE: core::ops::Range<u32> =
    (SETTINGS_PARTITION_START as u32)..(FLASH_SIZE as u32);

/// Item buffer: one record plus key and item header
const ITEM_BUFFER_SIZE: usize = MAX_RECORD_SIZE + 32;

/// RP2040 flash-backed settings storage
pub struct Rp2040FlashStorage<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
}

impl<'d> Rp2040FlashStorage<'d> {
    /// Create a new flash storage instance
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
        }
    }
}

impl<'d> SettingsStorage for Rp2040FlashStorage<'d> {
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, StorageError> {
        let mut data_buffer = [0u8; ITEM_BUFFER_SIZE];

        let result = block_on(map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            SETTINGS_RANGE,
            &mut NoCache::new(),
            &mut data_buffer,
            &key,
        ));

        match result {
            Ok(Some(data)) => {
                let target = buffer
                    .get_mut(..data.len())
                    .ok_or(StorageError::BufferTooSmall)?;
                target.copy_from_slice(data);
                Ok(data.len())
            }
            Ok(None) => Err(StorageError::NotFound),
            Err(sequential_storage::Error::Corrupted { .. }) => Err(StorageError::Corrupted),
            Err(sequential_storage::Error::Storage { .. }) => Err(StorageError::Flash),
            Err(_) => Err(StorageError::Storage),
        }
    }

    fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), StorageError> {
        let mut data_buffer = [0u8; ITEM_BUFFER_SIZE];

        block_on(map::store_item(
            &mut self.flash,
            SETTINGS_RANGE,
            &mut NoCache::new(),
            &mut data_buffer,
            &key,
            &data,
        ))
        .map_err(|e| match e {
            sequential_storage::Error::FullStorage => StorageError::Full,
            sequential_storage::Error::Storage { .. } => StorageError::Flash,
            _ => StorageError::Storage,
        })
    }
}
