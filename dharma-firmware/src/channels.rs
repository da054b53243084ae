//! Inter-task communication channels
//!
//! The control task is the only owner of counter state. Other tasks talk
//! to it through these static channels.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use dharma_core::mode::{ConfigCommand, SoundId};

/// Channel capacity for sound cues
const SOUND_CHANNEL_SIZE: usize = 8;

/// Channel capacity for configuration commands
const CONFIG_CHANNEL_SIZE: usize = 4;

/// Sound cues from the control task to the buzzer
pub static SOUND_CHANNEL: Channel<CriticalSectionRawMutex, SoundId, SOUND_CHANNEL_SIZE> =
    Channel::new();

/// Commands from the configuration server, applied between ticks
pub static CONFIG_CHANNEL: Channel<CriticalSectionRawMutex, ConfigCommand, CONFIG_CHANNEL_SIZE> =
    Channel::new();
