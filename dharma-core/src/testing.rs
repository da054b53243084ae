//! Test doubles for the hardware traits
//!
//! Every double is a cheap handle around shared state, so a test can keep
//! one clone while the code under test owns another.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::vec::Vec;

use crate::traits::{
    ButtonPin, DistanceSensor, PinError, PowerControl, SensorError, SettingsStorage,
    StorageError, StorageKey,
};

/// Raw button level controlled by the test
#[derive(Debug, Clone, Default)]
pub struct TestPin {
    pressed: Rc<Cell<bool>>,
    failing: Rc<Cell<bool>>,
}

impl TestPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, pressed: bool) {
        self.pressed.set(pressed);
    }

    pub fn fail(&self, failing: bool) {
        self.failing.set(failing);
    }
}

impl ButtonPin for TestPin {
    fn is_pressed(&mut self) -> Result<bool, PinError> {
        if self.failing.get() {
            Err(PinError::ReadFailed)
        } else {
            Ok(self.pressed.get())
        }
    }
}

/// Distance sensor returning whatever the test last set
#[derive(Debug, Clone, Default)]
pub struct ScriptedSensor {
    distance: Rc<Cell<Option<u16>>>,
    failing: Rc<Cell<bool>>,
    polls: Rc<Cell<usize>>,
}

impl ScriptedSensor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_distance(&self, mm: u16) {
        self.distance.set(Some(mm));
    }

    pub fn fail(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn polls(&self) -> usize {
        self.polls.get()
    }
}

impl DistanceSensor for ScriptedSensor {
    fn poll_mm(&mut self) -> Result<Option<u16>, SensorError> {
        self.polls.set(self.polls.get() + 1);
        if self.failing.get() {
            Err(SensorError::Bus)
        } else {
            Ok(self.distance.get())
        }
    }
}

#[derive(Debug, Default)]
struct StorageInner {
    records: BTreeMap<u8, Vec<u8>>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

/// In-memory key-value storage with fault injection
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Rc<RefCell<StorageInner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store bytes directly, bypassing record encoding
    pub fn insert_raw(&self, key: StorageKey, data: &[u8]) {
        self.inner
            .borrow_mut()
            .records
            .insert(key.as_u8(), data.to_vec());
    }

    pub fn contains(&self, key: StorageKey) -> bool {
        self.inner.borrow().records.contains_key(&key.as_u8())
    }

    pub fn fail_reads(&self, fail: bool) {
        self.inner.borrow_mut().fail_reads = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().fail_writes = fail;
    }

    /// Successful writes so far
    pub fn write_count(&self) -> usize {
        self.inner.borrow().writes
    }
}

impl SettingsStorage for MemoryStorage {
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, StorageError> {
        let inner = self.inner.borrow();
        if inner.fail_reads {
            return Err(StorageError::Flash);
        }
        let data = inner
            .records
            .get(&key.as_u8())
            .ok_or(StorageError::NotFound)?;
        let target = buffer
            .get_mut(..data.len())
            .ok_or(StorageError::BufferTooSmall)?;
        target.copy_from_slice(data);
        Ok(data.len())
    }

    fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), StorageError> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_writes {
            return Err(StorageError::Flash);
        }
        inner.records.insert(key.as_u8(), data.to_vec());
        inner.writes += 1;
        Ok(())
    }
}

/// A deep-sleep request as seen by [`RecordingPower`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepRequest {
    pub wake_mask: u64,
    /// Storage writes completed before the request
    pub writes_before: usize,
}

#[derive(Debug, Default)]
struct PowerLog {
    brightness: Vec<u8>,
    sleeps: Vec<SleepRequest>,
}

/// Power control that records every call
#[derive(Debug, Clone, Default)]
pub struct RecordingPower {
    log: Rc<RefCell<PowerLog>>,
    storage: Option<MemoryStorage>,
}

impl RecordingPower {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the storage write count at each sleep request
    pub fn observing(storage: &MemoryStorage) -> Self {
        Self {
            log: Rc::default(),
            storage: Some(storage.clone()),
        }
    }

    pub fn brightness(&self) -> Option<u8> {
        self.log.borrow().brightness.last().copied()
    }

    pub fn sleeps(&self) -> Vec<SleepRequest> {
        self.log.borrow().sleeps.clone()
    }
}

impl PowerControl for RecordingPower {
    fn set_brightness(&mut self, level: u8) {
        self.log.borrow_mut().brightness.push(level);
    }

    fn deep_sleep(&mut self, wake_mask: u64) {
        let writes_before = self.storage.as_ref().map_or(0, |s| s.write_count());
        self.log.borrow_mut().sleeps.push(SleepRequest {
            wake_mask,
            writes_before,
        });
    }
}
