//! VL53L0X time-of-flight ranging sensor
//!
//! The sensor runs in continuous back-to-back mode and raises its
//! interrupt status when a range is ready. [`DistanceSensor::poll_mm`]
//! checks that status and returns immediately if nothing is pending, so
//! the control loop never waits on the bus for a measurement.
//!
//! Only the registers needed for continuous ranging with factory
//! calibration are touched; SPAD and reference calibration are left at
//! their power-on values.

use dharma_core::traits::{DistanceSensor, SensorError};
use embedded_hal::i2c::{Error as _, ErrorKind, I2c};
use embedded_hal_async::delay::DelayNs;

/// Default 7-bit I2C address
pub const DEFAULT_ADDRESS: u8 = 0x29;

/// Range reported when no target is in view
pub const OUT_OF_RANGE_MM: u16 = 8190;

/// Register addresses
pub mod reg {
    pub const SYSRANGE_START: u8 = 0x00;
    pub const SYSTEM_INTERRUPT_CONFIG_GPIO: u8 = 0x0A;
    pub const SYSTEM_INTERRUPT_CLEAR: u8 = 0x0B;
    pub const RESULT_INTERRUPT_STATUS: u8 = 0x13;
    pub const RESULT_RANGE_STATUS: u8 = 0x14;
    pub const POWER_MANAGEMENT: u8 = 0x80;
    pub const GPIO_HV_MUX_ACTIVE_HIGH: u8 = 0x84;
    pub const I2C_MODE: u8 = 0x88;
    pub const VHV_CONFIG_PAD_SCL_SDA: u8 = 0x89;
    pub const STOP_VARIABLE: u8 = 0x91;
    pub const IDENTIFICATION_MODEL_ID: u8 = 0xC0;
    pub const PAGE_SELECT: u8 = 0xFF;
}

/// SYSRANGE_START value for back-to-back ranging
const MODE_BACK_TO_BACK: u8 = 0x02;
/// SYSRANGE_START value that stops ranging
const MODE_STOP: u8 = 0x01;
/// Interrupt on "new sample ready"
const INTERRUPT_NEW_SAMPLE: u8 = 0x04;
/// Expected IDENTIFICATION_MODEL_ID
const MODEL_ID: u8 = 0xEE;
/// Device range status meaning "range valid"
const RANGE_VALID: u8 = 11;

/// Model ID polls while waiting for the sensor to leave reset
const BOOT_ATTEMPTS: u8 = 10;
const BOOT_POLL_MS: u32 = 2;

/// VL53L0X driver
pub struct Vl53l0x<I2C> {
    i2c: I2C,
    address: u8,
    stop_variable: u8,
    running: bool,
}

impl<I2C: I2c> Vl53l0x<I2C> {
    /// Create a driver at the default address
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    /// Create a driver at a custom address
    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            stop_variable: 0,
            running: false,
        }
    }

    /// Bring the sensor up and start continuous ranging
    ///
    /// Waits for the sensor to finish its own boot, then applies the
    /// minimal register setup.
    pub async fn init<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), SensorError> {
        self.wait_boot(delay).await?;

        // 2V8 I/O mode
        let pad = self.read_reg(reg::VHV_CONFIG_PAD_SCL_SDA)?;
        self.write_reg(reg::VHV_CONFIG_PAD_SCL_SDA, pad | 0x01)?;

        self.write_reg(reg::I2C_MODE, 0x00)?;
        self.stop_variable = self.with_private_page(|s| s.read_reg(reg::STOP_VARIABLE))?;

        // Interrupt on new sample, active low
        self.write_reg(reg::SYSTEM_INTERRUPT_CONFIG_GPIO, INTERRUPT_NEW_SAMPLE)?;
        let mux = self.read_reg(reg::GPIO_HV_MUX_ACTIVE_HIGH)?;
        self.write_reg(reg::GPIO_HV_MUX_ACTIVE_HIGH, mux & !0x10)?;
        self.write_reg(reg::SYSTEM_INTERRUPT_CLEAR, 0x01)?;

        self.start_continuous()
    }

    /// Start back-to-back ranging
    pub fn start_continuous(&mut self) -> Result<(), SensorError> {
        let stop_variable = self.stop_variable;
        self.with_private_page(|s| s.write_reg(reg::STOP_VARIABLE, stop_variable))?;
        self.write_reg(reg::SYSRANGE_START, MODE_BACK_TO_BACK)?;
        self.running = true;
        Ok(())
    }

    /// Stop ranging
    pub fn stop(&mut self) -> Result<(), SensorError> {
        self.write_reg(reg::SYSRANGE_START, MODE_STOP)?;
        self.running = false;
        let stop_variable = self.stop_variable;
        self.with_private_page(|s| s.write_reg(reg::STOP_VARIABLE, stop_variable))
    }

    /// Check if continuous ranging is active
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Give the bus back
    pub fn release(self) -> I2C {
        self.i2c
    }

    async fn wait_boot<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), SensorError> {
        let mut last = SensorError::NotResponding;
        for _ in 0..BOOT_ATTEMPTS {
            match self.read_reg(reg::IDENTIFICATION_MODEL_ID) {
                Ok(MODEL_ID) => return Ok(()),
                Ok(_) => last = SensorError::InvalidMeasurement,
                Err(e) => last = e,
            }
            delay.delay_ms(BOOT_POLL_MS).await;
        }
        Err(last)
    }

    /// Run `f` with the vendor-private register page selected
    fn with_private_page<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, SensorError>,
    ) -> Result<T, SensorError> {
        self.write_reg(reg::POWER_MANAGEMENT, 0x01)?;
        self.write_reg(reg::PAGE_SELECT, 0x01)?;
        self.write_reg(reg::SYSRANGE_START, 0x00)?;
        let result = f(self);
        self.write_reg(reg::SYSRANGE_START, 0x01)?;
        self.write_reg(reg::PAGE_SELECT, 0x00)?;
        self.write_reg(reg::POWER_MANAGEMENT, 0x00)?;
        result
    }

    fn read_reg(&mut self, register: u8) -> Result<u8, SensorError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register], &mut buf)
            .map_err(bus_error)?;
        Ok(buf[0])
    }

    fn read_block(&mut self, register: u8, buf: &mut [u8]) -> Result<(), SensorError> {
        self.i2c
            .write_read(self.address, &[register], buf)
            .map_err(bus_error)
    }

    fn write_reg(&mut self, register: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(self.address, &[register, value])
            .map_err(bus_error)
    }
}

impl<I2C: I2c> DistanceSensor for Vl53l0x<I2C> {
    fn poll_mm(&mut self) -> Result<Option<u16>, SensorError> {
        if !self.running {
            return Err(SensorError::NotResponding);
        }

        let status = self.read_reg(reg::RESULT_INTERRUPT_STATUS)?;
        if status & 0x07 == 0 {
            return Ok(None);
        }

        // Range status byte, then the range at offset 10
        let mut result = [0u8; 12];
        self.read_block(reg::RESULT_RANGE_STATUS, &mut result)?;
        self.write_reg(reg::SYSTEM_INTERRUPT_CLEAR, 0x01)?;

        let range = u16::from_be_bytes([result[10], result[11]]);
        if range >= OUT_OF_RANGE_MM {
            return Ok(Some(OUT_OF_RANGE_MM));
        }

        match (result[0] >> 3) & 0x0F {
            RANGE_VALID => Ok(Some(range)),
            _ => Err(SensorError::InvalidMeasurement),
        }
    }
}

fn bus_error<E: embedded_hal::i2c::Error>(e: E) -> SensorError {
    match e.kind() {
        ErrorKind::NoAcknowledge(_) => SensorError::NotResponding,
        _ => SensorError::Bus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorType, NoAcknowledgeSource, Operation};
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy)]
    enum FakeError {
        Nack,
        Arbitration,
    }

    impl embedded_hal::i2c::Error for FakeError {
        fn kind(&self) -> ErrorKind {
            match self {
                FakeError::Nack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
                FakeError::Arbitration => ErrorKind::ArbitrationLoss,
            }
        }
    }

    /// Register file with a single auto-incrementing pointer
    struct FakeBus {
        regs: [u8; 256],
        pointer: u8,
        writes: Vec<(u8, u8)>,
        fail: Option<FakeError>,
    }

    impl FakeBus {
        fn new() -> Self {
            let mut regs = [0u8; 256];
            regs[reg::IDENTIFICATION_MODEL_ID as usize] = MODEL_ID;
            regs[reg::STOP_VARIABLE as usize] = 0x3C;
            regs[reg::GPIO_HV_MUX_ACTIVE_HIGH as usize] = 0x11;
            Self {
                regs,
                pointer: 0,
                writes: Vec::new(),
                fail: None,
            }
        }

        fn ready_range(&mut self, device_status: u8, mm: u16) {
            self.regs[reg::RESULT_INTERRUPT_STATUS as usize] = 0x04;
            self.regs[reg::RESULT_RANGE_STATUS as usize] = device_status << 3;
            let [hi, lo] = mm.to_be_bytes();
            self.regs[reg::RESULT_RANGE_STATUS as usize + 10] = hi;
            self.regs[reg::RESULT_RANGE_STATUS as usize + 11] = lo;
        }

        fn wrote(&self, register: u8, value: u8) -> bool {
            self.writes.contains(&(register, value))
        }
    }

    impl ErrorType for FakeBus {
        type Error = FakeError;
    }

    impl I2c for FakeBus {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if let Some(e) = self.fail {
                return Err(e);
            }
            assert_eq!(address, DEFAULT_ADDRESS);
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        if let Some((&register, values)) = bytes.split_first() {
                            self.pointer = register;
                            for &value in values {
                                self.writes.push((self.pointer, value));
                                if self.pointer == reg::SYSTEM_INTERRUPT_CLEAR {
                                    self.regs[reg::RESULT_INTERRUPT_STATUS as usize] = 0;
                                }
                                self.regs[self.pointer as usize] = value;
                                self.pointer = self.pointer.wrapping_add(1);
                            }
                        }
                    }
                    Operation::Read(buf) => {
                        for byte in buf.iter_mut() {
                            *byte = self.regs[self.pointer as usize];
                            self.pointer = self.pointer.wrapping_add(1);
                        }
                    }
                }
            }
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        async fn delay_ns(&mut self, _ns: u32) {}
    }

    fn started() -> Vl53l0x<FakeBus> {
        let mut sensor = Vl53l0x::new(FakeBus::new());
        embassy_futures::block_on(sensor.init(&mut NoDelay)).unwrap();
        sensor
    }

    #[test]
    fn test_init_starts_continuous() {
        let sensor = started();
        assert!(sensor.is_running());
        assert_eq!(sensor.stop_variable, 0x3C);
        let bus = &sensor.i2c;
        assert!(bus.wrote(reg::SYSRANGE_START, MODE_BACK_TO_BACK));
        assert!(bus.wrote(reg::SYSTEM_INTERRUPT_CONFIG_GPIO, INTERRUPT_NEW_SAMPLE));
        assert!(bus.wrote(reg::GPIO_HV_MUX_ACTIVE_HIGH, 0x01));
        assert_eq!(bus.regs[reg::PAGE_SELECT as usize], 0x00);
    }

    #[test]
    fn test_init_rejects_wrong_model() {
        let mut bus = FakeBus::new();
        bus.regs[reg::IDENTIFICATION_MODEL_ID as usize] = 0x10;
        let mut sensor = Vl53l0x::new(bus);
        let result = embassy_futures::block_on(sensor.init(&mut NoDelay));
        assert_eq!(result, Err(SensorError::InvalidMeasurement));
        assert!(!sensor.is_running());
    }

    #[test]
    fn test_init_absent_sensor() {
        let mut bus = FakeBus::new();
        bus.fail = Some(FakeError::Nack);
        let mut sensor = Vl53l0x::new(bus);
        let result = embassy_futures::block_on(sensor.init(&mut NoDelay));
        assert_eq!(result, Err(SensorError::NotResponding));
    }

    #[test]
    fn test_poll_not_ready() {
        let mut sensor = started();
        assert_eq!(sensor.poll_mm(), Ok(None));
    }

    #[test]
    fn test_poll_reads_and_clears() {
        let mut sensor = started();
        sensor.i2c.ready_range(RANGE_VALID, 412);
        assert_eq!(sensor.poll_mm(), Ok(Some(412)));
        // Interrupt cleared, next poll has nothing
        assert_eq!(sensor.poll_mm(), Ok(None));
    }

    #[test]
    fn test_poll_out_of_range_is_far() {
        let mut sensor = started();
        sensor.i2c.ready_range(4, 8191);
        assert_eq!(sensor.poll_mm(), Ok(Some(OUT_OF_RANGE_MM)));
    }

    #[test]
    fn test_poll_invalid_status() {
        let mut sensor = started();
        sensor.i2c.ready_range(4, 120);
        assert_eq!(sensor.poll_mm(), Err(SensorError::InvalidMeasurement));
        assert_eq!(sensor.poll_mm(), Ok(None));
    }

    #[test]
    fn test_bus_error_mapping() {
        let mut sensor = started();
        sensor.i2c.fail = Some(FakeError::Arbitration);
        assert_eq!(sensor.poll_mm(), Err(SensorError::Bus));
        sensor.i2c.fail = Some(FakeError::Nack);
        assert_eq!(sensor.poll_mm(), Err(SensorError::NotResponding));
    }

    #[test]
    fn test_stopped_sensor_reports_error() {
        let mut sensor = started();
        sensor.stop().unwrap();
        assert!(sensor.i2c.wrote(reg::SYSRANGE_START, MODE_STOP));
        assert_eq!(sensor.poll_mm(), Err(SensorError::NotResponding));
    }
}
