//! Board wiring
//!
//! Pin assignments for a Raspberry Pi Pico based counter:
//!
//! | Function        | GPIO | Notes                  |
//! |-----------------|------|------------------------|
//! | Increment       | 2    | wake button            |
//! | Decrement       | 3    |                        |
//! | Prostration     | 4    | sound / start-pause    |
//! | Next mode       | 5    |                        |
//! | Previous mode   | 6    |                        |
//! | Backlight       | 13   | PWM slice 6, channel B |
//! | Buzzer          | 15   | PWM slice 7, channel B |
//! | VL53L0X SDA     | 20   | I2C0                   |
//! | VL53L0X SCL     | 21   | I2C0                   |
//!
//! All buttons switch to ground and use the internal pull-ups.

use defmt::*;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::i2c::{self, Blocking, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_rp::pwm::{self, Pwm, PwmOutput};
use embassy_rp::Peripherals;

use dharma_core::input::BUTTON_COUNT;
use dharma_core::traits::PowerControl;
use dharma_core::{Device, Instant};
use dharma_drivers::backlight::PwmBacklight;
use dharma_drivers::button::GpioButton;
use dharma_drivers::sensor::Vl53l0x;
use dharma_hal_rp2040::{Rp2040FlashStorage, WakeControl};

/// Button GPIOs in `ButtonId::ALL` order
pub const BUTTON_GPIOS: [u8; BUTTON_COUNT] = [2, 3, 4, 5, 6];

/// VL53L0X bus speed
const I2C_FREQUENCY: u32 = 400_000;

pub type Button = GpioButton<Input<'static>>;
pub type SensorBus = I2c<'static, I2C0, Blocking>;
pub type Sensor = Vl53l0x<SensorBus>;
pub type Storage = Rp2040FlashStorage<'static>;
pub type CounterDevice = Device<Button, Sensor, Storage, BoardPower>;

/// Backlight and sleep request handling
pub struct BoardPower {
    backlight: PwmBacklight<PwmOutput<'static>>,
    sleep_request: Option<u64>,
}

impl BoardPower {
    fn new(backlight: PwmOutput<'static>) -> Self {
        Self {
            backlight: PwmBacklight::new(backlight),
            sleep_request: None,
        }
    }

    /// Wake mask of the pending deep-sleep request
    pub fn sleep_request(&self) -> Option<u64> {
        self.sleep_request
    }
}

impl PowerControl for BoardPower {
    fn set_brightness(&mut self, level: u8) {
        if self.backlight.set_level(level).is_err() {
            warn!("Backlight level {} rejected", level);
        }
    }

    fn deep_sleep(&mut self, wake_mask: u64) {
        // The control task hands the wake pins over once it stops ticking
        self.sleep_request = Some(wake_mask);
    }
}

/// Every peripheral the firmware uses, configured
pub struct Board {
    pub buttons: [Button; BUTTON_COUNT],
    pub sensor_bus: SensorBus,
    pub power: BoardPower,
    pub buzzer: Pwm<'static>,
    pub storage: Storage,
    pub wake: WakeControl,
}

impl Board {
    pub fn init(p: Peripherals) -> Self {
        let buttons = [
            GpioButton::active_low(Input::new(p.PIN_2, Pull::Up)),
            GpioButton::active_low(Input::new(p.PIN_3, Pull::Up)),
            GpioButton::active_low(Input::new(p.PIN_4, Pull::Up)),
            GpioButton::active_low(Input::new(p.PIN_5, Pull::Up)),
            GpioButton::active_low(Input::new(p.PIN_6, Pull::Up)),
        ];

        let mut i2c_config = i2c::Config::default();
        i2c_config.frequency = I2C_FREQUENCY;
        let sensor_bus = I2c::new_blocking(p.I2C0, p.PIN_21, p.PIN_20, i2c_config);

        let backlight = Pwm::new_output_b(p.PWM_SLICE6, p.PIN_13, pwm::Config::default());
        let (_, backlight) = backlight.split();
        let power = BoardPower::new(unwrap!(backlight));

        let buzzer = Pwm::new_output_b(p.PWM_SLICE7, p.PIN_15, pwm::Config::default());

        info!("Board initialized");

        Self {
            buttons,
            sensor_bus,
            power,
            buzzer,
            storage: Rp2040FlashStorage::new(p.FLASH, p.DMA_CH0),
            wake: WakeControl::new(p.WATCHDOG),
        }
    }
}

/// Milliseconds since boot as a core timestamp
pub fn now() -> Instant {
    Instant::from_millis(embassy_time::Instant::now().as_millis())
}
