//! Buzzer task
//!
//! Plays short square-wave patterns for sound cues. The buzzer is driven
//! by a PWM channel at 50% duty; each tone reprograms the wrap value.

use defmt::*;
use embassy_rp::clocks::clk_sys_freq;
use embassy_rp::pwm::{Config, Pwm};
use embassy_time::Timer;

use dharma_core::mode::SoundId;

use crate::channels::SOUND_CHANNEL;

/// One step of a pattern; `hz == 0` is a rest
#[derive(Clone, Copy)]
struct Tone {
    hz: u32,
    ms: u64,
}

const fn tone(hz: u32, ms: u64) -> Tone {
    Tone { hz, ms }
}

const INCREMENT: &[Tone] = &[tone(2_600, 30)];
const DECREMENT: &[Tone] = &[tone(2_000, 30)];
const NEXT: &[Tone] = &[tone(3_000, 20), tone(3_400, 20)];
const PREVIOUS: &[Tone] = &[tone(3_400, 20), tone(3_000, 20)];
const ZERO: &[Tone] = &[tone(2_000, 150)];
const GOAL: &[Tone] = &[
    tone(2_600, 80),
    tone(0, 40),
    tone(3_200, 80),
    tone(0, 40),
    tone(3_900, 160),
];
const SOUND_ON: &[Tone] = &[tone(3_000, 40), tone(0, 30), tone(3_000, 40)];

fn pattern(sound: SoundId) -> &'static [Tone] {
    match sound {
        SoundId::Increment => INCREMENT,
        SoundId::Decrement => DECREMENT,
        SoundId::Next => NEXT,
        SoundId::Previous => PREVIOUS,
        SoundId::Zero => ZERO,
        SoundId::Goal => GOAL,
        SoundId::SoundOn => SOUND_ON,
    }
}

/// PWM settings producing `hz` on channel B, or silence
fn tone_config(hz: u32) -> Config {
    let mut config = Config::default();
    if hz > 0 {
        let top = (clk_sys_freq() / hz).clamp(2, u32::from(u16::MAX)) as u16;
        config.top = top;
        config.compare_b = top / 2;
    }
    config
}

#[embassy_executor::task]
pub async fn buzzer_task(mut buzzer: Pwm<'static>) {
    info!("Buzzer task started");

    loop {
        let sound = SOUND_CHANNEL.receive().await;
        trace!("Playing {}", sound);

        for step in pattern(sound) {
            buzzer.set_config(&tone_config(step.hz));
            Timer::after_millis(step.ms).await;
        }
        buzzer.set_config(&tone_config(0));
    }
}
