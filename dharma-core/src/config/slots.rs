//! Default counter slot table
//!
//! The device has a fixed number of counter modes. These values seed the
//! slots on first boot; afterwards everything is loaded from storage.

use super::types::{make_title, Title};
use crate::mode::ModePolicy;

/// Quantity of counter modes
pub const MODES: usize = 14;

/// Index of the sensor-driven prostrations mode
pub const PROSTRATIONS: usize = 3;

/// Goal used for open-ended tally counters
const TALLY_GOAL: u32 = 999_999;

/// What kind of counting a slot does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotKind {
    /// Fixed-goal mala round (7, 21, 108 beads)
    Mala,
    /// Prostrations counted by the distance sensor
    Prostrations,
    /// Open-ended tally counter
    Tally,
}

impl SlotKind {
    /// Counting policy for this kind of slot
    pub fn policy(self) -> ModePolicy {
        match self {
            SlotKind::Prostrations => ModePolicy::SensorDriven,
            SlotKind::Mala | SlotKind::Tally => ModePolicy::Manual,
        }
    }

    /// Long-press multiplier
    ///
    /// Tally counters often hold large values, so resetting them takes a
    /// deliberately longer hold.
    pub fn long_press_factor(self) -> u16 {
        match self {
            SlotKind::Tally => 2,
            SlotKind::Mala | SlotKind::Prostrations => 1,
        }
    }
}

/// Initial values for one counter slot
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotDefault {
    /// Display title
    pub title: Title,
    /// Goal value
    pub max_value: u32,
    /// Shown in mode navigation
    pub visible: bool,
    /// Counting kind
    pub kind: SlotKind,
}

impl SlotDefault {
    fn new(title: &str, max_value: u32, visible: bool, kind: SlotKind) -> Self {
        Self {
            title: make_title(title),
            max_value,
            visible,
            kind,
        }
    }
}

/// The reference device's slot table
pub fn default_slots() -> [SlotDefault; MODES] {
    core::array::from_fn(|index| match index {
        0 => SlotDefault::new("• Mode 7 •", 7, true, SlotKind::Mala),
        1 => SlotDefault::new("• Mode 21 •", 21, true, SlotKind::Mala),
        2 => SlotDefault::new("• Mode 108 •", 108, true, SlotKind::Mala),
        PROSTRATIONS => {
            SlotDefault::new("• Prostrations •", TALLY_GOAL, false, SlotKind::Prostrations)
        }
        n => {
            let number = n - PROSTRATIONS;
            let mut title = make_title("Tally counter ");
            push_number(&mut title, number as u32);
            SlotDefault {
                title,
                max_value: TALLY_GOAL,
                visible: number <= 3,
                kind: SlotKind::Tally,
            }
        }
    })
}

/// Append a decimal number to a title
fn push_number(title: &mut Title, mut n: u32) {
    let mut digits = [0u8; 10];
    let mut len = 0;
    loop {
        digits[len] = b'0' + (n % 10) as u8;
        len += 1;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    for &d in digits[..len].iter().rev() {
        let _ = title.push(d as char);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let slots = default_slots();
        assert_eq!(slots[0].max_value, 7);
        assert_eq!(slots[2].max_value, 108);
        assert_eq!(slots[PROSTRATIONS].kind, SlotKind::Prostrations);
        assert!(!slots[PROSTRATIONS].visible);
        assert_eq!(slots[4].title.as_str(), "Tally counter 1");
        assert_eq!(slots[13].title.as_str(), "Tally counter 10");
    }

    #[test]
    fn test_default_visibility() {
        let visible: std::vec::Vec<usize> = default_slots()
            .iter()
            .enumerate()
            .filter(|(_, s)| s.visible)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(visible, std::vec![0, 1, 2, 4, 5, 6]);
    }

    #[test]
    fn test_policy_and_long_press() {
        assert_eq!(SlotKind::Prostrations.policy(), ModePolicy::SensorDriven);
        assert_eq!(SlotKind::Mala.policy(), ModePolicy::Manual);
        assert_eq!(SlotKind::Tally.long_press_factor(), 2);
        assert_eq!(SlotKind::Mala.long_press_factor(), 1);
    }
}
