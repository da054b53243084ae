//! Time-based button debouncing
//!
//! A raw level is only accepted once it has stayed unchanged for the
//! debounce interval. Accepted edges become `Press` and `Release`; a press
//! held past the long-press threshold fires `LongPress` exactly once and
//! swallows the trailing `Release`, so one gesture is either short or long,
//! never both.
//!
//! After a pin fault (and on the very first poll) the source resynchronizes:
//! it adopts the current level silently and ignores a press that was
//! already in progress.

use super::buttons::{ButtonId, PressEvent, PressKind};
use crate::time::Instant;
use crate::traits::{ButtonPin, PinError};

/// Debounced event source for one physical button
#[derive(Debug)]
pub struct DebouncedButton<P> {
    id: ButtonId,
    pin: P,
    debounce_ms: u16,
    long_press_ms: u16,
    /// Last raw level read from the pin
    raw: bool,
    /// When the raw level last changed
    raw_since: Instant,
    /// Accepted (debounced) level
    stable: bool,
    /// When the current press started
    pressed_at: Instant,
    /// Current press already produced its action (long press, or held at sync)
    consumed: bool,
    /// Adopt the next reading without emitting events
    needs_sync: bool,
    faulted: bool,
}

impl<P: ButtonPin> DebouncedButton<P> {
    /// Create a source for `id` reading from `pin`
    pub fn new(id: ButtonId, pin: P, debounce_ms: u16, long_press_ms: u16) -> Self {
        Self {
            id,
            pin,
            debounce_ms,
            long_press_ms,
            raw: false,
            raw_since: Instant::ZERO,
            stable: false,
            pressed_at: Instant::ZERO,
            consumed: false,
            needs_sync: true,
            faulted: false,
        }
    }

    /// Button this source reads
    pub fn id(&self) -> ButtonId {
        self.id
    }

    /// Check if the last pin read failed
    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    /// Debounced level
    pub fn is_held(&self) -> bool {
        self.stable
    }

    /// Change the long-press threshold
    ///
    /// Applies to the press in progress too; a press already past the new
    /// threshold fires on the next poll.
    pub fn set_long_press_ms(&mut self, long_press_ms: u16) {
        self.long_press_ms = long_press_ms;
    }

    /// Current long-press threshold
    pub fn long_press_ms(&self) -> u16 {
        self.long_press_ms
    }

    /// Give the pin back
    pub fn into_pin(self) -> P {
        self.pin
    }

    /// Sample the pin and return at most one event
    ///
    /// A read failure is returned as `Err` and puts the source into
    /// resync, so no event can be built from readings on both sides of
    /// the outage.
    pub fn poll(&mut self, now: Instant) -> Result<Option<PressEvent>, PinError> {
        let raw = match self.pin.is_pressed() {
            Ok(level) => level,
            Err(e) => {
                self.faulted = true;
                self.needs_sync = true;
                return Err(e);
            }
        };
        self.faulted = false;

        if self.needs_sync {
            self.needs_sync = false;
            self.raw = raw;
            self.raw_since = now;
            self.stable = raw;
            self.pressed_at = now;
            self.consumed = raw;
            return Ok(None);
        }

        if raw != self.raw {
            self.raw = raw;
            self.raw_since = now;
        }

        if raw != self.stable && now.millis_since(self.raw_since) >= u64::from(self.debounce_ms) {
            self.stable = raw;
            if raw {
                self.pressed_at = self.raw_since;
                self.consumed = false;
                return Ok(Some(self.event(PressKind::Press)));
            }
            if self.consumed {
                return Ok(None);
            }
            return Ok(Some(self.event(PressKind::Release)));
        }

        if self.stable
            && raw
            && !self.consumed
            && now.millis_since(self.pressed_at) >= u64::from(self.long_press_ms)
        {
            self.consumed = true;
            return Ok(Some(self.event(PressKind::LongPress)));
        }

        Ok(None)
    }

    fn event(&self, kind: PressKind) -> PressEvent {
        PressEvent::new(self.id, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestPin;
    use proptest::prelude::*;
    use std::vec::Vec;

    const DEBOUNCE: u16 = 35;
    const LONG: u16 = 700;

    fn button(pin: &TestPin) -> DebouncedButton<TestPin> {
        let mut button = DebouncedButton::new(ButtonId::Decrement, pin.clone(), DEBOUNCE, LONG);
        // First poll only synchronizes
        assert_eq!(button.poll(Instant::ZERO), Ok(None));
        button
    }

    /// Poll once per millisecond over `from..to`, collecting event kinds
    fn run(
        button: &mut DebouncedButton<TestPin>,
        pin: &TestPin,
        from: u64,
        to: u64,
        level_at: impl Fn(u64) -> bool,
    ) -> Vec<PressKind> {
        let mut events = Vec::new();
        for t in from..to {
            pin.set(level_at(t));
            if let Ok(Some(event)) = button.poll(Instant::from_millis(t)) {
                events.push(event.kind);
            }
        }
        events
    }

    #[test]
    fn test_short_press() {
        let pin = TestPin::new();
        let mut b = button(&pin);
        let events = run(&mut b, &pin, 1, 400, |t| (10..200).contains(&t));
        assert_eq!(events, [PressKind::Press, PressKind::Release]);
    }

    #[test]
    fn test_press_needs_stable_level() {
        let pin = TestPin::new();
        let mut b = button(&pin);
        // Down for one tick less than the debounce interval
        let events = run(&mut b, &pin, 1, 200, |t| {
            (10..10 + DEBOUNCE as u64).contains(&t)
        });
        assert!(events.is_empty());
    }

    #[test]
    fn test_three_bounces_give_one_press() {
        let pin = TestPin::new();
        let mut b = button(&pin);
        // Bouncing contact for 20 ms, then held for ~200 ms
        let events = run(&mut b, &pin, 1, 500, |t| match t {
            0..=9 => false,
            10..=14 => true,
            15..=19 => false,
            20..=24 => true,
            25..=29 => false,
            30..=230 => true,
            _ => false,
        });
        assert_eq!(events, [PressKind::Press, PressKind::Release]);
    }

    #[test]
    fn test_long_press_suppresses_release() {
        let pin = TestPin::new();
        let mut b = button(&pin);
        let events = run(&mut b, &pin, 1, 2000, |t| (100..1500).contains(&t));
        assert_eq!(events, [PressKind::Press, PressKind::LongPress]);
    }

    #[test]
    fn test_long_press_timing() {
        let pin = TestPin::new();
        let mut b = button(&pin);
        pin.set(true);
        let mut long_at = None;
        for t in 100..1000u64 {
            if let Ok(Some(e)) = b.poll(Instant::from_millis(t)) {
                if e.kind == PressKind::LongPress {
                    long_at = Some(t);
                    break;
                }
            }
        }
        // Measured from the raw down edge
        assert_eq!(long_at, Some(100 + LONG as u64));
    }

    #[test]
    fn test_release_before_threshold_cancels_long_press() {
        let pin = TestPin::new();
        let mut b = button(&pin);
        // Released 1 ms before the long-press threshold
        let events = run(&mut b, &pin, 1, 2000, |t| {
            (100..100 + LONG as u64 - 1).contains(&t)
        });
        assert_eq!(events, [PressKind::Press, PressKind::Release]);
    }

    #[test]
    fn test_doubled_threshold() {
        let pin = TestPin::new();
        let mut b = button(&pin);
        b.set_long_press_ms(LONG * 2);
        let events = run(&mut b, &pin, 1, 3000, |t| (100..1000).contains(&t));
        assert_eq!(events, [PressKind::Press, PressKind::Release]);
    }

    #[test]
    fn test_held_at_startup_is_ignored() {
        let pin = TestPin::new();
        pin.set(true);
        let mut b = DebouncedButton::new(ButtonId::Increment, pin.clone(), DEBOUNCE, LONG);
        let events = run(&mut b, &pin, 0, 3000, |t| t < 2000);
        assert!(events.is_empty());

        // The next press works normally
        let events = run(&mut b, &pin, 3000, 3500, |t| (3100..3300).contains(&t));
        assert_eq!(events, [PressKind::Press, PressKind::Release]);
    }

    #[test]
    fn test_fault_stops_events_until_recovery() {
        let pin = TestPin::new();
        let mut b = button(&pin);
        pin.set(true);
        for t in 1..20 {
            let _ = b.poll(Instant::from_millis(t));
        }

        pin.fail(true);
        for t in 20..1000 {
            assert_eq!(b.poll(Instant::from_millis(t)), Err(PinError::ReadFailed));
        }
        assert!(b.is_faulted());

        // Recovered while still held: the interrupted press is dropped
        pin.fail(false);
        let events = run(&mut b, &pin, 1000, 1500, |t| t < 1200);
        assert!(!b.is_faulted());
        assert!(events.is_empty());
    }

    proptest! {
        #[test]
        fn prop_burst_gives_at_most_one_press(
            gaps in proptest::collection::vec(1u64..DEBOUNCE as u64, 1..20),
            settle_pressed in any::<bool>(),
        ) {
            let pin = TestPin::new();
            let mut b = button(&pin);

            // Toggle the raw level after each gap; every gap is shorter
            // than the debounce interval
            let mut edges = Vec::new();
            let mut t = 10;
            for gap in &gaps {
                edges.push(t);
                t += gap;
            }
            let burst_end = t;
            let level_at = |now: u64| {
                if now < 10 {
                    false
                } else if now >= burst_end {
                    settle_pressed
                } else {
                    edges.iter().filter(|&&e| e <= now).count() % 2 == 1
                }
            };

            let events = run(&mut b, &pin, 1, burst_end + 200, level_at);
            let presses = events.iter().filter(|k| **k == PressKind::Press).count();
            prop_assert!(presses <= 1);
            // Nothing is accepted during the burst itself
            prop_assert_eq!(presses, usize::from(settle_pressed));
        }
    }
}
