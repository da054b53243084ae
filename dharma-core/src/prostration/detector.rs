//! Low/high position state machine with time hysteresis
//!
//! Each valid sample is smoothed by taking the larger of it and the
//! previous valid sample, which hides single-frame near readings. The
//! smoothed value is classified as near (below `distance_mm`) or far, and a
//! position is only accepted once its classification has held for the
//! configured dwell time:
//!
//! ```text
//!        near >= low_time           far >= stand_up_time
//!   High ------------------> Low -----------------------> High  (+1)
//! ```
//!
//! Invalid samples are skipped without touching any timer.

use super::DistanceSample;
use crate::config::ProstrationConfig;
use crate::time::Instant;

/// Body position as seen by the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Position {
    /// Down, close to the sensor
    Low,
    /// Standing, far from the sensor
    High,
}

/// Detector output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DetectorEvent {
    /// Low position accepted; the repetition is pending
    LowReached,
    /// Low followed by a full stand-up: count one repetition
    RepetitionCompleted,
}

/// Snapshot of the detector's accepted state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProstrationState {
    /// Accepted position
    pub position: Position,
    /// When the position was accepted
    pub position_since: Instant,
    /// A low dwell completed and awaits its stand-up
    pub pending_count: bool,
}

impl ProstrationState {
    const fn initial(now: Instant) -> Self {
        Self {
            position: Position::High,
            position_since: now,
            pending_count: false,
        }
    }
}

/// Run of consecutive samples with the same classification
#[derive(Debug, Clone, Copy)]
struct Candidate {
    near: bool,
    since: Instant,
}

/// Repetition detector for the prostrations mode
#[derive(Debug, Clone)]
pub struct ProstrationDetector {
    config: ProstrationConfig,
    state: ProstrationState,
    candidate: Option<Candidate>,
    /// Previous valid sample, for the two-sample maximum
    previous: Option<(u16, Instant)>,
    paused: bool,
    last_distance: Option<u16>,
}

impl ProstrationDetector {
    /// Create a paused detector
    pub fn new(config: ProstrationConfig) -> Self {
        Self {
            config,
            state: ProstrationState::initial(Instant::ZERO),
            candidate: None,
            previous: None,
            paused: true,
            last_distance: None,
        }
    }

    /// Current accepted state
    pub fn state(&self) -> ProstrationState {
        self.state
    }

    /// Check if samples are currently ignored
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Last valid distance seen, paused or not
    pub fn last_distance(&self) -> Option<u16> {
        self.last_distance
    }

    /// Stop producing transitions; samples are still accepted
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Start detecting again from a clean state
    pub fn resume(&mut self, now: Instant) {
        self.reset(now);
        self.paused = false;
    }

    /// Forget all timers and history
    pub fn reset(&mut self, now: Instant) {
        self.state = ProstrationState::initial(now);
        self.candidate = None;
        self.previous = None;
    }

    /// Feed one sample
    pub fn update(&mut self, sample: DistanceSample) -> Option<DetectorEvent> {
        if !sample.valid {
            return None;
        }
        self.last_distance = Some(sample.millimeters);
        if self.paused {
            return None;
        }

        let now = sample.timestamp;
        let (effective, run_start) = match self.previous {
            Some((mm, at)) => (mm.max(sample.millimeters), at),
            None => (sample.millimeters, now),
        };
        self.previous = Some((sample.millimeters, now));

        let near = effective < self.config.distance_mm;
        // A near reading is only visible once two samples agree, so the
        // run began at the earlier one. Far readings take effect at once.
        let since = if near { run_start } else { now };

        match self.candidate {
            Some(current) if current.near == near => self.evaluate(current, now),
            Some(current) => {
                // The old run lasted until the new one began
                let ended = self.evaluate(current, since.max(current.since));
                let next = Candidate { near, since };
                self.candidate = Some(next);
                let started = self.evaluate(next, now);
                started.or(ended)
            }
            None => {
                let next = Candidate { near, since };
                self.candidate = Some(next);
                self.evaluate(next, now)
            }
        }
    }

    /// Accept the candidate's position if it has dwelt long enough by `at`
    fn evaluate(&mut self, candidate: Candidate, at: Instant) -> Option<DetectorEvent> {
        let dwell = at.millis_since(candidate.since);
        match (self.state.position, candidate.near) {
            (Position::High, true) if dwell >= u64::from(self.config.low_time_ms) => {
                self.state = ProstrationState {
                    position: Position::Low,
                    position_since: at,
                    pending_count: true,
                };
                Some(DetectorEvent::LowReached)
            }
            (Position::Low, false) if dwell >= u64::from(self.config.stand_up_time_ms) => {
                let counted = self.state.pending_count;
                self.state = ProstrationState {
                    position: Position::High,
                    position_since: at,
                    pending_count: false,
                };
                counted.then_some(DetectorEvent::RepetitionCompleted)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FAR: u16 = 1500;
    const NEAR: u16 = 300;

    fn detector() -> ProstrationDetector {
        let mut d = ProstrationDetector::new(ProstrationConfig::default());
        d.resume(Instant::ZERO);
        d
    }

    /// Sample every millisecond over `from..to`, counting repetitions
    fn run(
        d: &mut ProstrationDetector,
        from: u64,
        to: u64,
        distance_at: impl Fn(u64) -> u16,
    ) -> usize {
        (from..to)
            .filter(|&t| {
                d.update(DistanceSample::valid(distance_at(t), Instant::from_millis(t)))
                    == Some(DetectorEvent::RepetitionCompleted)
            })
            .count()
    }

    /// Far, then near for `low` ms, far for `high` ms, then near again
    fn cycle(low: u64, high: u64) -> impl Fn(u64) -> u16 {
        move |t| {
            if t < 100 {
                FAR
            } else if t < 100 + low {
                NEAR
            } else if t < 100 + low + high {
                FAR
            } else {
                NEAR
            }
        }
    }

    #[test]
    fn test_full_repetition_counts_once() {
        let mut d = detector();
        assert_eq!(run(&mut d, 0, 3000, cycle(300, 500)), 1);
    }

    #[test]
    fn test_short_low_dwell_never_counts() {
        let mut d = detector();
        assert_eq!(run(&mut d, 0, 3000, cycle(299, 2000)), 0);
    }

    #[test]
    fn test_short_high_dwell_does_not_count() {
        let mut d = detector();
        assert_eq!(run(&mut d, 0, 3000, cycle(400, 499)), 0);
        assert_eq!(d.state().position, Position::Low);
        assert!(d.state().pending_count);
    }

    #[test]
    fn test_single_frame_dropout_is_smoothed() {
        let mut d = detector();
        // Isolated near readings every 50 ms while standing
        let count = run(&mut d, 0, 5000, |t| if t % 50 == 0 { 0 } else { FAR });
        assert_eq!(count, 0);
        assert_eq!(d.state().position, Position::High);
    }

    #[test]
    fn test_invalid_samples_do_not_reset_timers() {
        let mut d = detector();
        let mut counted = 0;
        for t in 0..3000u64 {
            let sample = if (100..400).contains(&t) && t % 3 == 0 {
                DistanceSample::invalid(Instant::from_millis(t))
            } else {
                DistanceSample::valid(cycle(300, 500)(t), Instant::from_millis(t))
            };
            if d.update(sample) == Some(DetectorEvent::RepetitionCompleted) {
                counted += 1;
            }
        }
        assert_eq!(counted, 1);
    }

    #[test]
    fn test_paused_detector_ignores_motion() {
        let mut d = detector();
        d.pause();
        assert_eq!(run(&mut d, 0, 3000, cycle(1000, 1000)), 0);
        assert_eq!(d.last_distance(), Some(NEAR));
        assert_eq!(d.state().position, Position::High);
    }

    #[test]
    fn test_resume_clears_pending_low() {
        let mut d = detector();
        // Reach the low position, then pause and resume while still down
        run(&mut d, 0, 1000, |t| if t < 100 { FAR } else { NEAR });
        assert_eq!(d.state().position, Position::Low);
        d.pause();
        d.resume(Instant::from_millis(1000));
        assert_eq!(d.state().position, Position::High);

        // Standing up now is not a repetition
        assert_eq!(run(&mut d, 1000, 3000, |_| FAR), 0);
    }

    #[test]
    fn test_resume_restarts_smoothing() {
        let mut d = detector();
        d.pause();
        run(&mut d, 0, 1000, |_| NEAR);
        d.resume(Instant::from_millis(1000));

        // The low dwell counts from the first sample after resume
        run(&mut d, 1000, 1300, |_| NEAR);
        assert_eq!(d.state().position, Position::High);
        run(&mut d, 1300, 1301, |_| NEAR);
        assert_eq!(d.state().position, Position::Low);
    }

    #[test]
    fn test_back_to_back_repetitions() {
        let mut d = detector();
        let count = run(&mut d, 0, 10_000, |t| {
            if (t / 1000) % 2 == 1 {
                NEAR
            } else {
                FAR
            }
        });
        // The last low phase never stands up
        assert_eq!(count, 4);
    }

    proptest! {
        #[test]
        fn prop_counts_only_complete_dwells(low in 1u64..700, high in 1u64..1000) {
            let mut d = detector();
            let count = run(&mut d, 0, 100 + low + high + 1000, cycle(low, high));
            let expected = usize::from(low >= 300 && high >= 500);
            prop_assert_eq!(count, expected);
        }
    }
}
