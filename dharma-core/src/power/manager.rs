//! Active → Dimmed → Sleeping state machine

use crate::config::PowerConfig;
use crate::time::Instant;

/// Device power state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// Full brightness
    Active,
    /// Backlight dimmed
    Dimmed,
    /// Deep sleep requested
    Sleeping,
}

/// A change of power state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerTransition {
    /// State before
    pub from: PowerState,
    /// State after
    pub to: PowerState,
}

/// Inactivity tracker
#[derive(Debug, Clone)]
pub struct PowerManager {
    config: PowerConfig,
    state: PowerState,
    last_activity: Instant,
    /// Start of the current idle period; held at `now` while inhibited
    idle_since: Instant,
}

impl PowerManager {
    /// Start in `Active` with the activity clock at `now`
    pub fn new(config: PowerConfig, now: Instant) -> Self {
        Self {
            config,
            state: PowerState::Active,
            last_activity: now,
            idle_since: now,
        }
    }

    /// Current state
    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Time of the last qualifying activity
    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    /// Milliseconds without activity
    pub fn idle_ms(&self, now: Instant) -> u64 {
        now.millis_since(self.idle_since)
    }

    /// Backlight level for a state
    pub fn brightness_for(&self, state: PowerState) -> u8 {
        match state {
            PowerState::Active => self.config.brightness_max,
            PowerState::Dimmed => self.config.brightness_dim,
            PowerState::Sleeping => 0,
        }
    }

    /// Note user or web activity, restoring `Active`
    pub fn record_activity(&mut self, now: Instant) -> Option<PowerTransition> {
        self.last_activity = now;
        self.idle_since = now;
        self.enter(PowerState::Active)
    }

    /// Re-evaluate the timeouts
    ///
    /// While `inhibited` holds (or power saving is disabled) the idle
    /// clock is kept at `now`, so timeouts start counting only once the
    /// inhibit is released. [`last_activity`](Self::last_activity) is
    /// left alone.
    pub fn update(&mut self, now: Instant, inhibited: bool) -> Option<PowerTransition> {
        if inhibited || !self.config.power_save {
            self.idle_since = now;
            return self.enter(PowerState::Active);
        }

        let idle = self.idle_ms(now);
        let dim_at = u64::from(self.config.dim_time_ms);
        let sleep_at = dim_at + u64::from(self.config.sleep_time_ms);

        let target = if idle >= sleep_at {
            PowerState::Sleeping
        } else if idle >= dim_at {
            PowerState::Dimmed
        } else {
            PowerState::Active
        };

        // Only activity brings the state back down
        if target > self.state {
            self.enter(target)
        } else {
            None
        }
    }

    fn enter(&mut self, to: PowerState) -> Option<PowerTransition> {
        if self.state == to {
            return None;
        }
        let from = self.state;
        self.state = to;
        Some(PowerTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> PowerManager {
        PowerManager::new(PowerConfig::default(), Instant::ZERO)
    }

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn test_idle_dims_then_sleeps() {
        let mut pm = manager();
        assert_eq!(pm.update(at(19_999), false), None);
        assert_eq!(
            pm.update(at(20_000), false),
            Some(PowerTransition {
                from: PowerState::Active,
                to: PowerState::Dimmed
            })
        );
        assert_eq!(pm.update(at(39_999), false), None);
        assert_eq!(
            pm.update(at(40_000), false),
            Some(PowerTransition {
                from: PowerState::Dimmed,
                to: PowerState::Sleeping
            })
        );
    }

    #[test]
    fn test_activity_restores_active() {
        let mut pm = manager();
        pm.update(at(25_000), false);
        assert_eq!(pm.state(), PowerState::Dimmed);

        let t = pm.record_activity(at(26_000));
        assert_eq!(t.map(|t| t.to), Some(PowerState::Active));
        assert_eq!(pm.brightness_for(pm.state()), 255);

        // Timers restart from the activity
        assert_eq!(pm.update(at(45_999), false), None);
        assert_eq!(pm.update(at(46_000), false).map(|t| t.to), Some(PowerState::Dimmed));
    }

    #[test]
    fn test_inhibit_holds_active() {
        let mut pm = manager();
        for s in 0..120 {
            assert_eq!(pm.update(at(s * 1000), true), None);
        }
        assert_eq!(pm.state(), PowerState::Active);
        // Released at 119 s: dims 20 s later
        assert_eq!(pm.update(at(138_999), false), None);
        assert_eq!(pm.update(at(139_000), false).map(|t| t.to), Some(PowerState::Dimmed));
    }

    #[test]
    fn test_inhibit_keeps_last_activity() {
        let mut pm = manager();
        pm.record_activity(at(1_000));
        for s in 2..10 {
            pm.update(at(s * 1000), true);
        }
        assert_eq!(pm.last_activity(), at(1_000));
        assert_eq!(pm.idle_ms(at(9_000)), 0);

        // Dims 20 s after the release at 9 s, not after the press at 1 s
        assert_eq!(pm.update(at(28_999), false), None);
        assert_eq!(pm.update(at(29_000), false).map(|t| t.to), Some(PowerState::Dimmed));
        assert_eq!(pm.last_activity(), at(1_000));
    }

    #[test]
    fn test_inhibit_wakes_dimmed_display() {
        let mut pm = manager();
        pm.update(at(30_000), false);
        assert_eq!(pm.update(at(30_010), true).map(|t| t.to), Some(PowerState::Active));
    }

    #[test]
    fn test_power_save_disabled() {
        let config = PowerConfig {
            power_save: false,
            ..PowerConfig::default()
        };
        let mut pm = PowerManager::new(config, Instant::ZERO);
        assert_eq!(pm.update(at(1_000_000), false), None);
        assert_eq!(pm.state(), PowerState::Active);
    }

    #[test]
    fn test_sparse_update_goes_straight_to_sleep() {
        let mut pm = manager();
        assert_eq!(
            pm.update(at(60_000), false),
            Some(PowerTransition {
                from: PowerState::Active,
                to: PowerState::Sleeping
            })
        );
        assert_eq!(pm.brightness_for(pm.state()), 0);
    }
}
