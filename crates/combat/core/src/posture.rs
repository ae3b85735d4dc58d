//! Posture accumulation and recovery.
//!
//! Posture is a bounded meter of defensive stamina. It only ever moves
//! through the three server-authoritative operations here plus the continuous
//! recovery tick; saturation through the *uncapped* add path is the single
//! trigger for guardbreak.

use crate::config::CombatConfig;
use crate::state::{Seconds, Timestamp};

/// Outcome of an uncapped posture add.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostureGain {
    Changed,
    /// The meter reached max; the combatant must be guardbroken.
    Saturated,
}

/// Bounded posture meter with delayed decay.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PostureMeter {
    pub current: f32,
    pub max: f32,
    /// Last add/remove; recovery waits out the delay from here.
    pub last_action_at: Timestamp,
}

impl PostureMeter {
    pub fn new(max: f32) -> Self {
        Self {
            current: 0.0,
            max,
            last_action_at: Timestamp::ZERO,
        }
    }

    /// Adds posture, clamped to max. Reaching max is a guardbreak trigger.
    pub fn add(&mut self, amount: f32, now: Timestamp) -> PostureGain {
        self.current = (self.current + amount).min(self.max);
        self.last_action_at = now;
        if self.current >= self.max {
            PostureGain::Saturated
        } else {
            PostureGain::Changed
        }
    }

    /// Adds posture, clamped below max. Never triggers guardbreak no matter
    /// the amount.
    pub fn add_capped(&mut self, amount: f32, soft_cap: f32, now: Timestamp) {
        self.current = (self.current + amount).min(soft_cap);
        self.last_action_at = now;
    }

    /// Removes posture, clamped at zero.
    pub fn remove(&mut self, amount: f32, now: Timestamp) {
        self.current = (self.current - amount).max(0.0);
        self.last_action_at = now;
    }

    /// Continuous decay, independent of combat activity.
    ///
    /// No decay happens until `recovery_delay` has elapsed since the last
    /// posture action. Returns true if the meter value changed.
    pub fn recover(
        &mut self,
        now: Timestamp,
        dt: Seconds,
        blocking: bool,
        config: &CombatConfig,
    ) -> bool {
        if self.current <= 0.0 {
            return false;
        }
        if now.since(self.last_action_at) < config.posture_recovery_delay {
            return false;
        }
        let rate = if blocking {
            config.posture_recovery_rate_blocking
        } else {
            config.posture_recovery_rate
        };
        self.current = (self.current - self.max * rate * dt as f32).max(0.0);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meter() -> (PostureMeter, CombatConfig) {
        let config = CombatConfig::default();
        (PostureMeter::new(config.posture_max), config)
    }

    #[test]
    fn add_saturates_exactly_at_max() {
        let (mut posture, _) = meter();
        assert_eq!(posture.add(99.9, Timestamp(1.0)), PostureGain::Changed);
        assert_eq!(posture.add(50.0, Timestamp(1.1)), PostureGain::Saturated);
        assert_eq!(posture.current, 100.0);
    }

    #[test]
    fn capped_add_never_saturates() {
        let (mut posture, config) = meter();
        for i in 0..64 {
            posture.add_capped(30.0, config.posture_soft_cap(), Timestamp(i as f64));
        }
        assert_eq!(posture.current, 99.0);
        assert!(posture.current < posture.max);
    }

    #[test]
    fn remove_floors_at_zero() {
        let (mut posture, _) = meter();
        posture.add(10.0, Timestamp(0.0));
        posture.remove(25.0, Timestamp(0.5));
        assert_eq!(posture.current, 0.0);
    }

    #[test]
    fn recovery_waits_out_delay() {
        let (mut posture, config) = meter();
        posture.add(50.0, Timestamp(0.0));

        assert!(!posture.recover(Timestamp(0.5), 0.5, false, &config));
        assert_eq!(posture.current, 50.0);

        // Past the delay: 100 * 0.05 * 2.0 = 10 points recovered.
        assert!(posture.recover(Timestamp(3.0), 2.0, false, &config));
        assert!((posture.current - 40.0).abs() < 1e-4);
    }

    #[test]
    fn blocking_halves_recovery_rate() {
        let (mut posture, config) = meter();
        posture.add(50.0, Timestamp(0.0));

        posture.recover(Timestamp(3.0), 2.0, true, &config);
        assert!((posture.current - 45.0).abs() < 1e-4);
    }

    #[test]
    fn recovery_never_goes_negative() {
        let (mut posture, config) = meter();
        posture.add(1.0, Timestamp(0.0));
        posture.recover(Timestamp(100.0), 50.0, false, &config);
        assert_eq!(posture.current, 0.0);
    }
}
