use serde::{Deserialize, Serialize};

// Absorbs rounding when the accumulated ticks land exactly on the threshold.
const THRESHOLD_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AlarmPhase {
    Idle,
    Active,
}

/// Time-integrated fatigue counter plus the alarm flag.
///
/// The accumulator is kept as a count of consecutive fatigue ticks so that
/// fifty ticks of `0.1` reach a threshold of `5.0` without float drift.
#[derive(Debug, Clone)]
pub struct AlarmState {
    fatigue_ticks: u32,
    increment: f64,
    threshold: f64,
    active: bool,
}

impl AlarmState {
    pub fn new(threshold: f64, increment: f64) -> Self {
        Self {
            fatigue_ticks: 0,
            increment,
            threshold,
            active: false,
        }
    }

    pub fn fatigue_accumulator(&self) -> f64 {
        f64::from(self.fatigue_ticks) * self.increment
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn phase(&self) -> AlarmPhase {
        if self.active {
            AlarmPhase::Active
        } else {
            AlarmPhase::Idle
        }
    }

    /// Adds one tick and returns `true` only on the Idle -> Active transition.
    pub fn accumulate(&mut self) -> bool {
        self.fatigue_ticks = self.fatigue_ticks.saturating_add(1);
        if !self.active && self.fatigue_accumulator() + THRESHOLD_EPSILON >= self.threshold {
            self.active = true;
            return true;
        }
        false
    }

    pub fn reset_accumulator(&mut self) {
        self.fatigue_ticks = 0;
    }

    pub fn clear(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifty_ticks_reach_default_threshold() {
        let mut state = AlarmState::new(5.0, 0.1);
        for _ in 0..49 {
            assert!(!state.accumulate());
        }
        assert!(state.accumulate());
        assert_eq!(state.phase(), AlarmPhase::Active);
        assert!(!state.accumulate());
    }

    #[test]
    fn reset_keeps_alarm_flag() {
        let mut state = AlarmState::new(0.2, 0.1);
        state.accumulate();
        state.accumulate();
        state.reset_accumulator();
        assert_eq!(state.fatigue_accumulator(), 0.0);
        assert!(state.is_active());
    }
}
