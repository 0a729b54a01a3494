// VitalWatch - Debounced Event Detection
//
// IDLE -> OBSERVING -> CONFIRMED -> IDLE, driven once per tick by a boolean
// predicate.  Confirmation needs the predicate to hold for the debounce
// interval; a confirmed flag is cleared by its hold timer or by an explicit
// reset, and either way the next detection starts from IDLE.

use serde::{Deserialize, Serialize};

use crate::clock::elapsed_ms;
use crate::events::{FlagLevel, FlagState};

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebounceTimer {
    active: bool,
    start_ms: u32,
}

impl DebounceTimer {
    pub fn start(&mut self, now_ms: u32) {
        self.active = true;
        self.start_ms = now_ms;
    }

    pub fn stop(&mut self) {
        self.active = false;
        self.start_ms = 0;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn elapsed(&self, now_ms: u32) -> Option<u32> {
        self.active.then(|| elapsed_ms(now_ms, self.start_ms))
    }

    /// Follow a level condition: start on the rising edge, stop on the
    /// falling edge.  Returns how long the condition has held.
    pub fn track(&mut self, condition: bool, now_ms: u32) -> Option<u32> {
        match (condition, self.active) {
            (true, false) => self.start(now_ms),
            (false, true) => self.stop(),
            _ => {}
        }
        self.elapsed(now_ms)
    }
}

// ---------------------------------------------------------------------------
// Event detector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BouncePolicy {
    /// A false predicate while observing drops back to IDLE.
    Reset,
    /// The observation survives gaps; only confirmation, hold or reset end it.
    Latch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorPhase {
    #[default]
    Idle,
    Observing,
    Confirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagTransition {
    Observing,
    Confirmed,
    /// Predicate fell before the debounce interval elapsed.
    Bounced,
    AutoCleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorSettings {
    /// Debounce interval.  `None` never confirms.
    pub confirm_after_ms: Option<u32>,
    /// Auto-clear delay after confirmation.  `None` waits for a reset.
    pub hold_ms: Option<u32>,
    pub bounce: BouncePolicy,
    /// Flag level shown while observing.
    pub observing_level: FlagLevel,
    pub confirmed_level: FlagLevel,
}

#[derive(Debug, Clone)]
pub struct EventDetector {
    settings: DetectorSettings,
    phase: DetectorPhase,
    timer: DebounceTimer,
    flag: FlagState,
}

impl EventDetector {
    pub fn new(settings: DetectorSettings) -> Self {
        Self {
            settings,
            phase: DetectorPhase::Idle,
            timer: DebounceTimer::default(),
            flag: FlagState::default(),
        }
    }

    /// Advance one tick.  `corroborated` is an extra predicate that must
    /// also be true at the instant of confirmation.
    pub fn update(&mut self, condition: bool, corroborated: bool, now_ms: u32) -> Option<FlagTransition> {
        match self.phase {
            DetectorPhase::Idle => {
                if !condition {
                    return None;
                }
                self.phase = DetectorPhase::Observing;
                self.timer.start(now_ms);
                if self.settings.observing_level != FlagLevel::Clear {
                    self.flag = FlagState::raised(self.settings.observing_level, now_ms);
                }
                Some(FlagTransition::Observing)
            }

            DetectorPhase::Observing => {
                if !condition {
                    return match self.settings.bounce {
                        BouncePolicy::Reset => {
                            self.clear();
                            Some(FlagTransition::Bounced)
                        }
                        BouncePolicy::Latch => None,
                    };
                }

                let confirm_after = self.settings.confirm_after_ms?;
                let held = self.timer.elapsed(now_ms)?;
                if held >= confirm_after && corroborated {
                    self.phase = DetectorPhase::Confirmed;
                    self.timer.stop();
                    self.flag = FlagState::raised(self.settings.confirmed_level, now_ms);
                    Some(FlagTransition::Confirmed)
                } else {
                    None
                }
            }

            DetectorPhase::Confirmed => {
                let hold = self.settings.hold_ms?;
                let raised_at = self.flag.raised_at_ms?;
                if elapsed_ms(now_ms, raised_at) >= hold {
                    self.clear();
                    Some(FlagTransition::AutoCleared)
                } else {
                    None
                }
            }
        }
    }

    /// Explicit reset.  Idempotent; returns whether anything was cleared.
    pub fn reset(&mut self) -> bool {
        let changed = self.phase != DetectorPhase::Idle || self.flag.is_set();
        self.clear();
        changed
    }

    fn clear(&mut self) {
        self.phase = DetectorPhase::Idle;
        self.timer.stop();
        self.flag = FlagState::default();
    }

    pub fn phase(&self) -> DetectorPhase {
        self.phase
    }

    pub fn flag(&self) -> FlagState {
        self.flag
    }

    pub fn settings(&self) -> &DetectorSettings {
        &self.settings
    }

    /// How long the current observation has been running.
    pub fn observed_for(&self, now_ms: u32) -> Option<u32> {
        self.timer.elapsed(now_ms)
    }
}

// ---------------------------------------------------------------------------
// Sustained motion (feeds the classifier, raises no flag of its own)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct SustainedMotion {
    timer: DebounceTimer,
}

impl SustainedMotion {
    /// Returns how long motion has continuously been above threshold.
    pub fn update(&mut self, moving: bool, now_ms: u32) -> Option<u32> {
        self.timer.track(moving, now_ms)
    }

    pub fn duration(&self, now_ms: u32) -> Option<u32> {
        self.timer.elapsed(now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEBOUNCE: u32 = 100;
    const TICK: u32 = 10;

    fn fall_detector(hold_ms: Option<u32>) -> EventDetector {
        EventDetector::new(DetectorSettings {
            confirm_after_ms: Some(DEBOUNCE),
            hold_ms,
            bounce: BouncePolicy::Reset,
            observing_level: FlagLevel::Clear,
            confirmed_level: FlagLevel::Raised,
        })
    }

    #[test]
    fn timer_tracks_level() {
        let mut timer = DebounceTimer::default();
        assert_eq!(timer.track(false, 0), None);
        assert_eq!(timer.track(true, 100), Some(0));
        assert_eq!(timer.track(true, 250), Some(150));
        assert_eq!(timer.track(false, 260), None);
        assert!(!timer.is_active());
    }

    #[test]
    fn short_dip_bounces() {
        let mut det = fall_detector(None);
        let mut now = 1_000;
        // Below threshold for 90 ms only, with a gyro spike throughout.
        while now < 1_000 + DEBOUNCE {
            det.update(true, true, now);
            now += TICK;
        }
        assert_eq!(det.update(false, true, now), Some(FlagTransition::Bounced));
        assert_eq!(det.phase(), DetectorPhase::Idle);
        assert!(!det.flag().is_set());
    }

    #[test]
    fn sustained_dip_confirms_exactly_once() {
        let mut det = fall_detector(None);
        let mut confirmations = 0;
        for i in 0..200 {
            if det.update(true, true, i * TICK) == Some(FlagTransition::Confirmed) {
                confirmations += 1;
            }
        }
        assert_eq!(confirmations, 1);
        assert_eq!(det.flag().level, FlagLevel::Raised);
        assert_eq!(det.flag().raised_at_ms, Some(DEBOUNCE));
    }

    #[test]
    fn confirmation_waits_for_corroboration() {
        let mut det = fall_detector(None);
        det.update(true, false, 0);
        assert_eq!(det.update(true, false, 150), None);
        assert_eq!(det.phase(), DetectorPhase::Observing);
        assert_eq!(det.update(true, true, 160), Some(FlagTransition::Confirmed));
    }

    #[test]
    fn hold_auto_clears() {
        let mut det = fall_detector(Some(5_000));
        det.update(true, true, 0);
        det.update(true, true, 100);
        assert_eq!(det.update(false, false, 5_099), None);
        assert_eq!(det.update(false, false, 5_100), Some(FlagTransition::AutoCleared));
        assert_eq!(det.flag(), FlagState::default());
    }

    #[test]
    fn reset_requires_fresh_debounce() {
        let mut det = fall_detector(None);
        det.update(true, true, 0);
        det.update(true, true, 100);
        assert!(det.flag().is_set());

        assert!(det.reset());
        assert!(!det.reset());
        assert_eq!(det.flag(), FlagState::default());

        // Condition still physically true: re-observe, then a full interval.
        assert_eq!(det.update(true, true, 110), Some(FlagTransition::Observing));
        assert_eq!(det.update(true, true, 200), None);
        assert_eq!(det.update(true, true, 210), Some(FlagTransition::Confirmed));
    }

    #[test]
    fn latch_keeps_observation_through_gaps() {
        let mut det = EventDetector::new(DetectorSettings {
            confirm_after_ms: Some(1_000),
            hold_ms: None,
            bounce: BouncePolicy::Latch,
            observing_level: FlagLevel::Raised,
            confirmed_level: FlagLevel::Severe,
        });
        det.update(true, true, 0);
        assert_eq!(det.flag().level, FlagLevel::Raised);
        assert_eq!(det.update(false, true, 500), None);
        assert_eq!(det.flag().level, FlagLevel::Raised);
        // Gap elapsed the interval, but confirmation needs the predicate.
        assert_eq!(det.update(false, true, 1_200), None);
        assert_eq!(det.update(true, true, 1_300), Some(FlagTransition::Confirmed));
        assert_eq!(det.flag().level, FlagLevel::Severe);
    }

    #[test]
    fn unconfirmable_detector_only_observes() {
        let mut det = EventDetector::new(DetectorSettings {
            confirm_after_ms: None,
            hold_ms: None,
            bounce: BouncePolicy::Reset,
            observing_level: FlagLevel::Raised,
            confirmed_level: FlagLevel::Severe,
        });
        det.update(true, true, 0);
        assert_eq!(det.update(true, true, 60_000), None);
        assert_eq!(det.flag().level, FlagLevel::Raised);
        assert_eq!(det.update(false, true, 60_010), Some(FlagTransition::Bounced));
    }

    #[test]
    fn sustained_motion_measures_continuous_run() {
        let mut motion = SustainedMotion::default();
        assert_eq!(motion.update(true, 0), Some(0));
        assert_eq!(motion.update(true, 9_000), Some(9_000));
        assert_eq!(motion.update(false, 9_100), None);
        assert_eq!(motion.update(true, 9_200), Some(0));
        assert_eq!(motion.duration(9_700), Some(500));
    }
}
