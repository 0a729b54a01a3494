// VitalWatch - Threshold Classifier
//
// Picks exactly one tier per tick, in strict priority order
// CRITICAL > SEIZURE > SEPSIS > NONE.  Lower tiers are not evaluated once a
// higher one matches.  The matched sub-conditions are kept for the alert
// text only; they never influence the tier.

use std::fmt::Write as _;

use crate::config::{MotionThresholds, ThresholdConfig, VitalThresholds};
use crate::events::{Condition, Tier, Vitals};

/// Everything the rule table looks at for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClassifierInput {
    pub heart_rate: Option<f32>,
    pub spo2: Option<f32>,
    pub accel_g: f32,
    pub gyro_dps: f32,
    /// Continuous above-threshold motion, if any.
    pub motion_duration_ms: Option<u32>,
    /// Latest windowed RMS, `None` before the first full window.
    pub gyro_rms_dps: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub tier: Tier,
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    vitals: VitalThresholds,
    motion: MotionThresholds,
    seizure_rms_dps: f32,
}

impl Classifier {
    pub fn new(thresholds: &ThresholdConfig) -> Self {
        Self {
            vitals: thresholds.vitals,
            motion: thresholds.motion,
            seizure_rms_dps: thresholds.seizure.rms_dps,
        }
    }

    pub fn classify(&self, input: &ClassifierInput) -> Classification {
        for (tier, rules) in [
            (Tier::Critical, Self::critical as fn(&Self, &ClassifierInput) -> Vec<Condition>),
            (Tier::Seizure, Self::seizure),
            (Tier::Sepsis, Self::sepsis),
        ] {
            let conditions = rules(self, input);
            if !conditions.is_empty() {
                return Classification { tier, conditions };
            }
        }
        Classification::default()
    }

    fn critical(&self, input: &ClassifierInput) -> Vec<Condition> {
        let v = &self.vitals;
        let m = &self.motion;
        let mut found = Vec::new();

        if let Some(hr) = input.heart_rate {
            if hr > v.hr_critical_high {
                found.push(Condition::ExtremeTachycardia);
            }
            if hr < v.hr_critical_low {
                found.push(Condition::ExtremeBradycardia);
            }
        }
        if input.spo2.is_some_and(|s| s < v.spo2_critical_low) {
            found.push(Condition::SevereHypoxemia);
        }
        if input.accel_g > m.accel_critical_g {
            found.push(Condition::ViolentMotion);
        }
        if input.gyro_dps > m.gyro_critical_dps {
            found.push(Condition::ViolentRotation);
        }
        if input
            .motion_duration_ms
            .is_some_and(|d| d > m.critical_motion_duration_ms)
        {
            found.push(Condition::ProlongedSeizureActivity);
        }
        found
    }

    fn seizure(&self, input: &ClassifierInput) -> Vec<Condition> {
        let mut found = Vec::new();

        if input.heart_rate.is_some_and(|hr| hr > self.vitals.hr_seizure_high) {
            found.push(Condition::HighHeartRate);
        }
        if input.spo2.is_some_and(|s| s < self.vitals.spo2_seizure_low) {
            found.push(Condition::LowSpO2);
        }
        if input
            .motion_duration_ms
            .is_some_and(|d| d > self.motion.motion_duration_ms)
        {
            found.push(Condition::ProlongedMotion);
        }
        if input.gyro_rms_dps.is_some_and(|rms| rms > self.seizure_rms_dps) {
            found.push(Condition::SustainedTremor);
        }
        found
    }

    fn sepsis(&self, input: &ClassifierInput) -> Vec<Condition> {
        let v = &self.vitals;
        let mut found = Vec::new();

        if let Some(hr) = input.heart_rate {
            if hr > v.hr_sepsis_high {
                found.push(Condition::Tachycardia);
            }
            if hr < v.hr_sepsis_low {
                found.push(Condition::Bradycardia);
            }
        }
        if input.spo2.is_some_and(|s| s < v.spo2_sepsis_low) {
            found.push(Condition::Hypoxemia);
        }
        found
    }
}

/// Operator text, e.g. `CRITICAL ALERT! Extreme Tachycardia HR:150.0 SpO2:99.0`.
pub fn compose_message(classification: &Classification, vitals: &Vitals) -> String {
    let mut message = format!("{} ALERT!", classification.tier.as_str());
    for condition in &classification.conditions {
        message.push(' ');
        message.push_str(condition.label());
    }
    let _ = write!(message, " HR:{}", reading(vitals.heart_rate));
    let _ = write!(message, " SpO2:{}", reading(vitals.spo2));
    message
}

fn reading(value: Option<f32>) -> String {
    value.map_or_else(|| "--".to_owned(), |v| format!("{v:.1}"))
}
