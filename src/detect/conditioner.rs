// VitalWatch - Signal Conditioner
//
// Turns one raw frame into g / °/s magnitudes and tracks how many reads in a
// row have failed.

use crate::config::{AccelUnit, GyroUnit, MonitorConfig, RAD_TO_DEG, STANDARD_GRAVITY};
use crate::error::ConditionError;
use crate::events::{MotionMagnitude, SampleFrame, Vitals};

#[derive(Debug, Clone, Copy)]
pub struct SignalConditioner {
    accel_unit: AccelUnit,
    gyro_unit: GyroUnit,
}

impl SignalConditioner {
    pub fn new(accel_unit: AccelUnit, gyro_unit: GyroUnit) -> Self {
        Self {
            accel_unit,
            gyro_unit,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.accel_unit, config.gyro_unit)
    }

    /// Reject the whole frame if any axis is NaN or infinite; a single bad
    /// axis would otherwise poison every magnitude derived from it.
    pub fn condition(&self, frame: &SampleFrame) -> Result<MotionMagnitude, ConditionError> {
        if frame.accel.iter().any(|v| !v.is_finite()) {
            return Err(ConditionError::NonFinite { axis: "accelerometer" });
        }
        if frame.gyro.iter().any(|v| !v.is_finite()) {
            return Err(ConditionError::NonFinite { axis: "gyroscope" });
        }

        let accel_scale = match self.accel_unit {
            AccelUnit::StandardGravity => 1.0,
            AccelUnit::MetersPerSecondSquared => 1.0 / STANDARD_GRAVITY,
        };
        let gyro_scale = match self.gyro_unit {
            GyroUnit::DegreesPerSecond => 1.0,
            GyroUnit::RadiansPerSecond => RAD_TO_DEG,
        };

        let accel = frame.accel.map(|v| v * accel_scale);
        let gyro = frame.gyro.map(|v| v * gyro_scale);

        let magnitude = MotionMagnitude {
            accel_g: norm(&accel),
            gyro_dps: norm(&gyro),
            peak_axis_dps: gyro.iter().fold(0.0f32, |peak, v| peak.max(v.abs())),
        };

        // Huge-but-finite inputs can still overflow when squared.
        if !magnitude.accel_g.is_finite() {
            return Err(ConditionError::NonFinite { axis: "accelerometer" });
        }
        if !magnitude.gyro_dps.is_finite() {
            return Err(ConditionError::NonFinite { axis: "gyroscope" });
        }
        Ok(magnitude)
    }

    /// The oximeter reports 0 while it has no finger contact; treat that the
    /// same as no reading.
    pub fn vitals(&self, frame: &SampleFrame) -> Vitals {
        Vitals {
            heart_rate: frame.heart_rate.filter(|hr| hr.is_finite() && *hr > 0.0),
            spo2: frame.spo2.filter(|s| s.is_finite() && *s > 0.0),
        }
    }
}

fn norm(v: &[f32; 3]) -> f32 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

// ---------------------------------------------------------------------------
// Read-failure bookkeeping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct SensorHealth {
    threshold: u32,
    consecutive_failures: u32,
    total_failures: u32,
    reinit_count: u32,
}

impl SensorHealth {
    pub fn new(max_consecutive_failures: u32) -> Self {
        Self {
            threshold: max_consecutive_failures.max(1),
            consecutive_failures: 0,
            total_failures: 0,
            reinit_count: 0,
        }
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Returns `true` once the failure streak calls for a reinitialisation.
    pub fn record_failure(&mut self) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.total_failures = self.total_failures.saturating_add(1);
        self.consecutive_failures >= self.threshold
    }

    /// Start a fresh streak after a reinitialisation attempt, whether or
    /// not it worked, so a dead sensor is retried every `threshold` ticks
    /// rather than on every tick.
    pub fn mark_reinitialized(&mut self) {
        self.consecutive_failures = 0;
        self.reinit_count = self.reinit_count.saturating_add(1);
    }

    pub fn is_healthy(&self) -> bool {
        self.consecutive_failures == 0
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn total_failures(&self) -> u32 {
        self.total_failures
    }

    pub fn reinit_count(&self) -> u32 {
        self.reinit_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn frame(accel: [f32; 3], gyro: [f32; 3]) -> SampleFrame {
        SampleFrame {
            accel,
            gyro,
            ..Default::default()
        }
    }

    #[test]
    fn si_units_are_converted() {
        let c = SignalConditioner::new(AccelUnit::MetersPerSecondSquared, GyroUnit::RadiansPerSecond);
        let m = c.condition(&frame([0.0, 0.0, STANDARD_GRAVITY], [1.0, 0.0, 0.0])).unwrap();
        assert_relative_eq!(m.accel_g, 1.0, epsilon = 1e-6);
        assert_relative_eq!(m.gyro_dps, RAD_TO_DEG, epsilon = 1e-3);
        assert_relative_eq!(m.peak_axis_dps, RAD_TO_DEG, epsilon = 1e-3);
    }

    #[test]
    fn native_units_pass_through() {
        let c = SignalConditioner::new(AccelUnit::StandardGravity, GyroUnit::DegreesPerSecond);
        let m = c.condition(&frame([3.0, 4.0, 0.0], [-30.0, 40.0, 0.0])).unwrap();
        assert_relative_eq!(m.accel_g, 5.0, epsilon = 1e-6);
        assert_relative_eq!(m.gyro_dps, 50.0, epsilon = 1e-4);
        assert_relative_eq!(m.peak_axis_dps, 40.0, epsilon = 1e-6);
    }

    #[test]
    fn nan_axis_is_rejected() {
        let c = SignalConditioner::new(AccelUnit::StandardGravity, GyroUnit::DegreesPerSecond);
        assert_eq!(
            c.condition(&frame([0.0, f32::NAN, 1.0], [0.0; 3])),
            Err(ConditionError::NonFinite { axis: "accelerometer" })
        );
        assert_eq!(
            c.condition(&frame([0.0, 0.0, 1.0], [f32::INFINITY, 0.0, 0.0])),
            Err(ConditionError::NonFinite { axis: "gyroscope" })
        );
    }

    #[test]
    fn overflowing_axis_is_rejected() {
        let c = SignalConditioner::new(AccelUnit::StandardGravity, GyroUnit::DegreesPerSecond);
        assert!(c.condition(&frame([f32::MAX, 0.0, 0.0], [0.0; 3])).is_err());
    }

    #[test]
    fn zero_and_nan_vitals_read_as_missing() {
        let c = SignalConditioner::new(AccelUnit::StandardGravity, GyroUnit::DegreesPerSecond);
        let mut f = frame([0.0, 0.0, 1.0], [0.0; 3]);
        f.heart_rate = Some(0.0);
        f.spo2 = Some(f32::NAN);
        assert_eq!(c.vitals(&f), Vitals::default());

        f.heart_rate = Some(72.0);
        f.spo2 = Some(98.0);
        assert_eq!(c.vitals(&f).heart_rate, Some(72.0));
        assert_eq!(c.vitals(&f).spo2, Some(98.0));
    }

    #[test]
    fn failure_streak_requests_reinit() {
        let mut health = SensorHealth::new(3);
        assert!(!health.record_failure());
        assert!(!health.record_failure());
        health.record_success();
        assert!(!health.record_failure());
        assert!(!health.record_failure());
        assert!(health.record_failure());
        assert_eq!(health.total_failures(), 5);

        health.mark_reinitialized();
        assert!(health.is_healthy());
        assert_eq!(health.reinit_count(), 1);
        assert!(!health.record_failure());
    }
}
