// VitalWatch - Scripted Sensor Source
//
// Plays back a list of segments (rest, free-fall, tremor, dropout) as
// synthetic IMU + oximeter frames.  Used by the host simulator and the
// integration tests in place of the I2C drivers.

use crate::clock::elapsed_ms;
use crate::config::{AccelUnit, GyroUnit, RAD_TO_DEG, STANDARD_GRAVITY};
use crate::error::SensorError;
use crate::events::SampleFrame;
use crate::sensor::SensorSource;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Motion {
    /// Wrist at rest: 1 g on Z, no rotation.
    Rest,
    /// Near-zero acceleration while spinning about X.
    FreeFall { spin_dps: f32 },
    /// Square-wave rotation about X, alternating sign every half period.
    Tremor { amplitude_dps: f32, period_ms: u32 },
    /// Every read fails.
    Dropout,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub duration_ms: u32,
    pub motion: Motion,
    pub heart_rate: Option<f32>,
    pub spo2: Option<f32>,
}

impl Segment {
    pub fn new(duration_ms: u32, motion: Motion) -> Self {
        Self {
            duration_ms,
            motion,
            heart_rate: None,
            spo2: None,
        }
    }

    pub fn with_vitals(mut self, heart_rate: f32, spo2: f32) -> Self {
        self.heart_rate = Some(heart_rate);
        self.spo2 = Some(spo2);
        self
    }
}

pub struct ScenarioSource {
    segments: Vec<Segment>,
    accel_unit: AccelUnit,
    gyro_unit: GyroUnit,
    /// Timestamp of the first read; segment offsets are relative to it.
    origin_ms: Option<u32>,
    reinit_count: u32,
}

impl ScenarioSource {
    /// Frames are produced in g and °/s unless `with_units` says otherwise.
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            accel_unit: AccelUnit::StandardGravity,
            gyro_unit: GyroUnit::DegreesPerSecond,
            origin_ms: None,
            reinit_count: 0,
        }
    }

    pub fn with_units(mut self, accel_unit: AccelUnit, gyro_unit: GyroUnit) -> Self {
        self.accel_unit = accel_unit;
        self.gyro_unit = gyro_unit;
        self
    }

    /// Normal vitals, a fall, a 15 s seizure, a short sensor dropout and
    /// finally a slide into sepsis-range vitals.
    pub fn demo() -> Self {
        Self::new(vec![
            Segment::new(3_000, Motion::Rest).with_vitals(72.0, 98.0),
            Segment::new(300, Motion::FreeFall { spin_dps: 150.0 }).with_vitals(75.0, 98.0),
            Segment::new(2_000, Motion::Rest).with_vitals(88.0, 97.0),
            Segment::new(
                15_000,
                Motion::Tremor {
                    amplitude_dps: 120.0,
                    period_ms: 200,
                },
            )
            .with_vitals(118.0, 93.0),
            Segment::new(2_000, Motion::Rest).with_vitals(96.0, 96.0),
            Segment::new(100, Motion::Dropout),
            Segment::new(5_000, Motion::Rest).with_vitals(108.0, 94.0),
        ])
    }

    pub fn total_duration_ms(&self) -> u32 {
        self.segments.iter().map(|s| s.duration_ms).sum()
    }

    pub fn reinit_count(&self) -> u32 {
        self.reinit_count
    }

    /// Segment active `offset_ms` into the script, plus the offset into it.
    /// Past the end the last segment repeats.
    fn segment_at(&self, offset_ms: u32) -> Option<(&Segment, u32)> {
        let mut start = 0u32;
        for segment in &self.segments {
            if offset_ms < start.saturating_add(segment.duration_ms) {
                return Some((segment, offset_ms - start));
            }
            start = start.saturating_add(segment.duration_ms);
        }
        self.segments
            .last()
            .map(|last| (last, offset_ms.saturating_sub(start - last.duration_ms)))
    }

    fn frame(&self, segment: &Segment, into_ms: u32, now_ms: u32) -> Result<SampleFrame, SensorError> {
        let (accel_g, gyro_dps) = match segment.motion {
            Motion::Rest => ([0.0, 0.0, 1.0], [0.0; 3]),
            Motion::FreeFall { spin_dps } => ([0.05, 0.05, 0.1], [spin_dps, 0.0, 0.0]),
            Motion::Tremor {
                amplitude_dps,
                period_ms,
            } => {
                let half = (period_ms / 2).max(1);
                let sign = if (into_ms / half) % 2 == 0 { 1.0 } else { -1.0 };
                ([0.0, 0.0, 1.0], [sign * amplitude_dps, 0.0, 0.0])
            }
            Motion::Dropout => return Err(SensorError::Read("no ACK from 0x68".into())),
        };

        let accel_scale = match self.accel_unit {
            AccelUnit::StandardGravity => 1.0,
            AccelUnit::MetersPerSecondSquared => STANDARD_GRAVITY,
        };
        let gyro_scale = match self.gyro_unit {
            GyroUnit::DegreesPerSecond => 1.0,
            GyroUnit::RadiansPerSecond => 1.0 / RAD_TO_DEG,
        };

        Ok(SampleFrame {
            accel: accel_g.map(|a| a * accel_scale),
            gyro: gyro_dps.map(|g| g * gyro_scale),
            heart_rate: segment.heart_rate,
            spo2: segment.spo2,
            timestamp_ms: now_ms,
        })
    }
}

impl SensorSource for ScenarioSource {
    fn read_frame(&mut self, now_ms: u32) -> Result<SampleFrame, SensorError> {
        let origin = *self.origin_ms.get_or_insert(now_ms);
        match self.segment_at(elapsed_ms(now_ms, origin)) {
            Some((segment, into_ms)) => self.frame(segment, into_ms, now_ms),
            None => Err(SensorError::Disconnected),
        }
    }

    fn reinitialize(&mut self) -> anyhow::Result<()> {
        self.reinit_count += 1;
        log::info!("Scenario source re-initialised ({} so far)", self.reinit_count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn segments_follow_each_other() {
        let mut source = ScenarioSource::new(vec![
            Segment::new(100, Motion::Rest),
            Segment::new(100, Motion::FreeFall { spin_dps: 150.0 }),
            Segment::new(100, Motion::Dropout),
        ]);
        assert_eq!(source.total_duration_ms(), 300);

        let rest = source.read_frame(5_000).unwrap();
        assert_relative_eq!(rest.accel[2], 1.0);
        let fall = source.read_frame(5_150).unwrap();
        assert_relative_eq!(fall.gyro[0], 150.0);
        assert_eq!(fall.timestamp_ms, 5_150);
        assert!(source.read_frame(5_250).is_err());
        // Past the end the last segment repeats.
        assert!(source.read_frame(9_000).is_err());
    }

    #[test]
    fn tremor_alternates_sign() {
        let mut source = ScenarioSource::new(vec![Segment::new(
            1_000,
            Motion::Tremor {
                amplitude_dps: 100.0,
                period_ms: 200,
            },
        )]);
        assert_relative_eq!(source.read_frame(0).unwrap().gyro[0], 100.0);
        assert_relative_eq!(source.read_frame(100).unwrap().gyro[0], -100.0);
        assert_relative_eq!(source.read_frame(200).unwrap().gyro[0], 100.0);
    }

    #[test]
    fn si_units_on_request() {
        let mut source = ScenarioSource::new(vec![Segment::new(
            1_000,
            Motion::FreeFall { spin_dps: 57.2958 },
        )])
        .with_units(AccelUnit::MetersPerSecondSquared, GyroUnit::RadiansPerSecond);
        let frame = source.read_frame(0).unwrap();
        assert_relative_eq!(frame.gyro[0], 1.0, epsilon = 1e-5);
        assert_relative_eq!(frame.accel[2], 0.1 * STANDARD_GRAVITY, epsilon = 1e-5);
    }

    #[test]
    fn empty_script_reports_disconnected() {
        let mut source = ScenarioSource::new(Vec::new());
        assert_eq!(source.read_frame(0), Err(SensorError::Disconnected));
        source.reinitialize().unwrap();
        assert_eq!(source.reinit_count(), 1);
    }
}
