// VitalWatch - Hardware, Threshold & Monitor Configuration
// Target: ESP32 with MPU6050 (IMU) and MAX30100 (pulse oximeter) on I2C
//
// The `pub const` blocks are the reference values.  They seed the
// `Default` impls and the per-variant presets of `MonitorConfig`, which is
// validated once at startup and never mutated afterwards.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::detect::debounce::BouncePolicy;
use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// GPIO Pin Definitions
// ---------------------------------------------------------------------------
pub const PIN_BUTTON: i32 = 3; // User button (INPUT_PULLUP, active LOW) - flag reset
pub const PIN_HAPTIC: i32 = 4; // Haptic motor control
pub const PIN_I2C_SDA: i32 = 21; // I2C data line
pub const PIN_I2C_SCL: i32 = 22; // I2C clock line

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_ADDR_MPU6050: u8 = 0x68;
pub const I2C_ADDR_OLED: u8 = 0x3C;
pub const I2C_BAUDRATE_KHZ: u32 = 100; // 100 kHz is more reliable on long wrist leads
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks

// ---------------------------------------------------------------------------
// Display (SSD1306 OLED)
// ---------------------------------------------------------------------------
pub const SCREEN_WIDTH: u32 = 128;
pub const SCREEN_HEIGHT: u32 = 64;
pub const DISPLAY_BUFFER_SIZE: usize = (SCREEN_WIDTH as usize * SCREEN_HEIGHT as usize) / 8; // 1024
pub const DISPLAY_REFRESH_MS: u32 = 1000;

// ---------------------------------------------------------------------------
// Task Stack Sizes (bytes)
// ---------------------------------------------------------------------------
pub const STACK_MONITOR: usize = 16384;

// ---------------------------------------------------------------------------
// Timing (milliseconds)
// ---------------------------------------------------------------------------
pub const SAMPLE_RATE_HZ: u32 = 100; // IMU variants
pub const VITALS_SAMPLE_RATE_HZ: u32 = 10; // combined IMU + oximeter variant
pub const MAX_SAMPLE_RATE_HZ: u32 = 1000; // 1 ms tick
pub const STATUS_INTERVAL_MS: u32 = 5000;
pub const BUTTON_DEBOUNCE_MS: u32 = 50;
pub const LONG_PRESS_MS: u32 = 3000;
pub const DOUBLE_CLICK_WINDOW_MS: u32 = 400;

// ---------------------------------------------------------------------------
// Unit Conversion
// ---------------------------------------------------------------------------
pub const STANDARD_GRAVITY: f32 = 9.80665; // m/s² per g
pub const RAD_TO_DEG: f32 = 57.2958;

// ---------------------------------------------------------------------------
// Vital-Sign Thresholds (BPM, %)
// ---------------------------------------------------------------------------
pub const HR_SEPSIS_HIGH: f32 = 100.0;
pub const HR_SEPSIS_LOW: f32 = 60.0;
pub const HR_SEIZURE_HIGH: f32 = 120.0;
pub const HR_CRITICAL_HIGH: f32 = 140.0;
pub const HR_CRITICAL_LOW: f32 = 50.0;
pub const SPO2_SEPSIS_LOW: f32 = 95.0;
pub const SPO2_SEIZURE_LOW: f32 = 90.0;
pub const SPO2_CRITICAL_LOW: f32 = 85.0;

// ---------------------------------------------------------------------------
// Motion Thresholds (g, °/s, ms)
// ---------------------------------------------------------------------------
pub const ACCEL_MOTION_G: f32 = 3.0;
pub const GYRO_MOTION_DPS: f32 = 50.0;
pub const ACCEL_CRITICAL_G: f32 = 5.0;
pub const GYRO_CRITICAL_DPS: f32 = 100.0;
pub const MOTION_DURATION_MS: u32 = 10_000;
pub const CRITICAL_MOTION_DURATION_MS: u32 = 30_000;

// ---------------------------------------------------------------------------
// Fall Detection
// ---------------------------------------------------------------------------
pub const FREEFALL_G: f32 = 0.5;
pub const FALL_GYRO_DPS: f32 = 100.0;
pub const FALL_DEBOUNCE_MS: u32 = 100;
pub const FALL_HOLD_MS: u32 = 5000;

// ---------------------------------------------------------------------------
// Seizure Detection (gyro RMS over a 1-second window)
// ---------------------------------------------------------------------------
pub const SEIZURE_RMS_DPS: f32 = 80.0;
pub const SEIZURE_ESCALATION_MS: u32 = 13_000;

// ---------------------------------------------------------------------------
// Alert Cooldowns
// ---------------------------------------------------------------------------
pub const SEPSIS_COOLDOWN_MS: u32 = 300_000; // 5 minutes
pub const SEIZURE_COOLDOWN_MS: u32 = 180_000; // 3 minutes
pub const CRITICAL_COOLDOWN_MS: u32 = 60_000; // 1 minute

// ---------------------------------------------------------------------------
// Sensor Recovery
// ---------------------------------------------------------------------------
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;
pub const REINIT_ATTEMPTS: u32 = 5;
pub const REINIT_BACKOFF_MS: u32 = 500;

// ---------------------------------------------------------------------------
// MPU6050 Sensor Scale Factors
// ---------------------------------------------------------------------------
pub const ACCEL_SCALE_2G: f32 = 16384.0; // LSB/g  at ±2 g
pub const ACCEL_SCALE_8G: f32 = 4096.0; // LSB/g  at ±8 g
pub const GYRO_SCALE_250: f32 = 131.0; // LSB/°/s at ±250 °/s
pub const GYRO_SCALE_500: f32 = 65.5; // LSB/°/s at ±500 °/s

// ---------------------------------------------------------------------------
// Units reported by the sensor source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccelUnit {
    /// Already in g (raw register driver).
    StandardGravity,
    /// SI units, as reported by unified sensor libraries.
    MetersPerSecondSquared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GyroUnit {
    DegreesPerSecond,
    RadiansPerSecond,
}

// ---------------------------------------------------------------------------
// Threshold groups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalThresholds {
    pub hr_sepsis_high: f32,
    pub hr_sepsis_low: f32,
    pub hr_seizure_high: f32,
    pub hr_critical_high: f32,
    pub hr_critical_low: f32,
    pub spo2_sepsis_low: f32,
    pub spo2_seizure_low: f32,
    pub spo2_critical_low: f32,
}

impl Default for VitalThresholds {
    fn default() -> Self {
        Self {
            hr_sepsis_high: HR_SEPSIS_HIGH,
            hr_sepsis_low: HR_SEPSIS_LOW,
            hr_seizure_high: HR_SEIZURE_HIGH,
            hr_critical_high: HR_CRITICAL_HIGH,
            hr_critical_low: HR_CRITICAL_LOW,
            spo2_sepsis_low: SPO2_SEPSIS_LOW,
            spo2_seizure_low: SPO2_SEIZURE_LOW,
            spo2_critical_low: SPO2_CRITICAL_LOW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionThresholds {
    /// Either magnitude above its motion threshold counts as "moving".
    pub accel_motion_g: f32,
    pub gyro_motion_dps: f32,
    pub accel_critical_g: f32,
    pub gyro_critical_dps: f32,
    pub motion_duration_ms: u32,
    pub critical_motion_duration_ms: u32,
}

impl Default for MotionThresholds {
    fn default() -> Self {
        Self {
            accel_motion_g: ACCEL_MOTION_G,
            gyro_motion_dps: GYRO_MOTION_DPS,
            accel_critical_g: ACCEL_CRITICAL_G,
            gyro_critical_dps: GYRO_CRITICAL_DPS,
            motion_duration_ms: MOTION_DURATION_MS,
            critical_motion_duration_ms: CRITICAL_MOTION_DURATION_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallThresholds {
    pub freefall_g: f32,
    /// Single-axis rate that must be exceeded when the fall is confirmed.
    /// `None` confirms on free-fall alone.
    pub gyro_spike_dps: Option<f32>,
    pub debounce_ms: u32,
    /// Auto-clear delay after confirmation.  `None` = manual reset only.
    pub hold_ms: Option<u32>,
}

impl Default for FallThresholds {
    fn default() -> Self {
        Self {
            freefall_g: FREEFALL_G,
            gyro_spike_dps: Some(FALL_GYRO_DPS),
            debounce_ms: FALL_DEBOUNCE_MS,
            hold_ms: Some(FALL_HOLD_MS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeizureThresholds {
    pub rms_dps: f32,
    /// Time the RMS condition must hold before the warning becomes severe.
    /// `None` keeps the flag at warning level.
    pub escalation_ms: Option<u32>,
    /// Auto-clear delay for a severe flag.  `None` = manual reset only.
    pub hold_ms: Option<u32>,
    /// What happens to a warning when the RMS drops before escalation.
    pub bounce: BouncePolicy,
}

impl Default for SeizureThresholds {
    fn default() -> Self {
        Self {
            rms_dps: SEIZURE_RMS_DPS,
            escalation_ms: Some(SEIZURE_ESCALATION_MS),
            hold_ms: None,
            bounce: BouncePolicy::Reset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownPeriods {
    pub sepsis_ms: u32,
    pub seizure_ms: u32,
    pub critical_ms: u32,
}

impl Default for CooldownPeriods {
    fn default() -> Self {
        Self {
            sepsis_ms: SEPSIS_COOLDOWN_MS,
            seizure_ms: SEIZURE_COOLDOWN_MS,
            critical_ms: CRITICAL_COOLDOWN_MS,
        }
    }
}

/// Every numeric constant the detection core compares against.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub vitals: VitalThresholds,
    pub motion: MotionThresholds,
    pub fall: FallThresholds,
    pub seizure: SeizureThresholds,
    pub cooldown: CooldownPeriods,
}

impl ThresholdConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.vitals;
        for (field, value) in [
            ("hr_sepsis_high", v.hr_sepsis_high),
            ("hr_sepsis_low", v.hr_sepsis_low),
            ("hr_seizure_high", v.hr_seizure_high),
            ("hr_critical_high", v.hr_critical_high),
            ("hr_critical_low", v.hr_critical_low),
            ("spo2_sepsis_low", v.spo2_sepsis_low),
            ("spo2_seizure_low", v.spo2_seizure_low),
            ("spo2_critical_low", v.spo2_critical_low),
            ("accel_motion_g", self.motion.accel_motion_g),
            ("gyro_motion_dps", self.motion.gyro_motion_dps),
            ("accel_critical_g", self.motion.accel_critical_g),
            ("gyro_critical_dps", self.motion.gyro_critical_dps),
            ("freefall_g", self.fall.freefall_g),
            ("seizure_rms_dps", self.seizure.rms_dps),
        ] {
            finite(field, value)?;
        }
        if let Some(spike) = self.fall.gyro_spike_dps {
            finite("fall_gyro_spike_dps", spike)?;
        }

        positive("hr_critical_low", v.hr_critical_low)?;
        positive("spo2_critical_low", v.spo2_critical_low)?;
        positive("freefall_g", self.fall.freefall_g)?;
        positive("seizure_rms_dps", self.seizure.rms_dps)?;

        below("hr_critical_low", v.hr_critical_low, "hr_sepsis_low", v.hr_sepsis_low)?;
        below("hr_sepsis_low", v.hr_sepsis_low, "hr_sepsis_high", v.hr_sepsis_high)?;
        at_most("hr_sepsis_high", v.hr_sepsis_high, "hr_seizure_high", v.hr_seizure_high)?;
        below("hr_seizure_high", v.hr_seizure_high, "hr_critical_high", v.hr_critical_high)?;

        below("spo2_critical_low", v.spo2_critical_low, "spo2_seizure_low", v.spo2_seizure_low)?;
        below("spo2_seizure_low", v.spo2_seizure_low, "spo2_sepsis_low", v.spo2_sepsis_low)?;
        at_most("spo2_sepsis_low", v.spo2_sepsis_low, "100 %", 100.0)?;

        let m = &self.motion;
        below("accel_motion_g", m.accel_motion_g, "accel_critical_g", m.accel_critical_g)?;
        below("gyro_motion_dps", m.gyro_motion_dps, "gyro_critical_dps", m.gyro_critical_dps)?;
        if m.motion_duration_ms >= m.critical_motion_duration_ms {
            return Err(ConfigError::Misordered {
                low: "motion_duration_ms",
                high: "critical_motion_duration_ms",
            });
        }
        // Free-fall is a *drop* below 1 g; a threshold above the motion
        // threshold would make every moving sample a free-fall.
        below("freefall_g", self.fall.freefall_g, "accel_motion_g", m.accel_motion_g)?;

        Ok(())
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field })
    }
}

fn below(low: &'static str, a: f32, high: &'static str, b: f32) -> Result<(), ConfigError> {
    if a < b {
        Ok(())
    } else {
        Err(ConfigError::Misordered { low, high })
    }
}

fn at_most(low: &'static str, a: f32, high: &'static str, b: f32) -> Result<(), ConfigError> {
    if a <= b {
        Ok(())
    } else {
        Err(ConfigError::Misordered { low, high })
    }
}

// ---------------------------------------------------------------------------
// Sensor recovery
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryPolicy {
    /// Consecutive failed reads before the sensor is reinitialised.
    pub max_consecutive_failures: u32,
    pub reinit_attempts: u32,
    /// First retry delay; doubles after every failed attempt.
    pub reinit_backoff_ms: u32,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            max_consecutive_failures: MAX_CONSECUTIVE_FAILURES,
            reinit_attempts: REINIT_ATTEMPTS,
            reinit_backoff_ms: REINIT_BACKOFF_MS,
        }
    }
}

// ---------------------------------------------------------------------------
// Monitor configuration (one value per device variant)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Tick rate.  Also the RMS window length, giving a 1-second window.
    pub sample_rate_hz: u32,
    pub accel_unit: AccelUnit,
    pub gyro_unit: GyroUnit,
    pub thresholds: ThresholdConfig,
    pub recovery: RecoveryPolicy,
    pub status_interval_ms: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: SAMPLE_RATE_HZ,
            accel_unit: AccelUnit::MetersPerSecondSquared,
            gyro_unit: GyroUnit::RadiansPerSecond,
            thresholds: ThresholdConfig::default(),
            recovery: RecoveryPolicy::default(),
            status_interval_ms: STATUS_INTERVAL_MS,
        }
    }
}

impl MonitorConfig {
    /// Reference thresholds with every detector enabled.
    pub fn reference() -> Self {
        Self::default()
    }

    /// Pulse oximeter plus IMU, polled at 10 Hz.  Tier alerts are the
    /// primary output; the fall flag auto-clears.
    pub fn combined_vitals() -> Self {
        Self {
            sample_rate_hz: VITALS_SAMPLE_RATE_HZ,
            ..Self::default()
        }
    }

    /// Bedside fall + seizure monitor.  Both flags stay raised until a
    /// caregiver resets them; a seizure escalates to severe after 13 s.
    pub fn fall_seizure_monitor() -> Self {
        let mut config = Self::default();
        config.thresholds.fall.hold_ms = None;
        config
    }

    /// Accelerometer-only free-fall detector (no gyro corroboration).
    pub fn fall_threshold() -> Self {
        let mut config = Self::default();
        config.thresholds.fall.freefall_g = 0.75;
        config.thresholds.fall.gyro_spike_dps = None;
        config.thresholds.seizure.escalation_ms = None;
        config
    }

    /// IMU-only monitor whose seizure flag follows the 1-second RMS.
    pub fn imu_rms() -> Self {
        let mut config = Self::default();
        config.thresholds.seizure.escalation_ms = None;
        config
    }

    /// Apply a (possibly partial) JSON document on top of this config.
    /// Fields the document leaves out keep their current values.
    pub fn with_overrides(&self, json: &str) -> serde_json::Result<Self> {
        let mut merged = serde_json::to_value(self)?;
        merge_json(&mut merged, serde_json::from_str(json)?);
        serde_json::from_value(merged)
    }

    pub fn tick_interval_ms(&self) -> u32 {
        (1000 / self.sample_rate_hz.max(1)).max(1)
    }

    pub fn window_size(&self) -> usize {
        self.sample_rate_hz.max(1) as usize
    }

    /// Startup check.  Out-of-order thresholds are fatal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate_hz == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if self.sample_rate_hz > MAX_SAMPLE_RATE_HZ {
            return Err(ConfigError::SampleRateTooHigh {
                rate_hz: self.sample_rate_hz,
                max_hz: MAX_SAMPLE_RATE_HZ,
            });
        }
        if self.recovery.max_consecutive_failures == 0 {
            return Err(ConfigError::ZeroFailureThreshold);
        }
        self.thresholds.validate()
    }
}

fn merge_json(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                merge_json(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, value) => *base = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        for config in [
            MonitorConfig::reference(),
            MonitorConfig::combined_vitals(),
            MonitorConfig::fall_seizure_monitor(),
            MonitorConfig::fall_threshold(),
            MonitorConfig::imu_rms(),
        ] {
            assert_eq!(config.validate(), Ok(()));
        }
    }

    #[test]
    fn window_matches_sample_rate() {
        let config = MonitorConfig::combined_vitals();
        assert_eq!(config.window_size(), 10);
        assert_eq!(config.tick_interval_ms(), 100);
        assert_eq!(MonitorConfig::reference().tick_interval_ms(), 10);
    }

    #[test]
    fn swapped_heart_rate_pair_is_rejected() {
        let mut config = MonitorConfig::reference();
        config.thresholds.vitals.hr_sepsis_low = 110.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::Misordered {
                low: "hr_sepsis_low",
                high: "hr_sepsis_high"
            })
        );
    }

    #[test]
    fn spo2_bands_must_descend() {
        let mut config = MonitorConfig::reference();
        config.thresholds.vitals.spo2_critical_low = 92.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Misordered { low: "spo2_critical_low", .. })
        ));
    }

    #[test]
    fn motion_durations_must_ascend() {
        let mut config = MonitorConfig::reference();
        config.thresholds.motion.motion_duration_ms = 40_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn nan_threshold_is_rejected() {
        let mut config = MonitorConfig::reference();
        config.thresholds.motion.gyro_critical_dps = f32::NAN;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonFinite { field: "gyro_critical_dps" })
        );
    }

    #[test]
    fn zero_rate_and_zero_failure_threshold_are_rejected() {
        let mut config = MonitorConfig::reference();
        config.sample_rate_hz = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroSampleRate));

        let mut config = MonitorConfig::reference();
        config.recovery.max_consecutive_failures = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroFailureThreshold));
    }

    #[test]
    fn fall_seizure_monitor_latches_and_escalates() {
        let config = MonitorConfig::fall_seizure_monitor();
        assert_eq!(config.thresholds.fall.hold_ms, None);
        assert_eq!(config.thresholds.seizure.escalation_ms, Some(SEIZURE_ESCALATION_MS));
        assert_eq!(config.thresholds.seizure.hold_ms, None);
        assert_eq!(config.thresholds.seizure.bounce, BouncePolicy::Reset);
    }

    #[test]
    fn sample_rate_above_one_khz_is_rejected() {
        let mut config = MonitorConfig::reference();
        config.sample_rate_hz = MAX_SAMPLE_RATE_HZ;
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_interval_ms(), 1);
        assert_eq!(config.window_size(), 1_000);

        config.sample_rate_hz = 4_000;
        assert_eq!(
            config.validate(),
            Err(ConfigError::SampleRateTooHigh {
                rate_hz: 4_000,
                max_hz: 1_000
            })
        );
    }

    #[test]
    fn overrides_apply_on_top_of_a_preset() {
        let preset = MonitorConfig::fall_seizure_monitor();
        let config = preset
            .with_overrides(r#"{ "sample_rate_hz": 50, "thresholds": { "seizure": { "rms_dps": 70.0 } } }"#)
            .unwrap();
        assert_eq!(config.sample_rate_hz, 50);
        assert_eq!(config.thresholds.seizure.rms_dps, 70.0);
        // Untouched preset choices survive.
        assert_eq!(config.thresholds.fall.hold_ms, None);
        assert_eq!(config.thresholds.seizure.escalation_ms, Some(SEIZURE_ESCALATION_MS));
        assert_eq!(config.thresholds.vitals, preset.thresholds.vitals);

        let config = MonitorConfig::reference()
            .with_overrides(r#"{ "thresholds": { "fall": { "hold_ms": null } } }"#)
            .unwrap();
        assert_eq!(config.thresholds.fall.hold_ms, None);
        assert!(MonitorConfig::reference().with_overrides("[1, 2]").is_err());
    }

    #[test]
    fn partial_json_falls_back_to_reference_values() {
        let json = r#"{ "sample_rate_hz": 50, "thresholds": { "fall": { "hold_ms": null } } }"#;
        let config: MonitorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.sample_rate_hz, 50);
        assert_eq!(config.thresholds.fall.hold_ms, None);
        assert_eq!(config.thresholds.fall.freefall_g, FREEFALL_G);
        assert_eq!(config.thresholds.vitals, VitalThresholds::default());
    }
}
