// VitalWatch - Status Snapshot
//
// Read-only view of the monitor for the serial console (Display), the JSON
// data endpoint (serde) and the OLED panel.

use std::fmt;

use serde::Serialize;

use crate::events::{Condition, FlagLevel, Tier};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatus {
    pub uptime_ms: u32,
    pub ticks: u64,
    pub last_sample_ms: Option<u32>,
    pub heart_rate: Option<f32>,
    pub spo2: Option<f32>,
    pub accel_g: f32,
    pub gyro_dps: f32,
    pub gyro_rms_dps: Option<f32>,
    pub motion_duration_ms: Option<u32>,
    pub fall_flag: FlagLevel,
    pub seizure_flag: FlagLevel,
    pub tier: Tier,
    pub conditions: Vec<Condition>,
    pub sensor_ok: bool,
    pub consecutive_failures: u32,
}

impl MonitorStatus {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn is_moving(&self) -> bool {
        self.motion_duration_ms.is_some()
    }
}

fn opt(f: &mut fmt::Formatter<'_>, value: Option<f32>, unit: &str) -> fmt::Result {
    match value {
        Some(v) => write!(f, "{v:.1} {unit}"),
        None => write!(f, "-- {unit}"),
    }
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== MEDICAL MONITORING STATUS ===")?;
        write!(f, "Heart Rate: ")?;
        opt(f, self.heart_rate, "BPM")?;
        write!(f, "\nSpO2: ")?;
        opt(f, self.spo2, "%")?;
        writeln!(f)?;
        writeln!(f, "Accel Magnitude: {:.2} g", self.accel_g)?;
        writeln!(f, "Gyro Magnitude: {:.1} deg/s", self.gyro_dps)?;
        write!(f, "Gyro RMS: ")?;
        opt(f, self.gyro_rms_dps, "deg/s")?;
        writeln!(f)?;
        writeln!(f, "Motion Detected: {}", if self.is_moving() { "YES" } else { "NO" })?;
        if let Some(ms) = self.motion_duration_ms {
            writeln!(f, "Motion Duration: {} seconds", ms / 1000)?;
        }
        writeln!(
            f,
            "Fall: {} | Seizure: {}",
            self.fall_flag.severity(),
            self.seizure_flag.severity()
        )?;
        writeln!(f, "Status: {}", self.tier.display_name())?;
        writeln!(
            f,
            "Sensor: {}",
            if self.sensor_ok { "OK" } else { "READ ERRORS" }
        )?;
        write!(f, "================================")
    }
}
