// VitalWatch - Monitor Controller
//
// Owns every piece of detection state and runs the per-tick pipeline:
//   condition -> RMS window -> sustained motion -> fall / seizure detectors
//   -> classifier -> cooldown gate.
// Nothing here blocks or touches hardware; the monitor task feeds it.

use crate::config::MonitorConfig;
use crate::detect::{
    compose_message, AlertCooldown, BouncePolicy, Classification, Classifier, ClassifierInput,
    DetectorSettings, EventDetector, FlagTransition, RmsWindow, SensorHealth, SignalConditioner,
    SustainedMotion,
};
use crate::error::{ConfigError, SensorError};
use crate::events::{Alert, FlagKind, FlagLevel, FlagState, MotionMagnitude, SampleFrame, Tier, Vitals};
use crate::status::MonitorStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Full pipeline ran.
    Classified,
    /// Frame had non-finite axes; state left untouched.
    Discarded,
    SensorFailed { reinit_requested: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub outcome: TickOutcome,
    pub tier: Tier,
    pub alerts: Vec<Alert>,
}

/// Latest derived values, kept for the status query.
#[derive(Debug, Clone, Default)]
struct MonitorState {
    ticks: u64,
    last_tick_ms: u32,
    last_sample_ms: Option<u32>,
    magnitude: MotionMagnitude,
    vitals: Vitals,
    motion_duration_ms: Option<u32>,
    classification: Classification,
}

pub struct Monitor {
    config: MonitorConfig,
    conditioner: SignalConditioner,
    health: SensorHealth,
    rms: RmsWindow,
    /// Seizure condition from the last completed window.  Only a fresh
    /// window sets it; a seizure reset clears it.
    tremor: bool,
    motion: SustainedMotion,
    fall: EventDetector,
    seizure: EventDetector,
    classifier: Classifier,
    cooldown: AlertCooldown,
    state: MonitorState,
}

impl Monitor {
    pub fn new(config: MonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let t = &config.thresholds;

        let fall = EventDetector::new(DetectorSettings {
            confirm_after_ms: Some(t.fall.debounce_ms),
            hold_ms: t.fall.hold_ms,
            bounce: BouncePolicy::Reset,
            observing_level: FlagLevel::Clear,
            confirmed_level: FlagLevel::Raised,
        });
        let seizure = EventDetector::new(DetectorSettings {
            confirm_after_ms: t.seizure.escalation_ms,
            hold_ms: t.seizure.hold_ms,
            bounce: t.seizure.bounce,
            observing_level: FlagLevel::Raised,
            confirmed_level: FlagLevel::Severe,
        });

        Ok(Self {
            conditioner: SignalConditioner::from_config(&config),
            health: SensorHealth::new(config.recovery.max_consecutive_failures),
            rms: RmsWindow::new(config.window_size()),
            tremor: false,
            motion: SustainedMotion::default(),
            fall,
            seizure,
            classifier: Classifier::new(t),
            cooldown: AlertCooldown::new(t.cooldown),
            state: MonitorState::default(),
            config,
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Run one tick.  A failed read or a corrupt frame skips detection for
    /// this tick; the previous magnitudes stay visible to the status query.
    pub fn tick(&mut self, reading: Result<SampleFrame, SensorError>, now_ms: u32) -> TickReport {
        self.state.ticks += 1;
        self.state.last_tick_ms = now_ms;

        let frame = match reading {
            Ok(frame) => frame,
            Err(e) => {
                let reinit_requested = self.health.record_failure();
                log::warn!(
                    "Sensor read error ({} in a row): {}",
                    self.health.consecutive_failures(),
                    e
                );
                return self.skipped(TickOutcome::SensorFailed { reinit_requested });
            }
        };
        self.health.record_success();

        let magnitude = match self.conditioner.condition(&frame) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("Discarding frame: {}", e);
                return self.skipped(TickOutcome::Discarded);
            }
        };
        let vitals = self.conditioner.vitals(&frame);
        self.state.last_sample_ms = Some(frame.timestamp_ms);
        self.state.magnitude = magnitude;
        self.state.vitals = vitals;

        // ---- Aggregation ----
        if let Some(rms) = self.rms.push(magnitude.gyro_dps) {
            log::debug!("Gyro RMS (1 s window): {:.1} °/s", rms);
            self.tremor = rms > self.config.thresholds.seizure.rms_dps;
        }

        let m = &self.config.thresholds.motion;
        let moving = magnitude.accel_g > m.accel_motion_g || magnitude.gyro_dps > m.gyro_motion_dps;
        let motion_duration_ms = self.motion.update(moving, now_ms);

        // ---- Debounced detectors ----
        let mut alerts = Vec::new();

        let fall = &self.config.thresholds.fall;
        let freefall = magnitude.accel_g < fall.freefall_g;
        let spike = fall
            .gyro_spike_dps
            .map_or(true, |limit| magnitude.peak_axis_dps > limit);
        if let Some(transition) = self.fall.update(freefall, spike, now_ms) {
            self.on_transition(FlagKind::Fall, transition, now_ms, &mut alerts);
        }

        if let Some(transition) = self.seizure.update(self.tremor, true, now_ms) {
            self.on_transition(FlagKind::Seizure, transition, now_ms, &mut alerts);
        }

        // ---- Classification + cooldown gate ----
        let classification = self.classifier.classify(&ClassifierInput {
            heart_rate: vitals.heart_rate,
            spo2: vitals.spo2,
            accel_g: magnitude.accel_g,
            gyro_dps: magnitude.gyro_dps,
            motion_duration_ms,
            gyro_rms_dps: self.rms.rms(),
        });
        let tier = classification.tier;
        log::debug!("Tick {} ms: {} {:?}", now_ms, tier, classification.conditions);

        if tier != Tier::None {
            if self.cooldown.try_emit(tier, now_ms) {
                alerts.push(Alert::Tier {
                    tier,
                    conditions: classification.conditions.clone(),
                    message: compose_message(&classification, &vitals),
                });
            } else {
                log::debug!("{} still detected; alert suppressed by cooldown", tier);
            }
        }

        self.state.motion_duration_ms = motion_duration_ms;
        self.state.classification = classification;

        TickReport {
            outcome: TickOutcome::Classified,
            tier,
            alerts,
        }
    }

    fn skipped(&self, outcome: TickOutcome) -> TickReport {
        TickReport {
            outcome,
            tier: self.state.classification.tier,
            alerts: Vec::new(),
        }
    }

    fn on_transition(&self, kind: FlagKind, transition: FlagTransition, now_ms: u32, alerts: &mut Vec<Alert>) {
        match (kind, transition) {
            (FlagKind::Fall, FlagTransition::Confirmed) => {
                log::info!(
                    "Fall confirmed at {} ms (|a| = {:.2} g)",
                    now_ms,
                    self.state.magnitude.accel_g
                );
                alerts.push(Alert::Event {
                    kind,
                    level: FlagLevel::Raised,
                    message: "FALL DETECTED! Check patient immediately!".to_owned(),
                });
            }
            (FlagKind::Seizure, FlagTransition::Observing) => {
                log::info!("Seizure activity detected (gyro RMS {:.1} °/s)", self.rms.rms().unwrap_or(0.0));
            }
            (FlagKind::Seizure, FlagTransition::Confirmed) => {
                let secs = self.config.thresholds.seizure.escalation_ms.unwrap_or(0) / 1000;
                log::info!("Seizure escalated to severe after {} s", secs);
                alerts.push(Alert::Event {
                    kind,
                    level: FlagLevel::Severe,
                    message: format!("SEVERE SEIZURE ({secs}s+ detected)! Emergency!"),
                });
            }
            (_, FlagTransition::Bounced) => {
                log::debug!("{} condition ended before confirmation", kind.as_str());
            }
            (_, FlagTransition::AutoCleared) => {
                log::info!("{} flag auto-cleared", kind.as_str());
            }
            (FlagKind::Fall, FlagTransition::Observing) => {}
        }
    }

    /// External reset control.  Zeroes the flag even if the condition is
    /// still physically present; re-confirmation needs a full debounce.
    pub fn reset_flag(&mut self, kind: FlagKind) {
        if kind == FlagKind::Seizure {
            // The stored RMS predates the reset; wait for the next window.
            self.tremor = false;
        }
        let detector = match kind {
            FlagKind::Fall => &mut self.fall,
            FlagKind::Seizure => &mut self.seizure,
        };
        if detector.reset() {
            log::info!("{} flag reset", kind.as_str());
        }
    }

    pub fn flag(&self, kind: FlagKind) -> FlagState {
        match kind {
            FlagKind::Fall => self.fall.flag(),
            FlagKind::Seizure => self.seizure.flag(),
        }
    }

    pub fn tier(&self) -> Tier {
        self.state.classification.tier
    }

    pub fn gyro_rms(&self) -> Option<f32> {
        self.rms.rms()
    }

    pub fn sensor_health(&self) -> &SensorHealth {
        &self.health
    }

    /// Called by the task loop after a reinitialisation attempt.
    pub fn sensor_reinitialized(&mut self) {
        self.health.mark_reinitialized();
    }

    /// Read-only snapshot for the serial console, JSON endpoint and OLED.
    pub fn status(&self) -> MonitorStatus {
        MonitorStatus {
            uptime_ms: self.state.last_tick_ms,
            ticks: self.state.ticks,
            last_sample_ms: self.state.last_sample_ms,
            heart_rate: self.state.vitals.heart_rate,
            spo2: self.state.vitals.spo2,
            accel_g: self.state.magnitude.accel_g,
            gyro_dps: self.state.magnitude.gyro_dps,
            gyro_rms_dps: self.rms.rms(),
            motion_duration_ms: self.state.motion_duration_ms,
            fall_flag: self.fall.flag().level,
            seizure_flag: self.seizure.flag().level,
            tier: self.state.classification.tier,
            conditions: self.state.classification.conditions.clone(),
            sensor_ok: self.health.is_healthy(),
            consecutive_failures: self.health.consecutive_failures(),
        }
    }
}
