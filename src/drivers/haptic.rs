// VitalWatch - Haptic Motor Driver
//
// GPIO-driven vibration motor.  Acts as a notifier: each alert plays a
// pulse pattern on the wrist, longer and more numerous for worse news.

use std::thread;
use std::time::Duration;

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};

use vitalwatch::events::{Alert, FlagKind, Tier};
use vitalwatch::notify::Notifier;

const PULSE_GAP_MS: u64 = 120;

pub struct HapticDriver<'d> {
    pin: PinDriver<'d, AnyOutputPin, Output>,
}

impl<'d> HapticDriver<'d> {
    pub fn new(pin: PinDriver<'d, AnyOutputPin, Output>) -> Self {
        Self { pin }
    }

    /// Vibrate for a custom duration (blocks the calling thread).
    pub fn buzz(&mut self, duration: Duration) -> anyhow::Result<()> {
        self.pin.set_high()?;
        thread::sleep(duration);
        self.pin.set_low()?;
        Ok(())
    }

    /// (pulse count, pulse length in ms)
    fn pattern(alert: &Alert) -> (u32, u64) {
        match alert {
            Alert::Tier { tier: Tier::Critical, .. } => (3, 400),
            Alert::Tier { tier: Tier::Seizure, .. } => (2, 300),
            Alert::Tier { .. } => (1, 200),
            Alert::Event { kind: FlagKind::Fall, .. } => (3, 200),
            Alert::Event { kind: FlagKind::Seizure, .. } => (4, 300),
        }
    }
}

impl Notifier for HapticDriver<'_> {
    fn notify(&mut self, alert: &Alert) -> anyhow::Result<()> {
        let (count, pulse_ms) = Self::pattern(alert);
        for i in 0..count {
            if i > 0 {
                thread::sleep(Duration::from_millis(PULSE_GAP_MS));
            }
            self.buzz(Duration::from_millis(pulse_ms))?;
        }
        Ok(())
    }
}
