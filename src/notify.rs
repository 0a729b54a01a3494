// VitalWatch - Notifier Capability
//
// The core hands every alert that passed its gate to a `Notifier`.  Delivery
// failures are the notifier's problem: the cooldown has already been spent
// and nothing is retried.

use crate::events::Alert;

pub trait Notifier {
    fn notify(&mut self, alert: &Alert) -> anyhow::Result<()>;
}

impl<N: Notifier + ?Sized> Notifier for &mut N {
    fn notify(&mut self, alert: &Alert) -> anyhow::Result<()> {
        (**self).notify(alert)
    }
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&mut self, alert: &Alert) -> anyhow::Result<()> {
        (**self).notify(alert)
    }
}

/// Fan out to two notifiers.  Both are always attempted.
impl<A: Notifier, B: Notifier> Notifier for (A, B) {
    fn notify(&mut self, alert: &Alert) -> anyhow::Result<()> {
        let first = self.0.notify(alert);
        let second = self.1.notify(alert);
        first.and(second)
    }
}

/// Serial-console notifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, alert: &Alert) -> anyhow::Result<()> {
        log::warn!("MEDICAL ALERT TRIGGERED! [{}] {}", alert.kind_str(), alert.message());
        Ok(())
    }
}

/// Keeps every alert it receives, in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingNotifier {
    pub alerts: Vec<Alert>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.alerts.iter().filter(|a| a.kind_str() == kind).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, alert: &Alert) -> anyhow::Result<()> {
        self.alerts.push(alert.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{FlagKind, FlagLevel};

    struct Offline;

    impl Notifier for Offline {
        fn notify(&mut self, _alert: &Alert) -> anyhow::Result<()> {
            anyhow::bail!("WiFi not connected")
        }
    }

    fn fall_alert() -> Alert {
        Alert::Event {
            kind: FlagKind::Fall,
            level: FlagLevel::Raised,
            message: "FALL DETECTED! Check patient immediately!".into(),
        }
    }

    #[test]
    fn pair_attempts_both_even_if_first_fails() {
        let mut pair = (Offline, RecordingNotifier::new());
        assert!(pair.notify(&fall_alert()).is_err());
        assert_eq!(pair.1.count("FALL"), 1);
    }

    #[test]
    fn boxed_and_borrowed_notifiers_delegate() {
        let mut recorder = RecordingNotifier::new();
        {
            let mut borrowed = &mut recorder;
            Notifier::notify(&mut borrowed, &fall_alert()).unwrap();
        }
        let mut boxed: Box<dyn Notifier> = Box::new(LogNotifier);
        boxed.notify(&fall_alert()).unwrap();
        assert_eq!(recorder.alerts.len(), 1);
    }
}
