// VitalWatch - Alert Cooldown Gate
//
// One independent timer per tier.  A tier's timestamp moves only when an
// alert is actually emitted, never on mere detection.

use crate::clock::elapsed_ms;
use crate::config::CooldownPeriods;
use crate::events::Tier;

#[derive(Debug, Clone)]
pub struct AlertCooldown {
    periods: CooldownPeriods,
    last_alert_ms: [Option<u32>; 3],
}

impl AlertCooldown {
    pub fn new(periods: CooldownPeriods) -> Self {
        Self {
            periods,
            last_alert_ms: [None; 3],
        }
    }

    fn slot(tier: Tier) -> Option<usize> {
        match tier {
            Tier::None => None,
            Tier::Sepsis => Some(0),
            Tier::Seizure => Some(1),
            Tier::Critical => Some(2),
        }
    }

    pub fn period_ms(&self, tier: Tier) -> Option<u32> {
        match tier {
            Tier::None => None,
            Tier::Sepsis => Some(self.periods.sepsis_ms),
            Tier::Seizure => Some(self.periods.seizure_ms),
            Tier::Critical => Some(self.periods.critical_ms),
        }
    }

    pub fn last_alert_ms(&self, tier: Tier) -> Option<u32> {
        Self::slot(tier).and_then(|i| self.last_alert_ms[i])
    }

    pub fn is_cooling(&self, tier: Tier, now_ms: u32) -> bool {
        match (self.last_alert_ms(tier), self.period_ms(tier)) {
            (Some(last), Some(period)) => elapsed_ms(now_ms, last) < period,
            _ => false,
        }
    }

    /// Allow and record an emission if the tier's cooldown has run out.
    /// The first alert of every tier is always allowed.
    pub fn try_emit(&mut self, tier: Tier, now_ms: u32) -> bool {
        let Some(slot) = Self::slot(tier) else {
            return false;
        };
        if self.is_cooling(tier, now_ms) {
            return false;
        }
        self.last_alert_ms[slot] = Some(now_ms);
        true
    }
}
