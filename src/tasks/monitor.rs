// VitalWatch - Monitor Task
//
// The single sampling loop: read the sensor, tick the monitor, hand alerts
// to the notifier, recover the sensor after repeated failures and print the
// status block periodically.  Runs on its own thread on the device; the host
// simulator drives it with a manual clock.

use crate::clock::{elapsed_ms, Clock};
use crate::monitor::{Monitor, TickOutcome, TickReport};
use crate::notify::Notifier;
use crate::sensor::SensorSource;

pub struct MonitorTask<S, N, C> {
    monitor: Monitor,
    source: S,
    notifier: N,
    clock: C,
    last_status_ms: u32,
    delivery_failures: u32,
}

impl<S: SensorSource, N: Notifier, C: Clock> MonitorTask<S, N, C> {
    pub fn new(monitor: Monitor, source: S, notifier: N, clock: C) -> Self {
        let last_status_ms = clock.now_ms();
        Self {
            monitor,
            source,
            notifier,
            clock,
            last_status_ms,
            delivery_failures: 0,
        }
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    pub fn monitor_mut(&mut self) -> &mut Monitor {
        &mut self.monitor
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Alerts the notifier refused.  They are not retried.
    pub fn delivery_failures(&self) -> u32 {
        self.delivery_failures
    }

    /// One tick at the current clock time.
    pub fn step(&mut self) -> TickReport {
        let now = self.clock.now_ms();
        let reading = self.source.read_frame(now);
        let report = self.monitor.tick(reading, now);

        for alert in &report.alerts {
            if let Err(e) = self.notifier.notify(alert) {
                self.delivery_failures += 1;
                log::error!("Failed to deliver {} alert: {:#}", alert.kind_str(), e);
            }
        }

        if let TickOutcome::SensorFailed {
            reinit_requested: true,
        } = report.outcome
        {
            self.recover_sensor();
        }

        let now = self.clock.now_ms();
        let interval = self.monitor.config().status_interval_ms;
        if interval > 0 && elapsed_ms(now, self.last_status_ms) >= interval {
            self.last_status_ms = now;
            log::info!("\n{}", self.monitor.status());
        }

        report
    }

    /// Re-initialise the sensor with doubling backoff.  The failure streak is
    /// cleared afterwards whether or not the device came back.
    fn recover_sensor(&mut self) {
        let policy = self.monitor.config().recovery;
        let mut backoff = policy.reinit_backoff_ms;

        log::warn!(
            "{} consecutive sensor failures - re-initialising",
            self.monitor.sensor_health().consecutive_failures()
        );

        for attempt in 1..=policy.reinit_attempts.max(1) {
            match self.source.reinitialize() {
                Ok(()) => {
                    log::info!("Sensor re-initialised (attempt {})", attempt);
                    break;
                }
                Err(e) => {
                    log::error!("Sensor re-init attempt {} failed: {:#}", attempt, e);
                    if attempt < policy.reinit_attempts {
                        self.clock.delay_ms(backoff);
                        backoff = backoff.saturating_mul(2);
                    }
                }
            }
        }
        self.monitor.sensor_reinitialized();
    }

    /// Run `max_ticks` ticks (forever when `None`), pacing to the tick
    /// interval.
    pub fn run(&mut self, max_ticks: Option<u64>) {
        self.run_with(max_ticks, |_, _| {});
    }

    /// As [`run`](Self::run), calling `before_tick` with the monitor and the
    /// current time ahead of every tick.  Button polling and display refresh
    /// hook in here.
    pub fn run_with<F>(&mut self, max_ticks: Option<u64>, mut before_tick: F)
    where
        F: FnMut(&mut Monitor, u32),
    {
        let interval = self.monitor.config().tick_interval_ms();
        let mut ticks = 0u64;

        while max_ticks.map_or(true, |max| ticks < max) {
            let tick_start = self.clock.now_ms();
            before_tick(&mut self.monitor, tick_start);
            self.step();
            ticks += 1;

            // Sleep for the remainder of the tick interval.
            let spent = elapsed_ms(self.clock.now_ms(), tick_start);
            if spent < interval {
                self.clock.delay_ms(interval - spent);
            }
        }
    }
}
