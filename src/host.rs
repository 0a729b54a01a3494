// VitalWatch - Host Simulator
//
// Replays the demo scenario through the monitor task and prints what the
// device would have reported.
//
// Usage:
//   vitalwatch --preset fall-seizure --seconds 30
//   vitalwatch --config monitor.json --realtime

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use vitalwatch::clock::{Clock, ManualClock, SystemClock};
use vitalwatch::notify::{LogNotifier, RecordingNotifier};
use vitalwatch::sim::ScenarioSource;
use vitalwatch::{Monitor, MonitorConfig, MonitorTask};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    Reference,
    CombinedVitals,
    FallSeizure,
    FallThreshold,
    ImuRms,
}

impl Preset {
    fn config(self) -> MonitorConfig {
        match self {
            Self::Reference => MonitorConfig::reference(),
            Self::CombinedVitals => MonitorConfig::combined_vitals(),
            Self::FallSeizure => MonitorConfig::fall_seizure_monitor(),
            Self::FallThreshold => MonitorConfig::fall_threshold(),
            Self::ImuRms => MonitorConfig::imu_rms(),
        }
    }
}

/// Run the health monitor against a scripted sensor scenario.
#[derive(Parser)]
#[command(name = "vitalwatch", about = "Replay a scripted scenario through the health monitor")]
struct Cli {
    /// Device variant whose thresholds and timings to use.
    #[arg(long, value_enum, default_value = "fall-seizure")]
    preset: Preset,

    /// JSON file applied on top of the preset.  Missing fields keep the
    /// preset's values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulated duration; defaults to the full scenario.
    #[arg(long)]
    seconds: Option<u32>,

    /// Pace ticks against the wall clock instead of simulated time.
    #[arg(long)]
    realtime: bool,
}

pub fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            cli.preset
                .config()
                .with_overrides(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => cli.preset.config(),
    };
    let monitor = Monitor::new(config).context("invalid monitor configuration")?;

    let source = ScenarioSource::demo().with_units(config.accel_unit, config.gyro_unit);
    let duration_ms = cli
        .seconds
        .map_or(source.total_duration_ms(), |s| s.saturating_mul(1000));
    let ticks = u64::from(duration_ms / config.tick_interval_ms());

    log::info!(
        "VitalWatch simulator: {:?}, {} Hz, {} ticks",
        cli.preset,
        config.sample_rate_hz,
        ticks
    );

    if cli.realtime {
        simulate(monitor, source, SystemClock::new(), ticks)
    } else {
        simulate(monitor, source, ManualClock::default(), ticks)
    }
}

fn simulate<C: Clock>(
    monitor: Monitor,
    source: ScenarioSource,
    clock: C,
    ticks: u64,
) -> anyhow::Result<()> {
    let notifier = (LogNotifier, RecordingNotifier::new());
    let mut task = MonitorTask::new(monitor, source, notifier, clock);
    task.run(Some(ticks));

    let recorded = &task.notifier().1;
    println!("---- {} alerts ----", recorded.alerts.len());
    for alert in &recorded.alerts {
        println!("[{}] {}", alert.kind_str(), alert.message());
    }
    println!(
        "sensor re-inits: {}",
        task.monitor().sensor_health().reinit_count()
    );
    println!("{}", task.monitor().status());
    println!("{}", task.monitor().status().to_json()?);
    Ok(())
}
