// VitalWatch - Wearable Health Monitor Core
//
// Fall, seizure, sepsis and critical-condition detection for a wrist-worn
// IMU + pulse oximeter.  Everything in this crate is hardware-agnostic; the
// firmware binary plugs the ESP32 drivers in through `SensorSource`,
// `Notifier` and `Clock`.

pub mod clock;
pub mod config;
pub mod detect;
pub mod error;
pub mod events;
pub mod input;
pub mod monitor;
pub mod notify;
pub mod sensor;
pub mod sim;
pub mod status;
pub mod tasks;
pub mod ui;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::MonitorConfig;
pub use error::{ConfigError, SensorError};
pub use events::{Alert, FlagKind, FlagLevel, SampleFrame, Tier};
pub use monitor::{Monitor, TickOutcome, TickReport};
pub use notify::{LogNotifier, Notifier, RecordingNotifier};
pub use sensor::SensorSource;
pub use status::MonitorStatus;
pub use tasks::MonitorTask;
