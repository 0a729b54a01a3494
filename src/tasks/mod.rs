// VitalWatch - Tasks
//
// The device runs a single monitor task; everything it needs is injected so
// the same loop runs on the host.

pub mod monitor;

pub use monitor::MonitorTask;
