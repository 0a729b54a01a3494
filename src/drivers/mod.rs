// VitalWatch - ESP32 Drivers
//
// Register-level drivers over the shared I2C bus, plus the haptic motor.

use std::sync::Mutex;

use esp_idf_hal::i2c::I2cDriver;

pub mod display;
pub mod haptic;
pub mod imu;

/// Thread-safe handle to a shared I2C bus.
pub type SharedBus = &'static Mutex<I2cDriver<'static>>;

/// Lock the bus, turning a poisoned mutex into an error.
pub fn lock_bus(bus: SharedBus) -> anyhow::Result<std::sync::MutexGuard<'static, I2cDriver<'static>>> {
    bus.lock().map_err(|_| anyhow::anyhow!("I2C bus mutex poisoned"))
}
