// VitalWatch - Entry Point
//
// On the ESP32 this is the firmware: MPU6050 + SSD1306 on a shared I2C bus,
// reset button, haptic motor.  Anywhere else it is the host simulator that
// replays a scripted scenario through the same monitor loop.

#[cfg(target_os = "espidf")]
mod drivers;
#[cfg(target_os = "espidf")]
mod firmware;
#[cfg(not(target_os = "espidf"))]
mod host;

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    firmware::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    host::run()
}
