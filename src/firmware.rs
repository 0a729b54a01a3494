// VitalWatch - Firmware Entry Point
//
// Boot sequence:
//   1. Bring up the shared I2C bus (MPU6050 + SSD1306).
//   2. Component self-test, reported on the serial console.
//   3. Spawn the monitor task: 100 Hz sampling, button polling, OLED refresh.
//
// Button gestures reset the event flags:
//   single click -> fall, double click -> seizure, long press -> both.

use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, IOPin, Input, OutputPin, PinDriver, Pull};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::prelude::*;

use vitalwatch::clock::{elapsed_ms, Clock};
use vitalwatch::config::*;
use vitalwatch::input::ButtonDecoder;
use vitalwatch::notify::LogNotifier;
use vitalwatch::ui::{draw_status, FrameBuffer};
use vitalwatch::{Monitor, MonitorTask};

use crate::drivers::display::OledDisplay;
use crate::drivers::haptic::HapticDriver;
use crate::drivers::imu::Mpu6050;
use crate::drivers::SharedBus;

/// Milliseconds since boot from the ESP high-resolution timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct EspClock;

impl Clock for EspClock {
    fn now_ms(&self) -> u32 {
        // SAFETY: read-only query of a timer started by the IDF at boot.
        unsafe { (esp_idf_sys::esp_timer_get_time() / 1000) as u32 }
    }

    fn delay_ms(&mut self, ms: u32) {
        FreeRtos::delay_ms(ms);
    }
}

pub fn run() -> anyhow::Result<()> {
    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("VitalWatch firmware starting…");

    let config = MonitorConfig {
        // The register driver already reports g and °/s.
        accel_unit: AccelUnit::StandardGravity,
        gyro_unit: GyroUnit::DegreesPerSecond,
        ..MonitorConfig::fall_seizure_monitor()
    };
    let monitor = Monitor::new(config)?;

    // ---- Peripherals ------------------------------------------------------
    let peripherals = Peripherals::take()?;

    // ---- I2C bus (shared between OLED and MPU6050) ------------------------
    let i2c_config = I2cConfig::new().baudrate(I2C_BAUDRATE_KHZ.kHz().into());
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21, // SDA
        peripherals.pins.gpio22, // SCL
        &i2c_config,
    )?;
    // The firmware never exits, so the bus lives for the whole programme.
    let i2c_bus: SharedBus = Box::leak(Box::new(Mutex::new(i2c)));
    log::info!(
        "I2C bus up (SDA {}, SCL {}, {} kHz)",
        PIN_I2C_SDA,
        PIN_I2C_SCL,
        I2C_BAUDRATE_KHZ
    );

    // Button (pull-up, active LOW) and haptic motor.
    let mut button = PinDriver::input(peripherals.pins.gpio3.downgrade())?;
    button.set_pull(Pull::Up)?;
    let haptic = HapticDriver::new(PinDriver::output(peripherals.pins.gpio4.downgrade_output())?);

    // ---- Component self-test ----------------------------------------------
    let mut display = OledDisplay::new(i2c_bus);
    let oled_ok = display.is_connected() && display.init().is_ok();
    let imu = Mpu6050::new(i2c_bus);
    let imu_ok = imu.is_connected() && imu.init().is_ok();
    if !oled_ok || !imu_ok {
        // Keep going: read failures drive the re-init path, and the serial
        // console still works without a display.
        log::error!("Boot check FAILED - OLED:{} IMU:{}", oled_ok, imu_ok);
    }

    // ---- Monitor task -----------------------------------------------------
    thread::Builder::new()
        .name("monitor".into())
        .stack_size(STACK_MONITOR)
        .spawn(move || {
            monitor_task(monitor, imu, haptic, button, display, oled_ok);
        })?;

    log::info!("Boot complete - monitoring");

    // Main thread has nothing left to do - park it forever.
    loop {
        thread::sleep(Duration::from_secs(60));
    }
}

fn monitor_task(
    monitor: Monitor,
    imu: Mpu6050,
    haptic: HapticDriver<'static>,
    button: PinDriver<'static, AnyIOPin, Input>,
    mut display: OledDisplay,
    display_ok: bool,
) {
    log::info!("Monitor task started");

    let mut task = MonitorTask::new(monitor, imu, (LogNotifier, haptic), EspClock);
    let mut decoder = ButtonDecoder::default();
    let mut frame = FrameBuffer::new();
    let mut last_refresh_ms = EspClock.now_ms();

    task.run_with(None, |monitor, now| {
        if let Some(gesture) = decoder.update(button.is_low(), now) {
            log::info!("Button: {:?}", gesture);
            for &kind in gesture.resets() {
                monitor.reset_flag(kind);
            }
        }

        if display_ok && elapsed_ms(now, last_refresh_ms) >= DISPLAY_REFRESH_MS {
            last_refresh_ms = now;
            if let Err(never) = draw_status(&mut frame, &monitor.status()) {
                match never {}
            }
            if let Err(e) = display.flush(&frame) {
                log::error!("Display error: {:#}", e);
            }
        }
    });
}
