// VitalWatch - MPU6050 IMU Driver
//
// Custom register-level driver over the shared I2C bus.  Frames come out in
// g and °/s; the oximeter is not fitted on this board, so vitals are empty.

use vitalwatch::config::*;
use vitalwatch::error::SensorError;
use vitalwatch::events::SampleFrame;
use vitalwatch::sensor::SensorSource;

use super::{lock_bus, SharedBus};

// MPU6050 register addresses
const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_CONFIG: u8 = 0x1A;
const REG_GYRO_CONFIG: u8 = 0x1B;
const REG_ACCEL_CONFIG: u8 = 0x1C;
const REG_ACCEL_XOUT_H: u8 = 0x3B; // Start of 14-byte sensor burst
const REG_WHO_AM_I: u8 = 0x75;
const WHO_AM_I_EXPECTED: u8 = 0x68;

pub struct Mpu6050 {
    bus: SharedBus,
}

impl Mpu6050 {
    pub fn new(bus: SharedBus) -> Self {
        Self { bus }
    }

    pub fn is_connected(&self) -> bool {
        let Ok(mut bus) = lock_bus(self.bus) else {
            return false;
        };
        let mut buf = [0u8; 1];
        match bus.write_read(I2C_ADDR_MPU6050, &[REG_WHO_AM_I], &mut buf, I2C_TIMEOUT_TICKS) {
            Ok(()) => buf[0] == WHO_AM_I_EXPECTED,
            Err(_) => false,
        }
    }

    /// Wake the sensor and configure accel (±8 g), gyro (±500 °/s), DLPF 21 Hz.
    /// ±8 g keeps impacts after a fall from clipping.
    pub fn init(&self) -> anyhow::Result<()> {
        let mut bus = lock_bus(self.bus)?;

        // Wake up (clear SLEEP bit)
        bus.write(I2C_ADDR_MPU6050, &[REG_PWR_MGMT_1, 0x00], I2C_TIMEOUT_TICKS)?;
        bus.write(I2C_ADDR_MPU6050, &[REG_CONFIG, 0x04], I2C_TIMEOUT_TICKS)?;
        bus.write(I2C_ADDR_MPU6050, &[REG_GYRO_CONFIG, 0x08], I2C_TIMEOUT_TICKS)?;
        bus.write(I2C_ADDR_MPU6050, &[REG_ACCEL_CONFIG, 0x10], I2C_TIMEOUT_TICKS)?;

        log::info!("MPU6050 initialised (±8g, ±500°/s, DLPF 21Hz)");
        Ok(())
    }

    /// Burst-read all 6 axes and convert to g and °/s.
    pub fn read(&self, now_ms: u32) -> anyhow::Result<SampleFrame> {
        let mut bus = lock_bus(self.bus)?;
        let mut raw = [0u8; 14];
        bus.write_read(
            I2C_ADDR_MPU6050,
            &[REG_ACCEL_XOUT_H],
            &mut raw,
            I2C_TIMEOUT_TICKS,
        )?;

        let axis = |i: usize| f32::from(i16::from_be_bytes([raw[i], raw[i + 1]]));
        Ok(SampleFrame {
            accel: [0, 2, 4].map(|i| axis(i) / ACCEL_SCALE_8G),
            // raw[6..8] = temperature - skipped
            gyro: [8, 10, 12].map(|i| axis(i) / GYRO_SCALE_500),
            heart_rate: None,
            spo2: None,
            timestamp_ms: now_ms,
        })
    }
}

impl SensorSource for Mpu6050 {
    fn read_frame(&mut self, now_ms: u32) -> Result<SampleFrame, SensorError> {
        self.read(now_ms).map_err(|e| SensorError::Read(format!("{e:#}")))
    }

    fn reinitialize(&mut self) -> anyhow::Result<()> {
        if !self.is_connected() {
            anyhow::bail!("MPU6050 not found at 0x{:02X}", I2C_ADDR_MPU6050);
        }
        self.init()
    }
}
