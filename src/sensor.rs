// VitalWatch - Sensor Source Capability
//
// Whatever sits on the I2C bus (or a script, on the host) is polled once
// per tick for the latest synchronised reading.

use crate::error::SensorError;
use crate::events::SampleFrame;

pub trait SensorSource {
    /// Latest reading, stamped with `now_ms`.
    fn read_frame(&mut self, now_ms: u32) -> Result<SampleFrame, SensorError>;

    /// Bring the device back after repeated read failures.
    fn reinitialize(&mut self) -> anyhow::Result<()>;
}

impl<S: SensorSource + ?Sized> SensorSource for &mut S {
    fn read_frame(&mut self, now_ms: u32) -> Result<SampleFrame, SensorError> {
        (**self).read_frame(now_ms)
    }

    fn reinitialize(&mut self) -> anyhow::Result<()> {
        (**self).reinitialize()
    }
}
