// VitalWatch - SSD1306 OLED Driver
//
// 128x64 panel on the shared I2C bus.  The frame is rendered off-screen into
// a `FrameBuffer` and pushed whole on every refresh.

use vitalwatch::config::*;
use vitalwatch::ui::FrameBuffer;

use super::{lock_bus, SharedBus};

const CONTROL_COMMAND: u8 = 0x00;
const CONTROL_DATA: u8 = 0x40;
const DATA_CHUNK: usize = 16;

const INIT_SEQUENCE: &[u8] = &[
    0xAE, // display off
    0xD5, 0x80, // clock divide
    0xA8, 0x3F, // multiplex 64
    0xD3, 0x00, // display offset
    0x40, // start line 0
    0x8D, 0x14, // charge pump on
    0x20, 0x00, // horizontal addressing
    0xA1, // segment remap
    0xC8, // COM scan descending
    0xDA, 0x12, // COM pins
    0x81, 0xCF, // contrast
    0xD9, 0xF1, // pre-charge
    0xDB, 0x40, // VCOM detect
    0xA4, // resume from RAM
    0xA6, // normal (not inverted)
    0xAF, // display on
];

pub struct OledDisplay {
    bus: SharedBus,
}

impl OledDisplay {
    pub fn new(bus: SharedBus) -> Self {
        Self { bus }
    }

    pub fn is_connected(&self) -> bool {
        let Ok(mut bus) = lock_bus(self.bus) else {
            return false;
        };
        bus.write(I2C_ADDR_OLED, &[CONTROL_COMMAND, 0xE3], I2C_TIMEOUT_TICKS)
            .is_ok()
    }

    pub fn init(&mut self) -> anyhow::Result<()> {
        for &cmd in INIT_SEQUENCE {
            self.command(cmd)?;
        }
        log::info!("SSD1306 initialised ({}x{})", SCREEN_WIDTH, SCREEN_HEIGHT);
        Ok(())
    }

    fn command(&mut self, cmd: u8) -> anyhow::Result<()> {
        let mut bus = lock_bus(self.bus)?;
        bus.write(I2C_ADDR_OLED, &[CONTROL_COMMAND, cmd], I2C_TIMEOUT_TICKS)?;
        Ok(())
    }

    /// Push the whole frame: full column and page window, then the data in
    /// small chunks so other bus users are not starved.
    pub fn flush(&mut self, frame: &FrameBuffer) -> anyhow::Result<()> {
        let last_col = (SCREEN_WIDTH - 1) as u8;
        let last_page = (SCREEN_HEIGHT / 8 - 1) as u8;
        for cmd in [0x21, 0, last_col, 0x22, 0, last_page] {
            self.command(cmd)?;
        }

        let mut packet = [0u8; DATA_CHUNK + 1];
        packet[0] = CONTROL_DATA;
        for chunk in frame.pages().chunks(DATA_CHUNK) {
            packet[1..=chunk.len()].copy_from_slice(chunk);
            let mut bus = lock_bus(self.bus)?;
            bus.write(I2C_ADDR_OLED, &packet[..=chunk.len()], I2C_TIMEOUT_TICKS)?;
        }
        Ok(())
    }
}
