// VitalWatch - OLED Status Panel
//
// Layout (6x10 font, 6 rows):
//   row 0  tier banner, inverted while an alert tier is active
//   row 1  HR / SpO2
//   row 2  |a| and |w|
//   row 3  1 s gyro RMS and motion time
//   row 4  fall / seizure flags
//   row 5  sensor health

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};

use crate::config::SCREEN_WIDTH;
use crate::events::{FlagLevel, Tier};
use crate::status::MonitorStatus;

const LINE_HEIGHT: i32 = 10;
const BANNER_HEIGHT: u32 = 11;

fn flag_text(level: FlagLevel) -> &'static str {
    match level {
        FlagLevel::Clear => "--",
        FlagLevel::Raised => "ON",
        FlagLevel::Severe => "SEV",
    }
}

fn value(v: Option<f32>) -> String {
    v.map_or_else(|| "--".to_owned(), |v| format!("{v:.0}"))
}

/// Render the status snapshot.  The target is cleared first.
pub fn draw_status<D>(target: &mut D, status: &MonitorStatus) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    target.clear(BinaryColor::Off)?;

    let normal = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
    let inverted = MonoTextStyle::new(&FONT_6X10, BinaryColor::Off);

    // ---- Banner ----
    let banner_style = if status.tier != Tier::None {
        Rectangle::new(Point::zero(), Size::new(SCREEN_WIDTH, BANNER_HEIGHT))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(target)?;
        inverted
    } else {
        normal
    };
    Text::with_baseline(status.tier.display_name(), Point::new(1, 1), banner_style, Baseline::Top)
        .draw(target)?;

    // ---- Body ----
    let motion = status
        .motion_duration_ms
        .map_or_else(String::new, |ms| format!("  MOV {}s", ms / 1000));
    let lines = [
        format!("HR {}  SpO2 {}", value(status.heart_rate), value(status.spo2)),
        format!("A {:.2}g W {:.0}dps", status.accel_g, status.gyro_dps),
        format!("RMS {}{}", value(status.gyro_rms_dps), motion),
        format!(
            "FALL {}  SEIZ {}",
            flag_text(status.fall_flag),
            flag_text(status.seizure_flag)
        ),
        format!("IMU {}", if status.sensor_ok { "OK" } else { "ERR" }),
    ];

    for (row, line) in lines.iter().enumerate() {
        let y = BANNER_HEIGHT as i32 + 1 + row as i32 * LINE_HEIGHT;
        Text::with_baseline(line, Point::new(0, y), normal, Baseline::Top).draw(target)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::FrameBuffer;

    fn status(tier: Tier) -> MonitorStatus {
        MonitorStatus {
            uptime_ms: 1_000,
            ticks: 100,
            last_sample_ms: Some(1_000),
            heart_rate: Some(72.0),
            spo2: Some(98.0),
            accel_g: 1.0,
            gyro_dps: 0.0,
            gyro_rms_dps: None,
            motion_duration_ms: None,
            fall_flag: FlagLevel::Clear,
            seizure_flag: FlagLevel::Clear,
            tier,
            conditions: Vec::new(),
            sensor_ok: true,
            consecutive_failures: 0,
        }
    }

    fn banner_lit(fb: &FrameBuffer) -> u32 {
        (0..SCREEN_WIDTH)
            .flat_map(|x| (0..BANNER_HEIGHT).map(move |y| (x, y)))
            .filter(|&(x, y)| fb.pixel(x, y))
            .count() as u32
    }

    #[test]
    fn normal_status_draws_text() {
        let mut fb = FrameBuffer::new();
        draw_status(&mut fb, &status(Tier::None)).unwrap();
        assert!(fb.lit_pixels() > 0);
        // Plain banner: only glyph pixels are lit.
        assert!(banner_lit(&fb) < SCREEN_WIDTH * BANNER_HEIGHT / 2);
    }

    #[test]
    fn alert_tier_inverts_banner() {
        let mut fb = FrameBuffer::new();
        draw_status(&mut fb, &status(Tier::Critical)).unwrap();
        assert!(banner_lit(&fb) > SCREEN_WIDTH * BANNER_HEIGHT / 2);
    }

    #[test]
    fn motion_time_extends_rms_row() {
        let mut still = FrameBuffer::new();
        draw_status(&mut still, &status(Tier::None)).unwrap();

        let mut moving = FrameBuffer::new();
        let snapshot = MonitorStatus {
            motion_duration_ms: Some(4_200),
            ..status(Tier::None)
        };
        draw_status(&mut moving, &snapshot).unwrap();

        // "  MOV 4s" lands to the right of "RMS --" on row 3.
        let row_top = BANNER_HEIGHT + 1 + 2 * LINE_HEIGHT as u32;
        let tail_lit = |fb: &FrameBuffer| {
            (40..SCREEN_WIDTH)
                .flat_map(|x| (row_top..row_top + LINE_HEIGHT as u32).map(move |y| (x, y)))
                .filter(|&(x, y)| fb.pixel(x, y))
                .count()
        };
        assert_eq!(tail_lit(&still), 0);
        assert!(tail_lit(&moving) > 0);
    }

    #[test]
    fn redraw_clears_previous_frame() {
        let mut fb = FrameBuffer::new();
        draw_status(&mut fb, &status(Tier::Critical)).unwrap();
        draw_status(&mut fb, &status(Tier::None)).unwrap();
        let mut fresh = FrameBuffer::new();
        draw_status(&mut fresh, &status(Tier::None)).unwrap();
        assert_eq!(fb.pages(), fresh.pages());
    }
}
