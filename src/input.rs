// VitalWatch - Reset Button Decoder
//
// Debounced push-button handler with single-click, double-click and
// long-press detection.  Polled once per monitor tick with the raw level;
// the resulting gestures become flag resets:
//   single click -> clear fall, double click -> clear seizure,
//   long press   -> clear both.

use crate::clock::elapsed_ms;
use crate::config::{BUTTON_DEBOUNCE_MS, DOUBLE_CLICK_WINDOW_MS, LONG_PRESS_MS};
use crate::events::FlagKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    SingleClick,
    DoubleClick,
    LongPress,
}

impl ButtonEvent {
    pub fn resets(&self) -> &'static [FlagKind] {
        match self {
            Self::SingleClick => &[FlagKind::Fall],
            Self::DoubleClick => &[FlagKind::Seizure],
            Self::LongPress => &[FlagKind::Fall, FlagKind::Seizure],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ButtonDecoder {
    debounce_ms: u32,
    long_press_ms: u32,
    double_click_window_ms: u32,

    // Debounce state
    last_raw: bool,
    last_change_ms: u32,

    // Press tracking
    button_down: bool,
    press_start_ms: Option<u32>,

    // Double-click state machine
    waiting_for_second_click: bool,
    first_click_ms: u32,
}

impl Default for ButtonDecoder {
    fn default() -> Self {
        Self::new(BUTTON_DEBOUNCE_MS, LONG_PRESS_MS, DOUBLE_CLICK_WINDOW_MS)
    }
}

impl ButtonDecoder {
    pub fn new(debounce_ms: u32, long_press_ms: u32, double_click_window_ms: u32) -> Self {
        Self {
            debounce_ms,
            long_press_ms,
            double_click_window_ms,
            last_raw: false,
            last_change_ms: 0,
            button_down: false,
            press_start_ms: None,
            waiting_for_second_click: false,
            first_click_ms: 0,
        }
    }

    /// Feed the raw level (`true` = pressed).
    pub fn update(&mut self, pressed: bool, now_ms: u32) -> Option<ButtonEvent> {
        // ---- debounce filter ----
        if pressed != self.last_raw {
            self.last_change_ms = now_ms;
        }
        self.last_raw = pressed;

        if elapsed_ms(now_ms, self.last_change_ms) < self.debounce_ms {
            // Signal still bouncing.
            return self.check_double_click_timeout(now_ms);
        }

        // ---- pressed edge ----
        if pressed && !self.button_down {
            self.button_down = true;
            self.press_start_ms = Some(now_ms);
        }

        // ---- released edge ----
        if !pressed && self.button_down {
            self.button_down = false;
            let hold_ms = self
                .press_start_ms
                .take()
                .map_or(0, |start| elapsed_ms(now_ms, start));

            if hold_ms >= self.long_press_ms {
                self.waiting_for_second_click = false;
                return Some(ButtonEvent::LongPress);
            }
            if self.waiting_for_second_click {
                self.waiting_for_second_click = false;
                return Some(ButtonEvent::DoubleClick);
            }
            // First short click: open the double-click window.
            self.waiting_for_second_click = true;
            self.first_click_ms = now_ms;
            return None;
        }

        self.check_double_click_timeout(now_ms)
    }

    /// A lone click is only reported once the double-click window expires.
    fn check_double_click_timeout(&mut self, now_ms: u32) -> Option<ButtonEvent> {
        if self.waiting_for_second_click
            && elapsed_ms(now_ms, self.first_click_ms) > self.double_click_window_ms
        {
            self.waiting_for_second_click = false;
            return Some(ButtonEvent::SingleClick);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLL: u32 = 10;

    /// Drive the decoder with (level, duration) segments at 100 Hz.
    fn run(pattern: &[(bool, u32)]) -> Vec<(u32, ButtonEvent)> {
        let mut decoder = ButtonDecoder::default();
        let mut events = Vec::new();
        let mut now = 1_000;
        for &(pressed, duration) in pattern {
            let end = now + duration;
            while now < end {
                if let Some(event) = decoder.update(pressed, now) {
                    events.push((now, event));
                }
                now += POLL;
            }
        }
        events
    }

    #[test]
    fn single_click_after_window() {
        let events = run(&[(false, 100), (true, 150), (false, 1_000)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].1, ButtonEvent::SingleClick);
    }

    #[test]
    fn double_click_within_window() {
        let events = run(&[(false, 100), (true, 120), (false, 150), (true, 120), (false, 1_000)]);
        assert_eq!(events.iter().map(|e| e.1).collect::<Vec<_>>(), vec![ButtonEvent::DoubleClick]);
    }

    #[test]
    fn long_press() {
        let events = run(&[(false, 100), (true, 3_500), (false, 1_000)]);
        assert_eq!(events.iter().map(|e| e.1).collect::<Vec<_>>(), vec![ButtonEvent::LongPress]);
    }

    #[test]
    fn contact_bounce_is_ignored() {
        // 20 ms glitches never settle long enough to count as a press.
        let events = run(&[
            (false, 100),
            (true, 20),
            (false, 20),
            (true, 20),
            (false, 1_000),
        ]);
        assert!(events.is_empty());
    }

    #[test]
    fn gestures_map_to_resets() {
        assert_eq!(ButtonEvent::SingleClick.resets(), &[FlagKind::Fall]);
        assert_eq!(ButtonEvent::LongPress.resets().len(), 2);
    }
}
