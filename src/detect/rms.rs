// VitalWatch - Windowed Gyro RMS
//
// Fixed-capacity ring of the most recent gyro magnitudes.  The RMS is
// recomputed only when the write cursor wraps, i.e. once per window, and is
// reused unchanged in between.

#[derive(Debug, Clone)]
pub struct RmsWindow {
    samples: Box<[f32]>,
    cursor: usize,
    rms: Option<f32>,
}

impl RmsWindow {
    /// Allocates once; the buffer never grows.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity.max(1)].into_boxed_slice(),
            cursor: 0,
            rms: None,
        }
    }

    /// Store one sample.  Returns the fresh RMS on the tick that completes a
    /// window.  Non-finite samples are dropped without moving the cursor.
    pub fn push(&mut self, sample: f32) -> Option<f32> {
        if !sample.is_finite() {
            return None;
        }

        self.samples[self.cursor] = sample;
        self.cursor = (self.cursor + 1) % self.samples.len();
        if self.cursor != 0 {
            return None;
        }

        let sum_sq: f64 = self
            .samples
            .iter()
            .map(|&v| f64::from(v) * f64::from(v))
            .sum();
        let rms = (sum_sq / self.samples.len() as f64).sqrt() as f32;
        self.rms = Some(rms);
        Some(rms)
    }

    /// Last completed RMS; `None` until the buffer has filled once.
    pub fn rms(&self) -> Option<f32> {
        self.rms
    }

    pub fn is_warm(&self) -> bool {
        self.rms.is_some()
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identical_samples_give_that_value() {
        let mut window = RmsWindow::new(100);
        let mut last = None;
        for _ in 0..100 {
            last = window.push(87.3);
        }
        assert_relative_eq!(last.unwrap(), 87.3, epsilon = 1e-4);
        assert_relative_eq!(window.rms().unwrap(), 87.3, epsilon = 1e-4);
    }

    #[test]
    fn cold_start_has_no_rms() {
        let mut window = RmsWindow::new(10);
        for _ in 0..9 {
            assert_eq!(window.push(500.0), None);
            assert!(!window.is_warm());
        }
        assert!(window.push(500.0).is_some());
        assert!(window.is_warm());
    }

    #[test]
    fn rms_is_held_between_windows() {
        let mut window = RmsWindow::new(4);
        for v in [3.0, 3.0, 3.0, 3.0] {
            window.push(v);
        }
        assert_relative_eq!(window.rms().unwrap(), 3.0, epsilon = 1e-6);

        // Half a window of larger samples does not move the statistic.
        window.push(10.0);
        window.push(10.0);
        assert_relative_eq!(window.rms().unwrap(), 3.0, epsilon = 1e-6);

        window.push(0.0);
        let rms = window.push(0.0).unwrap();
        assert_relative_eq!(rms, (200.0f32 / 4.0).sqrt(), epsilon = 1e-5);
    }

    #[test]
    fn cursor_wraps_and_skips_nan() {
        let mut window = RmsWindow::new(3);
        window.push(1.0);
        window.push(f32::NAN);
        assert_eq!(window.cursor(), 1);
        window.push(1.0);
        window.push(1.0);
        assert_eq!(window.cursor(), 0);
        assert_eq!(window.capacity(), 3);
    }
}
