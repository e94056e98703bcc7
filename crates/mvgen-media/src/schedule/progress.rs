//! Coarse progress reporting.

/// Emits a tick each time progress crosses the next 10% step.
#[derive(Debug, Clone, Default)]
pub struct ProgressTicker {
    last_percent: u32,
}

impl ProgressTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current fraction in `[0, 1]`.
    ///
    /// Returns the newly reached percentage (a multiple of 10), or `None` if
    /// no new step was crossed.
    pub fn update(&mut self, fraction: f64) -> Option<u32> {
        let percent = ((fraction.clamp(0.0, 1.0) * 100.0).floor() as u32 / 10) * 10;
        if percent > self.last_percent {
            self.last_percent = percent;
            Some(percent)
        } else {
            None
        }
    }
}
