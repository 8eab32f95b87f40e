//! Blink pattern engine for the status LED.
//!
//! Generates the RGB value for the current instant of a [`BlinkConfig`]:
//! the colour, scaled by brightness, for the first half of each period
//! and off for the second half.  The status-LED thread calls
//! [`Blinker::tick`] at a fixed frame rate and writes the result.
//!
//! Changing the pattern restarts the phase, so a new pattern always
//! starts with its "on" half.

use crate::app::ports::BlinkConfig;

/// Colour as (R, G, B) tuple, each 0–255.
pub type Rgb = (u8, u8, u8);

/// Scale a full-scale colour by `brightness` (255 = unchanged).
pub fn scale(rgb: Rgb, brightness: u8) -> Rgb {
    let s = |c: u8| ((u16::from(c) * u16::from(brightness)) / 255) as u8;
    (s(rgb.0), s(rgb.1), s(rgb.2))
}

/// Pattern engine.  Stack-allocated, no heap.
pub struct Blinker {
    config: BlinkConfig,
    phase_ms: u32,
}

impl Default for Blinker {
    fn default() -> Self {
        Self::new(BlinkConfig::default())
    }
}

impl Blinker {
    pub fn new(config: BlinkConfig) -> Self {
        Self {
            config,
            phase_ms: 0,
        }
    }

    /// Swap the pattern.  Same pattern keeps its phase.
    pub fn set(&mut self, config: BlinkConfig) {
        if config != self.config {
            self.config = config;
            self.phase_ms = 0;
        }
    }

    pub fn config(&self) -> BlinkConfig {
        self.config
    }

    /// Output for the current phase, then advance by `delta_ms`.
    pub fn tick(&mut self, delta_ms: u32) -> Rgb {
        let period = self.config.period_ms.max(2);
        let on = self.phase_ms % period < period / 2;
        self.phase_ms = (self.phase_ms + delta_ms) % period;

        if on {
            scale(self.config.colour.rgb(), self.config.brightness)
        } else {
            (0, 0, 0)
        }
    }
}
