//! RGB status LED driver.
//!
//! Three LEDC PWM channels (CH0-2) drive a common-cathode RGB LED.  A
//! dedicated thread renders the current [`BlinkConfig`] through a
//! [`Blinker`] every [`FRAME_MS`]; the controller only swaps the config
//! behind a mutex and never waits on the LED.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: [`LedcRgb`] drives three LEDC PWM channels via hw_init.
//! On host/test: any [`RgbOutput`] can stand in.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use log::warn;

use crate::app::ports::{BlinkConfig, IndicatorPort};
use crate::drivers::blinker::{Blinker, Rgb};
use crate::drivers::hw_init;
use crate::drivers::task::spawn_task;

/// Render interval of the blinker thread.
pub const FRAME_MS: u32 = 50;

const LED_PRIORITY: u8 = 2;
const LED_STACK_KB: usize = 2;

/// Something that can show an RGB colour.
pub trait RgbOutput: Send {
    fn set_rgb(&mut self, rgb: Rgb);
}

/// LEDC-backed output on the board's RGB channels.
pub struct LedcRgb;

impl RgbOutput for LedcRgb {
    fn set_rgb(&mut self, (r, g, b): Rgb) {
        hw_init::ledc_set(hw_init::LEDC_CH_LED_R, r);
        hw_init::ledc_set(hw_init::LEDC_CH_LED_G, g);
        hw_init::ledc_set(hw_init::LEDC_CH_LED_B, b);
    }
}

struct Shared {
    config: Mutex<BlinkConfig>,
    shutdown: AtomicBool,
}

pub struct StatusLed {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl StatusLed {
    /// Spawn the blinker thread, starting with the default pattern.
    pub fn spawn(mut output: impl RgbOutput + 'static) -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            config: Mutex::new(BlinkConfig::default()),
            shutdown: AtomicBool::new(false),
        });
        let worker = Arc::clone(&shared);

        let handle = spawn_task(LED_PRIORITY, LED_STACK_KB, "status_led\0", move || {
            let mut blinker = Blinker::default();
            while !worker.shutdown.load(Ordering::Acquire) {
                // A poisoned lock still holds a valid Copy config.
                let cfg = *worker
                    .config
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                blinker.set(cfg);
                output.set_rgb(blinker.tick(FRAME_MS));
                std::thread::sleep(Duration::from_millis(u64::from(FRAME_MS)));
            }
            output.set_rgb((0, 0, 0));
        })?;

        Ok(Self {
            shared,
            handle: Some(handle),
        })
    }

    /// Pattern currently shown.
    pub fn current(&self) -> BlinkConfig {
        *self
            .shared
            .config
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl IndicatorPort for StatusLed {
    fn set_indicator(&mut self, config: BlinkConfig) {
        match self.shared.config.lock() {
            Ok(mut guard) => *guard = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }
}

impl Drop for StatusLed {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Status LED thread panicked");
            }
        }
    }
}
