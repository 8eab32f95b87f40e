//! System configuration parameters
//!
//! All tunable parameters for the coop door controller.
//! Defaults are compiled in; a JSON document can be baked into the image
//! at build time through the `COOP_CONFIG_JSON` environment variable.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Shortest full open/close travel the stepper driver accepts (seconds).
pub const MIN_FULL_TRAVEL_SECS: u16 = 50;
/// Longest full open/close travel the stepper driver accepts (seconds).
pub const MAX_FULL_TRAVEL_SECS: u16 = 1000;
/// Travel time assumed when the configured value is out of range.
pub const FALLBACK_FULL_TRAVEL_SECS: u16 = 120;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoopConfig {
    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub tick_interval_ms: u32,
    /// Settle time after boot before the first reconciliation (seconds)
    pub start_delay_secs: u16,
    /// Enter MANUAL instead of INIT once the start delay elapses
    pub start_in_manual_mode: bool,

    // --- Motor ---
    /// Nominal duration of a full open or close run (seconds, 50-1000)
    pub full_open_close_duration_secs: u16,
    /// Output shaft revolutions for a full open or close run
    pub revolutions_open_close: u8,
    /// Controller-side watchdog for a single motor operation (seconds)
    pub max_operation_duration_secs: u16,
    /// Clockwise rotation opens the door
    pub clockwise_is_open: bool,

    // --- Door switch ---
    /// Swap the meaning of the switch contact (open reads as closed)
    pub invert_door_switch: bool,

    // --- Recheck ---
    /// Delay between a completed close and the verification sample (seconds)
    pub recheck_delay_secs: u16,
    /// Cooldown before re-arming, as a multiple of `max_operation_duration_secs`
    pub recheck_cooldown_factor: u8,
}

impl Default for CoopConfig {
    fn default() -> Self {
        Self {
            // Timing
            tick_interval_ms: 500, // 2 Hz
            start_delay_secs: 5,
            start_in_manual_mode: false,

            // Motor
            full_open_close_duration_secs: 120,
            revolutions_open_close: 12,
            max_operation_duration_secs: 180,
            clockwise_is_open: true,

            // Door switch
            invert_door_switch: false,

            // Recheck
            recheck_delay_secs: 30,
            recheck_cooldown_factor: 3, // 9 minutes with the defaults
        }
    }
}

impl CoopConfig {
    /// Parse and validate a JSON config document.  Missing fields take
    /// their default value.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter combinations the controller cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("tick_interval_ms must be > 0"));
        }
        if self.revolutions_open_close == 0 {
            return Err(ConfigError::ValidationFailed(
                "revolutions_open_close must be > 0",
            ));
        }
        if self.max_operation_duration_secs <= self.effective_travel_secs() {
            return Err(ConfigError::ValidationFailed(
                "max_operation_duration_secs must exceed the full travel time",
            ));
        }
        if self.recheck_cooldown_factor == 0 {
            return Err(ConfigError::ValidationFailed(
                "recheck_cooldown_factor must be > 0",
            ));
        }
        Ok(())
    }

    /// Full travel time actually used by the motor driver.  Out-of-range
    /// values fall back to [`FALLBACK_FULL_TRAVEL_SECS`].
    pub fn effective_travel_secs(&self) -> u16 {
        if (MIN_FULL_TRAVEL_SECS..=MAX_FULL_TRAVEL_SECS)
            .contains(&self.full_open_close_duration_secs)
        {
            self.full_open_close_duration_secs
        } else {
            FALLBACK_FULL_TRAVEL_SECS
        }
    }

    /// Convert a duration in seconds to whole control ticks (rounded up).
    pub fn secs_to_ticks(&self, secs: u32) -> u64 {
        let ms = u64::from(secs) * 1000;
        ms.div_ceil(u64::from(self.tick_interval_ms.max(1)))
    }

    /// Recheck cooldown window in seconds.
    pub fn recheck_cooldown_secs(&self) -> u32 {
        u32::from(self.recheck_cooldown_factor) * u32::from(self.max_operation_duration_secs)
    }
}
