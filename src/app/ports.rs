//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DoorController (domain)
//! ```
//!
//! Driven adapters (RTC, door switch, stepper, LED, serial link, event
//! sinks) implement these traits.  The
//! [`DoorController`](super::service::DoorController) consumes them via
//! generics, so the domain core never touches hardware directly.

use chrono::NaiveDateTime;

use crate::command::codec::CommandLine;
use crate::config::CoopConfig;
use crate::error::ClockError;
use crate::fsm::context::DriveMode;

// ───────────────────────────────────────────────────────────────
// Clock port (RTC ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Settable wall clock.  Implementations return local standard time.
pub trait ClockPort {
    fn now(&mut self) -> Result<NaiveDateTime, ClockError>;

    fn set_time(&mut self, time: &NaiveDateTime) -> Result<(), ClockError>;
}

// ───────────────────────────────────────────────────────────────
// Door switch port (hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Door-position switch.  Any configured inversion is applied by the
/// adapter; the domain only sees "open" or "not open".
pub trait DoorSwitchPort {
    fn is_open(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Motor port (domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Door motor with a single outstanding operation.
///
/// Requests are rejected, never queued: `request_*` returns `false` if a
/// run is already in progress.  `operation_done` reports `true` exactly
/// once after an accepted run has finished.
pub trait MotorPort {
    fn request_open(&mut self, drive: DriveMode) -> bool;

    fn request_close(&mut self, drive: DriveMode) -> bool;

    fn operation_done(&mut self) -> bool;

    /// De-energize and abandon the current run.
    fn stop(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Indicator port (domain → status LED)
// ───────────────────────────────────────────────────────────────

/// Colours the status LED can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedColour {
    Off,
    White,
    /// Low-intensity white used as the quiet default.
    WhiteDim,
    Green,
    Blue,
    Yellow,
    Red,
}

impl LedColour {
    /// Full-scale RGB value before brightness scaling.
    pub const fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Off => (0, 0, 0),
            Self::White => (255, 255, 255),
            Self::WhiteDim => (40, 40, 40),
            Self::Green => (0, 255, 0),
            Self::Blue => (0, 60, 255),
            Self::Yellow => (255, 180, 0),
            Self::Red => (255, 0, 0),
        }
    }
}

/// Blink pattern: the LED toggles between `colour` and off every half
/// `period_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkConfig {
    pub colour: LedColour,
    pub brightness: u8,
    pub period_ms: u32,
}

impl BlinkConfig {
    pub const fn new(colour: LedColour, brightness: u8, period_ms: u32) -> Self {
        Self {
            colour,
            brightness,
            period_ms,
        }
    }
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self::new(LedColour::WhiteDim, 128, 2000)
    }
}

/// Fire-and-forget status indicator.  Must never block the caller.
pub trait IndicatorPort {
    fn set_indicator(&mut self, config: BlinkConfig);
}

/// Every device the controller drives in one tick.
pub trait DevicePorts: ClockPort + DoorSwitchPort + MotorPort + IndicatorPort {}

impl<T: ClockPort + DoorSwitchPort + MotorPort + IndicatorPort> DevicePorts for T {}

// ───────────────────────────────────────────────────────────────
// Command port (serial link ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Line-oriented operator channel.
pub trait CommandPort {
    /// Next complete, newline-terminated line, if any.  Never blocks.
    fn poll_line(&mut self) -> Option<CommandLine>;

    /// Send a reply line (already terminated).
    fn reply(&mut self, line: &[u8]);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Supplies the boot configuration.
///
/// Implementations MUST validate before returning.  Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not clamped.
pub trait ConfigPort {
    fn load(&self) -> Result<CoopConfig, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config supplied; callers fall back to defaults.
    NotFound,
    /// Config document failed to deserialize.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}
