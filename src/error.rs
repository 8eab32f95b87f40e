//! Unified error types for the coop door firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! boot path's error handling uniform.  All variants are `Copy` so they can
//! be passed through the controller and logged without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The real-time clock could not be read or written.
    Clock(ClockError),
    /// A command line from the serial channel was rejected.
    Command(CommandError),
    /// The motor driver refused or failed an operation.
    Motor(MotorError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clock(e) => write!(f, "clock: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Motor(e) => write!(f, "motor: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Clock errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// The I2C transaction with the RTC failed.
    Bus,
    /// The RTC returned register contents that do not form a valid date.
    InvalidTime,
    /// The requested time cannot be stored by the RTC (year outside 2000-2199).
    OutOfRange,
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus => write!(f, "RTC bus error"),
            Self::InvalidTime => write!(f, "RTC holds an invalid time"),
            Self::OutOfRange => write!(f, "time outside RTC range"),
        }
    }
}

impl core::error::Error for ClockError {}

impl From<ClockError> for Error {
    fn from(e: ClockError) -> Self {
        Self::Clock(e)
    }
}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

/// Reasons a command line is dropped.  None of these produce a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Line shorter than the minimum for its command family.
    TooShort { len: usize, min: usize },
    /// Line does not end with `\n`.
    Unterminated,
    /// The first two bytes are not the command pattern.
    BadPattern,
    /// The family byte is not a known command.
    UnknownCommand(u8),
    /// An argument byte is not one of the accepted values.
    InvalidArgument(u8),
    /// The TIME payload is not `YYYY-MM-DDTHH:MM:SSZ`.
    BadTimestamp,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { len, min } => {
                write!(f, "line too short ({len} bytes, need {min})")
            }
            Self::Unterminated => write!(f, "line not newline-terminated"),
            Self::BadPattern => write!(f, "missing command pattern"),
            Self::UnknownCommand(b) => write!(f, "unknown command byte 0x{b:02x}"),
            Self::InvalidArgument(b) => write!(f, "invalid argument byte 0x{b:02x}"),
            Self::BadTimestamp => write!(f, "malformed timestamp"),
        }
    }
}

impl core::error::Error for CommandError {}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Motor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorError {
    /// A run is already in progress; the request was rejected, not queued.
    Busy,
    /// The door already sits in the requested position.
    AlreadyInPosition,
    /// Motor commands are only accepted in MANUAL mode.
    NotInManualMode,
    /// The worker thread could not be spawned.
    WorkerSpawn,
    /// A coil GPIO write failed.
    CoilWrite,
}

impl fmt::Display for MotorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "motor busy"),
            Self::AlreadyInPosition => write!(f, "door already in position"),
            Self::NotInManualMode => write!(f, "not in manual mode"),
            Self::WorkerSpawn => write!(f, "motor worker spawn failed"),
            Self::CoilWrite => write!(f, "coil write failed"),
        }
    }
}

impl core::error::Error for MotorError {}

impl From<MotorError> for Error {
    fn from(e: MotorError) -> Self {
        Self::Motor(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
