//! Inbound commands to the door controller.
//!
//! Produced by the serial [`parser`](crate::command::parser) and
//! interpreted by [`DoorController`](super::service::DoorController).

use chrono::NaiveDateTime;

use crate::fsm::context::DriveMode;

/// Target of a MODE command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeRequest {
    Manual,
    /// Return to scheduled operation (always re-runs INIT).
    Normal,
}

/// Manual motor action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorAction {
    Open,
    Close,
    Stop,
}

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Liveness check; echoed back as the bare pattern.
    Ping,

    SetMode(ModeRequest),

    /// Write the RTC and restart reconciliation.
    SetTime(NaiveDateTime),

    /// Reply with the current RTC time.
    RequestTime,

    /// Manual motor control (MANUAL mode only).
    Motor { action: MotorAction, drive: DriveMode },
}
