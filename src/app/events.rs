//! Outbound application events.
//!
//! The [`DoorController`](super::service::DoorController) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them.

use chrono::NaiveDateTime;

use crate::error::{CommandError, MotorError};
use crate::fsm::ModeId;
use crate::fsm::context::{DoorDirection, DoorState, DriveMode, RecheckState};
use crate::schedule::DayTargets;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The controller has started (carries initial mode).
    Started(ModeId),

    /// The operating mode changed.
    ModeChanged { from: ModeId, to: ModeId },

    /// The door switch reading changed.
    DoorChanged { from: DoorState, to: DoorState },

    /// Today's open/close targets were (re)computed.
    ScheduleLoaded(DayTargets),

    /// The motor driver accepted a run.
    MotorStarted {
        direction: DoorDirection,
        drive: DriveMode,
    },

    /// A run ended, by the driver or by the watchdog.
    MotorFinished {
        direction: DoorDirection,
        door: DoorState,
        timed_out: bool,
    },

    /// A manual STOP cancelled the outstanding run.
    MotorStopped,

    /// A motor request was refused.
    MotorRejected(MotorError),

    /// The recheck supervisor changed state.
    RecheckChanged { from: RecheckState, to: RecheckState },

    /// The RTC was set by an operator.
    TimeSet(NaiveDateTime),

    /// A command line was malformed and dropped.
    CommandRejected(CommandError),
}
