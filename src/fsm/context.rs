//! Shared mutable context threaded through every mode handler.
//!
//! `FsmContext` is the single struct that mode handlers read from and
//! write to.  It holds the latest clock and door-switch snapshot, the
//! motor-operation bookkeeping, the daily execution flags, the recheck
//! state and the outgoing motor request.  Think of it as the
//! "blackboard" in a blackboard architecture: the controller fills in
//! the inputs, the handlers decide, and the controller applies the
//! outputs to the motor port afterwards.

use chrono::NaiveDateTime;

use crate::config::CoopConfig;
use crate::schedule::{self, DayTargets, ScheduleTable};

// ---------------------------------------------------------------------------
// Door and motor vocabulary
// ---------------------------------------------------------------------------

/// Door position as derived from the switch.  Recomputed every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DoorState {
    /// No reading taken yet.
    #[default]
    Unknown,
    Open,
    Closed,
}

/// Direction of a motor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorDirection {
    Open,
    Close,
}

impl DoorDirection {
    /// Door state this direction drives towards.
    pub fn target(self) -> DoorState {
        match self {
            Self::Open => DoorState::Open,
            Self::Close => DoorState::Closed,
        }
    }
}

/// Whether a run honours the door-switch guard and stop condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    /// Normal run: a close stops as soon as the switch reads closed.
    Protected,
    /// Override: ignore the switch and run the full step budget.
    Forced,
}

/// Lifecycle of the single outstanding motor operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotorOp {
    #[default]
    Idle,
    Opening { since_tick: u64, drive: DriveMode },
    Closing { since_tick: u64, drive: DriveMode },
}

impl MotorOp {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn direction(&self) -> Option<DoorDirection> {
        match self {
            Self::Idle => None,
            Self::Opening { .. } => Some(DoorDirection::Open),
            Self::Closing { .. } => Some(DoorDirection::Close),
        }
    }

    pub fn since_tick(&self) -> Option<u64> {
        match self {
            Self::Idle => None,
            Self::Opening { since_tick, .. } | Self::Closing { since_tick, .. } => {
                Some(*since_tick)
            }
        }
    }

    pub(crate) fn started(direction: DoorDirection, drive: DriveMode, since_tick: u64) -> Self {
        match direction {
            DoorDirection::Open => Self::Opening { since_tick, drive },
            DoorDirection::Close => Self::Closing { since_tick, drive },
        }
    }
}

/// A motor operation that ended this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub direction: DoorDirection,
    /// Ended by the controller watchdog rather than the driver.
    pub timed_out: bool,
}

/// Per-day idempotence markers for the scheduled open and close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DailyFlags {
    pub open_executed: bool,
    pub close_executed: bool,
}

impl DailyFlags {
    pub const fn new(open_executed: bool, close_executed: bool) -> Self {
        Self {
            open_executed,
            close_executed,
        }
    }
}

/// Closed-door verification loop.  Timestamps are controller ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecheckState {
    /// Nothing scheduled, or cooling down since `cooldown_since`.
    Idle { cooldown_since: Option<u64> },
    /// A close was confirmed at `since`; waiting for the recheck delay.
    Armed { since: u64 },
    /// The delay elapsed; the next evaluation samples the switch.
    Rechecking,
    /// The door was found open; scheduling forces a close.
    Retrying,
}

impl Default for RecheckState {
    fn default() -> Self {
        Self::Idle {
            cooldown_since: None,
        }
    }
}

impl RecheckState {
    pub fn is_retrying(&self) -> bool {
        matches!(self, Self::Retrying)
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every mode handler function.
pub struct FsmContext {
    // -- Timing --
    /// Ticks elapsed since the current mode was entered.
    pub ticks_in_state: u64,
    /// Monotonic total tick count.
    pub total_ticks: u64,
    /// Duration of one tick in milliseconds.
    pub tick_period_ms: u32,

    // -- Inputs (written by the controller before each FSM tick) --
    /// Latest wall-clock reading.
    pub now: NaiveDateTime,
    /// Door position from the switch.
    pub door: DoorState,
    /// Motor operation that finished since the previous tick.
    pub completion: Option<Completion>,

    // -- Bookkeeping --
    /// Outstanding motor operation.
    pub motor: MotorOp,
    pub daily: DailyFlags,
    /// Today's resolved schedule.  `None` until INIT computes it.
    pub today: Option<DayTargets>,
    pub recheck: RecheckState,
    /// Outcome of the latest scheduled close: `Some(true)` when the door
    /// is confirmed closed.  Consumed by the recheck supervisor.
    pub close_outcome: Option<bool>,

    // -- Outputs (consumed by the controller after each FSM tick) --
    /// Motor run requested by a mode handler.  At most one per tick.
    pub request: Option<DoorDirection>,

    // -- Configuration --
    pub config: CoopConfig,
    pub schedule: ScheduleTable,
}

impl FsmContext {
    /// Create a new context with the given configuration and schedule.
    pub fn new(config: CoopConfig, schedule: ScheduleTable) -> Self {
        Self {
            ticks_in_state: 0,
            total_ticks: 0,
            tick_period_ms: config.tick_interval_ms,
            now: NaiveDateTime::default(),
            door: DoorState::Unknown,
            completion: None,
            motor: MotorOp::Idle,
            daily: DailyFlags::default(),
            today: None,
            recheck: RecheckState::default(),
            close_outcome: None,
            request: None,
            config,
            schedule,
        }
    }

    /// Milliseconds elapsed since the current mode was entered.
    pub fn ms_in_state(&self) -> u64 {
        self.ticks_in_state * u64::from(self.tick_period_ms)
    }

    /// Minutes since midnight of the latest clock reading.
    pub fn day_minutes(&self) -> u16 {
        schedule::day_minutes_of(&self.now)
    }

    /// Today's targets, recomputed if the calendar day moved on.
    pub fn refresh_targets(&mut self) -> DayTargets {
        use chrono::Datelike;
        match self.today {
            Some(t) if t.day_of_month == self.now.day() => t,
            _ => {
                let t = self.schedule.targets_for(&self.now);
                self.today = Some(t);
                t
            }
        }
    }

    /// Take the completion if it matches `direction`.
    pub fn take_completion(&mut self, direction: DoorDirection) -> Option<Completion> {
        match self.completion {
            Some(c) if c.direction == direction => self.completion.take(),
            _ => None,
        }
    }

    /// Queue a motor request unless one is already outstanding or queued.
    pub fn request_motor(&mut self, direction: DoorDirection) -> bool {
        if self.motor.is_idle() && self.request.is_none() {
            self.request = Some(direction);
            true
        } else {
            false
        }
    }
}
