//! Door controller: the hexagonal core.
//!
//! [`DoorController`] owns the mode FSM, the recheck supervisor and the
//! shared context.  It exposes a clean, hardware-agnostic API.  All I/O
//! flows through port traits injected at call sites, making the entire
//! controller testable with mock adapters.
//!
//! ```text
//!  CommandPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                  │      DoorController      │
//!  DevicePorts ◀──▶│  FSM · Recheck · Watchdog│
//!                  └──────────────────────────┘
//! ```
//!
//! One call to [`DoorController::tick`] runs, in order:
//! 1. drain and apply pending commands
//! 2. refresh the clock and door-switch snapshot
//! 3. poll motor completion (or time the run out)
//! 4. advance the mode FSM
//! 5. evaluate the recheck supervisor (NORMAL only)
//! 6. issue at most one motor request
//! 7. update the status indicator

use chrono::NaiveDateTime;
use log::{error, info, warn};

use crate::command::parser;
use crate::config::CoopConfig;
use crate::error::MotorError;
use crate::fsm::context::{
    Completion, DailyFlags, DoorDirection, DoorState, DriveMode, FsmContext, MotorOp,
    RecheckState,
};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, ModeId};
use crate::recheck::RecheckSupervisor;
use crate::schedule::{DayTargets, ScheduleTable};

use super::commands::{AppCommand, ModeRequest, MotorAction};
use super::events::AppEvent;
use super::ports::{BlinkConfig, CommandPort, DevicePorts, EventSink, LedColour, MotorPort};

/// Upper bound on command lines handled per tick.
const MAX_COMMANDS_PER_TICK: usize = 8;

/// Reply to a ping: the bare command pattern.
pub const PING_REPLY: &[u8] = b"CC\n";

// ───────────────────────────────────────────────────────────────
// DoorController
// ───────────────────────────────────────────────────────────────

/// The door controller orchestrates all domain logic.
pub struct DoorController {
    fsm: Fsm,
    ctx: FsmContext,
    recheck: RecheckSupervisor,
    /// Watchdog budget for a single motor run.
    max_op_ticks: u64,
    tick_count: u64,
    /// Last mode reported through the event sink.
    reported_mode: ModeId,
    reported_today: Option<DayTargets>,
    indicator: Option<BlinkConfig>,
}

impl DoorController {
    /// Construct the controller from configuration and schedule.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: CoopConfig, schedule: ScheduleTable) -> Self {
        let recheck = RecheckSupervisor::new(&config);
        let max_op_ticks = config.secs_to_ticks(u32::from(config.max_operation_duration_secs));
        let ctx = FsmContext::new(config, schedule);
        let fsm = Fsm::new(build_state_table(), ModeId::StartDelay);

        Self {
            fsm,
            ctx,
            recheck,
            max_op_ticks,
            tick_count: 0,
            reported_mode: ModeId::StartDelay,
            reported_today: None,
            indicator: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the FSM in START_DELAY.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        self.reported_mode = self.fsm.current_state();
        sink.emit(&AppEvent::Started(self.reported_mode));
        info!("DoorController started in {:?}", self.reported_mode);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle.
    ///
    /// The `hw` parameter satisfies every device port at once; this
    /// avoids juggling several mutable borrows while keeping the port
    /// boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut impl DevicePorts,
        link: &mut impl CommandPort,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;

        // 1. Commands
        for _ in 0..MAX_COMMANDS_PER_TICK {
            let Some(line) = link.poll_line() else { break };
            match parser::parse(&line) {
                Ok(cmd) => self.handle_command(cmd, hw, link, sink),
                Err(e) => {
                    warn!("Dropping command line: {}", e);
                    sink.emit(&AppEvent::CommandRejected(e));
                }
            }
        }

        // 2. Snapshot
        match hw.now() {
            Ok(now) => self.ctx.now = now,
            Err(e) => warn!("Clock read failed ({}), keeping {}", e, self.ctx.now),
        }
        let door = if hw.is_open() {
            DoorState::Open
        } else {
            DoorState::Closed
        };
        if door != self.ctx.door {
            sink.emit(&AppEvent::DoorChanged {
                from: self.ctx.door,
                to: door,
            });
            self.ctx.door = door;
        }

        // 3. Motor completion / watchdog
        self.poll_motor(hw, sink);

        // 4. Mode FSM
        self.fsm.tick(&mut self.ctx);

        // 5. Recheck supervisor
        if self.fsm.current_state() == ModeId::Normal {
            let before = self.ctx.recheck;
            let after = self.recheck.evaluate(&mut self.ctx);
            if after != before {
                sink.emit(&AppEvent::RecheckChanged {
                    from: before,
                    to: after,
                });
            }
        } else {
            self.ctx.close_outcome = None;
        }

        // 6. Motor request
        if let Some(direction) = self.ctx.request.take() {
            self.start_motor(direction, DriveMode::Protected, hw, sink);
        }
        // A completion nobody consumed this tick is stale by the next one.
        self.ctx.completion = None;

        // 7. Indicator
        self.refresh_indicator(hw);

        self.report_mode(sink);
        if self.ctx.today != self.reported_today {
            self.reported_today = self.ctx.today;
            if let Some(t) = self.ctx.today {
                sink.emit(&AppEvent::ScheduleLoaded(t));
            }
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply one parsed command.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl DevicePorts,
        link: &mut impl CommandPort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::Ping => link.reply(PING_REPLY),
            AppCommand::SetMode(ModeRequest::Manual) => {
                if !self.ctx.motor.is_idle() {
                    warn!("MODE=MANUAL rejected: motor operation outstanding");
                    sink.emit(&AppEvent::MotorRejected(MotorError::Busy));
                    return;
                }
                self.fsm.force_transition(ModeId::Manual, &mut self.ctx);
                self.report_mode(sink);
            }
            AppCommand::SetMode(ModeRequest::Normal) => {
                info!("MODE=NORMAL: re-running initialisation");
                self.restart_init(sink);
            }
            AppCommand::SetTime(time) => self.set_time(time, hw, sink),
            AppCommand::RequestTime => match hw.now() {
                Ok(now) => {
                    let reply = parser::format_time_reply(&now);
                    link.reply(reply.as_bytes());
                }
                Err(e) => warn!("Time request unanswered: {}", e),
            },
            AppCommand::Motor { action, drive } => self.manual_motor(action, drive, hw, sink),
        }
    }

    fn set_time(
        &mut self,
        time: NaiveDateTime,
        hw: &mut impl DevicePorts,
        sink: &mut impl EventSink,
    ) {
        match hw.set_time(&time) {
            Ok(()) => {
                info!("Clock set to {}", time);
                self.ctx.now = time;
                sink.emit(&AppEvent::TimeSet(time));
                self.restart_init(sink);
            }
            Err(e) => error!("Clock write failed: {}", e),
        }
    }

    fn manual_motor(
        &mut self,
        action: MotorAction,
        drive: DriveMode,
        hw: &mut impl DevicePorts,
        sink: &mut impl EventSink,
    ) {
        if self.fsm.current_state() != ModeId::Manual {
            warn!("Motor command {:?} ignored outside MANUAL", action);
            sink.emit(&AppEvent::MotorRejected(MotorError::NotInManualMode));
            return;
        }

        let direction = match action {
            MotorAction::Stop => {
                hw.stop();
                if !self.ctx.motor.is_idle() {
                    info!("Motor stopped by operator");
                }
                self.ctx.motor = MotorOp::Idle;
                sink.emit(&AppEvent::MotorStopped);
                return;
            }
            MotorAction::Open => DoorDirection::Open,
            MotorAction::Close => DoorDirection::Close,
        };

        if drive == DriveMode::Protected && self.ctx.door == direction.target() {
            warn!("Manual {:?} rejected: door already {:?}", direction, self.ctx.door);
            sink.emit(&AppEvent::MotorRejected(MotorError::AlreadyInPosition));
            return;
        }
        if !self.ctx.motor.is_idle() {
            warn!("Manual {:?} rejected: motor busy", direction);
            sink.emit(&AppEvent::MotorRejected(MotorError::Busy));
            return;
        }
        self.start_motor(direction, drive, hw, sink);
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current operating mode.
    pub fn mode(&self) -> ModeId {
        self.fsm.current_state()
    }

    /// Door position at the latest tick.
    pub fn door(&self) -> DoorState {
        self.ctx.door
    }

    pub fn motor(&self) -> MotorOp {
        self.ctx.motor
    }

    pub fn daily(&self) -> DailyFlags {
        self.ctx.daily
    }

    pub fn recheck(&self) -> RecheckState {
        self.ctx.recheck
    }

    /// Today's schedule, once INIT has resolved it.
    pub fn today(&self) -> Option<DayTargets> {
        self.ctx.today
    }

    /// Latest clock reading.
    pub fn now(&self) -> NaiveDateTime {
        self.ctx.now
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &CoopConfig {
        &self.ctx.config
    }

    /// Indicator pattern last sent to the LED.
    pub fn indicator(&self) -> Option<BlinkConfig> {
        self.indicator
    }

    // ── Internal ──────────────────────────────────────────────

    fn restart_init(&mut self, sink: &mut impl EventSink) {
        self.fsm.reset_to(ModeId::Init, &mut self.ctx);
        let from = self.reported_mode;
        self.reported_mode = ModeId::Init;
        sink.emit(&AppEvent::ModeChanged {
            from,
            to: ModeId::Init,
        });
    }

    fn report_mode(&mut self, sink: &mut impl EventSink) {
        let mode = self.fsm.current_state();
        if mode != self.reported_mode {
            sink.emit(&AppEvent::ModeChanged {
                from: self.reported_mode,
                to: mode,
            });
            self.reported_mode = mode;
        }
    }

    /// Turn a finished (or overdue) run into a [`Completion`].
    fn poll_motor(&mut self, hw: &mut impl MotorPort, sink: &mut impl EventSink) {
        let (Some(direction), Some(since)) =
            (self.ctx.motor.direction(), self.ctx.motor.since_tick())
        else {
            return;
        };

        let timed_out = if hw.operation_done() {
            false
        } else if self.tick_count.saturating_sub(since) >= self.max_op_ticks {
            warn!(
                "Motor {:?} exceeded {}s, stopping",
                direction, self.ctx.config.max_operation_duration_secs
            );
            hw.stop();
            true
        } else {
            return;
        };

        self.ctx.motor = MotorOp::Idle;
        self.ctx.completion = Some(Completion {
            direction,
            timed_out,
        });
        sink.emit(&AppEvent::MotorFinished {
            direction,
            door: self.ctx.door,
            timed_out,
        });
    }

    fn start_motor(
        &mut self,
        direction: DoorDirection,
        drive: DriveMode,
        hw: &mut impl MotorPort,
        sink: &mut impl EventSink,
    ) {
        let accepted = match direction {
            DoorDirection::Open => hw.request_open(drive),
            DoorDirection::Close => hw.request_close(drive),
        };
        if accepted {
            info!("Motor {:?} started ({:?})", direction, drive);
            self.ctx.motor = MotorOp::started(direction, drive, self.tick_count);
            sink.emit(&AppEvent::MotorStarted { direction, drive });
        } else {
            warn!("Motor busy, {:?} request retried next tick", direction);
            sink.emit(&AppEvent::MotorRejected(MotorError::Busy));
        }
    }

    fn refresh_indicator(&mut self, hw: &mut impl DevicePorts) {
        let pattern = indicator_pattern(self.fsm.current_state(), self.ctx.motor, self.ctx.recheck);
        if self.indicator != Some(pattern) {
            hw.set_indicator(pattern);
            self.indicator = Some(pattern);
        }
    }
}

/// LED pattern for the given controller state.  A running motor wins
/// over a pending retry, which wins over the mode colour.
pub fn indicator_pattern(mode: ModeId, motor: MotorOp, recheck: RecheckState) -> BlinkConfig {
    if !motor.is_idle() {
        return BlinkConfig::new(LedColour::Green, 255, 200);
    }
    if recheck.is_retrying() {
        return BlinkConfig::new(LedColour::Red, 255, 200);
    }
    match mode {
        ModeId::StartDelay => BlinkConfig::new(LedColour::White, 64, 500),
        ModeId::Init => BlinkConfig::new(LedColour::Yellow, 128, 500),
        ModeId::Normal => BlinkConfig::default(),
        ModeId::Manual => BlinkConfig::new(LedColour::Blue, 128, 1000),
    }
}
