//! Mock hardware adapter for integration tests.
//!
//! Records every motor and indicator call so tests can assert on the full
//! command history without touching real GPIO, I²C or UART.  The door
//! switch follows the motor: completing a run moves the simulated door
//! to the run's target unless the test says the door jammed.

use std::collections::VecDeque;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use coopdoor::app::DoorController;
use coopdoor::app::events::AppEvent;
use coopdoor::app::ports::{
    BlinkConfig, ClockPort, CommandPort, DoorSwitchPort, EventSink, IndicatorPort, MotorPort,
};
use coopdoor::command::{CommandLine, LineDecoder};
use coopdoor::config::CoopConfig;
use coopdoor::error::ClockError;
use coopdoor::fsm::context::{DoorDirection, DriveMode};
use coopdoor::schedule::{DaySchedule, ScheduleTable};

/// `2024-06-<day> hh:mm:ss`.
pub fn june(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, day)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

/// Fast, small config: 1 s ticks, 2 s start delay, 60 s motor watchdog.
pub fn test_config() -> CoopConfig {
    CoopConfig {
        tick_interval_ms: 1000,
        start_delay_secs: 2,
        full_open_close_duration_secs: 50,
        revolutions_open_close: 2,
        max_operation_duration_secs: 60,
        recheck_delay_secs: 5,
        recheck_cooldown_factor: 1,
        ..CoopConfig::default()
    }
}

/// Opens at 07:00, closes at 20:00 every day.
pub fn test_schedule() -> ScheduleTable {
    ScheduleTable::uniform(DaySchedule::new(7, 0, 20, 0))
}

// ── MockHw ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorRequest {
    pub direction: DoorDirection,
    pub drive: DriveMode,
}

pub struct MockHw {
    /// Current RTC time.
    pub clock: NaiveDateTime,
    pub clock_read_fails: bool,
    pub clock_write_fails: bool,
    pub clock_writes: Vec<NaiveDateTime>,

    pub door_open: bool,

    /// Run the fake driver is currently executing.
    pub running: Option<MotorRequest>,
    finished: bool,
    pub requests: Vec<MotorRequest>,
    /// Requests refused because a run was still in flight.
    pub rejected: usize,
    pub stops: usize,

    pub indicator: Vec<BlinkConfig>,
}

#[allow(dead_code)]
impl MockHw {
    pub fn new(clock: NaiveDateTime, door_open: bool) -> Self {
        Self {
            clock,
            clock_read_fails: false,
            clock_write_fails: false,
            clock_writes: Vec::new(),
            door_open,
            running: None,
            finished: false,
            requests: Vec::new(),
            rejected: 0,
            stops: 0,
            indicator: Vec::new(),
        }
    }

    pub fn advance(&mut self, ms: u32) {
        self.clock += TimeDelta::milliseconds(i64::from(ms));
    }

    /// Finish the running operation, moving the door to its target.
    pub fn complete_motor(&mut self) {
        if let Some(run) = self.running.take() {
            self.door_open = run.direction == DoorDirection::Open;
            self.finished = true;
        }
    }

    /// Finish the running operation without the door moving.
    pub fn complete_motor_jammed(&mut self) {
        if self.running.take().is_some() {
            self.finished = true;
        }
    }

    pub fn last_indicator(&self) -> Option<BlinkConfig> {
        self.indicator.last().copied()
    }

    fn request(&mut self, direction: DoorDirection, drive: DriveMode) -> bool {
        if self.running.is_some() || self.finished {
            self.rejected += 1;
            return false;
        }
        let run = MotorRequest { direction, drive };
        self.requests.push(run);
        self.running = Some(run);
        true
    }
}

impl ClockPort for MockHw {
    fn now(&mut self) -> Result<NaiveDateTime, ClockError> {
        if self.clock_read_fails {
            Err(ClockError::Bus)
        } else {
            Ok(self.clock)
        }
    }

    fn set_time(&mut self, time: &NaiveDateTime) -> Result<(), ClockError> {
        if self.clock_write_fails {
            return Err(ClockError::Bus);
        }
        self.clock = *time;
        self.clock_writes.push(*time);
        Ok(())
    }
}

impl DoorSwitchPort for MockHw {
    fn is_open(&mut self) -> bool {
        self.door_open
    }
}

impl MotorPort for MockHw {
    fn request_open(&mut self, drive: DriveMode) -> bool {
        self.request(DoorDirection::Open, drive)
    }

    fn request_close(&mut self, drive: DriveMode) -> bool {
        self.request(DoorDirection::Close, drive)
    }

    fn operation_done(&mut self) -> bool {
        std::mem::take(&mut self.finished)
    }

    fn stop(&mut self) {
        self.stops += 1;
        self.running = None;
        self.finished = false;
    }
}

impl IndicatorPort for MockHw {
    fn set_indicator(&mut self, config: BlinkConfig) {
        self.indicator.push(config);
    }
}

// ── MockLink ──────────────────────────────────────────────────

/// Serial link fed through the real line decoder.
#[derive(Default)]
pub struct MockLink {
    decoder: LineDecoder,
    lines: VecDeque<CommandLine>,
    pub replies: Vec<Vec<u8>>,
}

#[allow(dead_code)]
impl MockLink {
    pub fn send(&mut self, bytes: &[u8]) {
        let lines = &mut self.lines;
        self.decoder.feed(bytes, |line| lines.push_back(line));
    }

    pub fn pending(&self) -> usize {
        self.lines.len()
    }
}

impl CommandPort for MockLink {
    fn poll_line(&mut self) -> Option<CommandLine> {
        self.lines.pop_front()
    }

    fn reply(&mut self, line: &[u8]) {
        self.replies.push(line.to_vec());
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

// ── Bench ─────────────────────────────────────────────────────

/// Controller wired to the mocks, with the clock advancing one tick
/// interval per tick.
pub struct Bench {
    pub controller: DoorController,
    pub hw: MockHw,
    pub link: MockLink,
    pub sink: RecordingSink,
    tick_ms: u32,
}

#[allow(dead_code)]
impl Bench {
    pub fn new(config: CoopConfig, clock: NaiveDateTime, door_open: bool) -> Self {
        let tick_ms = config.tick_interval_ms;
        let mut controller = DoorController::new(config, test_schedule());
        let mut sink = RecordingSink::default();
        controller.start(&mut sink);
        Self {
            controller,
            hw: MockHw::new(clock, door_open),
            link: MockLink::default(),
            sink,
            tick_ms,
        }
    }

    pub fn tick(&mut self) {
        self.hw.advance(self.tick_ms);
        self.controller
            .tick(&mut self.hw, &mut self.link, &mut self.sink);
    }

    pub fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Tick until `done` holds.  Panics after `max` ticks.
    pub fn run_until(&mut self, max: usize, done: impl Fn(&Self) -> bool) {
        for _ in 0..max {
            if done(self) {
                return;
            }
            self.tick();
        }
        assert!(done(self), "condition not reached within {max} ticks");
    }

    /// Send a command line and process it on the next tick.
    pub fn command(&mut self, line: &[u8]) {
        self.link.send(line);
        self.tick();
    }
}
