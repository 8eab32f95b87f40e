//! Integration tests for the serial command path.
//!
//! Bytes go through the real line decoder and parser into the
//! controller; replies and motor calls are observed on the mocks.

use coopdoor::app::events::AppEvent;
use coopdoor::error::{CommandError, MotorError};
use coopdoor::fsm::ModeId;
use coopdoor::fsm::context::{DailyFlags, DoorDirection, DriveMode};

use super::mock_hw::{Bench, MotorRequest, june, test_config};

fn in_normal(b: &Bench) -> bool {
    b.controller.mode() == ModeId::Normal
}

/// Bench already in MANUAL, entered straight from START_DELAY.
fn manual_bench(door_open: bool) -> Bench {
    let mut b = Bench::new(test_config(), june(10, 12, 0, 0), door_open);
    b.command(b"CCCM\n");
    assert_eq!(b.controller.mode(), ModeId::Manual);
    b
}

// ── Ping / time ───────────────────────────────────────────────

#[test]
fn ping_echoes_pattern() {
    let mut b = Bench::new(test_config(), june(10, 12, 0, 0), true);
    b.command(b"CC\n");
    assert_eq!(b.link.replies, vec![b"CC\n".to_vec()]);
}

#[test]
fn request_time_replies_with_rtc_time() {
    let mut b = Bench::new(test_config(), june(10, 12, 0, 0), true);
    b.command(b"CCRT\n");
    assert_eq!(b.link.replies, vec![b"CCRT2024-06-10T12:00:01Z\n".to_vec()]);
}

#[test]
fn request_time_without_clock_stays_silent() {
    let mut b = Bench::new(test_config(), june(10, 12, 0, 0), true);
    b.hw.clock_read_fails = true;
    b.command(b"CCRT\n");
    assert!(b.link.replies.is_empty());
}

#[test]
fn set_time_writes_rtc_and_restarts_init() {
    let mut b = Bench::new(test_config(), june(10, 12, 0, 0), true);
    b.run_until(5, in_normal);
    assert_eq!(b.controller.daily(), DailyFlags::new(true, false));
    b.sink.clear();

    b.command(b"CCT2024-06-10T21:30:00Z\n");
    assert_eq!(b.hw.clock_writes, vec![june(10, 21, 30, 0)]);
    assert!(b.sink.contains(&AppEvent::TimeSet(june(10, 21, 30, 0))));
    assert!(b.sink.contains(&AppEvent::ModeChanged {
        from: ModeId::Normal,
        to: ModeId::Init,
    }));
    // INIT now sees the after-close window with the door open.
    assert_eq!(b.controller.mode(), ModeId::Init);
    assert_eq!(
        b.hw.requests,
        vec![MotorRequest {
            direction: DoorDirection::Close,
            drive: DriveMode::Protected,
        }]
    );

    b.hw.complete_motor();
    b.tick();
    assert_eq!(b.controller.mode(), ModeId::Normal);
    assert_eq!(b.controller.daily(), DailyFlags::new(true, true));
}

#[test]
fn failed_rtc_write_changes_nothing() {
    let mut b = Bench::new(test_config(), june(10, 12, 0, 0), true);
    b.run_until(5, in_normal);
    b.sink.clear();
    b.hw.clock_write_fails = true;

    b.command(b"CCT2024-06-10T21:30:00Z\n");
    assert_eq!(b.controller.mode(), ModeId::Normal);
    assert!(b.hw.clock_writes.is_empty());
    assert!(
        !b.sink
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::TimeSet(_)))
    );
}

// ── Malformed input ───────────────────────────────────────────

#[test]
fn malformed_lines_are_rejected_without_reply() {
    let mut b = Bench::new(test_config(), june(10, 12, 0, 0), true);
    b.link.send(b"XX\nCCC\nCCQ\nCCT2024-13-10T21:30:00Z\nCCMXO\n");
    b.tick();

    let rejected: Vec<CommandError> = b
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::CommandRejected(err) => Some(*err),
            _ => None,
        })
        .collect();
    assert_eq!(
        rejected,
        vec![
            CommandError::BadPattern,
            CommandError::TooShort { len: 4, min: 5 },
            CommandError::UnknownCommand(b'Q'),
            CommandError::BadTimestamp,
            CommandError::InvalidArgument(b'X'),
        ]
    );
    assert!(b.link.replies.is_empty());
    assert_eq!(b.controller.mode(), ModeId::StartDelay);
}

#[test]
fn commands_per_tick_are_bounded() {
    let mut b = Bench::new(test_config(), june(10, 12, 0, 0), true);
    b.link.send(&b"CC\n".repeat(10));
    b.tick();
    assert_eq!(b.link.replies.len(), 8);
    assert_eq!(b.link.pending(), 2);
    b.tick();
    assert_eq!(b.link.replies.len(), 10);
}

// ── Mode commands ─────────────────────────────────────────────

#[test]
fn manual_mode_suspends_schedule() {
    let mut b = Bench::new(test_config(), june(10, 21, 0, 0), true);
    b.command(b"CCCM\n");
    assert_eq!(b.controller.mode(), ModeId::Manual);
    assert!(b.sink.contains(&AppEvent::ModeChanged {
        from: ModeId::StartDelay,
        to: ModeId::Manual,
    }));

    // Past closing time with the door open, yet nothing moves.
    b.run(10);
    assert_eq!(b.controller.mode(), ModeId::Manual);
    assert!(b.hw.requests.is_empty());
}

#[test]
fn manual_mode_rejected_while_motor_runs() {
    let mut b = Bench::new(test_config(), june(10, 5, 0, 0), true);
    b.run(3);
    assert!(!b.controller.motor().is_idle());

    b.command(b"CCCM\n");
    assert_eq!(b.controller.mode(), ModeId::Init);
    assert!(b.sink.contains(&AppEvent::MotorRejected(MotorError::Busy)));
}

#[test]
fn normal_mode_reruns_init() {
    let mut b = manual_bench(true);
    b.command(b"CCCN\n");
    assert!(b.sink.contains(&AppEvent::ModeChanged {
        from: ModeId::Manual,
        to: ModeId::Init,
    }));
    // Door already open at noon: INIT hands over on the same tick.
    assert_eq!(b.controller.mode(), ModeId::Normal);
    assert_eq!(b.controller.daily(), DailyFlags::new(true, false));
}

#[test]
fn normal_mode_in_normal_resets_daily_flags() {
    let mut b = Bench::new(test_config(), june(10, 21, 0, 0), false);
    b.run_until(5, in_normal);
    assert_eq!(b.controller.daily(), DailyFlags::new(true, true));
    b.sink.clear();

    b.command(b"CCCN\n");
    assert!(b.sink.contains(&AppEvent::ModeChanged {
        from: ModeId::Normal,
        to: ModeId::Init,
    }));
    assert_eq!(b.controller.mode(), ModeId::Normal);
    assert_eq!(b.controller.daily(), DailyFlags::new(true, true));
}

// ── Motor commands ────────────────────────────────────────────

#[test]
fn motor_commands_need_manual_mode() {
    let mut b = Bench::new(test_config(), june(10, 12, 0, 0), false);
    b.command(b"CCMPO\n");
    assert!(b.hw.requests.is_empty());
    assert!(b
        .sink
        .contains(&AppEvent::MotorRejected(MotorError::NotInManualMode)));
}

#[test]
fn manual_open_runs_until_finished() {
    let mut b = manual_bench(false);
    b.command(b"CCMPO\n");
    assert_eq!(
        b.hw.requests,
        vec![MotorRequest {
            direction: DoorDirection::Open,
            drive: DriveMode::Protected,
        }]
    );
    assert!(b.sink.contains(&AppEvent::MotorStarted {
        direction: DoorDirection::Open,
        drive: DriveMode::Protected,
    }));

    b.hw.complete_motor();
    b.tick();
    assert!(b.controller.motor().is_idle());
    assert_eq!(b.controller.mode(), ModeId::Manual);
}

#[test]
fn second_manual_run_is_rejected_while_busy() {
    let mut b = manual_bench(false);
    b.command(b"CCMPO\n");
    b.command(b"CCMFO\n");
    assert_eq!(b.hw.requests.len(), 1);
    assert!(b.sink.contains(&AppEvent::MotorRejected(MotorError::Busy)));
}

#[test]
fn protected_run_towards_current_position_is_rejected() {
    let mut b = manual_bench(true);
    b.command(b"CCMPO\n");
    assert!(b.hw.requests.is_empty());
    assert!(b
        .sink
        .contains(&AppEvent::MotorRejected(MotorError::AlreadyInPosition)));

    // Forced ignores the switch.
    b.command(b"CCMFO\n");
    assert_eq!(
        b.hw.requests,
        vec![MotorRequest {
            direction: DoorDirection::Open,
            drive: DriveMode::Forced,
        }]
    );
}

#[test]
fn stop_abandons_the_run() {
    let mut b = manual_bench(true);
    b.command(b"CCMPC\n");
    assert!(!b.controller.motor().is_idle());

    b.command(b"CCMPS\n");
    assert_eq!(b.hw.stops, 1);
    assert!(b.controller.motor().is_idle());
    assert!(b.sink.contains(&AppEvent::MotorStopped));

    // The motor accepts a new run straight away.
    b.command(b"CCMPC\n");
    assert_eq!(b.hw.requests.len(), 2);
}
