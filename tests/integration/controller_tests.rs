//! Integration tests for the DoorController → FSM → motor pipeline.
//!
//! These run on the host and drive the controller tick by tick against
//! [`MockHw`](super::mock_hw::MockHw), checking boot reconciliation, the
//! daily schedule, the recheck loop and the motor watchdog.

use coopdoor::app::events::AppEvent;
use coopdoor::app::ports::{BlinkConfig, LedColour};
use coopdoor::fsm::ModeId;
use coopdoor::fsm::context::{DailyFlags, DoorDirection, DoorState, DriveMode, RecheckState};

use super::mock_hw::{Bench, MotorRequest, june, test_config};

const CLOSE_PROTECTED: MotorRequest = MotorRequest {
    direction: DoorDirection::Close,
    drive: DriveMode::Protected,
};
const OPEN_PROTECTED: MotorRequest = MotorRequest {
    direction: DoorDirection::Open,
    drive: DriveMode::Protected,
};

fn in_normal(b: &Bench) -> bool {
    b.controller.mode() == ModeId::Normal
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn start_delay_then_init_then_normal() {
    let mut b = Bench::new(test_config(), june(10, 12, 0, 0), true);
    assert_eq!(b.sink.events, vec![AppEvent::Started(ModeId::StartDelay)]);

    b.tick();
    assert_eq!(b.controller.mode(), ModeId::StartDelay);
    b.tick();
    assert_eq!(b.controller.mode(), ModeId::Init);
    b.tick();
    assert_eq!(b.controller.mode(), ModeId::Normal);

    // Door already open inside the open window: no motor run needed.
    assert!(b.hw.requests.is_empty());
    assert_eq!(b.controller.daily(), DailyFlags::new(true, false));
    assert!(b.sink.contains(&AppEvent::ModeChanged {
        from: ModeId::StartDelay,
        to: ModeId::Init,
    }));
    assert!(b.sink.contains(&AppEvent::ModeChanged {
        from: ModeId::Init,
        to: ModeId::Normal,
    }));
}

#[test]
fn start_in_manual_mode_skips_init() {
    let config = coopdoor::config::CoopConfig {
        start_in_manual_mode: true,
        ..test_config()
    };
    let mut b = Bench::new(config, june(10, 21, 0, 0), true);
    b.run(5);
    assert_eq!(b.controller.mode(), ModeId::Manual);
    assert!(b.hw.requests.is_empty());
}

#[test]
fn boot_before_open_closes_open_door() {
    let mut b = Bench::new(test_config(), june(10, 5, 0, 0), true);
    b.run(3);
    assert_eq!(b.controller.mode(), ModeId::Init);
    assert_eq!(b.hw.requests, vec![CLOSE_PROTECTED]);
    assert_eq!(
        b.hw.last_indicator(),
        Some(BlinkConfig::new(LedColour::Green, 255, 200))
    );

    // INIT waits for the run.
    b.run(3);
    assert_eq!(b.controller.mode(), ModeId::Init);

    b.hw.complete_motor();
    b.tick();
    assert_eq!(b.controller.mode(), ModeId::Normal);
    assert_eq!(b.controller.door(), DoorState::Closed);
    assert_eq!(b.controller.daily(), DailyFlags::new(false, false));
    assert!(matches!(b.controller.recheck(), RecheckState::Armed { .. }));
    assert!(b.sink.contains(&AppEvent::MotorFinished {
        direction: DoorDirection::Close,
        door: DoorState::Closed,
        timed_out: false,
    }));
}

#[test]
fn boot_after_close_with_closed_door_marks_both_flags() {
    let mut b = Bench::new(test_config(), june(10, 21, 0, 0), false);
    b.run_until(5, in_normal);
    assert!(b.hw.requests.is_empty());
    assert_eq!(b.controller.daily(), DailyFlags::new(true, true));
}

#[test]
fn boot_in_open_window_opens_closed_door() {
    let mut b = Bench::new(test_config(), june(10, 9, 30, 0), false);
    b.run(3);
    assert_eq!(b.hw.requests, vec![OPEN_PROTECTED]);

    b.hw.complete_motor();
    b.tick();
    assert_eq!(b.controller.mode(), ModeId::Normal);
    assert_eq!(b.controller.daily(), DailyFlags::new(true, false));
}

// ── Daily schedule ────────────────────────────────────────────

#[test]
fn scheduled_open_then_scheduled_close() {
    let mut b = Bench::new(test_config(), june(10, 6, 59, 50), false);
    b.run_until(5, in_normal);
    assert_eq!(b.controller.daily(), DailyFlags::new(false, false));

    b.run_until(20, |b| !b.hw.requests.is_empty());
    assert_eq!(b.hw.requests, vec![OPEN_PROTECTED]);
    assert_eq!(b.hw.clock, june(10, 7, 0, 0));

    b.hw.complete_motor();
    b.tick();
    assert!(b.controller.daily().open_executed);
    assert_eq!(b.controller.door(), DoorState::Open);

    b.hw.clock = june(10, 19, 59, 58);
    b.run_until(10, |b| b.hw.requests.len() == 2);
    assert_eq!(b.hw.requests[1], CLOSE_PROTECTED);

    b.hw.complete_motor();
    b.tick();
    assert_eq!(b.controller.daily(), DailyFlags::new(true, true));
    assert!(matches!(b.controller.recheck(), RecheckState::Armed { .. }));

    // Nothing else happens for the rest of the evening.
    b.run(30);
    assert_eq!(b.hw.requests.len(), 2);
}

#[test]
fn day_rollover_resets_daily_flags() {
    let mut b = Bench::new(test_config(), june(10, 23, 59, 50), false);
    b.run_until(5, in_normal);
    assert_eq!(b.controller.daily(), DailyFlags::new(true, true));

    b.run_until(20, |b| b.controller.daily() == DailyFlags::default());
    assert_eq!(b.controller.today().map(|t| t.day_of_month), Some(11));
    assert!(b.hw.requests.is_empty());
    assert!(b.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::ScheduleLoaded(t) if t.day_of_month == 11
    )));
}

// ── Recheck loop ──────────────────────────────────────────────

#[test]
fn reopened_door_is_closed_again() {
    let mut b = Bench::new(test_config(), june(10, 21, 0, 0), false);
    b.run_until(5, in_normal);
    assert!(matches!(b.controller.recheck(), RecheckState::Armed { .. }));

    // Something pushes the door open after it was confirmed closed.
    b.hw.door_open = true;
    b.run_until(20, |b| b.controller.recheck() == RecheckState::Retrying);
    assert!(b.hw.requests.is_empty());
    assert_eq!(
        b.hw.last_indicator(),
        Some(BlinkConfig::new(LedColour::Red, 255, 200))
    );

    b.tick();
    assert_eq!(b.hw.requests, vec![CLOSE_PROTECTED]);

    b.hw.complete_motor();
    b.tick();
    assert_eq!(b.controller.door(), DoorState::Closed);
    assert!(matches!(b.controller.recheck(), RecheckState::Armed { .. }));
    // The retry never touches the daily flags.
    assert_eq!(b.controller.daily(), DailyFlags::new(true, true));
}

#[test]
fn failed_retry_cools_down_before_trying_again() {
    let mut b = Bench::new(test_config(), june(10, 21, 0, 0), false);
    b.run_until(5, in_normal);
    b.hw.door_open = true;
    b.run_until(20, |b| b.controller.recheck() == RecheckState::Retrying);
    b.tick();
    assert_eq!(b.hw.requests.len(), 1);

    b.hw.complete_motor_jammed();
    b.tick();
    assert!(matches!(
        b.controller.recheck(),
        RecheckState::Idle {
            cooldown_since: Some(_)
        }
    ));

    // Cooldown is 1 × 60 s: no new attempt for a while.
    b.run(30);
    assert_eq!(b.hw.requests.len(), 1);

    b.run_until(80, |b| b.controller.recheck() == RecheckState::Retrying);
    b.tick();
    assert_eq!(b.hw.requests.len(), 2);
}

#[test]
fn recheck_is_dormant_in_open_window() {
    let mut b = Bench::new(test_config(), june(10, 12, 0, 0), true);
    b.run_until(5, in_normal);
    b.run(20);
    assert_eq!(b.controller.recheck(), RecheckState::default());
    assert!(
        !b.sink
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::RecheckChanged { .. }))
    );
}

// ── Motor watchdog ────────────────────────────────────────────

#[test]
fn stuck_motor_is_timed_out_and_stopped() {
    let mut b = Bench::new(test_config(), june(10, 5, 0, 0), true);
    b.run(3);
    assert_eq!(b.hw.requests, vec![CLOSE_PROTECTED]);

    b.run_until(70, |b| b.controller.motor().is_idle());
    assert_eq!(b.hw.stops, 1);
    assert!(b.sink.contains(&AppEvent::MotorFinished {
        direction: DoorDirection::Close,
        door: DoorState::Open,
        timed_out: true,
    }));
    // A timed-out run still completes INIT.
    assert_eq!(b.controller.mode(), ModeId::Normal);
}

#[test]
fn only_one_motor_request_per_run() {
    let mut b = Bench::new(test_config(), june(10, 5, 0, 0), true);
    b.run(20);
    assert_eq!(b.hw.requests.len(), 1);
}

// ── Clock and indicator ───────────────────────────────────────

#[test]
fn clock_read_failure_keeps_last_time() {
    let mut b = Bench::new(test_config(), june(10, 12, 0, 0), true);
    b.run_until(5, in_normal);
    let before = b.controller.now();

    b.hw.clock_read_fails = true;
    b.run(3);
    assert_eq!(b.controller.now(), before);
    assert_eq!(b.controller.mode(), ModeId::Normal);

    b.hw.clock_read_fails = false;
    b.tick();
    assert!(b.controller.now() > before);
}

#[test]
fn indicator_is_sent_only_on_change() {
    let mut b = Bench::new(test_config(), june(10, 12, 0, 0), true);
    b.tick();
    assert_eq!(
        b.hw.indicator,
        vec![BlinkConfig::new(LedColour::White, 64, 500)]
    );
    b.tick();
    assert_eq!(
        b.hw.last_indicator(),
        Some(BlinkConfig::new(LedColour::Yellow, 128, 500))
    );
    b.tick();
    assert_eq!(b.hw.last_indicator(), Some(BlinkConfig::default()));

    b.run(10);
    assert_eq!(b.hw.indicator.len(), 3);
    assert_eq!(b.controller.indicator(), Some(BlinkConfig::default()));
}

#[test]
fn door_changes_are_reported() {
    let mut b = Bench::new(test_config(), june(10, 12, 0, 0), true);
    b.tick();
    assert!(b.sink.contains(&AppEvent::DoorChanged {
        from: DoorState::Unknown,
        to: DoorState::Open,
    }));

    b.hw.door_open = false;
    b.tick();
    assert!(b.sink.contains(&AppEvent::DoorChanged {
        from: DoorState::Open,
        to: DoorState::Closed,
    }));
}
