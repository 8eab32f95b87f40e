//! Property and fuzz-style tests for robustness of the command path and
//! the controller.
//!
//! Runs on host only; proptest is not available for ESP32 targets.

#![cfg(not(target_os = "espidf"))]

#[allow(dead_code)]
#[path = "integration/mock_hw.rs"]
mod mock_hw;

use std::collections::HashMap;

use chrono::{NaiveDate, TimeDelta};
use coopdoor::command::{LineDecoder, parse};
use coopdoor::error::CommandError;
use coopdoor::fsm::context::DoorDirection;
use coopdoor::schedule::{DaySchedule, DayWindow};
use proptest::prelude::*;

use mock_hw::{Bench, june, test_config};

// ── Parser / decoder ──────────────────────────────────────────

proptest! {
    /// Arbitrary bytes never panic the parser.
    #[test]
    fn parser_never_panics(line in proptest::collection::vec(any::<u8>(), 0..80)) {
        let _ = parse(&line);
    }

    /// Anything without a trailing newline is rejected as unterminated.
    #[test]
    fn unterminated_lines_are_rejected(
        line in proptest::collection::vec(any::<u8>().prop_filter("no newline", |b| *b != b'\n'), 0..40),
    ) {
        prop_assert_eq!(parse(&line), Err(CommandError::Unterminated));
    }

    /// Splitting the byte stream at arbitrary points yields the same lines.
    #[test]
    fn decoder_is_chunking_invariant(
        data in proptest::collection::vec(prop_oneof![Just(b'\n'), Just(b'C'), any::<u8>()], 0..200),
        cuts in proptest::collection::vec(1usize..16, 0..20),
    ) {
        let mut whole = Vec::new();
        LineDecoder::new().feed(&data, |l| whole.push(l));

        let mut pieces = Vec::new();
        let mut decoder = LineDecoder::new();
        let mut rest = &data[..];
        for cut in cuts {
            let (head, tail) = rest.split_at(cut.min(rest.len()));
            decoder.feed(head, |l| pieces.push(l));
            rest = tail;
        }
        decoder.feed(rest, |l| pieces.push(l));

        prop_assert_eq!(whole, pieces);
    }
}

// ── Schedule windows ──────────────────────────────────────────

proptest! {
    /// Every minute of the day falls in exactly the window its position
    /// relative to the half-open [open, close) interval implies.
    #[test]
    fn window_matches_half_open_interval(
        open in 0u16..1439,
        len in 1u16..1440,
        minute in 0u16..1440,
    ) {
        let close = (open + len).min(1439);
        prop_assume!(open < close);
        let day = DaySchedule::new((open / 60) as u8, (open % 60) as u8, (close / 60) as u8, (close % 60) as u8);
        let table = coopdoor::schedule::ScheduleTable::uniform(day);
        let now = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(u32::from(minute / 60), u32::from(minute % 60), 0)
            .unwrap();
        let window = table.targets_for(&now).window(minute);

        let expected = if minute < open {
            DayWindow::BeforeOpen
        } else if minute < close {
            DayWindow::Open
        } else {
            DayWindow::AfterClose
        };
        prop_assert_eq!(window, expected);
        prop_assert_eq!(window.wants_closed(), !(open..close).contains(&minute));
    }
}

// ── Controller ────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    /// Jump the clock forward by this many minutes, then tick.
    Tick(u16),
    Command(&'static [u8]),
    Complete,
    Jam,
    ToggleDoor,
}

const COMMANDS: &[&[u8]] = &[
    b"CC\n",
    b"CCCM\n",
    b"CCCN\n",
    b"CCRT\n",
    b"CCMPO\n",
    b"CCMPC\n",
    b"CCMFO\n",
    b"CCMFC\n",
    b"CCMPS\n",
    b"CCT2024-06-12T06:59:00Z\n",
    b"CCT2024-06-12T20:30:00Z\n",
];

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u16..180).prop_map(Op::Tick),
        2 => proptest::sample::select(COMMANDS).prop_map(Op::Command),
        2 => Just(Op::Complete),
        1 => Just(Op::Jam),
        1 => Just(Op::ToggleDoor),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Whatever the operator and the door do, the driver never sees a
    /// second request while a run is in flight, and the controller's
    /// idea of the motor matches the driver after every tick.
    #[test]
    fn single_motor_operation_in_flight(
        ops in proptest::collection::vec(arb_op(), 1..120),
        start_hour in 0u32..24,
        door_open in any::<bool>(),
    ) {
        let mut b = Bench::new(test_config(), june(10, start_hour, 0, 0), door_open);
        for op in ops {
            match op {
                Op::Tick(minutes) => {
                    b.hw.clock += TimeDelta::minutes(i64::from(minutes));
                    b.tick();
                    prop_assert_eq!(b.controller.motor().is_idle(), b.hw.running.is_none());
                }
                Op::Command(line) => b.link.send(line),
                Op::Complete => b.hw.complete_motor(),
                Op::Jam => b.hw.complete_motor_jammed(),
                Op::ToggleDoor => b.hw.door_open = !b.hw.door_open,
            }
            prop_assert_eq!(b.hw.rejected, 0);
        }
    }

    /// With a door that always follows the motor, the schedule opens the
    /// door at most once per calendar day.
    #[test]
    fn at_most_one_open_per_day(
        jumps in proptest::collection::vec(1u16..240, 1..60),
        start_hour in 0u32..24,
        door_open in any::<bool>(),
    ) {
        let mut b = Bench::new(test_config(), june(10, start_hour, 0, 0), door_open);
        let mut opens: HashMap<NaiveDate, usize> = HashMap::new();

        for minutes in jumps {
            b.hw.clock += TimeDelta::minutes(i64::from(minutes));
            let before = b.hw.requests.len();
            b.tick();
            for req in &b.hw.requests[before..] {
                if req.direction == DoorDirection::Open {
                    *opens.entry(b.hw.clock.date()).or_default() += 1;
                }
            }
            b.hw.complete_motor();
        }

        for (date, count) in opens {
            prop_assert!(count <= 1, "{} opened {} times", date, count);
        }
    }
}
