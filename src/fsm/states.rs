//! Concrete mode handler functions and table builder.
//!
//! Each mode is defined by plain `fn` pointers: no closures, no dynamic
//! dispatch, no heap.  Handlers never touch hardware; they read the
//! snapshot in [`FsmContext`] and leave at most one motor request in
//! `ctx.request` for the controller to apply.
//!
//! ```text
//!  START_DELAY ──[delay elapsed]──▶ INIT ──[door reconciled]──▶ NORMAL
//!       │                            ▲                            │
//!       │                            └──[MODE=NORMAL / TIME]──────┤
//!       │                                                         │
//!       └──[start_in_manual_mode]──▶ MANUAL ◀──[MODE=MANUAL]──────┘
//! ```

use chrono::Datelike;
use log::{info, warn};

use super::context::{DailyFlags, DoorDirection, DoorState, FsmContext, RecheckState};
use super::{ModeId, StateDescriptor};
use crate::schedule::DayWindow;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static mode table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; ModeId::COUNT] {
    [
        // Index 0: StartDelay
        StateDescriptor {
            id: ModeId::StartDelay,
            name: "StartDelay",
            on_enter: Some(start_delay_enter),
            on_exit: None,
            on_update: start_delay_update,
        },
        // Index 1: Init
        StateDescriptor {
            id: ModeId::Init,
            name: "Init",
            on_enter: Some(init_enter),
            on_exit: None,
            on_update: init_update,
        },
        // Index 2: Normal
        StateDescriptor {
            id: ModeId::Normal,
            name: "Normal",
            on_enter: Some(normal_enter),
            on_exit: None,
            on_update: normal_update,
        },
        // Index 3: Manual
        StateDescriptor {
            id: ModeId::Manual,
            name: "Manual",
            on_enter: Some(manual_enter),
            on_exit: Some(manual_exit),
            on_update: manual_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  START_DELAY: let the RTC and switch settle after power-up
// ═══════════════════════════════════════════════════════════════════════════

fn start_delay_enter(ctx: &mut FsmContext) {
    info!("START_DELAY: waiting {}s before first reconciliation", ctx.config.start_delay_secs);
}

fn start_delay_update(ctx: &mut FsmContext) -> Option<ModeId> {
    if ctx.ms_in_state() < u64::from(ctx.config.start_delay_secs) * 1000 {
        return None;
    }
    if ctx.config.start_in_manual_mode {
        Some(ModeId::Manual)
    } else {
        Some(ModeId::Init)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  INIT: bring the door in line with the schedule for "now"
// ═══════════════════════════════════════════════════════════════════════════

fn init_enter(ctx: &mut FsmContext) {
    ctx.daily = DailyFlags::default();
    ctx.recheck = RecheckState::default();
    ctx.close_outcome = None;
    ctx.today = None;
    let t = ctx.refresh_targets();
    info!(
        "INIT: {} day minute {}, open at {}, close at {}",
        ctx.now.date(),
        ctx.day_minutes(),
        t.open_min,
        t.close_min
    );
}

fn init_update(ctx: &mut FsmContext) -> Option<ModeId> {
    let window = ctx.refresh_targets().window(ctx.day_minutes());
    let direction = if window.wants_closed() {
        DoorDirection::Close
    } else {
        DoorDirection::Open
    };

    if !drive_toward(ctx, direction) {
        return None;
    }

    ctx.daily = match window {
        DayWindow::BeforeOpen => DailyFlags::new(false, false),
        DayWindow::Open => DailyFlags::new(true, false),
        DayWindow::AfterClose => DailyFlags::new(true, true),
    };
    if window.wants_closed() {
        ctx.close_outcome = Some(ctx.door == DoorState::Closed);
    }
    info!("INIT: door reconciled ({:?}), flags {:?}", window, ctx.daily);
    Some(ModeId::Normal)
}

/// Drive the door towards `direction`'s target.  Returns `true` once the
/// door is there, either already or after a completed run.
fn drive_toward(ctx: &mut FsmContext, direction: DoorDirection) -> bool {
    let target = direction.target();

    if ctx.take_completion(direction).is_some() {
        if ctx.door != target {
            warn!(
                "INIT: {:?} run finished but switch reads {:?}",
                direction, ctx.door
            );
        }
        return true;
    }

    // Another run (e.g. a manual one) is still in flight: wait for it.
    if !ctx.motor.is_idle() {
        return false;
    }

    if ctx.door == target {
        return true;
    }

    ctx.request_motor(direction);
    false
}

// ═══════════════════════════════════════════════════════════════════════════
//  NORMAL: scheduled open/close, day rollover, recheck-driven retries
// ═══════════════════════════════════════════════════════════════════════════

fn normal_enter(ctx: &mut FsmContext) {
    if let Some(t) = ctx.today {
        info!(
            "NORMAL: open at {:02}:{:02}, close at {:02}:{:02}, flags {:?}",
            t.open_min / 60,
            t.open_min % 60,
            t.close_min / 60,
            t.close_min % 60,
            ctx.daily
        );
    }
}

fn normal_update(ctx: &mut FsmContext) -> Option<ModeId> {
    // ── Day rollover ──────────────────────────────────────────
    if ctx.today.is_some_and(|t| t.day_of_month != ctx.now.day()) {
        ctx.daily = DailyFlags::default();
        let t = ctx.refresh_targets();
        info!(
            "NORMAL: new day {}, open at {:02}:{:02}, close at {:02}:{:02}",
            ctx.now.date(),
            t.open_min / 60,
            t.open_min % 60,
            t.close_min / 60,
            t.close_min % 60
        );
    }
    let targets = ctx.refresh_targets();
    let minutes = ctx.day_minutes();

    // ── Completions ───────────────────────────────────────────
    if ctx.take_completion(DoorDirection::Open).is_some() {
        ctx.daily.open_executed = true;
        ctx.recheck = RecheckState::default();
        if ctx.door != DoorState::Open {
            warn!("NORMAL: open finished but switch reads {:?}", ctx.door);
        }
    }
    if ctx.take_completion(DoorDirection::Close).is_some() {
        if minutes >= targets.close_min {
            ctx.daily.close_executed = true;
        }
        ctx.close_outcome = Some(ctx.door == DoorState::Closed);
        // The supervisor re-arms or cools down from the outcome.
        if ctx.recheck.is_retrying() {
            ctx.recheck = RecheckState::default();
        }
        if ctx.door != DoorState::Closed {
            warn!("NORMAL: close finished but switch reads {:?}", ctx.door);
        }
    }

    if !ctx.motor.is_idle() {
        return None;
    }

    // ── Scheduled open ────────────────────────────────────────
    if !ctx.daily.open_executed && minutes >= targets.open_min {
        if minutes >= targets.close_min {
            info!("NORMAL: open window already over, skipping today's open");
            ctx.daily.open_executed = true;
        } else {
            match ctx.door {
                DoorState::Closed => {
                    info!("NORMAL: opening time reached");
                    ctx.request_motor(DoorDirection::Open);
                }
                DoorState::Open => {
                    ctx.daily.open_executed = true;
                    ctx.recheck = RecheckState::default();
                }
                DoorState::Unknown => {}
            }
        }
    }

    // ── Scheduled close / recheck retry ───────────────────────
    let close_due = !ctx.daily.close_executed && minutes >= targets.close_min;
    if (close_due || ctx.recheck.is_retrying()) && ctx.request.is_none() {
        match ctx.door {
            DoorState::Open => {
                if close_due {
                    info!("NORMAL: closing time reached");
                } else {
                    info!("NORMAL: re-closing after failed recheck");
                }
                ctx.request_motor(DoorDirection::Close);
            }
            DoorState::Closed => {
                if close_due {
                    ctx.daily.close_executed = true;
                }
                ctx.close_outcome = Some(true);
            }
            DoorState::Unknown => {}
        }
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  MANUAL: operator drives the motor through serial commands
// ═══════════════════════════════════════════════════════════════════════════

fn manual_enter(_ctx: &mut FsmContext) {
    info!("MANUAL: schedule suspended, awaiting motor commands");
}

fn manual_exit(_ctx: &mut FsmContext) {
    info!("MANUAL: leaving manual control");
}

fn manual_update(ctx: &mut FsmContext) -> Option<ModeId> {
    if let Some(c) = ctx.completion.take() {
        info!(
            "MANUAL: {:?} run finished{}, door {:?}",
            c.direction,
            if c.timed_out { " (timed out)" } else { "" },
            ctx.door
        );
    }
    None
}
