//! Closed-door recheck supervisor.
//!
//! Runs **every tick after the mode handler while in NORMAL** and keeps
//! re-verifying that a door the schedule closed is still closed.  A hen
//! pushing against the door or a jammed latch can leave the switch
//! reading open long after the close completed.
//!
//! ## Lifecycle
//!
//! ```text
//!            close confirmed                delay elapsed
//!  Idle ───────────────────────▶ Armed ─────────────────────▶ Rechecking
//!   ▲ ▲                            ▲                              │
//!   │ └──[switch closed: cooldown]─┼──────────────────────────────┤
//!   │                              │                   [switch open]
//!   │       [retry close confirmed]│                              ▼
//!   │                              └─────────────────────────  Retrying
//!   └──[retry close left door open: cooldown]────────────────────┘
//! ```
//!
//! `Idle` carries an optional cooldown start; once
//! `recheck_cooldown_factor × max_operation_duration_secs` has passed the
//! supervisor re-arms on its own.  During the open window the supervisor
//! is dormant.

use log::{info, warn};

use crate::config::CoopConfig;
use crate::fsm::context::{DoorState, FsmContext, RecheckState};

/// Recheck supervisor.
pub struct RecheckSupervisor {
    /// Ticks between a confirmed close and the verification sample.
    delay_ticks: u64,
    /// Ticks a successful (or abandoned) recheck waits before re-arming.
    cooldown_ticks: u64,
}

impl RecheckSupervisor {
    pub fn new(config: &CoopConfig) -> Self {
        Self {
            delay_ticks: config.secs_to_ticks(u32::from(config.recheck_delay_secs)),
            cooldown_ticks: config.secs_to_ticks(config.recheck_cooldown_secs()),
        }
    }

    /// Advance the recheck state machine.  Returns the new state, which
    /// is also written back into `ctx.recheck`.
    pub fn evaluate(&self, ctx: &mut FsmContext) -> RecheckState {
        let now = ctx.total_ticks;
        let outcome = ctx.close_outcome.take();
        let window = ctx.refresh_targets().window(ctx.day_minutes());

        if !window.wants_closed() {
            ctx.recheck = RecheckState::default();
            return ctx.recheck;
        }

        let next = match (ctx.recheck, outcome) {
            (_, Some(true)) => RecheckState::Armed { since: now },
            (_, Some(false)) => {
                warn!("RECHECK: door still open after close, deferring to cooldown");
                RecheckState::Idle {
                    cooldown_since: Some(now),
                }
            }
            (RecheckState::Armed { since }, None) if now - since >= self.delay_ticks => {
                RecheckState::Rechecking
            }
            (RecheckState::Rechecking, None) => {
                if ctx.door == DoorState::Closed {
                    info!("RECHECK: door confirmed closed");
                    RecheckState::Idle {
                        cooldown_since: Some(now),
                    }
                } else {
                    warn!("RECHECK: door found {:?}, forcing a close", ctx.door);
                    RecheckState::Retrying
                }
            }
            (
                RecheckState::Idle {
                    cooldown_since: Some(t),
                },
                None,
            ) if now - t >= self.cooldown_ticks => RecheckState::Armed { since: now },
            (state, None) => state,
        };

        ctx.recheck = next;
        next
    }
}
