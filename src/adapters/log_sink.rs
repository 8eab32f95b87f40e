//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to the USB-serial console in
//! production).  Problems are logged at `warn`, everything else at `info`.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(mode) => {
                info!("START | initial_mode={:?}", mode);
            }
            AppEvent::ModeChanged { from, to } => {
                info!("MODE | {:?} -> {:?}", from, to);
            }
            AppEvent::DoorChanged { from, to } => {
                info!("DOOR | {:?} -> {:?}", from, to);
            }
            AppEvent::ScheduleLoaded(t) => {
                info!(
                    "SCHED | day {} open {:02}:{:02} close {:02}:{:02}",
                    t.day_of_month,
                    t.open_min / 60,
                    t.open_min % 60,
                    t.close_min / 60,
                    t.close_min % 60
                );
            }
            AppEvent::MotorStarted { direction, drive } => {
                info!("MOTOR | start {:?} ({:?})", direction, drive);
            }
            AppEvent::MotorFinished {
                direction,
                door,
                timed_out,
            } => {
                if *timed_out {
                    warn!("MOTOR | {:?} timed out, door={:?}", direction, door);
                } else {
                    info!("MOTOR | {:?} done, door={:?}", direction, door);
                }
            }
            AppEvent::MotorStopped => {
                info!("MOTOR | stopped");
            }
            AppEvent::MotorRejected(e) => {
                warn!("MOTOR | rejected: {}", e);
            }
            AppEvent::RecheckChanged { from, to } => {
                info!("RECHECK | {:?} -> {:?}", from, to);
            }
            AppEvent::TimeSet(t) => {
                info!("CLOCK | set to {}", t);
            }
            AppEvent::CommandRejected(e) => {
                warn!("CMD | rejected: {}", e);
            }
        }
    }
}
