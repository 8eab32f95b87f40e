//! Half-step stepper driver for the door winch (28BYJ-48 + ULN2003).
//!
//! ## Threading model
//!
//! ```text
//!  control loop                         stepper worker (own task)
//!  ────────────                         ─────────────────────────
//!  request_open() ─CAS Idle→Opening──▶  park() returns
//!                  unpark()             for rev in 0..revolutions:
//!                                         stop flag? → abort
//!                                         for step in 0..4096:
//!                                           stop condition? → abort
//!                                           write coils, delay
//!  operation_done() ◀──── state=Idle ── de-energize coils
//! ```
//!
//! Status crosses threads through atomics only.  A request while the
//! worker is busy fails its compare-exchange and is rejected, never
//! queued.  [`MotorPort::stop`] is honoured between revolutions; the
//! worker never aborts mid-step.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::thread::{self, JoinHandle, Thread};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{info, warn};

use crate::app::ports::{DoorSwitchPort, MotorPort};
use crate::config::{CoopConfig, FALLBACK_FULL_TRAVEL_SECS};
use crate::drivers::door_switch::DoorSwitch;
use crate::drivers::task::spawn_task;
use crate::error::MotorError;
use crate::fsm::context::{DoorDirection, DriveMode};

/// Half-steps per output-shaft revolution (64 × 64:1 gearbox).
pub const STEPS_PER_REVOLUTION: u32 = 4096;

/// Coil patterns IN1..IN4 (MSB = IN1), one per half-step.
pub const HALF_STEP_SEQUENCE: [u8; 8] = [
    0b1000, 0b1100, 0b0100, 0b0110, 0b0010, 0b0011, 0b0001, 0b1001,
];

const STATE_IDLE: u8 = 0;
const STATE_OPENING: u8 = 1;
const STATE_CLOSING: u8 = 2;

const WORKER_PRIORITY: u8 = 5;
const WORKER_STACK_KB: usize = 4;

// ───────────────────────────────────────────────────────────────
// Stop condition
// ───────────────────────────────────────────────────────────────

/// Checked before every step of a protected run.
pub trait StopCondition: Send {
    fn should_stop(&mut self, direction: DoorDirection) -> bool;
}

impl<F: FnMut(DoorDirection) -> bool + Send> StopCondition for F {
    fn should_stop(&mut self, direction: DoorDirection) -> bool {
        self(direction)
    }
}

/// Stop a close as soon as the door switch reads closed.
pub fn close_stops_at_switch<P: InputPin + Send>(
    mut switch: DoorSwitch<P>,
) -> impl StopCondition {
    move |direction: DoorDirection| direction == DoorDirection::Close && !switch.is_open()
}

// ───────────────────────────────────────────────────────────────
// Timing
// ───────────────────────────────────────────────────────────────

/// Step budget and pacing for one full open or close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepperTiming {
    pub revolutions: u32,
    pub step_delay_us: u32,
}

impl StepperTiming {
    pub fn from_config(config: &CoopConfig) -> Self {
        let travel = config.effective_travel_secs();
        if travel != config.full_open_close_duration_secs {
            warn!(
                "Invalid open/close duration {}s, assuming {}s",
                config.full_open_close_duration_secs, FALLBACK_FULL_TRAVEL_SECS
            );
        }
        let revolutions = u32::from(config.revolutions_open_close.max(1));
        let step_delay_us =
            (u64::from(travel) * 1_000_000 / u64::from(revolutions * STEPS_PER_REVOLUTION)) as u32;
        Self {
            revolutions,
            step_delay_us,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Shared status
// ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct Shared {
    state: AtomicU8,
    forced: AtomicBool,
    op_pending: AtomicBool,
    stop: AtomicBool,
}

// ───────────────────────────────────────────────────────────────
// Driver handle
// ───────────────────────────────────────────────────────────────

/// Handle to the stepper worker.  Owned by the control loop.
pub struct StepperMotor {
    shared: Arc<Shared>,
    worker: Thread,
    _handle: JoinHandle<()>,
}

impl StepperMotor {
    /// Spawn the worker thread.  Coils start de-energized.
    pub fn spawn<P, D, S>(
        coils: [P; 4],
        delay: D,
        stop_condition: S,
        config: &CoopConfig,
    ) -> Result<Self, MotorError>
    where
        P: OutputPin + Send + 'static,
        D: DelayNs + Send + 'static,
        S: StopCondition + 'static,
    {
        let timing = StepperTiming::from_config(config);
        info!(
            "Stepper: {} revolution(s) per run, {}us per step",
            timing.revolutions, timing.step_delay_us
        );

        let shared = Arc::new(Shared::default());
        let mut worker = Worker {
            coils,
            delay,
            stop_condition,
            timing,
            clockwise_is_open: config.clockwise_is_open,
            phase: 0,
            shared: Arc::clone(&shared),
        };
        worker.release();

        let handle = spawn_task(WORKER_PRIORITY, WORKER_STACK_KB, "stepper\0", move || {
            worker.run()
        })
        .map_err(|e| {
            warn!("Stepper worker spawn failed: {}", e);
            MotorError::WorkerSpawn
        })?;

        Ok(Self {
            shared,
            worker: handle.thread().clone(),
            _handle: handle,
        })
    }

    fn request(&self, direction: DoorDirection, drive: DriveMode) -> bool {
        let next = match direction {
            DoorDirection::Open => STATE_OPENING,
            DoorDirection::Close => STATE_CLOSING,
        };
        if self
            .shared
            .state
            .compare_exchange(STATE_IDLE, next, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.shared
            .forced
            .store(drive == DriveMode::Forced, Ordering::Release);
        self.shared.stop.store(false, Ordering::Release);
        self.shared.op_pending.store(true, Ordering::Release);
        self.worker.unpark();
        true
    }

    /// Whether the worker is currently driving the coils.
    pub fn is_running(&self) -> bool {
        self.shared.state.load(Ordering::Acquire) != STATE_IDLE
    }
}

impl MotorPort for StepperMotor {
    fn request_open(&mut self, drive: DriveMode) -> bool {
        self.request(DoorDirection::Open, drive)
    }

    fn request_close(&mut self, drive: DriveMode) -> bool {
        self.request(DoorDirection::Close, drive)
    }

    fn operation_done(&mut self) -> bool {
        self.shared.state.load(Ordering::Acquire) == STATE_IDLE
            && self
                .shared
                .op_pending
                .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
    }

    fn stop(&mut self) {
        self.shared.op_pending.store(false, Ordering::Release);
        self.shared.stop.store(true, Ordering::Release);
    }
}

// ───────────────────────────────────────────────────────────────
// Worker
// ───────────────────────────────────────────────────────────────

struct Worker<P, D, S> {
    coils: [P; 4],
    delay: D,
    stop_condition: S,
    timing: StepperTiming,
    clockwise_is_open: bool,
    /// Index into [`HALF_STEP_SEQUENCE`]; kept across runs.
    phase: usize,
    shared: Arc<Shared>,
}

impl<P: OutputPin, D: DelayNs, S: StopCondition> Worker<P, D, S> {
    fn run(&mut self) {
        loop {
            thread::park();
            let direction = match self.shared.state.load(Ordering::Acquire) {
                STATE_OPENING => DoorDirection::Open,
                STATE_CLOSING => DoorDirection::Close,
                _ => continue,
            };
            let forced = self.shared.forced.load(Ordering::Acquire);

            if let Err(e) = self.drive(direction, forced) {
                warn!("Stepper {:?} aborted: {}", direction, e);
            }
            self.release();
            self.shared.state.store(STATE_IDLE, Ordering::Release);
        }
    }

    fn drive(&mut self, direction: DoorDirection, forced: bool) -> Result<(), MotorError> {
        let clockwise = (direction == DoorDirection::Open) == self.clockwise_is_open;
        info!(
            "Stepper: driving {} for {} revolution(s){}",
            if clockwise { "clockwise" } else { "counter-clockwise" },
            self.timing.revolutions,
            if forced { " (forced)" } else { "" }
        );

        for _ in 0..self.timing.revolutions {
            if self.shared.stop.load(Ordering::Acquire) {
                info!("Stepper: stop requested");
                return Ok(());
            }
            for _ in 0..STEPS_PER_REVOLUTION {
                if !forced && self.stop_condition.should_stop(direction) {
                    info!("Stepper: stop condition met");
                    return Ok(());
                }
                self.write_phase(HALF_STEP_SEQUENCE[self.phase])?;
                self.phase = if clockwise {
                    (self.phase + HALF_STEP_SEQUENCE.len() - 1) % HALF_STEP_SEQUENCE.len()
                } else {
                    (self.phase + 1) % HALF_STEP_SEQUENCE.len()
                };
                self.delay.delay_us(self.timing.step_delay_us);
            }
        }
        Ok(())
    }

    fn write_phase(&mut self, pattern: u8) -> Result<(), MotorError> {
        for (i, coil) in self.coils.iter_mut().enumerate() {
            let high = (pattern >> (3 - i)) & 1 != 0;
            let res = if high { coil.set_high() } else { coil.set_low() };
            res.map_err(|_| MotorError::CoilWrite)?;
        }
        Ok(())
    }

    /// De-energize all coils.
    fn release(&mut self) {
        if self.write_phase(0).is_err() {
            warn!("Stepper: failed to release coils");
        }
    }
}
