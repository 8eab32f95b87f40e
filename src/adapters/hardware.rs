//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the RTC, door switch, stepper and status LED, exposing them
//! through [`ClockPort`], [`DoorSwitchPort`], [`MotorPort`] and
//! [`IndicatorPort`] (and therefore [`DevicePorts`](crate::app::ports::DevicePorts)).
//! This is the only place the control loop touches actual hardware.
//! On non-espidf targets the underlying drivers use simulation stubs.

use chrono::NaiveDateTime;

use crate::app::ports::{BlinkConfig, ClockPort, DoorSwitchPort, IndicatorPort, MotorPort};
use crate::error::ClockError;
use crate::fsm::context::DriveMode;

/// Concrete adapter that combines all devices behind port traits.
pub struct HardwareAdapter<C, S, M, L> {
    clock: C,
    switch: S,
    motor: M,
    led: L,
}

impl<C, S, M, L> HardwareAdapter<C, S, M, L>
where
    C: ClockPort,
    S: DoorSwitchPort,
    M: MotorPort,
    L: IndicatorPort,
{
    pub fn new(clock: C, switch: S, motor: M, led: L) -> Self {
        Self {
            clock,
            switch,
            motor,
            led,
        }
    }

    /// Stop the motor and show the quiet default pattern.
    pub fn all_off(&mut self) {
        self.motor.stop();
        self.led.set_indicator(BlinkConfig::default());
    }
}

// ── ClockPort ─────────────────────────────────────────────────

impl<C: ClockPort, S, M, L> ClockPort for HardwareAdapter<C, S, M, L> {
    fn now(&mut self) -> Result<NaiveDateTime, ClockError> {
        self.clock.now()
    }

    fn set_time(&mut self, time: &NaiveDateTime) -> Result<(), ClockError> {
        self.clock.set_time(time)
    }
}

// ── DoorSwitchPort ────────────────────────────────────────────

impl<C, S: DoorSwitchPort, M, L> DoorSwitchPort for HardwareAdapter<C, S, M, L> {
    fn is_open(&mut self) -> bool {
        self.switch.is_open()
    }
}

// ── MotorPort ─────────────────────────────────────────────────

impl<C, S, M: MotorPort, L> MotorPort for HardwareAdapter<C, S, M, L> {
    fn request_open(&mut self, drive: DriveMode) -> bool {
        self.motor.request_open(drive)
    }

    fn request_close(&mut self, drive: DriveMode) -> bool {
        self.motor.request_close(drive)
    }

    fn operation_done(&mut self) -> bool {
        self.motor.operation_done()
    }

    fn stop(&mut self) {
        self.motor.stop();
    }
}

// ── IndicatorPort ─────────────────────────────────────────────

impl<C, S, M, L: IndicatorPort> IndicatorPort for HardwareAdapter<C, S, M, L> {
    fn set_indicator(&mut self, config: BlinkConfig) {
        self.led.set_indicator(config);
    }
}
