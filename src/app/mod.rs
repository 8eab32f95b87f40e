//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for the coop door: mode
//! orchestration, motor-operation lifecycle, scheduling and the recheck
//! loop.  All interaction with hardware happens through **port traits**
//! defined in [`ports`], keeping this layer fully testable without real
//! peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;

pub use service::DoorController;
