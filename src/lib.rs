//! Coop door controller library.
//!
//! Exposes the pure-logic modules for integration testing and host-side
//! inspection.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod command;
pub mod config;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod recheck;
pub mod schedule;

// Hardware-facing layers.  On host targets the drivers fall back to
// in-memory simulation so the crate builds and tests without a board.
pub mod adapters;
pub mod drivers;
