//! Device drivers, hardware initialisation, and peripheral helpers.

pub mod blinker;
pub mod door_switch;
pub mod ds3231;
pub mod gpio;
pub mod hw_init;
pub mod status_led;
pub mod stepper;
pub mod task;
pub mod watchdog;
