//! Door-position switch.
//!
//! A reed or micro switch on an input pin with pull-up.  The raw level
//! reads HIGH when the door is open; `invert_door_switch` flips that for
//! boards wired the other way round.  A pin read error counts as "open"
//! so the recheck loop keeps trying to close the door.

use embedded_hal::digital::InputPin;
use log::warn;

use crate::app::ports::DoorSwitchPort;

pub struct DoorSwitch<P: InputPin> {
    pin: P,
    invert: bool,
}

impl<P: InputPin> DoorSwitch<P> {
    pub fn new(pin: P, invert: bool) -> Self {
        Self { pin, invert }
    }

    /// Raw electrical level, before inversion.
    pub fn raw_high(&mut self) -> Option<bool> {
        match self.pin.is_high() {
            Ok(level) => Some(level),
            Err(e) => {
                warn!("Door switch read failed: {:?}", e);
                None
            }
        }
    }
}

impl<P: InputPin> DoorSwitchPort for DoorSwitch<P> {
    fn is_open(&mut self) -> bool {
        match self.raw_high() {
            Some(level) => level != self.invert,
            None => true,
        }
    }
}
