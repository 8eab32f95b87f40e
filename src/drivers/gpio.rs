//! Raw GPIO pin exposed through the `embedded-hal` digital traits.
//!
//! The stepper and door-switch drivers are generic over
//! [`OutputPin`]/[`InputPin`]; on the board they are handed a
//! [`GpioPin`] that forwards to the pins configured by
//! [`hw_init`](super::hw_init).  Host builds hit the simulated level
//! bitmask instead.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use super::hw_init;

/// A GPIO configured by `hw_init`.  Direction is fixed at init time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioPin {
    num: i32,
}

impl GpioPin {
    pub const fn new(num: i32) -> Self {
        Self { num }
    }

    pub const fn num(&self) -> i32 {
        self.num
    }
}

impl ErrorType for GpioPin {
    type Error = Infallible;
}

impl OutputPin for GpioPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.num, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        hw_init::gpio_write(self.num, true);
        Ok(())
    }
}

impl InputPin for GpioPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(hw_init::gpio_read(self.num))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!hw_init::gpio_read(self.num))
    }
}
