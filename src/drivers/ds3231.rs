//! DS3231 real-time clock over `embedded-hal` I²C.
//!
//! The timekeeping registers are BCD encoded:
//!
//! | reg  | content                                   |
//! |------|-------------------------------------------|
//! | 0x00 | seconds 00-59                             |
//! | 0x01 | minutes 00-59                             |
//! | 0x02 | hours; bit 6 = 12h mode, bit 5 = PM in 12h|
//! | 0x03 | day of week 1-7                           |
//! | 0x04 | date 01-31                                |
//! | 0x05 | month 01-12; bit 7 = century              |
//! | 0x06 | year 00-99                                |
//!
//! The clock is always written in 24h mode.  Reads accept either mode
//! in case another tool set the chip.  The century bit extends the
//! range to 2000-2199.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use embedded_hal::i2c::I2c;
use log::warn;

use crate::app::ports::ClockPort;
use crate::error::ClockError;

/// Fixed 7-bit bus address of the DS3231.
pub const DS3231_ADDR: u8 = 0x68;

const REG_SECONDS: u8 = 0x00;
const HOUR_12H: u8 = 0x40;
const HOUR_PM: u8 = 0x20;
const MONTH_CENTURY: u8 = 0x80;

#[inline]
fn bcd_to_bin(v: u8) -> u8 {
    (v >> 4) * 10 + (v & 0x0F)
}

#[inline]
fn bin_to_bcd(v: u8) -> u8 {
    ((v / 10) << 4) | (v % 10)
}

/// Decode the seven timekeeping registers.
pub fn decode(regs: &[u8; 7]) -> Result<NaiveDateTime, ClockError> {
    let sec = bcd_to_bin(regs[0] & 0x7F);
    let min = bcd_to_bin(regs[1] & 0x7F);
    let hour = if regs[2] & HOUR_12H != 0 {
        let h12 = bcd_to_bin(regs[2] & 0x1F) % 12;
        if regs[2] & HOUR_PM != 0 { h12 + 12 } else { h12 }
    } else {
        bcd_to_bin(regs[2] & 0x3F)
    };
    let date = bcd_to_bin(regs[4] & 0x3F);
    let month = bcd_to_bin(regs[5] & 0x1F);
    let century = if regs[5] & MONTH_CENTURY != 0 { 100 } else { 0 };
    let year = 2000 + century + i32::from(bcd_to_bin(regs[6]));

    NaiveDate::from_ymd_opt(year, u32::from(month), u32::from(date))
        .and_then(|d| d.and_hms_opt(u32::from(hour), u32::from(min), u32::from(sec)))
        .ok_or(ClockError::InvalidTime)
}

/// Encode a time into the seven timekeeping registers (24h mode).
pub fn encode(time: &NaiveDateTime) -> Result<[u8; 7], ClockError> {
    let offset = time.year() - 2000;
    if !(0..200).contains(&offset) {
        return Err(ClockError::OutOfRange);
    }
    let century = if offset >= 100 { MONTH_CENTURY } else { 0 };
    Ok([
        bin_to_bcd(time.second() as u8),
        bin_to_bcd(time.minute() as u8),
        bin_to_bcd(time.hour() as u8),
        time.weekday().number_from_monday() as u8,
        bin_to_bcd(time.day() as u8),
        bin_to_bcd(time.month() as u8) | century,
        bin_to_bcd((offset % 100) as u8),
    ])
}

/// DS3231 driver generic over the bus.
pub struct Ds3231<I> {
    i2c: I,
}

impl<I: I2c> Ds3231<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: I2c> ClockPort for Ds3231<I> {
    fn now(&mut self) -> Result<NaiveDateTime, ClockError> {
        let mut regs = [0u8; 7];
        self.i2c
            .write_read(DS3231_ADDR, &[REG_SECONDS], &mut regs)
            .map_err(|e| {
                warn!("DS3231 read failed: {:?}", e);
                ClockError::Bus
            })?;
        decode(&regs)
    }

    fn set_time(&mut self, time: &NaiveDateTime) -> Result<(), ClockError> {
        let regs = encode(time)?;
        let mut frame = [0u8; 8];
        frame[0] = REG_SECONDS;
        frame[1..].copy_from_slice(&regs);
        self.i2c.write(DS3231_ADDR, &frame).map_err(|e| {
            warn!("DS3231 write failed: {:?}", e);
            ClockError::Bus
        })
    }
}
