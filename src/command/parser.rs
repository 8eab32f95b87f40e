//! Command-line parser.
//!
//! Every command starts with the two-byte pattern `CC`; the third byte
//! selects the family.  Lengths below include the trailing newline.
//!
//! | line                           | min | command                  |
//! |--------------------------------|-----|--------------------------|
//! | `CC\n`                         |  3  | [`AppCommand::Ping`]     |
//! | `CCC<M\|N>\n`                  |  5  | [`AppCommand::SetMode`]  |
//! | `CCT<YYYY-MM-DDTHH:MM:SSZ>\n`  | 24  | [`AppCommand::SetTime`]  |
//! | `CCRT\n`                       |  5  | [`AppCommand::RequestTime`] |
//! | `CCM<P\|F><O\|C\|S>\n`         |  6  | [`AppCommand::Motor`]    |
//!
//! Parsing is pure: no logging, no side effects.  The controller logs
//! and drops whatever comes back as `Err`.

use chrono::NaiveDateTime;

use crate::app::commands::{AppCommand, ModeRequest, MotorAction};
use crate::error::CommandError;
use crate::fsm::context::DriveMode;

/// Leading bytes of every command and of every reply.
pub const PATTERN: &[u8; 2] = b"CC";

/// `strftime` layout of TIME payloads and replies (UTC-style ISO 8601).
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Byte length of a formatted timestamp.
pub const TIME_LEN: usize = 20;

const FAMILY_MODE: u8 = b'C';
const FAMILY_TIME: u8 = b'T';
const FAMILY_REQUEST: u8 = b'R';
const FAMILY_MOTOR: u8 = b'M';

const MIN_PING: usize = 3;
const MIN_MODE: usize = 5;
const MIN_TIME: usize = 3 + TIME_LEN + 1;
const MIN_REQUEST: usize = 5;
const MIN_MOTOR: usize = 6;

/// Parse one newline-terminated line into a command.
pub fn parse(line: &[u8]) -> Result<AppCommand, CommandError> {
    if line.last() != Some(&b'\n') {
        return Err(CommandError::Unterminated);
    }
    require(line, MIN_PING)?;
    if &line[..2] != PATTERN {
        return Err(CommandError::BadPattern);
    }
    if line.len() == MIN_PING {
        return Ok(AppCommand::Ping);
    }

    match line[2] {
        FAMILY_MODE => {
            require(line, MIN_MODE)?;
            match line[3] {
                b'M' => Ok(AppCommand::SetMode(ModeRequest::Manual)),
                b'N' => Ok(AppCommand::SetMode(ModeRequest::Normal)),
                other => Err(CommandError::InvalidArgument(other)),
            }
        }
        FAMILY_TIME => {
            require(line, MIN_TIME)?;
            parse_time(&line[3..3 + TIME_LEN]).map(AppCommand::SetTime)
        }
        FAMILY_REQUEST => {
            require(line, MIN_REQUEST)?;
            match line[3] {
                b'T' => Ok(AppCommand::RequestTime),
                other => Err(CommandError::InvalidArgument(other)),
            }
        }
        FAMILY_MOTOR => {
            require(line, MIN_MOTOR)?;
            let drive = match line[3] {
                b'P' => DriveMode::Protected,
                b'F' => DriveMode::Forced,
                other => return Err(CommandError::InvalidArgument(other)),
            };
            let action = match line[4] {
                b'O' => MotorAction::Open,
                b'C' => MotorAction::Close,
                b'S' => MotorAction::Stop,
                other => return Err(CommandError::InvalidArgument(other)),
            };
            Ok(AppCommand::Motor { action, drive })
        }
        other => Err(CommandError::UnknownCommand(other)),
    }
}

fn require(line: &[u8], min: usize) -> Result<(), CommandError> {
    if line.len() < min {
        Err(CommandError::TooShort {
            len: line.len(),
            min,
        })
    } else {
        Ok(())
    }
}

fn parse_time(raw: &[u8]) -> Result<NaiveDateTime, CommandError> {
    let text = core::str::from_utf8(raw).map_err(|_| CommandError::BadTimestamp)?;
    NaiveDateTime::parse_from_str(text, TIME_FORMAT).map_err(|_| CommandError::BadTimestamp)
}

/// Render the reply to `CCRT`: `CCRT<YYYY-MM-DDTHH:MM:SSZ>\n`.
pub fn format_time_reply(now: &NaiveDateTime) -> heapless::String<32> {
    use core::fmt::Write;

    let mut out = heapless::String::new();
    // 4 + 20 + 1 bytes always fit in 32.
    let _ = writeln!(out, "CCRT{}", now.format(TIME_FORMAT));
    out
}
