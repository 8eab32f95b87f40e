//! Newline-delimited line codec.
//!
//! Wire format:
//! ```text
//! ┌──────────────────────────────┬──────┐
//! │ ASCII command (≤ 63 bytes)   │ '\n' │
//! └──────────────────────────────┴──────┘
//! ```
//!
//! The decoder accumulates incoming bytes and yields complete lines,
//! newline included.  A single `Transport::read` may return part of a
//! line or several lines at once.  Bytes after the last newline stay
//! buffered until the terminator arrives, so unterminated input never
//! reaches the parser.  Over-long lines are discarded up to the next
//! newline.

use heapless::Vec;
use log::warn;

/// Maximum line length including the terminating newline.
pub const MAX_LINE_LEN: usize = 64;

/// One complete command line as received (terminator included).
pub type CommandLine = Vec<u8, MAX_LINE_LEN>;

/// Streaming line decoder.
pub struct LineDecoder {
    buf: CommandLine,
    /// Set after an overflow; bytes are dropped until the next newline.
    discarding: bool,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            discarding: false,
        }
    }

    /// Push one byte.  Returns a line when `byte` completes one.
    pub fn push(&mut self, byte: u8) -> Option<CommandLine> {
        if self.discarding {
            if byte == b'\n' {
                self.discarding = false;
            }
            return None;
        }

        if self.buf.push(byte).is_err() {
            warn!("command line exceeds {} bytes, discarding", MAX_LINE_LEN);
            self.buf.clear();
            self.discarding = byte != b'\n';
            return None;
        }

        if byte == b'\n' {
            let line = core::mem::take(&mut self.buf);
            return Some(line);
        }
        None
    }

    /// Feed a chunk of bytes, calling `on_line` for every completed line.
    pub fn feed(&mut self, data: &[u8], mut on_line: impl FnMut(CommandLine)) {
        for &byte in data {
            if let Some(line) = self.push(byte) {
                on_line(line);
            }
        }
    }

    /// Number of bytes buffered towards the next line.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Reset decoder state (e.g. after a UART error).
    pub fn reset(&mut self) {
        self.buf.clear();
        self.discarding = false;
    }
}
