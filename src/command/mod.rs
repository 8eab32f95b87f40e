//! Serial command channel: line framing, parsing, byte transports.
//!
//! ```text
//! UART bytes ──▶ LineDecoder ──▶ CommandLine ──▶ parser::parse ──▶ AppCommand
//! ```

pub mod codec;
pub mod parser;
pub mod transport;

pub use codec::{CommandLine, LineDecoder, MAX_LINE_LEN};
pub use parser::{format_time_reply, parse};
pub use transport::Transport;
