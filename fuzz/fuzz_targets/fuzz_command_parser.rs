//! Fuzz target: `command::parse`
//!
//! Every framed line goes through the parser.  It must never panic, and
//! anything it accepts must carry the command pattern.
//!
//! cargo fuzz run fuzz_command_parser

#![no_main]

use coopdoor::command::{LineDecoder, parse};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Raw input, framed or not.
    let _ = parse(data);

    LineDecoder::new().feed(data, |line| {
        if parse(&line).is_ok() {
            assert!(line.starts_with(b"CC"), "accepted line without pattern");
        }
    });
});
