//! Fuzz target: `LineDecoder::feed`
//!
//! Drives arbitrary byte sequences into the serial line framer and
//! asserts that every yielded line is newline-terminated, fits the
//! buffer, and contains no interior newline.
//!
//! cargo fuzz run fuzz_line_decoder

#![no_main]

use coopdoor::command::{LineDecoder, MAX_LINE_LEN};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut decoder = LineDecoder::new();

    decoder.feed(data, |line| {
        assert!(line.len() <= MAX_LINE_LEN, "line exceeds MAX_LINE_LEN");
        assert_eq!(line.last(), Some(&b'\n'), "line not terminated");
        assert!(
            !line[..line.len() - 1].contains(&b'\n'),
            "interior newline"
        );
    });
    assert!(decoder.pending() <= MAX_LINE_LEN);

    // After a reset the decoder must accept bytes cleanly again.
    decoder.reset();
    assert_eq!(decoder.pending(), 0);
    decoder.feed(data, |_| {});
});
