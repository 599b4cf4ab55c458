//! Fuzz target: `LineDecoder::push`
//!
//! Drives arbitrary byte sequences into the streaming line decoder and
//! asserts that it never panics, never yields a line over the limit or
//! containing a terminator, and recovers cleanly after a reset.
//!
//! cargo fuzz run fuzz_line_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use meshnode::rpc::codec::{LineDecoder, MAX_LINE_LEN};

fuzz_target!(|data: &[u8]| {
    let mut decoder = LineDecoder::new();

    for &b in data {
        if let Some(Ok(line)) = decoder.push(b) {
            assert!(line.len() <= MAX_LINE_LEN, "line exceeds MAX_LINE_LEN");
            assert!(!line.contains('\n'), "line carries its terminator");
            assert!(!line.trim().is_empty(), "blank line delivered");
        }
    }

    decoder.reset();
    for &b in b"{\"Type\":\"Get Status\"}\n" {
        if let Some(r) = decoder.push(b) {
            assert_eq!(r.as_deref(), Ok("{\"Type\":\"Get Status\"}"));
        }
    }
});
