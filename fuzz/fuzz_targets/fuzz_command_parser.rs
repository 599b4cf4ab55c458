//! Fuzz target: `Command::parse`
//!
//! Every input must either parse or produce a `ProtocolError` whose wire
//! rendering is itself valid JSON.
//!
//! cargo fuzz run fuzz_command_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use meshnode::app::commands::Command;
use meshnode::app::events::Response;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };
    match Command::parse(line) {
        Ok(cmd) => {
            let _ = cmd.type_name();
        }
        Err(e) => {
            let rendered = Response::error(&e).to_json().expect("error response encodes");
            let v: serde_json::Value =
                serde_json::from_str(&rendered).expect("error response is JSON");
            assert_eq!(v["Type"], "Error");
        }
    }
});
