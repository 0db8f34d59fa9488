#![no_main]

use libfuzzer_sys::fuzz_target;
use crossmap::mappings::{table::CompositeTable, tiny, tsrg};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let intermediate = tiny::parse(text);
    let finals = tsrg::parse(text);
    let _ = CompositeTable::build(&intermediate, &finals);
});
