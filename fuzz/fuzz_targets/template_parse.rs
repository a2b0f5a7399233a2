#![no_main]

use blackprint_engine::{html, parse_expression};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        let _ = html::parse_document(source).to_html();
        let _ = parse_expression(source);
    }
});
