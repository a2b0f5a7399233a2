#![no_main]

use blackprint_markup::{default_dictionary, markup_to_html};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = markup_to_html(text, default_dictionary());
    }
});
