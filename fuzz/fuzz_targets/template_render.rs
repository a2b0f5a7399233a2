#![no_main]

use std::collections::BTreeMap;
use std::sync::Arc;

use blackprint_engine::{Template, Value};
use futures::executor::block_on;
use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;
use serde_json::json;

static DATA: Lazy<Value> = Lazy::new(|| {
    Value::from(json!({
        "title": "fuzz",
        "items": [1, "two", {"three": 3}, null, true],
        "user": {"name": "ada", "tags": ["a", "b"]},
        "html": "<b>{{title}}</b>",
    }))
});

fuzz_target!(|data: &[u8]| {
    let source = match std::str::from_utf8(data) {
        Ok(src) => src,
        Err(_) => return,
    };

    let mut imports = BTreeMap::new();
    imports.insert("self".to_string(), source.to_string());
    let template = Template::new("fuzz-template-render", source).with_resolver(Arc::new(imports));
    let _ = block_on(template.render(&DATA));
});
