// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use blackprint_engine::{Error, Template, Value};
use futures::executor::block_on;
use serde_json::json;
use tempfile::tempdir;

#[test]
fn loads_template_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("post.bp.html");
    fs::write(&path, "<article><h2>{{post.title}}</h2></article>").unwrap();

    let template = Template::from_file(&path).unwrap();
    assert_eq!(template.name(), "post");
    assert_eq!(template.source(), "<article><h2>{{post.title}}</h2></article>");

    let html = block_on(template.render(&Value::from(json!({"post": {"title": "Hello"}})))).unwrap();
    assert!(html.ends_with("<body><article><h2>Hello</h2></article></body></html>"));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = Template::from_file(dir.path().join("absent.bp.html")).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn concurrent_renders_are_independent() {
    let mut imports = BTreeMap::new();
    imports.insert("item".to_string(), "<li>{{i}}</li>".to_string());
    let template = Template::new(
        "list",
        r#"<ul><for! var="i" of="n"><ref! import="item"/></for!></ul>"#,
    )
    .with_resolver(Arc::new(imports));

    let (a, b) = block_on(futures::future::join(
        template.render(&Value::from(json!({"n": 2}))),
        template.render(&Value::from(json!({"n": 3}))),
    ));
    assert!(a.unwrap().contains("<ul><li>0</li><li>1</li></ul>"));
    assert!(b.unwrap().contains("<ul><li>0</li><li>1</li><li>2</li></ul>"));
}

#[test]
fn errors_inside_imports_propagate() {
    let mut imports = BTreeMap::new();
    imports.insert("broken".to_string(), "{{1 +}}".to_string());
    let template =
        Template::new("page", r#"<ref! import="broken"/>"#).with_resolver(Arc::new(imports));
    let err = block_on(template.render(&Value::Null)).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
}
