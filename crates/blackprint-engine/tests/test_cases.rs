// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::fs;
use std::path::PathBuf;

use blackprint_engine::{evaluate, Template, Value};
use futures::executor::block_on;
use serde::Deserialize;

const BODY_PREFIX: &str = "<!DOCTYPE html>\n<html><head></head><body>";
const BODY_SUFFIX: &str = "</body></html>";

#[derive(Debug, Deserialize)]
struct TemplateCase {
    name: String,
    template: String,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    expected: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExpressionCase {
    expression: String,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    expected: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

fn load<T: for<'de> Deserialize<'de>>(file: &str) -> Vec<T> {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let root = manifest_dir
        .parent()
        .expect("workspace root missing")
        .parent()
        .expect("workspace root missing");
    let path = root.join("test-cases").join(file);
    let bytes = fs::read(&path).unwrap_or_else(|err| panic!("missing {}: {err}", path.display()));
    serde_json::from_slice(&bytes).unwrap_or_else(|err| panic!("invalid {file}: {err}"))
}

#[test]
fn template_cases() {
    let cases: Vec<TemplateCase> = load("blackprint-engine.json");
    assert!(!cases.is_empty());

    for case in cases {
        let template = Template::new(case.name.as_str(), case.template.as_str());
        let result = block_on(template.render(&Value::from(case.data.clone())));

        match (result, case.error.as_ref()) {
            (Ok(output), Some(expected_err)) => panic!(
                "{} expected error '{}' but rendered '{}'",
                case.name, expected_err, output
            ),
            (Err(err), Some(expected_err)) => {
                let msg = err.to_string();
                assert!(
                    msg.contains(expected_err),
                    "{} expected error containing '{}', got '{}'",
                    case.name,
                    expected_err,
                    msg
                );
            }
            (Err(err), None) => panic!("render {} failed: {}", case.name, err),
            (Ok(output), None) => {
                let body = output
                    .strip_prefix(BODY_PREFIX)
                    .and_then(|rest| rest.strip_suffix(BODY_SUFFIX))
                    .unwrap_or(&output);
                assert_eq!(
                    Some(body),
                    case.expected.as_deref(),
                    "{} rendered unexpected output",
                    case.name
                );
            }
        }
    }
}

#[test]
fn expression_cases() {
    let cases: Vec<ExpressionCase> = load("blackprint-expressions.json");
    assert!(!cases.is_empty());

    for case in cases {
        let result = evaluate(&case.expression, &Value::from(case.data.clone()));
        match (result, case.error.as_ref()) {
            (Ok(value), Some(expected_err)) => panic!(
                "`{}` expected error '{}' but got {:?}",
                case.expression, expected_err, value
            ),
            (Err(err), Some(expected_err)) => {
                let msg = err.to_string();
                assert!(
                    msg.contains(expected_err),
                    "`{}` expected error containing '{}', got '{}'",
                    case.expression,
                    expected_err,
                    msg
                );
            }
            (Err(err), None) => panic!("`{}` failed: {}", case.expression, err),
            (Ok(value), None) => {
                let expected = Value::from(case.expected.clone().unwrap_or_default());
                assert_eq!(value, expected, "`{}` evaluated unexpectedly", case.expression);
            }
        }
    }
}
