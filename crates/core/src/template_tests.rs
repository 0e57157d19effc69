use super::*;
use serde_json::json;

fn map(pairs: &[(&str, Value)]) -> serde_json::Map<String, Value> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[test]
fn replaces_known_identifier() {
    let data = map(&[("name", json!("world"))]);
    assert_eq!(render("hello {{name}}", &data), "hello world");
}

#[test]
fn leaves_unknown_identifier_literal() {
    let data = map(&[]);
    assert_eq!(render("hello {{name}}", &data), "hello {{name}}");
}

#[test]
fn prints_non_string_values_naturally() {
    let data = map(&[("count", json!(42)), ("flag", json!(true))]);
    assert_eq!(render("{{count}} {{flag}}", &data), "42 true");
}

#[test]
fn sanitizes_interpolated_values() {
    let mut long = "a\x00b```c".to_string();
    long.push_str(&"x".repeat(2000));
    let data = map(&[("name", json!(long))]);
    let out = render("got {{name}}", &data);
    assert!(!out.contains('\0'));
    assert!(!out.contains("```"));
    assert!(out.len() <= "got ".len() + 1024);
}

#[test]
fn replaces_multiple_occurrences() {
    let data = map(&[("x", json!("1"))]);
    assert_eq!(render("{{x}}-{{x}}", &data), "1-1");
}
