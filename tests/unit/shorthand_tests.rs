//! Unit tests for scalar shorthand parsing.

use proman::resolver::{parse_literal, parse_shorthand, ARGS_KEY};
use serde_json::json;

// ── parse_literal ────────────────────────────────────────

#[test]
fn booleans_accept_both_capitalizations() {
    assert_eq!(parse_literal("true"), json!(true));
    assert_eq!(parse_literal("True"), json!(true));
    assert_eq!(parse_literal("false"), json!(false));
    assert_eq!(parse_literal("False"), json!(false));
}

#[test]
fn numbers_are_typed() {
    assert_eq!(parse_literal("42"), json!(42));
    assert_eq!(parse_literal("-7"), json!(-7));
    assert_eq!(parse_literal("1.5"), json!(1.5));
}

#[test]
fn quoted_strings_lose_their_quotes() {
    assert_eq!(parse_literal("'hello'"), json!("hello"));
    assert_eq!(parse_literal("\"hello world\""), json!("hello world"));
}

#[test]
fn uninterpretable_values_stay_raw() {
    assert_eq!(parse_literal("/a/b.py"), json!("/a/b.py"));
    assert_eq!(parse_literal("TRUE"), json!("TRUE"));
    assert_eq!(parse_literal("'unbalanced"), json!("'unbalanced"));
}

// ── parse_shorthand ──────────────────────────────────────

#[test]
fn key_value_tokens_become_entries() {
    let config = parse_shorthand("target=/a/b.py flag=true");
    assert_eq!(config.get("target"), Some(&json!("/a/b.py")));
    assert_eq!(config.get("flag"), Some(&json!(true)));
    assert!(!config.contains_key(ARGS_KEY));
}

#[test]
fn positional_tokens_collect_in_order() {
    let config = parse_shorthand("source foo.bat");
    assert_eq!(config.get(ARGS_KEY), Some(&json!(["source", "foo.bat"])));
}

#[test]
fn mixed_tokens_split_between_args_and_entries() {
    let config = parse_shorthand("run port=9000 --verbose");
    assert_eq!(config.get("port"), Some(&json!(9000)));
    assert_eq!(config.get(ARGS_KEY), Some(&json!(["run", "--verbose"])));
}

#[test]
fn quotes_group_whitespace_into_one_value() {
    let config = parse_shorthand("command='echo hi there' active=false");
    assert_eq!(config.get("command"), Some(&json!("echo hi there")));
    assert_eq!(config.get("active"), Some(&json!(false)));
}

#[test]
fn value_may_contain_equals_sign() {
    let config = parse_shorthand("env=A=1");
    assert_eq!(config.get("env"), Some(&json!("A=1")));
}

#[test]
fn later_duplicate_keys_win() {
    let config = parse_shorthand("port=1 port=2");
    assert_eq!(config.get("port"), Some(&json!(2)));
}

#[test]
fn blank_shorthand_is_empty() {
    assert!(parse_shorthand("   ").is_empty());
}
