//! Unit tests for the expansion state machine.

use anyhow::{Result, anyhow, ensure};
use serde_json::json;

use crate::error::ConfigError;
use crate::node::Node;

use super::Expansion;

fn mapper(name: &str) -> Option<String> {
    match name {
        "greeting" => Some("hello".to_owned()),
        "nested" => Some("${greeting} world".to_owned()),
        "empty" => Some(String::new()),
        _ => None,
    }
}

fn tree(value: serde_json::Value) -> Result<Node> {
    Node::from_value("fixture", &value).map_err(|error| anyhow!("decode failed: {error}"))
}

#[test]
fn substitutes_known_references() -> Result<()> {
    let pass = Expansion::new("test", mapper);
    let expanded = pass
        .apply(&tree(json!({"msg": "${greeting}!"}))?)
        .map_err(|error| anyhow!("{error}"))?;
    ensure!(
        expanded.to_value() == json!({"msg": "hello!"}),
        "unexpected result: {}",
        expanded.to_value()
    );
    Ok(())
}

#[test]
fn rescans_replacements_for_further_references() -> Result<()> {
    let pass = Expansion::new("test", mapper);
    let expanded = pass
        .apply(&tree(json!({"msg": "${nested}"}))?)
        .map_err(|error| anyhow!("{error}"))?;
    ensure!(
        expanded.to_value() == json!({"msg": "hello world"}),
        "nested reference not expanded: {}",
        expanded.to_value()
    );
    Ok(())
}

#[test]
fn unknown_references_stay_literal() -> Result<()> {
    let pass = Expansion::new("test", mapper);
    let expanded = pass
        .apply(&tree(json!({"msg": "${missing} stays"}))?)
        .map_err(|error| anyhow!("{error}"))?;
    ensure!(
        expanded.to_value() == json!({"msg": "${missing} stays"}),
        "unknown reference was altered"
    );
    Ok(())
}

#[test]
fn empty_replacements_stay_literal() -> Result<()> {
    let pass = Expansion::new("test", mapper);
    let expanded = pass
        .apply(&tree(json!({"msg": "${empty}"}))?)
        .map_err(|error| anyhow!("{error}"))?;
    ensure!(
        expanded.to_value() == json!({"msg": "${empty}"}),
        "empty replacement was substituted"
    );
    Ok(())
}

#[test]
fn expansion_without_references_is_identity() -> Result<()> {
    let pass = Expansion::new("test", mapper);
    let input = tree(json!({"a": "plain", "b": [1, true, null]}))?;
    let expanded = pass.apply(&input).map_err(|error| anyhow!("{error}"))?;
    ensure!(expanded == input, "no-op expansion changed the tree");
    Ok(())
}

#[test]
fn unterminated_references_are_left_alone() -> Result<()> {
    let pass = Expansion::new("test", mapper);
    let expanded = pass
        .apply(&tree(json!({"msg": "${greeting"}))?)
        .map_err(|error| anyhow!("{error}"))?;
    ensure!(
        expanded.to_value() == json!({"msg": "${greeting"}),
        "unterminated reference was altered"
    );
    Ok(())
}

#[test]
fn self_referential_mapping_trips_the_cycle_guard() -> Result<()> {
    let pass = Expansion::new("test", |name: &str| {
        (name == "A").then(|| "${A}".to_owned())
    })
    .with_substitution_limit(50);
    let error = pass
        .apply(&tree(json!({"loop": "${A}"}))?)
        .err()
        .ok_or_else(|| anyhow!("cycle guard did not trip"))?;
    ensure!(
        matches!(&*error, ConfigError::ExceededIterations { limit: 50, .. }),
        "unexpected error: {error}"
    );
    ensure!(
        error.to_string().contains("loop"),
        "offending path missing from: {error}"
    );
    Ok(())
}

#[test]
fn custom_delimiters_are_honoured() -> Result<()> {
    let pass = Expansion::new("test", mapper).with_delimiters("%", "%");
    let expanded = pass
        .apply(&tree(json!({"msg": "%greeting% there"}))?)
        .map_err(|error| anyhow!("{error}"))?;
    ensure!(
        expanded.to_value() == json!({"msg": "hello there"}),
        "custom delimiters ignored: {}",
        expanded.to_value()
    );
    Ok(())
}

#[test]
fn environment_pass_reads_process_variables() -> Result<()> {
    let _guard = test_helpers::env::set_var("CONFLUX_EXPAND_TEST", "resolved");
    let pass = Expansion::environment();
    let expanded = pass
        .apply(&tree(json!({"msg": "${CONFLUX_EXPAND_TEST}"}))?)
        .map_err(|error| anyhow!("{error}"))?;
    ensure!(
        expanded.to_value() == json!({"msg": "resolved"}),
        "environment variable not substituted"
    );
    Ok(())
}
