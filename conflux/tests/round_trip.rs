//! Single-source round trips: decode, merge into empty, fetch back.

use anyhow::{Result, anyhow, ensure};
use conflux::{Compiler, EncodeOptions, Node, merge};
use serde_json::json;

#[test]
fn a_lone_source_survives_the_pipeline_unchanged() -> Result<()> {
    let original = json!({
        "name": "edge",
        "port": 8080,
        "ratio": 0.75,
        "tls": true,
        "nothing": null,
        "hosts": ["a", "b", "c"],
        "limits": {"rps": 100, "burst": 250}
    });
    let compiler = Compiler::new();
    let seeded = original.clone();
    compiler.add_value("solo", move |_| Ok(seeded.clone()));
    compiler.compile().map_err(|error| anyhow!("{error}"))?;
    let root = compiler.fetch("").map_err(|error| anyhow!("{error}"))?;
    ensure!(
        root.to_value() == original,
        "round trip altered values: {}",
        root.to_value()
    );
    Ok(())
}

#[test]
fn directive_bearing_keys_come_back_clean() -> Result<()> {
    let decoded = Node::from_value("solo", &json!({"b((replace))": 9, "plain": 1}))
        .map_err(|error| anyhow!("{error}"))?;
    let merged = merge(&Node::empty(), &decoded).map_err(|error| anyhow!("{error}"))?;
    ensure!(
        merged.to_value() == json!({"b": 9, "plain": 1}),
        "directive text leaked into keys: {}",
        merged.to_value()
    );
    Ok(())
}

#[test]
fn every_node_of_a_compiled_tree_has_provenance() -> Result<()> {
    fn check(node: &Node) -> Result<()> {
        ensure!(
            !node.provenance().is_empty(),
            "node without provenance found"
        );
        if let Some(children) = node.as_map() {
            for child in children.values() {
                check(child)?;
            }
        }
        if let Some(children) = node.as_array() {
            for child in children {
                check(child)?;
            }
        }
        Ok(())
    }

    let compiler = Compiler::new();
    compiler.add_value("base", |_| Ok(json!({"a": {"b": [1, {"c": 2}]}})));
    compiler.compile().map_err(|error| anyhow!("{error}"))?;
    check(&compiler.tree().map_err(|error| anyhow!("{error}"))?)
}

#[test]
fn encoded_output_reparses_to_the_same_tree() -> Result<()> {
    let compiler = Compiler::new();
    compiler.add_value("base", |_| Ok(json!({"a": [1, 2], "b": {"c": "x"}})));
    compiler.compile().map_err(|error| anyhow!("{error}"))?;
    let bytes = compiler
        .encode("json", &EncodeOptions::default())
        .map_err(|error| anyhow!("{error}"))?;
    let reparsed: serde_json::Value = serde_json::from_slice(&bytes)?;
    ensure!(
        reparsed
            == compiler
                .tree()
                .map_err(|error| anyhow!("{error}"))?
                .to_value(),
        "encoded bytes do not reparse to the tree"
    );
    Ok(())
}

#[test]
fn redacted_output_masks_secrets_end_to_end() -> Result<()> {
    let compiler = Compiler::new();
    compiler.add_value("base", |_| Ok(json!({"token((secret))": "t0p", "plain": 1})));
    compiler.compile().map_err(|error| anyhow!("{error}"))?;
    let bytes = compiler
        .encode(
            "json",
            &EncodeOptions {
                redact_secrets: true,
            },
        )
        .map_err(|error| anyhow!("{error}"))?;
    let text = String::from_utf8(bytes)?;
    ensure!(!text.contains("t0p"), "secret leaked: {text}");
    ensure!(text.contains(conflux::REDACTED), "mask missing: {text}");
    Ok(())
}
