//! File-group resolution through the filesystem boundary.

use anyhow::{Result, anyhow, ensure};
use conflux::{Compiler, ConfigError, RecordOrdering};
use serde_json::json;
use test_helpers::fixture::ConfigDir;

#[test]
fn group_files_merge_in_natural_name_order() -> Result<()> {
    let dir = ConfigDir::with_files(&[
        ("10-final.json", "{\"stage\": \"final\", \"ten\": true}"),
        ("2-middle.json", "{\"stage\": \"middle\"}"),
        ("1-base.json", "{\"stage\": \"base\", \"one\": true}"),
    ])?;

    let compiler = Compiler::builder()
        .with_ordering(RecordOrdering::Natural)
        .build();
    compiler.add_file_group(dir.root(), false);
    compiler.compile().map_err(|error| anyhow!("{error}"))?;

    ensure!(
        compiler
            .fetch("stage")
            .map_err(|error| anyhow!("{error}"))?
            .to_value()
            == json!("final"),
        "highest-numbered file did not merge last"
    );
    ensure!(
        compiler.fetch("one").is_ok() && compiler.fetch("ten").is_ok(),
        "earlier files' keys were lost"
    );
    Ok(())
}

#[test]
fn files_without_codecs_are_skipped() -> Result<()> {
    let dir = ConfigDir::with_files(&[
        ("app.json", "{\"a\": 1}"),
        ("notes.txt", "not configuration"),
    ])?;

    let compiler = Compiler::new();
    compiler.add_file_group(dir.root(), false);
    compiler.compile().map_err(|error| anyhow!("{error}"))?;

    let log = compiler.record_log().map_err(|error| anyhow!("{error}"))?;
    ensure!(log.len() == 1, "unexpected records: {log:?}");
    ensure!(
        log.iter().all(|name| name.ends_with("app.json")),
        "wrong record selected: {log:?}"
    );
    Ok(())
}

#[test]
fn recursive_groups_descend_into_subdirectories() -> Result<()> {
    let dir = ConfigDir::with_files(&[
        ("base.json", "{\"a\": 1}"),
        ("conf.d/extra.json", "{\"b\": 2}"),
    ])?;

    let compiler = Compiler::new();
    compiler.add_file_group(dir.root(), true);
    compiler.compile().map_err(|error| anyhow!("{error}"))?;
    ensure!(compiler.fetch("b").is_ok(), "nested file not merged");

    let flat = Compiler::new();
    flat.add_file_group(dir.root(), false);
    flat.compile().map_err(|error| anyhow!("{error}"))?;
    ensure!(
        flat.fetch("b").is_err(),
        "non-recursive group read a nested file"
    );
    Ok(())
}

#[cfg(all(feature = "toml", feature = "yaml"))]
#[test]
fn mixed_formats_merge_through_their_codecs() -> Result<()> {
    let dir = ConfigDir::with_files(&[
        ("1-defaults.toml", "[server]\nport = 80\n"),
        ("2-site.yaml", "server:\n  port: 8080\n  tls: true\n"),
        ("3-local.json", "{\"server\": {\"name\": \"edge\"}}"),
    ])?;

    let compiler = Compiler::builder()
        .with_ordering(RecordOrdering::Natural)
        .build();
    compiler.add_file_group(dir.root(), false);
    compiler.compile().map_err(|error| anyhow!("{error}"))?;

    ensure!(
        compiler
            .fetch("server")
            .map_err(|error| anyhow!("{error}"))?
            .to_value()
            == json!({"port": 8080, "tls": true, "name": "edge"}),
        "cross-format merge wrong"
    );
    Ok(())
}

#[test]
fn malformed_files_abort_with_an_attributed_decode_error() -> Result<()> {
    let dir = ConfigDir::with_files(&[("bad.json", "{\n  \"a\": nope\n}")])?;

    let compiler = Compiler::new();
    compiler.add_file_group(dir.root(), false);
    let error = compiler
        .compile()
        .err()
        .ok_or_else(|| anyhow!("malformed file compiled"))?;
    ensure!(
        matches!(
            &*error,
            ConfigError::Compile { cause, .. }
                if matches!(&**cause, ConfigError::Decode { line: Some(2), .. })
        ),
        "position missing: {error}"
    );
    ensure!(
        error.to_string().contains("bad.json"),
        "source attribution missing: {error}"
    );
    Ok(())
}

#[test]
fn missing_explicit_files_fail_the_gather_stage() -> Result<()> {
    let compiler = Compiler::new();
    compiler.add_file("definitely/not/here.json");
    let error = compiler
        .compile()
        .err()
        .ok_or_else(|| anyhow!("missing file compiled"))?;
    ensure!(
        matches!(
            &*error,
            ConfigError::Compile { stage: conflux::CompileStage::Gather, .. }
        ),
        "unexpected stage: {error}"
    );
    Ok(())
}

#[test]
fn provenance_names_the_contributing_file() -> Result<()> {
    let dir = ConfigDir::with_files(&[("app.json", "{\"a\": 1}")])?;
    let compiler = Compiler::new();
    compiler.add_file(dir.path("app.json"));
    compiler.compile().map_err(|error| anyhow!("{error}"))?;
    let node = compiler.fetch("a").map_err(|error| anyhow!("{error}"))?;
    ensure!(
        node.provenance()
            .iter()
            .any(|origin| origin.source.ends_with("app.json")),
        "file name missing from provenance: {:?}",
        node.provenance()
    );
    Ok(())
}
