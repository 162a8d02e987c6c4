//! Variable expansion behaviour across a full compile.

use anyhow::{Result, anyhow, ensure};
use conflux::{Compiler, ConfigError, Expansion};
use serde_json::json;

#[test]
fn final_pass_expands_the_complete_tree() -> Result<()> {
    let compiler = Compiler::builder()
        .add_expansion(Expansion::new("names", |name: &str| {
            (name == "region").then(|| "eu-west".to_owned())
        }))
        .build();
    compiler.add_value("base", |_| Ok(json!({"bucket": "logs-${region}"})));
    compiler.compile().map_err(|error| anyhow!("{error}"))?;
    ensure!(
        compiler
            .fetch("bucket")
            .map_err(|error| anyhow!("{error}"))?
            .to_value()
            == json!("logs-eu-west"),
        "reference not expanded in final pass"
    );
    Ok(())
}

#[test]
fn passes_run_in_registration_order() -> Result<()> {
    let compiler = Compiler::builder()
        .add_expansion(Expansion::new("first", |name: &str| {
            (name == "a").then(|| "${b}".to_owned())
        }))
        .add_expansion(Expansion::new("second", |name: &str| {
            (name == "b").then(|| "resolved".to_owned())
        }))
        .build();
    compiler.add_value("base", |_| Ok(json!({"v": "${a}"})));
    compiler.compile().map_err(|error| anyhow!("{error}"))?;
    ensure!(
        compiler
            .fetch("v")
            .map_err(|error| anyhow!("{error}"))?
            .to_value()
            == json!("resolved"),
        "second pass did not see the first pass's output"
    );
    Ok(())
}

#[test]
fn environment_pass_resolves_process_variables() -> Result<()> {
    let _guard = test_helpers::env::set_var("CONFLUX_IT_REGION", "ap-south");
    let compiler = Compiler::builder()
        .add_expansion(Expansion::environment())
        .build();
    compiler.add_value("base", |_| Ok(json!({"region": "${CONFLUX_IT_REGION}"})));
    compiler.compile().map_err(|error| anyhow!("{error}"))?;
    ensure!(
        compiler
            .fetch("region")
            .map_err(|error| anyhow!("{error}"))?
            .to_value()
            == json!("ap-south"),
        "environment variable not expanded"
    );
    Ok(())
}

#[test]
fn expanding_an_already_expanded_tree_is_a_no_op() -> Result<()> {
    let pass = Expansion::new("names", |name: &str| {
        (name == "region").then(|| "eu-west".to_owned())
    });
    let compiler = Compiler::builder().add_expansion(pass.clone()).build();
    compiler.add_value("base", |_| Ok(json!({"bucket": "logs-${region}"})));
    compiler.compile().map_err(|error| anyhow!("{error}"))?;
    let tree = compiler.tree().map_err(|error| anyhow!("{error}"))?;
    let again = pass.apply(&tree).map_err(|error| anyhow!("{error}"))?;
    ensure!(again == tree, "idempotence violated");
    Ok(())
}

#[test]
fn cyclic_mappings_fail_the_compile_with_the_guard_error() -> Result<()> {
    let compiler = Compiler::builder()
        .add_expansion(
            Expansion::new("cycle", |name: &str| (name == "A").then(|| "${A}".to_owned()))
                .with_substitution_limit(100),
        )
        .build();
    compiler.add_value("base", |_| Ok(json!({"v": "${A}"})));
    let error = compiler
        .compile()
        .err()
        .ok_or_else(|| anyhow!("cyclic expansion compiled"))?;
    ensure!(
        matches!(
            &*error,
            ConfigError::Compile { cause, .. }
                if matches!(&**cause, ConfigError::ExceededIterations { limit: 100, .. })
        ),
        "unexpected error: {error}"
    );
    ensure!(!compiler.is_compiled(), "state published despite guard trip");
    Ok(())
}
