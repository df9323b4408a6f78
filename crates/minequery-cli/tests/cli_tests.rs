//! End-to-end tests for the `minequery` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::{tempdir, TempDir};

const MODEL: &str = r#"{
  "name": "genomic",
  "classes": [
    {"name": "Gene", "fields": [
      {"name": "symbol", "kind": "attribute", "type": "string"},
      {"name": "length", "kind": "attribute", "type": "integer"},
      {"name": "organism", "kind": "reference", "referenced_type": "Organism"}
    ]},
    {"name": "Organism", "fields": [
      {"name": "name", "kind": "attribute", "type": "string"}
    ]}
  ]
}"#;

const TEMPLATE: &str = r#"<template name="long_genes" title="Genes with long length" important="true" keywords="length" edited="false">
  <query model="genomic">
    <view path="Gene.symbol"/>
    <view path="Gene.length"/>
    <node path="Gene.length">
      <constraint op="&gt;" editable="true" code="A">
        <value type="integer" value="5000"/>
      </constraint>
    </node>
    <node path="Gene.organism.name">
      <constraint op="=" editable="false" code="B">
        <value type="string" value="H. sapiens"/>
      </constraint>
    </node>
  </query>
</template>
"#;

struct Fixture {
    dir: TempDir,
    model: PathBuf,
    template: PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempdir().unwrap();
    let model = dir.path().join("model.json");
    let template = dir.path().join("long_genes.xml");
    std::fs::write(&model, MODEL).unwrap();
    std::fs::write(&template, TEMPLATE).unwrap();
    Fixture {
        dir,
        model,
        template,
    }
}

fn run(args: &[&str], model: Option<&Path>) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_minequery"));
    cmd.env("NO_COLOR", "1").env_remove("MINEQUERY_LOG");
    match model {
        Some(path) => cmd.env("MINEQUERY_MODEL", path),
        None => cmd.env_remove("MINEQUERY_MODEL"),
    };
    cmd.args(args).output().expect("run minequery")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn inspect_lists_editable_constraints() {
    let f = fixture();
    let output = run(&["inspect", f.template.to_str().unwrap()], Some(&f.model));
    assert!(output.status.success(), "{output:?}");
    let text = stdout(&output);
    assert!(text.contains("long_genes"), "{text}");
    assert!(text.contains("Genes with long length"), "{text}");
    assert!(text.contains("1. Gene.length > 5000 (editable)"), "{text}");
    assert!(!text.contains("2. "), "{text}");
}

#[test]
fn strip_writes_template_without_editable_constraints() {
    let f = fixture();
    let out = f.dir.path().join("stripped.xml");
    let output = run(
        &[
            "--model",
            f.model.to_str().unwrap(),
            "strip",
            f.template.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ],
        None,
    );
    assert!(output.status.success(), "{output:?}");
    let xml = std::fs::read_to_string(&out).unwrap();
    assert!(!xml.contains("editable=\"true\""), "{xml}");
    assert!(xml.contains("H. sapiens"), "{xml}");
    assert!(xml.contains("path=\"Gene.length\""), "{xml}");
}

#[test]
fn summarise_reports_complete_and_oversized_nodes() {
    let f = fixture();
    let rows = f.dir.path().join("rows.json");
    std::fs::write(&rows, r#"{"Gene.length": [[5200], [7100], [9050]]}"#).unwrap();
    let output = run(
        &[
            "summarise",
            f.template.to_str().unwrap(),
            "--rows",
            rows.to_str().unwrap(),
        ],
        Some(&f.model),
    );
    assert!(output.status.success(), "{output:?}");
    let text = stdout(&output);
    assert!(text.contains("Gene.length: 3 value(s): 5200, 7100, 9050"), "{text}");
    assert!(text.contains("summarised: true"), "{text}");

    let many: Vec<String> = (0..25).map(|i| format!("[{i}]")).collect();
    std::fs::write(&rows, format!(r#"{{"Gene.length": [{}]}}"#, many.join(","))).unwrap();
    let output = run(
        &[
            "summarise",
            f.template.to_str().unwrap(),
            "--rows",
            rows.to_str().unwrap(),
        ],
        Some(&f.model),
    );
    assert!(output.status.success(), "{output:?}");
    let text = stdout(&output);
    assert!(text.contains("Gene.length: too many values"), "{text}");
    assert!(text.contains("summarised: false"), "{text}");
}

#[test]
fn validate_rejects_unnamed_templates() {
    let f = fixture();
    let output = run(&["validate", f.template.to_str().unwrap()], Some(&f.model));
    assert!(output.status.success(), "{output:?}");

    let unnamed = f.dir.path().join("unnamed.xml");
    std::fs::write(&unnamed, TEMPLATE.replace("name=\"long_genes\" ", "")).unwrap();
    let output = run(&["validate", unnamed.to_str().unwrap()], Some(&f.model));
    assert!(!output.status.success());
}

#[test]
fn missing_model_is_reported() {
    let f = fixture();
    let output = run(&["inspect", f.template.to_str().unwrap()], None);
    assert!(!output.status.success());
    let err = String::from_utf8_lossy(&output.stderr);
    assert!(err.contains("MINEQUERY_MODEL"), "{err}");
}
