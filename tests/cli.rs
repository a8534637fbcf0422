use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

mod common;

#[test]
fn runs() {
    let mut cmd = Command::cargo_bin("flowlabel").unwrap();
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("flowlabel --help"));
}

#[test]
fn outputs_tool_name() {
    let mut cmd = Command::cargo_bin("flowlabel").unwrap();
    cmd.arg("-V");
    cmd.assert().success().stdout("flowlabel 0.1.0\n");
}

// Annotate subcommand tests

#[test]
fn annotate_writes_the_layout() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let (svg, png) = common::write_diagram(&temp.path().join("input"));
    let output = temp.path().join("out");

    let mut cmd = Command::cargo_bin("flowlabel").unwrap();
    cmd.arg("annotate")
        .arg("--svg")
        .arg(&svg)
        .arg("--png")
        .arg(&png)
        .arg("--output")
        .arg(&output)
        .args(["--stem", "Q64"]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Annotated Q64.png (400x200): 6 object(s)"));

    assert!(output.join("images/Q64.png").is_file());
    assert!(output.join("images_with_bboxes/Q64.png").is_file());
    let xml = fs::read_to_string(output.join("annotations/Q64.xml")).expect("read record");
    assert!(xml.contains("<filename>Q64.png</filename>"));
    assert_eq!(xml.matches("<name>text</name>").count(), 3);
    assert_eq!(xml.matches("<name>process</name>").count(), 2);
    assert_eq!(xml.matches("<name>arrow</name>").count(), 1);
}

#[test]
fn annotate_defaults_stem_to_svg_name() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let (svg, png) = common::write_diagram(temp.path());
    let output = temp.path().join("out");

    let mut cmd = Command::cargo_bin("flowlabel").unwrap();
    cmd.arg("annotate")
        .arg("--svg")
        .arg(&svg)
        .arg("--png")
        .arg(&png)
        .arg("--output")
        .arg(&output);
    cmd.assert().success();
    assert!(output.join("annotations/diagram.xml").is_file());
}

#[test]
fn annotate_json_report() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let (svg, png) = common::write_diagram(temp.path());

    let mut cmd = Command::cargo_bin("flowlabel").unwrap();
    cmd.arg("annotate")
        .arg("--svg")
        .arg(&svg)
        .arg("--png")
        .arg(&png)
        .arg("--output")
        .arg(temp.path().join("out"))
        .args(["--report", "json"]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"objects\": 6"))
        .stdout(predicates::str::contains("\"width\": 400"));
}

#[test]
fn annotate_missing_svg_fails() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let png = temp.path().join("diagram.png");
    common::write_png(&png, 10, 10);

    let mut cmd = Command::cargo_bin("flowlabel").unwrap();
    cmd.arg("annotate")
        .arg("--svg")
        .arg(temp.path().join("missing.svg"))
        .arg("--png")
        .arg(&png)
        .arg("--output")
        .arg(temp.path().join("out"));
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Error:"));
    assert!(!temp.path().join("out/images/missing.png").exists());
}

#[test]
fn annotate_svg_without_view_box_fails() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let svg = temp.path().join("broken.svg");
    let png = temp.path().join("broken.png");
    fs::write(&svg, r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#).expect("write svg");
    common::write_png(&png, 10, 10);

    let mut cmd = Command::cargo_bin("flowlabel").unwrap();
    cmd.arg("annotate")
        .arg("--svg")
        .arg(&svg)
        .arg("--png")
        .arg(&png)
        .arg("--output")
        .arg(temp.path().join("out"));
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("viewBox"));
    assert!(!temp.path().join("out/images/broken.png").exists());
}

// Generate subcommand tests

#[test]
fn generate_without_entities_fails() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let mut cmd = Command::cargo_bin("flowlabel").unwrap();
    cmd.arg("generate").arg("--output").arg(temp.path());
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("no entities given"));
}

#[test]
fn generate_rejects_non_numeric_depth() {
    let mut cmd = Command::cargo_bin("flowlabel").unwrap();
    cmd.args(["generate", "Q64", "--depth", "deep"]);
    cmd.assert().failure();
}

// Sync and inspect subcommand tests

#[test]
fn sync_isolates_unpaired_files() {
    let temp = tempfile::tempdir().expect("create temp dir");
    common::write_png(&temp.path().join("images/Q1-1.png"), 4, 4);
    common::write_png(&temp.path().join("images/Q2.png"), 4, 4);
    fs::create_dir_all(temp.path().join("annotations")).expect("create annotations");
    fs::write(temp.path().join("annotations/Q1.xml"), "<annotation/>").expect("write xml");
    fs::write(temp.path().join("annotations/Q3.xml"), "<annotation/>").expect("write xml");

    let mut cmd = Command::cargo_bin("flowlabel").unwrap();
    cmd.arg("sync").arg(temp.path());
    cmd.assert().success().stdout(predicates::str::contains(
        "1 pair(s), 1 image(s) and 1 annotation(s) isolated",
    ));

    assert!(temp.path().join("isolated/Q2.png").is_file());
    assert!(temp.path().join("isolated/Q3.xml").is_file());
    assert!(temp.path().join("images/Q1-1.png").is_file());
}

#[test]
fn inspect_counts_categories() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let (svg, png) = common::write_diagram(&temp.path().join("input"));
    let output = temp.path().join("out");

    let mut annotate = Command::cargo_bin("flowlabel").unwrap();
    annotate
        .arg("annotate")
        .arg("--svg")
        .arg(&svg)
        .arg("--png")
        .arg(&png)
        .arg("--output")
        .arg(&output);
    annotate.assert().success();

    let mut cmd = Command::cargo_bin("flowlabel").unwrap();
    cmd.arg("inspect").arg(&output);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains(
            "1 record(s), 6 object(s), 3 categories",
        ))
        .stdout(predicates::str::contains("text").and(predicates::str::contains("arrow")));
}

#[test]
fn inspect_json_output() {
    let temp = tempfile::tempdir().expect("create temp dir");
    fs::create_dir_all(temp.path().join("annotations")).expect("create annotations");

    let mut cmd = Command::cargo_bin("flowlabel").unwrap();
    cmd.arg("inspect").arg(temp.path()).args(["--output", "json"]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"records\": 0"));
}
