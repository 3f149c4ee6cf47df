//! End-to-end tests running the `ddf` binary

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const SCHEMAS: &str = r#"{
    "messages": [
        { "name": "Texture", "fields": [
            { "name": "path", "number": 1, "label": "required", "type": "string" }
        ] },
        { "name": "TextureSet", "fields": [
            { "name": "name", "number": 1, "label": "required", "type": "string" },
            { "name": "textures", "number": 2, "label": "repeated", "type": "Texture" }
        ] }
    ]
}"#;

const CONFIG: &str = r#"{
    "resourceTypes": [
        { "name": "Texture Set", "extension": "texture_set", "message": "TextureSet" }
    ]
}"#;

fn project(document: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("schemas.json"), SCHEMAS).unwrap();
    fs::write(dir.path().join("ddf.config.json"), CONFIG).unwrap();
    fs::write(dir.path().join("ui.texture_set"), document).unwrap();
    dir
}

fn ddf(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ddf"))
        .arg("--config-dir")
        .arg(dir)
        .args(args)
        .current_dir(dir)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

#[test]
fn test_show_prints_canonical_text() {
    let dir = project("textures{path:'a.png'} name:\"ui\"");
    let output = ddf(dir.path(), &["show", "ui.texture_set"]);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "name: \"ui\"\ntextures {\n  path: \"a.png\"\n}\n"
    );
}

#[test]
fn test_check_reports_missing_required_field() {
    let dir = project("textures { path: \"a.png\" }\n");
    let output = ddf(dir.path(), &["check", "ui.texture_set"]);

    assert!(!output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("name"));
}

#[test]
fn test_edit_saves_file() {
    let dir = project("name: \"ui\"\n");
    let output = ddf(
        dir.path(),
        &[
            "edit",
            "ui.texture_set",
            "--set",
            "name=hud",
            "--append",
            "textures={ path: \"b.png\" }",
        ],
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        fs::read_to_string(dir.path().join("ui.texture_set")).unwrap(),
        "name: \"hud\"\ntextures {\n  path: \"b.png\"\n}\n"
    );
}

#[test]
fn test_edit_dry_run_leaves_file_alone() {
    let dir = project("name: \"ui\"\n");
    let output = ddf(
        dir.path(),
        &["edit", "ui.texture_set", "--set", "name=hud", "--dry-run"],
    );

    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout).unwrap().ends_with("name: \"hud\"\n"));
    assert_eq!(
        fs::read_to_string(dir.path().join("ui.texture_set")).unwrap(),
        "name: \"ui\"\n"
    );
}

#[test]
fn test_parse_error_is_reported() {
    let dir = project("name: \"ui\" bogus: 1\n");
    let output = ddf(dir.path(), &["show", "ui.texture_set"]);

    assert!(!output.status.success());
    assert!(String::from_utf8(output.stderr).unwrap().contains("bogus"));
}

#[test]
fn test_edit_applies_flags_in_given_order() {
    let dir = project("name: \"ui\"\n");
    let output = ddf(
        dir.path(),
        &["edit", "ui.texture_set", "--clear", "name", "--set", "name=hud"],
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        fs::read_to_string(dir.path().join("ui.texture_set")).unwrap(),
        "name: \"hud\"\n"
    );
}
