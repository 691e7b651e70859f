use super::*;

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

const HERO: &str = "00000000-0000-0000-0000-000000000001";

fn temp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time should be monotonic")
        .as_nanos();
    std::env::temp_dir().join(format!("battle-events-{}-{}", name, nanos))
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent should be created");
    }
    fs::write(path, content).expect("file should be written");
}

fn write_fixture(root: &Path) {
    write_file(
        &root.join("setup.json"),
        &format!(
            r#"{{
  "schemaVersion": "be-setup.v1",
  "members": [{{"id": "{HERO}", "name": "Hero", "stats": {{"maxHp": 20}}}}],
  "party": ["{HERO}"],
  "variables": {{"count": 0}}
}}"#
        ),
    );
    write_file(
        &root.join("pass.case.json"),
        &format!(
            r#"{{
  "schemaVersion": "be-tool-case.v1",
  "steps": [{{"kind": "frames", "count": 2}}],
  "expected": {{"party": ["{HERO}"], "variables": {{"count": 0}}}}
}}"#
        ),
    );
}

fn demo_dir() -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("demos")
        .to_string_lossy()
        .to_string()
}

#[test]
fn run_command_passes_a_matching_case() {
    let root = temp_path("run-ok");
    write_fixture(&root);
    let case = root.join("pass.case.json").to_string_lossy().to_string();
    let code = run_cli_from_args(["battle-events", "run", "--case", case.as_str()]);
    assert_eq!(code, 0);
}

#[test]
fn run_command_reports_missing_case() {
    let root = temp_path("run-missing");
    let case = root.join("missing.case.json").to_string_lossy().to_string();
    let code = run_cli_from_args(["battle-events", "run", "--case", case.as_str()]);
    assert_eq!(code, 1);
}

#[test]
fn check_command_fails_when_any_case_fails() {
    let root = temp_path("check");
    write_fixture(&root);
    let dir = root.to_string_lossy().to_string();
    assert_eq!(run_cli_from_args(["battle-events", "check", "--dir", dir.as_str()]), 0);

    write_file(
        &root.join("fail.case.json"),
        r#"{
  "schemaVersion": "be-tool-case.v1",
  "expected": {"variables": {"count": 9}}
}"#,
    );
    assert_eq!(run_cli_from_args(["battle-events", "check", "--dir", dir.as_str()]), 1);
}

#[test]
fn check_command_reports_empty_dir() {
    let root = temp_path("check-empty");
    fs::create_dir_all(&root).expect("root should be created");
    let dir = root.to_string_lossy().to_string();
    assert_eq!(run_cli_from_args(["battle-events", "check", "--dir", dir.as_str()]), 1);
}

#[test]
fn bundled_demo_cases_pass() {
    let dir = demo_dir();
    assert_eq!(run_cli_from_args(["battle-events", "check", "--dir", dir.as_str()]), 0);
}

#[test]
fn unknown_subcommand_returns_clap_exit_code() {
    assert_eq!(run_cli_from_args(["battle-events", "replay"]), 2);
}
