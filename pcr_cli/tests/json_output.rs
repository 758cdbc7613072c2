use assert_cmd::prelude::*;
use serde_json::Value;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn pcr_json(dir: &tempfile::TempDir) -> Command {
    let cfg = dir.path().join("cfg.toml");
    if !cfg.exists() {
        let toml = format!(
            "[acquisition]\ntick_ms = 3\nsettle_ms = 1\n\n[storage]\nresource_dir = \"{}\"\n",
            dir.path().join("resources").display()
        );
        fs::write(&cfg, toml).unwrap();
    }
    let mut cmd = Command::cargo_bin("pcr").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("PCR_TEST_SIM_INIT_FAIL")
        .env_remove("PCR_TEST_SIM_FAIL_EVERY")
        .arg("--config")
        .arg(&cfg)
        .arg("--json");
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let out = cmd.output().unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let line = String::from_utf8(out.stdout).unwrap();
    serde_json::from_str(line.trim()).expect("stdout is one JSON object")
}

#[test]
fn list_reports_current_and_names() {
    let dir = tempdir().unwrap();
    stdout_json(pcr_json(&dir).args(["create", "beta"]));
    stdout_json(pcr_json(&dir).args(["create", "alpha"]));

    let v = stdout_json(pcr_json(&dir).arg("list"));
    assert_eq!(v["current"], "alpha");
    let names: Vec<&str> = v["experiments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n.as_str().unwrap())
        .collect();
    assert_eq!(names, ["alpha", "beta", "untitled"]);
}

#[test]
fn run_report_has_stable_fields() {
    let dir = tempdir().unwrap();
    let v = stdout_json(pcr_json(&dir).arg("run"));
    assert_eq!(v["experiment"], "untitled");
    assert_eq!(v["samples"], 31);
    assert_eq!(v["skipped"], 0);
    assert_eq!(v["cycle_threshold"], 20);
    assert_eq!(v["interrupted"], false);
    assert!(v["reliability"].is_string());
}

#[test]
fn show_exposes_document_fields() {
    let dir = tempdir().unwrap();
    stdout_json(pcr_json(&dir).args(["set", "--coefficient", "2.50", "--multiplier", "4"]));

    let v = stdout_json(pcr_json(&dir).arg("show"));
    assert_eq!(v["concentration_coefficient"], "2.50");
    assert_eq!(v["concentration"], 10.0);
    assert_eq!(v["max_cycle"], 31);
    assert_eq!(v["light_sensor_data"].as_array().unwrap().len(), 31);
    // no curve yet
    assert!(v["efficiency"].is_null() || v["efficiency"].is_number());
}

#[test]
fn errors_are_structured_on_stderr() {
    let dir = tempdir().unwrap();
    let out = pcr_json(&dir).args(["select", "ghost"]).output().unwrap();
    assert_eq!(out.status.code(), Some(4));
    let err = String::from_utf8(out.stderr).unwrap();
    let line = err
        .lines()
        .rev()
        .find(|l| l.contains("\"reason\""))
        .expect("structured error line");
    let v: Value = serde_json::from_str(line).unwrap();
    assert_eq!(v["reason"], "NotFound");
    assert_eq!(v["exit_code"], 4);
}
