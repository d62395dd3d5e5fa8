#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn percept() -> Command {
    Command::cargo_bin("percept").unwrap()
}

const EXPORT: &str = r#"{
    "DiagnosticData": {
        "LFPTrendLogs": {
            "HemisphereLocationDef.Left": {
                "2024-01-01T00:00:00Z": [
                    { "DateTime": "2024-01-01T00:00:00Z", "LFP": 1, "AmplitudeInMilliAmps": 2.0 },
                    { "DateTime": "2024-01-01T01:00:00Z", "LFP": 2, "AmplitudeInMilliAmps": 2.0 },
                    { "DateTime": "2024-01-01T05:00:00Z", "LFP": 3, "AmplitudeInMilliAmps": 2.0 }
                ],
                "2024-01-02T00:00:00Z": [
                    { "DateTime": "2024-01-02T04:00:00Z", "LFP": 4, "AmplitudeInMilliAmps": 2.5 },
                    { "DateTime": "2024-01-02T05:00:00Z", "LFP": 5, "AmplitudeInMilliAmps": 2.5 },
                    { "DateTime": "2024-01-02T06:00:00Z", "LFP": 100, "AmplitudeInMilliAmps": 2.5 }
                ]
            }
        }
    },
    "Groups": { "Final": [
        { "ActiveGroup": false },
        { "ActiveGroup": true, "ProgramSettings": { "SensingChannel": [
            { "HemisphereLocation": "HemisphereLocationDef.Left", "UpperLfpThreshold": 80, "LowerLfpThreshold": 20 }
        ] } }
    ] },
    "BrainSenseLfp": [
        { "FirstPacketDateTime": "2024-01-03T09:30:00Z", "LfpData": [
            { "TicksInMs": 1000, "Left": { "LFP": 10, "mA": 1.0 }, "Right": { "LFP": 11, "mA": 1.0 } },
            { "TicksInMs": 1500, "Left": { "LFP": 12, "mA": 1.0 }, "Right": { "LFP": 12, "mA": 1.0 } },
            { "TicksInMs": 2000, "Left": { "LFP": 11, "mA": 1.0 }, "Right": { "LFP": 13, "mA": 1.0 } },
            { "TicksInMs": 2500, "Left": { "LFP": 900, "mA": 1.0 }, "Right": { "LFP": 12, "mA": 1.0 } },
            { "TicksInMs": 3000, "Left": { "LFP": 10, "mA": 1.0 } }
        ] },
        { "LfpData": [ { "TicksInMs": 1000, "Left": { "LFP": 1, "mA": 1.0 } } ] }
    ],
    "GroupHistory": [
        { "SessionDate": "2024-01-01", "Groups": [ { "SignalPsdValues": [1, 2, 3], "Name": "A" } ] }
    ]
}"#;

fn write_export(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("export.json");
    fs::write(&path, contents).unwrap();
    path
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    serde_json::from_str(&stdout).unwrap()
}

// =============================================================================
// GENERAL
// =============================================================================

#[test]
fn test_no_args_shows_help() {
    percept()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_version_flag() {
    percept()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("percept"));
}

// =============================================================================
// SESSIONS
// =============================================================================

#[test]
fn test_sessions_json_drops_spectral_arrays() {
    let dir = TempDir::new().unwrap();
    let input = write_export(&dir, EXPORT);

    percept()
        .args(["sessions", "-i"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("    {"))
        .stdout(predicate::str::contains("\"Name\": \"A\""))
        .stdout(predicate::str::contains("SignalPsdValues").not());
}

#[test]
fn test_sessions_flat_to_file() {
    let dir = TempDir::new().unwrap();
    let input = write_export(&dir, EXPORT);
    let output = dir.path().join("sessions.txt");

    percept()
        .args(["sessions", "--format", "flat", "-i"])
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(
        written,
        "[0].SessionDate = \"2024-01-01\"\n[0].Groups[0].Name = \"A\"\n"
    );
}

// =============================================================================
// TREND
// =============================================================================

#[test]
fn test_trend_defaults_to_iqr() {
    let payload = stdout_json(
        percept()
            .args(["trend", "--format", "json", "-i", "-"])
            .write_stdin(EXPORT),
    );

    assert_eq!(payload["filter"]["outlier"]["method"], "iqr");
    let records = payload["report"]["left"]["series"]["records"].as_array().unwrap();
    assert_eq!(records.len(), 5);
    assert_eq!(payload["report"]["left"]["thresholds"]["upper"], 80.0);
    assert!(payload["report"]["right"]["series"]["records"].as_array().unwrap().is_empty());
}

#[test]
fn test_trend_window_and_text_table() {
    let dir = TempDir::new().unwrap();
    let input = write_export(&dir, EXPORT);

    percept()
        .args(["trend", "--days", "1", "-i"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Thresholds: upper = 80, lower = 20"))
        .stdout(predicate::str::contains(
            "Records: 6 extracted, 5 after outlier filter, 3 in window, 0 missing values",
        ))
        .stdout(predicate::str::contains("2024-01-01 01:00:00").not());
}

#[test]
fn test_trend_mad_masks_values() {
    let payload = stdout_json(
        percept()
            .args(["trend", "--outlier", "mad", "--format", "json", "-i", "-"])
            .write_stdin(EXPORT),
    );

    let records = payload["report"]["left"]["series"]["records"].as_array().unwrap();
    assert_eq!(records.len(), 6);
    assert!(records[5]["value"].is_null());
    assert_eq!(records[5]["amplitude"], 2.5);
}

#[test]
fn test_trend_config_file_with_flag_override() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("filter.json");
    fs::write(&config, r#"{"outlier": {"method": "none"}, "window_secs": 86400}"#).unwrap();

    let payload = stdout_json(
        percept()
            .args(["trend", "--format", "json", "--hours", "2", "--config"])
            .arg(&config)
            .args(["-i", "-"])
            .write_stdin(EXPORT),
    );

    assert_eq!(payload["filter"]["outlier"]["method"], "none");
    assert_eq!(payload["filter"]["window_secs"], 7200);
    let records = payload["report"]["left"]["series"]["records"].as_array().unwrap();
    assert_eq!(records.len(), 3);
}

#[test]
fn test_invalid_filter_parameter() {
    percept()
        .args(["trend", "--outlier", "mad", "--z-threshold", "0", "-i", "-"])
        .write_stdin(EXPORT)
        .assert()
        .failure()
        .stderr(predicate::str::contains("INVALID_CONFIG"));
}

// =============================================================================
// BRAINSENSE
// =============================================================================

#[test]
fn test_brainsense_json() {
    let payload = stdout_json(
        percept()
            .args(["brainsense", "--format", "json", "-i", "-"])
            .write_stdin(EXPORT),
    );

    assert_eq!(payload["filter"]["outlier"]["method"], "robust_z_score");
    let session = &payload["report"]["sessions"][0];
    assert_eq!(session["left"]["records"][0]["timestamp"], 0.0);
    assert!(session["left"]["records"][3]["value"].is_null());
    assert!(session["right"]["records"][4]["amplitude"].is_null());
    assert_eq!(payload["report"]["skipped"][0]["ordinal"], 2);
}

#[test]
fn test_brainsense_text_reports_skipped_session() {
    percept()
        .args(["brainsense", "-i", "-"])
        .write_stdin(EXPORT)
        .assert()
        .success()
        .stdout(predicate::str::contains("Session 1: LFP and Stimulation Analysis (2024-01-03 09:30:00 UTC)"))
        .stdout(predicate::str::contains("Skipped session 2 due to insufficient data"));
}

#[test]
fn test_brainsense_warns_about_config_window() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("filter.json");
    fs::write(&config, r#"{"window_secs": 86400}"#).unwrap();

    percept()
        .args(["brainsense", "--format", "json", "--config"])
        .arg(&config)
        .args(["-i", "-"])
        .write_stdin(EXPORT)
        .assert()
        .success()
        .stderr(predicate::str::contains("window_secs = 86400 ignored"));
}

// =============================================================================
// THRESHOLDS
// =============================================================================

#[test]
fn test_thresholds_text() {
    percept()
        .args(["thresholds", "-i", "-"])
        .write_stdin(EXPORT)
        .assert()
        .success()
        .stdout("Left: upper = 80, lower = 20\nRight: upper = none, lower = none\n");
}

#[test]
fn test_thresholds_json() {
    let payload = stdout_json(percept().args(["thresholds", "--json", "-i", "-"]).write_stdin(EXPORT));

    assert_eq!(payload["left"]["lower"], 20.0);
    assert!(payload["right"]["upper"].is_null());
}

// =============================================================================
// ERRORS
// =============================================================================

#[test]
fn test_non_object_root_is_malformed() {
    percept()
        .args(["trend", "-i", "-"])
        .write_stdin("[1, 2]")
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"code\":\"MALFORMED_INPUT\""));
}

#[test]
fn test_invalid_json() {
    percept()
        .args(["sessions", "-i", "-"])
        .write_stdin("not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("JSON_ERROR"));
}

#[test]
fn test_missing_input_file() {
    percept()
        .args(["trend", "-i", "/definitely/not/here.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("IO_ERROR"));
}

// =============================================================================
// DOCTOR
// =============================================================================

#[test]
fn test_doctor_inspects_input() {
    let dir = TempDir::new().unwrap();
    let input = write_export(&dir, EXPORT);

    percept()
        .args(["doctor", "-i"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] trend_left"))
        .stdout(predicate::str::contains("[WARN] trend_right"))
        .stdout(predicate::str::contains("2 BrainSense sessions"));
}

#[test]
fn test_doctor_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("filter.json");
    fs::write(&config, r#"{"outlier": {"method": "iqr", "multiplier": -1}}"#).unwrap();

    percept()
        .args(["doctor", "--json", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"status\": \"error\""))
        .stderr(predicate::str::contains("DOCTOR_FAILED"));
}
