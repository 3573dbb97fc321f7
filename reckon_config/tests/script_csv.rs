use std::fs;

use reckon_config::{ScriptCommand, load_script_csv};
use tempfile::tempdir;

#[test]
fn parses_rows_with_optional_value() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("script.csv");
    fs::write(
        &path,
        "at_ms,device,command,value\n0,living,target,100\n4000, living ,target,0\n9000,garden,open,\n",
    )
    .unwrap();

    let rows = load_script_csv(&path).expect("valid script");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].device, "living");
    assert_eq!(rows[1].value, Some(0));
    assert_eq!(rows[2].command, ScriptCommand::Open);
    assert_eq!(rows[2].value, None);
}

#[test]
fn rejects_wrong_headers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("script.csv");
    fs::write(&path, "time,device,command,value\n0,a,open,\n").unwrap();
    let err = load_script_csv(&path).unwrap_err();
    assert!(err.to_string().contains("must have headers"));
}

#[test]
fn rejects_missing_value_for_target() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("script.csv");
    fs::write(&path, "at_ms,device,command,value\n0,a,target,\n").unwrap();
    let err = load_script_csv(&path).unwrap_err();
    assert!(err.to_string().contains("needs a value"));
}

#[test]
fn rejects_time_going_backwards() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("script.csv");
    fs::write(&path, "at_ms,device,command,value\n500,a,open,\n100,a,close,\n").unwrap();
    let err = load_script_csv(&path).unwrap_err();
    assert!(err.to_string().contains("must not decrease"));
}

#[test]
fn rejects_unknown_command() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("script.csv");
    fs::write(&path, "at_ms,device,command,value\n0,a,wiggle,\n").unwrap();
    let err = load_script_csv(&path).unwrap_err();
    assert!(err.to_string().contains("row 2"));
}
