use std::fs;
use std::path::Path;

use clap::Parser;
use file_cleaner::cli::Cli;
use file_cleaner::error::{exit_code_for, ExitCode};
use file_cleaner::lock::ProcessLock;
use file_cleaner::run_app;

use super::common::Workspace;

fn cli(rules: &Path, ws: &Workspace, extra: &[&str]) -> Cli {
    let mut args = vec![
        "file-cleaner".to_string(),
        "-q".to_string(),
        "--config".to_string(),
        rules.display().to_string(),
        "--lock-file".to_string(),
        ws.lock_path().display().to_string(),
    ];
    args.extend(extra.iter().map(|s| s.to_string()));
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn test_run_app_defaults_to_dry_run() {
    let ws = Workspace::with_hello_world();
    let rules = ws.write_rules(&ws.rules());

    let code = run_app(cli(&rules, &ws, &[])).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(ws.source.join("b.txt").exists());
    assert!(!ws.trash.exists());
}

#[test]
fn test_run_app_applies_changes() {
    let ws = Workspace::with_hello_world();
    let rules = ws.write_rules(&ws.rules());

    let code = run_app(cli(&rules, &ws, &["--dry-run=false"])).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(!ws.source.join("b.txt").exists());
    assert!(ws.source.join("c.txt").exists());
    assert_eq!(ws.trashed_files().len(), 1);
}

#[test]
fn test_run_app_invalid_rules_fail_before_changes() {
    let ws = Workspace::with_hello_world();
    let rules = ws.write_rules(r#"{"version": "0.1", "pdfs": {"strategy": "pdf_mover"}}"#);

    let err = run_app(cli(&rules, &ws, &["--dry-run=false"])).unwrap_err();

    assert_eq!(exit_code_for(&err), ExitCode::GeneralError);
    assert!(format!("{:#}", err).contains("pdf_mover strategy not implemented"));
    assert!(ws.source.join("b.txt").exists());
}

#[test]
fn test_run_app_refuses_when_lock_held() {
    let ws = Workspace::with_hello_world();
    let rules = ws.write_rules(&ws.rules());
    let _held = ProcessLock::acquire(&ws.lock_path()).unwrap();

    let err = run_app(cli(&rules, &ws, &["--dry-run=false"])).unwrap_err();

    assert_eq!(exit_code_for(&err), ExitCode::GeneralError);
    assert!(format!("{:#}", err).contains("already running"));
    assert!(ws.source.join("b.txt").exists());
}

#[test]
fn test_run_app_resolution_failure_exits_non_zero() {
    let ws = Workspace::with_hello_world();
    ws.write(&ws.source.join("d.txt"), "hello");
    let rules = ws.write_rules(&ws.rules());

    // Every run stamp lives under `trash`; as a plain file it breaks each move.
    fs::write(&ws.trash, "not a directory").unwrap();

    let code = run_app(cli(&rules, &ws, &["--dry-run=false"])).unwrap();

    assert_eq!(code, ExitCode::GeneralError);
    assert!(ws.source.join("b.txt").exists());
    assert!(ws.source.join("d.txt").exists());
}

#[test]
fn test_run_app_overlap_is_an_error() {
    let ws = Workspace::with_hello_world();
    let rules = serde_json::json!({
        "version": "0.1",
        "loop": ws.dedupe_entry(&ws.target),
    })
    .to_string();
    let rules = ws.write_rules(&rules);

    let err = run_app(cli(&rules, &ws, &["--dry-run=false"])).unwrap_err();

    assert_eq!(exit_code_for(&err), ExitCode::GeneralError);
    assert!(format!("{:#}", err).contains("overlaps target"));
}
