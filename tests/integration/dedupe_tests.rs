use std::fs;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use file_cleaner::config::Config;
use file_cleaner::error::{exit_code_for, ExitCode};
use file_cleaner::lock::ProcessLock;
use file_cleaner::strategy::{RunOptions, StrategyError, StrategyRunner};
use serde_json::json;

use super::common::Workspace;

fn run(ws: &Workspace, rules: &str, options: RunOptions) -> file_cleaner::strategy::RunReport {
    let config = Config::from_json_str(rules).unwrap();
    let lock = ProcessLock::acquire(&ws.lock_path()).unwrap();
    StrategyRunner::from_config(&config, options)
        .run(&lock.permit())
        .unwrap()
}

#[test]
fn test_apply_moves_duplicate_into_trash() {
    let ws = Workspace::with_hello_world();

    let report = run(&ws, &ws.rules(), RunOptions::apply());

    assert_eq!(report.duplicates_found(), 1);
    assert_eq!(report.bytes_reclaimed(), 5);
    assert!(report.all_succeeded());

    assert!(!ws.source.join("b.txt").exists());
    assert_eq!(fs::read_to_string(ws.source.join("c.txt")).unwrap(), "world");
    assert_eq!(fs::read_to_string(ws.target.join("a.txt")).unwrap(), "hello");

    let trashed = ws.trashed_files();
    assert_eq!(trashed.len(), 1);
    assert!(trashed[0].ends_with("S/b.txt"));
    assert_eq!(fs::read_to_string(&trashed[0]).unwrap(), "hello");

    let resolution = &report.strategies[0].resolution.successes[0];
    assert_eq!(resolution.trash_path, trashed[0]);
}

#[test]
fn test_trash_is_nested_under_run_timestamp() {
    let ws = Workspace::with_hello_world();
    let config = Config::from_json_str(&ws.rules()).unwrap();
    let file_cleaner::config::StrategyConfig::SourceToTargetDedupe(dedupe) =
        &config.strategies["clean"];

    assert_eq!(dedupe.trash_root.parent(), Some(ws.trash.as_path()));
    let stamp = dedupe.trash_root.file_name().unwrap().to_string_lossy();
    // 2006-01-02-15-04-05.000
    assert_eq!(stamp.len(), 23);
    assert_eq!(&stamp[19..20], ".");
}

#[cfg(unix)]
#[test]
fn test_apply_with_symlink_replacement() {
    let ws = Workspace::with_hello_world();

    let report = run(&ws, &ws.rules(), RunOptions::apply().with_symlink(true));

    let link = ws.source.join("b.txt");
    let meta = fs::symlink_metadata(&link).unwrap();
    assert!(meta.file_type().is_symlink());
    assert_eq!(fs::read_link(&link).unwrap(), ws.target.join("a.txt"));
    assert_eq!(fs::read_to_string(&link).unwrap(), "hello");
    assert!(fs::symlink_metadata(ws.source.join("c.txt")).unwrap().is_file());
    assert_eq!(ws.trashed_files().len(), 1);
    assert!(report.strategies[0].resolution.successes[0].symlinked);
}

#[cfg(unix)]
#[test]
fn test_second_run_ignores_left_symlinks() {
    let ws = Workspace::with_hello_world();
    run(&ws, &ws.rules(), RunOptions::apply().with_symlink(true));

    let report = run(&ws, &ws.rules(), RunOptions::apply().with_symlink(true));

    assert_eq!(report.duplicates_found(), 0);
    assert!(fs::symlink_metadata(ws.source.join("b.txt"))
        .unwrap()
        .file_type()
        .is_symlink());
}

#[test]
fn test_dry_run_leaves_everything_in_place() {
    let ws = Workspace::with_hello_world();

    let report = run(&ws, &ws.rules(), RunOptions::dry_run().with_symlink(true));

    assert_eq!(report.duplicates_found(), 1);
    assert!(report.strategies[0].resolution.successes[0].simulated);
    assert!(fs::symlink_metadata(ws.source.join("b.txt")).unwrap().is_file());
    assert!(fs::symlink_metadata(ws.source.join("c.txt")).unwrap().is_file());
    assert!(!ws.trash.exists());
}

#[test]
fn test_target_equal_to_source_is_rejected_before_any_change() {
    let ws = Workspace::new();
    ws.write(&ws.target.join("a.txt"), "hello");
    ws.write(&ws.target.join("b.txt"), "hello");
    let rules = json!({
        "version": "0.1",
        "self": ws.dedupe_entry(&ws.target),
    })
    .to_string();

    let config = Config::from_json_str(&rules).unwrap();
    let lock = ProcessLock::acquire(&ws.lock_path()).unwrap();
    let err = StrategyRunner::from_config(&config, RunOptions::apply())
        .run(&lock.permit())
        .unwrap_err();

    assert_eq!(err.name, "self");
    assert!(matches!(err.source, StrategyError::Overlap { .. }));
    assert!(ws.target.join("a.txt").exists());
    assert!(ws.target.join("b.txt").exists());
    assert!(!ws.trash.exists());
}

#[test]
fn test_strategies_run_in_name_order_and_stop_at_first_failure() {
    let ws = Workspace::with_hello_world();
    let other_source = ws.dir.path().join("S2");
    ws.write(&other_source.join("copy.txt"), "hello");

    let mut missing_target = ws.dedupe_entry(&other_source);
    missing_target["target_dir"]["path"] = json!(ws.dir.path().join("missing"));

    let rules = json!({
        "version": "0.1",
        "b_broken": missing_target,
        "a_first": ws.dedupe_entry(&ws.source),
        "c_never": ws.dedupe_entry(&other_source),
    })
    .to_string();

    let config = Config::from_json_str(&rules).unwrap();
    let lock = ProcessLock::acquire(&ws.lock_path()).unwrap();
    let err = StrategyRunner::from_config(&config, RunOptions::apply())
        .run(&lock.permit())
        .unwrap_err();

    assert_eq!(err.name, "b_broken");
    assert!(matches!(err.source, StrategyError::TargetMissing(_)));
    assert_eq!(err.completed.strategies.len(), 1);
    assert_eq!(err.completed.strategies[0].name, "a_first");
    // a_first ran and is not rolled back; c_never never started.
    assert!(!ws.source.join("b.txt").exists());
    assert!(other_source.join("copy.txt").exists());
}

#[test]
fn test_flat_source_ignores_subdirectories() {
    let ws = Workspace::with_hello_world();
    ws.write(&ws.source.join("nested").join("deep.txt"), "hello");
    let mut entry = ws.dedupe_entry(&ws.source);
    entry["source_dirs"][0]["recursive"] = json!(false);
    let rules = json!({ "version": "0.1", "flat": entry }).to_string();

    let report = run(&ws, &rules, RunOptions::apply());

    assert_eq!(report.duplicates_found(), 1);
    assert!(!ws.source.join("b.txt").exists());
    assert!(ws.source.join("nested").join("deep.txt").exists());
}

#[test]
fn test_match_rule_limits_sources() {
    let ws = Workspace::with_hello_world();
    ws.write(&ws.source.join("b.bak"), "hello");
    let mut entry = ws.dedupe_entry(&ws.source);
    entry["source_dirs"][0]["match"] = json!(r"\.bak$");
    let rules = json!({ "version": "0.1", "baks": entry }).to_string();

    let report = run(&ws, &rules, RunOptions::apply());

    assert_eq!(report.duplicates_found(), 1);
    assert!(ws.source.join("b.txt").exists());
    assert!(!ws.source.join("b.bak").exists());
}

#[test]
fn test_same_size_different_content_is_kept() {
    let ws = Workspace::new();
    ws.write(&ws.target.join("a.txt"), "hello");
    ws.write(&ws.source.join("b.txt"), "jello");

    let report = run(&ws, &ws.rules(), RunOptions::apply());

    assert_eq!(report.duplicates_found(), 0);
    assert!(ws.source.join("b.txt").exists());
}

#[test]
fn test_interrupted_run_maps_to_exit_130() {
    let ws = Workspace::with_hello_world();
    let config = Config::from_json_str(&ws.rules()).unwrap();
    let lock = ProcessLock::acquire(&ws.lock_path()).unwrap();

    let err = StrategyRunner::from_config(&config, RunOptions::apply())
        .with_shutdown_flag(Arc::new(AtomicBool::new(true)))
        .run(&lock.permit())
        .unwrap_err();

    assert!(err.is_interrupted());
    assert!(ws.source.join("b.txt").exists());
    assert_eq!(exit_code_for(&anyhow::Error::new(err)), ExitCode::Interrupted);
}
