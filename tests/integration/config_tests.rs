use std::path::PathBuf;

use file_cleaner::config::{expand_home, Config, ConfigError, StrategyConfig, StrategyKind};
use serde_json::json;

use super::common::Workspace;

#[test]
fn test_load_rules_from_file() {
    let ws = Workspace::new();
    let path = ws.write_rules(&ws.rules());

    let config = Config::load(&path).unwrap();

    assert_eq!(config.version, "0.1");
    assert_eq!(config.strategies.len(), 1);
    let StrategyConfig::SourceToTargetDedupe(dedupe) = &config.strategies["clean"];
    assert_eq!(dedupe.target.path, ws.target);
    assert!(dedupe.target.recursive());
    assert_eq!(dedupe.sources.len(), 1);
    assert_eq!(dedupe.sources[0].path, ws.source);
    assert!(dedupe.trash_root.starts_with(&ws.trash));
}

#[test]
fn test_home_relative_paths_are_expanded() {
    let rules = json!({
        "version": "0.1",
        "home": {
            "strategy": "source_to_target_dedupe",
            "target_dir": { "path": "~/Pictures", "recursive": true },
            "source_dirs": [ { "path": "~/Downloads", "recursive": false } ],
            "trash_dir": "~/.file_cleaner_trash",
        }
    })
    .to_string();

    // Only meaningful where a home directory is known.
    let Ok(home) = expand_home("~") else {
        return;
    };
    let config = Config::from_json_str(&rules).unwrap();
    let StrategyConfig::SourceToTargetDedupe(dedupe) = &config.strategies["home"];

    assert_eq!(dedupe.target.path, home.join("Pictures"));
    assert_eq!(dedupe.sources[0].path, home.join("Downloads"));
    assert!(dedupe.trash_root.starts_with(home.join(".file_cleaner_trash")));
}

#[test]
fn test_pdf_mover_fails_at_load() {
    let ws = Workspace::new();
    let rules = json!({
        "version": "0.1",
        "clean": ws.dedupe_entry(&ws.source),
        "pdfs": { "strategy": "pdf_mover" },
    })
    .to_string();

    let err = Config::from_json_str(&rules).unwrap_err();

    assert!(matches!(
        err,
        ConfigError::NotImplemented {
            kind: StrategyKind::PdfMover,
            ..
        }
    ));
    assert!(err.to_string().contains("pdf_mover strategy not implemented"));
}

#[test]
fn test_unknown_strategy_kind() {
    let err = Config::from_json_str(r#"{"version": "0.1", "x": {"strategy": "zip_it"}}"#)
        .unwrap_err();
    assert!(err.to_string().contains("Unknown strategy"));
}

#[test]
fn test_unsupported_version_is_rejected_before_strategies() {
    // The strategy entry is invalid too; the version check comes first.
    let err = Config::from_json_str(r#"{"version": "1.0", "x": {"strategy": "zip_it"}}"#)
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedVersion(_)));
}

#[test]
fn test_missing_file() {
    let err = Config::load(&PathBuf::from("/nonexistent/file_cleaner/rules.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));

    let io_message = std::error::Error::source(&err).unwrap().to_string();
    let chain = format!("{:#}", anyhow::Error::new(err));
    assert!(chain.starts_with("Failed to read config /nonexistent/file_cleaner/rules.json: "));
    assert_eq!(chain.matches(io_message.as_str()).count(), 1);
}

#[test]
fn test_source_dirs_optional_fields() {
    let ws = Workspace::new();
    let mut entry = ws.dedupe_entry(&ws.source);
    entry["source_dirs"][0]["ignore"] = json!("tmp");
    entry["source_dirs"][0]["include_dirs"] = json!(true);
    let rules = json!({ "version": "0.1", "clean": entry }).to_string();

    let config = Config::from_json_str(&rules).unwrap();
    let StrategyConfig::SourceToTargetDedupe(dedupe) = &config.strategies["clean"];
    let walker = &dedupe.sources[0].walker;

    assert!(walker.include_dirs);
    assert!(walker.ignore_regex.is_some());
    assert!(walker.match_regex.is_none());
}
