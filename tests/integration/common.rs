//! Shared fixtures: a temp workspace with `T/`, `S/` and a trash directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tempfile::TempDir;

pub struct Workspace {
    pub dir: TempDir,
    pub target: PathBuf,
    pub source: PathBuf,
    pub trash: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("T");
        let source = dir.path().join("S");
        let trash = dir.path().join("trash");
        fs::create_dir_all(&target).unwrap();
        fs::create_dir_all(&source).unwrap();
        Self {
            dir,
            target,
            source,
            trash,
        }
    }

    /// T/a.txt "hello", S/b.txt "hello", S/c.txt "world".
    pub fn with_hello_world() -> Self {
        let ws = Self::new();
        ws.write(&ws.target.join("a.txt"), "hello");
        ws.write(&ws.source.join("b.txt"), "hello");
        ws.write(&ws.source.join("c.txt"), "world");
        ws
    }

    pub fn write(&self, path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn lock_path(&self) -> PathBuf {
        self.dir.path().join("file_cleaner.lock")
    }

    /// One `source_to_target_dedupe` entry over this workspace.
    pub fn dedupe_entry(&self, source: &Path) -> Value {
        json!({
            "strategy": "source_to_target_dedupe",
            "target_dir": { "path": self.target, "recursive": true },
            "source_dirs": [ { "path": source, "recursive": true } ],
            "trash_dir": self.trash,
        })
    }

    /// Rule file with a single strategy named `clean`.
    pub fn rules(&self) -> String {
        json!({
            "version": "0.1",
            "clean": self.dedupe_entry(&self.source),
        })
        .to_string()
    }

    /// Write `rules` next to the trees and return its path.
    pub fn write_rules(&self, rules: &str) -> PathBuf {
        let path = self.dir.path().join("rules.json");
        fs::write(&path, rules).unwrap();
        path
    }

    /// Every file under the trash directory.
    pub fn trashed_files(&self) -> Vec<PathBuf> {
        if !self.trash.exists() {
            return Vec::new();
        }
        walkdir::WalkDir::new(&self.trash)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect()
    }
}
