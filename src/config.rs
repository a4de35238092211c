//! Rule file loading and validation.
//!
//! A rule file is a JSON object with a `version` and one entry per named
//! strategy:
//!
//! ```json
//! {
//!   "version": "0.1",
//!   "photos": {
//!     "strategy": "source_to_target_dedupe",
//!     "target_dir": { "path": "~/Pictures", "recursive": true },
//!     "source_dirs": [
//!       { "path": "~/Downloads", "recursive": false, "match": "\\.jpe?g$" }
//!     ],
//!     "trash_dir": "~/.file_cleaner/trash"
//!   }
//! }
//! ```
//!
//! Everything is validated here, before any filesystem mutation: the
//! version, strategy kinds, regex patterns and `~` expansion. The trash
//! directory of each strategy gets a run timestamp segment fixed at load.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use directories::BaseDirs;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::scanner::WalkerConfig;

/// The only rule file version this build understands.
pub const SUPPORTED_VERSION: &str = "0.1";

/// chrono format of the per-run trash directory segment.
pub const TRASH_STAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S%.3f";

/// Errors raised while loading a rule file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not valid JSON.
    #[error("Invalid JSON in config")]
    Json(#[from] serde_json::Error),

    /// The top level is not a JSON object.
    #[error("Config root must be a JSON object")]
    NotAnObject,

    /// No string `version` key.
    #[error("Config version missing")]
    MissingVersion,

    /// `version` is not [`SUPPORTED_VERSION`].
    #[error("Unsupported config version {0:?} (expected \"0.1\")")]
    UnsupportedVersion(String),

    /// A strategy entry is not a JSON object.
    #[error("Strategy parse error: {0:?} is not an object")]
    StrategyParse(String),

    /// A strategy entry has no `strategy` kind.
    #[error("Strategy key not found in {0:?}")]
    MissingKind(String),

    /// The `strategy` kind is not recognised.
    #[error("Unknown strategy {kind:?} in {name:?}")]
    UnknownStrategy { name: String, kind: String },

    /// The kind is recognised but has no implementation.
    #[error("{kind} strategy not implemented (in {name:?})")]
    NotImplemented { name: String, kind: StrategyKind },

    /// The entry does not have the shape its kind requires.
    #[error("Invalid strategy {name:?}")]
    InvalidStrategy {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// A `match` or `ignore` pattern does not compile.
    #[error("Invalid {field} pattern {pattern:?} in {name:?}")]
    InvalidPattern {
        name: String,
        field: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// `~` was used but the home directory is unknown.
    #[error("Cannot expand {0:?}: home directory unknown")]
    NoHomeDir(String),
}

/// Strategy kinds accepted in the `strategy` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Remove source files already present in the target tree.
    SourceToTargetDedupe,
    /// Reserved; rejected at load.
    PdfMover,
}

impl StrategyKind {
    /// Parse the `strategy` tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "source_to_target_dedupe" => Some(Self::SourceToTargetDedupe),
            "pdf_mover" => Some(Self::PdfMover),
            _ => None,
        }
    }

    /// The `strategy` tag of this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SourceToTargetDedupe => "source_to_target_dedupe",
            Self::PdfMover => "pdf_mover",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured tree: its root plus traversal rules.
#[derive(Debug, Clone)]
pub struct DirSpec {
    /// Root path, `~` already expanded
    pub path: PathBuf,
    /// Recursion and match rules
    pub walker: WalkerConfig,
}

impl DirSpec {
    /// Create a tree spec.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, walker: WalkerConfig) -> Self {
        Self {
            path: path.into(),
            walker,
        }
    }

    /// Whether subdirectories are descended.
    #[must_use]
    pub fn recursive(&self) -> bool {
        self.walker.recursive
    }
}

/// Validated settings of a `source_to_target_dedupe` strategy.
#[derive(Debug, Clone)]
pub struct DedupeConfig {
    /// Authoritative tree; never modified
    pub target: DirSpec,
    /// Trees cleaned of files already in the target, in configured order
    pub sources: Vec<DirSpec>,
    /// Trash directory for this run (`trash_dir/<timestamp>`)
    pub trash_root: PathBuf,
}

/// A validated strategy entry.
#[derive(Debug, Clone)]
pub enum StrategyConfig {
    /// `source_to_target_dedupe`
    SourceToTargetDedupe(DedupeConfig),
}

impl StrategyConfig {
    /// Kind tag of this entry.
    #[must_use]
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::SourceToTargetDedupe(_) => StrategyKind::SourceToTargetDedupe,
        }
    }
}

/// A loaded rule file.
#[derive(Debug, Clone)]
pub struct Config {
    /// Rule file version
    pub version: String,
    /// Strategies by name; iteration order is the execution order
    pub strategies: BTreeMap<String, StrategyConfig>,
}

#[derive(Debug, Deserialize)]
struct RawDirSpec {
    path: String,
    recursive: bool,
    #[serde(default, rename = "match")]
    match_pattern: Option<String>,
    #[serde(default, rename = "ignore")]
    ignore_pattern: Option<String>,
    #[serde(default)]
    include_dirs: bool,
}

#[derive(Debug, Deserialize)]
struct RawDedupe {
    target_dir: RawDirSpec,
    #[serde(default)]
    source_dirs: Vec<RawDirSpec>,
    trash_dir: String,
}

impl Config {
    /// Load and validate a rule file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is unreadable or invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Read config file {}", path.display());
        Self::from_json_str(&content)
    }

    /// Parse a rule file, stamping trash directories with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the document is invalid.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Self::parse(json, Local::now())
    }

    /// Parse a rule file, stamping trash directories with `run_time`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the document is invalid.
    pub fn parse(json: &str, run_time: DateTime<Local>) -> Result<Self, ConfigError> {
        let mut root: Map<String, Value> = match serde_json::from_str::<Value>(json)? {
            Value::Object(map) => map,
            _ => return Err(ConfigError::NotAnObject),
        };

        let version = match root.remove("version") {
            Some(Value::String(v)) => v,
            _ => return Err(ConfigError::MissingVersion),
        };
        log::info!("Config version: {}", version);
        if version != SUPPORTED_VERSION {
            return Err(ConfigError::UnsupportedVersion(version));
        }

        let stamp = run_time.format(TRASH_STAMP_FORMAT).to_string();
        let mut strategies = BTreeMap::new();
        for (name, value) in root {
            log::debug!("Found strategy entry: {}", name);
            let strategy = parse_strategy(&name, value, &stamp)?;
            strategies.insert(name, strategy);
        }

        Ok(Self {
            version,
            strategies,
        })
    }
}

fn parse_strategy(name: &str, value: Value, stamp: &str) -> Result<StrategyConfig, ConfigError> {
    let Value::Object(fields) = &value else {
        return Err(ConfigError::StrategyParse(name.to_string()));
    };

    let tag = fields
        .get("strategy")
        .and_then(Value::as_str)
        .ok_or_else(|| ConfigError::MissingKind(name.to_string()))?;
    let kind = StrategyKind::from_tag(tag).ok_or_else(|| ConfigError::UnknownStrategy {
        name: name.to_string(),
        kind: tag.to_string(),
    })?;

    match kind {
        StrategyKind::SourceToTargetDedupe => {
            let raw: RawDedupe =
                serde_json::from_value(value).map_err(|source| ConfigError::InvalidStrategy {
                    name: name.to_string(),
                    source,
                })?;
            let config = resolve_dedupe(name, raw, stamp)?;
            log::info!(
                "Strategy {}: target {} ({}), {} source tree(s), trash {}",
                name,
                config.target.path.display(),
                if config.target.recursive() {
                    "recursive"
                } else {
                    "flat"
                },
                config.sources.len(),
                config.trash_root.display()
            );
            Ok(StrategyConfig::SourceToTargetDedupe(config))
        }
        StrategyKind::PdfMover => Err(ConfigError::NotImplemented {
            name: name.to_string(),
            kind,
        }),
    }
}

fn resolve_dedupe(name: &str, raw: RawDedupe, stamp: &str) -> Result<DedupeConfig, ConfigError> {
    let target = resolve_dir(name, raw.target_dir)?;
    let sources = raw
        .source_dirs
        .into_iter()
        .map(|dir| resolve_dir(name, dir))
        .collect::<Result<Vec<_>, _>>()?;
    let trash_root = expand_home(&raw.trash_dir)?.join(stamp);

    Ok(DedupeConfig {
        target,
        sources,
        trash_root,
    })
}

fn resolve_dir(name: &str, raw: RawDirSpec) -> Result<DirSpec, ConfigError> {
    let compile = |field: &'static str, pattern: Option<String>| {
        pattern
            .map(|p| {
                Regex::new(&p).map_err(|source| ConfigError::InvalidPattern {
                    name: name.to_string(),
                    field,
                    pattern: p.clone(),
                    source,
                })
            })
            .transpose()
    };

    let walker = WalkerConfig::default()
        .with_recursive(raw.recursive)
        .with_include_dirs(raw.include_dirs)
        .with_match(compile("match", raw.match_pattern)?)
        .with_ignore(compile("ignore", raw.ignore_pattern)?);

    let spec = DirSpec::new(expand_home(&raw.path)?, walker);
    log::debug!(
        "  Dir {} recursive={} include_dirs={}",
        spec.path.display(),
        spec.walker.recursive,
        spec.walker.include_dirs
    );
    Ok(spec)
}

/// Expand a leading `~` or `~/` to the current user's home directory.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDir`] if expansion is needed but the home
/// directory cannot be determined.
pub fn expand_home(path: &str) -> Result<PathBuf, ConfigError> {
    let base_dirs = BaseDirs::new();
    expand_home_with(path, base_dirs.as_ref().map(BaseDirs::home_dir))
}

/// [`expand_home`] against an explicit home directory.
///
/// `~user` forms are left untouched.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDir`] if `path` needs a home and `home` is `None`.
pub fn expand_home_with(path: &str, home: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let rest = if path == "~" {
        ""
    } else if let Some(rest) = path.strip_prefix("~/") {
        rest
    } else {
        return Ok(PathBuf::from(path));
    };

    let home = home.ok_or_else(|| ConfigError::NoHomeDir(path.to_string()))?;
    Ok(if rest.is_empty() {
        home.to_path_buf()
    } else {
        home.join(rest)
    })
}
