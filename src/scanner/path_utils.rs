//! Path normalization and tree overlap analysis.
//!
//! Before a rule touches anything, every source tree is checked for
//! independence from the target tree. Paths are compared in a canonical
//! textual form:
//!
//! 1. made absolute against the current directory at call time,
//! 2. lexically cleaned (`.` dropped, `..` popped, repeated separators collapsed),
//! 3. NFC-normalized, since macOS reports NFD names while configs are usually NFC,
//! 4. terminated with a separator, so `/etc/host` is never a prefix of `/etc/hostname`.
//!
//! # Example
//!
//! ```
//! use file_cleaner::scanner::path_utils::overlaps_normalized;
//!
//! // A recursive /etc sees /etc/hosts, but a flat /etc/hosts never sees /etc.
//! assert!(overlaps_normalized("/etc/", true, "/etc/hosts/", false));
//! assert!(!overlaps_normalized("/etc/", false, "/etc/hosts/", true));
//! ```

use std::env;
use std::io;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

use unicode_normalization::UnicodeNormalization;

/// A configured path could not be made absolute.
#[derive(Debug, thiserror::Error)]
#[error("Cannot resolve path {path}")]
pub struct PathResolutionError {
    /// The path as configured
    pub path: PathBuf,
    /// Why the current directory was unavailable
    #[source]
    pub source: io::Error,
}

/// Normalize a path string to NFC (Composed) form.
#[must_use]
pub fn normalize_path_str(s: &str) -> String {
    s.nfc().collect()
}

/// Lexically clean `path`, resolving it against `base` if it is relative.
///
/// Pure: touches neither the filesystem nor the process environment, and
/// does not follow symlinks.
#[must_use]
pub fn absolutize_with_base(path: &Path, base: &Path) -> PathBuf {
    let joined;
    let path = if path.is_absolute() {
        path
    } else {
        joined = base.join(path);
        joined.as_path()
    };

    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => cleaned.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            Component::Normal(part) => cleaned.push(part),
        }
    }
    cleaned
}

/// Make `path` absolute and lexically clean.
///
/// Relative paths are resolved against the current directory as it is at
/// the time of this call.
///
/// # Errors
///
/// Returns [`PathResolutionError`] if `path` is relative and the current
/// directory cannot be determined.
pub fn absolutize(path: &Path) -> Result<PathBuf, PathResolutionError> {
    if path.is_absolute() {
        return Ok(absolutize_with_base(path, Path::new("")));
    }
    let cwd = env::current_dir().map_err(|source| PathResolutionError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(absolutize_with_base(path, &cwd))
}

/// Canonical comparison key: absolute, cleaned, NFC, trailing separator.
///
/// # Errors
///
/// Returns [`PathResolutionError`] if the path cannot be made absolute.
pub fn comparison_key(path: &Path) -> Result<String, PathResolutionError> {
    let absolute = absolutize(path)?;
    Ok(with_trailing_separator(normalize_path_str(
        &absolute.to_string_lossy(),
    )))
}

fn with_trailing_separator(mut s: String) -> String {
    if !s.ends_with(MAIN_SEPARATOR) {
        s.push(MAIN_SEPARATOR);
    }
    s
}

/// Whether two configured trees can enumerate a common path.
///
/// # Errors
///
/// Returns [`PathResolutionError`] if either path cannot be made absolute.
/// Callers must treat this as fatal rather than as "independent".
pub fn overlaps(
    a: &Path,
    recursive_a: bool,
    b: &Path,
    recursive_b: bool,
) -> Result<bool, PathResolutionError> {
    let key_a = comparison_key(a)?;
    let key_b = comparison_key(b)?;
    let result = overlaps_normalized(&key_a, recursive_a, &key_b, recursive_b);
    log::trace!(
        "overlap({}, recursive={}, {}, recursive={}) = {}",
        key_a,
        recursive_a,
        key_b,
        recursive_b,
        result
    );
    Ok(result)
}

/// Overlap decision on two comparison keys (see [`comparison_key`]).
///
/// - Identical keys always overlap.
/// - Otherwise the shorter key is the only possible ancestor, and the
///   trees overlap only if that ancestor is recursive and is a prefix of
///   the longer key. A flat listing never reaches into a descendant tree.
#[must_use]
pub fn overlaps_normalized(a: &str, recursive_a: bool, b: &str, recursive_b: bool) -> bool {
    if a == b {
        return true;
    }

    let (ancestor, ancestor_recursive, descendant) = if a.len() <= b.len() {
        (a, recursive_a, b)
    } else {
        (b, recursive_b, a)
    };

    ancestor_recursive && descendant.starts_with(ancestor)
}
