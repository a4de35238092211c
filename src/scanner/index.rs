//! Size and path indexes over a walked tree.
//!
//! Entries are stored once and referenced from both indexes, so a
//! fingerprint computed through one lookup is visible through the other.
//! Only entries sharing an exact size are ever compared, which keeps the
//! source-against-target pass away from an all-pairs comparison.
//!
//! # Example
//!
//! ```
//! use file_cleaner::scanner::{FileEntry, TreeIndex};
//! use std::path::{Path, PathBuf};
//!
//! let mut index = TreeIndex::default();
//! index.insert(FileEntry::new(PathBuf::from("/t/a.txt"), false, 5));
//! index.insert(FileEntry::new(PathBuf::from("/t/b.txt"), false, 5));
//! index.insert(FileEntry::new(PathBuf::from("/t/c.txt"), false, 9));
//!
//! assert_eq!(index.len(), 3);
//! assert_eq!(index.candidates(5).count(), 2);
//! assert!(index.get(Path::new("/t/c.txt")).is_some());
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use super::FileEntry;

/// Entries of one tree, bucketed by size and keyed by path.
#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    entries: Vec<FileEntry>,
    by_size: HashMap<u64, Vec<usize>>,
    by_path: BTreeMap<PathBuf, usize>,
}

impl TreeIndex {
    /// Record an entry. A second entry for an already-indexed path replaces
    /// the path mapping but stays in its size bucket.
    pub fn insert(&mut self, entry: FileEntry) {
        let slot = self.entries.len();
        self.by_size.entry(entry.size).or_default().push(slot);
        self.by_path.insert(entry.path.clone(), slot);
        self.entries.push(entry);
    }

    /// Entries with exactly `size` bytes, in discovery order.
    pub fn candidates(&self, size: u64) -> impl Iterator<Item = &FileEntry> + '_ {
        self.by_size
            .get(&size)
            .into_iter()
            .flatten()
            .map(move |&slot| &self.entries[slot])
    }

    /// Look up an entry by its enumerated path.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&FileEntry> {
        self.by_path.get(path).map(|&slot| &self.entries[slot])
    }

    /// All entries in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &FileEntry> + '_ {
        self.entries.iter()
    }

    /// Indexed paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.by_path.keys().map(PathBuf::as_path)
    }

    /// Number of indexed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct sizes.
    #[must_use]
    pub fn size_buckets(&self) -> usize {
        self.by_size.len()
    }

    /// Sum of the sizes of all non-directory entries.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.entries
            .iter()
            .filter(|e| !e.is_dir)
            .map(|e| e.size)
            .sum()
    }
}

impl FromIterator<FileEntry> for TreeIndex {
    fn from_iter<I: IntoIterator<Item = FileEntry>>(iter: I) -> Self {
        let mut index = Self::default();
        for entry in iter {
            index.insert(entry);
        }
        index
    }
}
