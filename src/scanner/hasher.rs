//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//!
//! This module provides the [`Hasher`] struct for computing BLAKE3 content
//! fingerprints using memory-efficient streaming, and [`files_identical`],
//! the block-by-block comparison that confirms a fingerprint match before
//! any file is treated as a duplicate.
//!
//! # Example
//!
//! ```no_run
//! use file_cleaner::scanner::hasher::{files_identical, hash_to_hex, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let hash = hasher.full_hash(Path::new("a.txt")).unwrap();
//! println!("{}", hash_to_hex(&hash));
//!
//! assert!(files_identical(Path::new("a.txt"), Path::new("a.txt")));
//! ```

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use super::HashError;

/// A 256-bit BLAKE3 digest.
pub type Hash = [u8; 32];

/// Block size used by [`files_identical`].
pub const COMPARE_BLOCK_SIZE: usize = 1024;

/// Default read buffer size for streaming hashes.
const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Streaming BLAKE3 hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    buffer_size: usize,
}

impl Hasher {
    /// Create a hasher with the default 64 KiB read buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Hash the entire content of a file.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut reader = BufReader::with_capacity(self.buffer_size, file);
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };
            hasher.update(&buffer[..n]);
        }

        let hash = *hasher.finalize().as_bytes();
        log::trace!("Hashed {}: {}", path.display(), hash_to_hex(&hash));
        Ok(hash)
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a digest as lowercase hex.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    blake3::Hash::from(*hash).to_hex().to_string()
}

/// Compare two files byte for byte in [`COMPARE_BLOCK_SIZE`] blocks.
///
/// Both streams must end together. Any open or read failure counts as a
/// mismatch rather than an error.
#[must_use]
pub fn files_identical(a: &Path, b: &Path) -> bool {
    let (file_a, file_b) = match (File::open(a), File::open(b)) {
        (Ok(fa), Ok(fb)) => (fa, fb),
        (Err(e), _) | (_, Err(e)) => {
            log::debug!(
                "Byte comparison skipped for {} / {}: {}",
                a.display(),
                b.display(),
                e
            );
            return false;
        }
    };

    let mut reader_a = BufReader::new(file_a);
    let mut reader_b = BufReader::new(file_b);
    let mut block_a = [0u8; COMPARE_BLOCK_SIZE];
    let mut block_b = [0u8; COMPARE_BLOCK_SIZE];

    loop {
        let (len_a, len_b) = match (
            read_block(&mut reader_a, &mut block_a),
            read_block(&mut reader_b, &mut block_b),
        ) {
            (Ok(la), Ok(lb)) => (la, lb),
            _ => return false,
        };

        if len_a != len_b || block_a[..len_a] != block_b[..len_b] {
            return false;
        }

        // Short block means EOF on both sides.
        if len_a < COMPARE_BLOCK_SIZE {
            return true;
        }
    }
}

/// Fill `buf` as far as the reader allows, returning the number of bytes read.
fn read_block(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
