//! Document identifiers: path canonicalization and normalization.
//!
//! Two identifiers are equal iff their canonical forms are string-equal, so
//! every path entering the active set goes through the same pipeline:
//! symlink resolution, Unicode NFC normalization, trailing-slash removal.

use crate::error::TrackerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Canonical identifier of a tracked document.
///
/// Always an absolute, symlink-resolved, NFC-normalized path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocId(PathBuf);

impl DocId {
    /// Resolve a path to its canonical document identifier.
    ///
    /// When the file does not exist yet (a before-persist hook fires before
    /// the first write of a new document), the parent directory is
    /// canonicalized instead and the file name re-appended.
    pub fn resolve(path: &Path) -> Result<Self, TrackerError> {
        let canonical = match dunce::canonicalize(path) {
            Ok(c) => c,
            Err(_) => canonicalize_via_parent(path)?,
        };
        Ok(DocId(PathBuf::from(normalize_path_string(
            &canonical.to_string_lossy(),
        ))))
    }

    /// Wrap an already-canonical path without touching the filesystem.
    ///
    /// Only normalization is applied; the caller guarantees the path is
    /// absolute and symlink-free.
    pub fn from_canonical(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        DocId(PathBuf::from(normalize_path_string(
            &path.to_string_lossy(),
        )))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Whether the backing file can currently be opened for reading.
    ///
    /// This is the fast-cleanup retention test: readability only, no
    /// predicate evaluation.
    pub fn is_readable(&self) -> bool {
        std::fs::File::open(&self.0).is_ok()
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for DocId {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Canonicalize a not-yet-existing file through its parent directory.
fn canonicalize_via_parent(path: &Path) -> Result<PathBuf, TrackerError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| {
            TrackerError::InvalidPath(format!("No parent directory for {}", path.display()))
        })?;
    let file_name = path.file_name().ok_or_else(|| {
        TrackerError::InvalidPath(format!("No file name in {}", path.display()))
    })?;
    let canonical_parent = dunce::canonicalize(parent).map_err(|e| {
        TrackerError::InvalidPath(format!(
            "Failed to canonicalize {}: {}",
            parent.display(),
            e
        ))
    })?;
    Ok(canonical_parent.join(file_name))
}

/// Normalize a path string: Unicode NFC, no trailing slashes (except root).
pub fn normalize_path_string(path: &str) -> String {
    let mut result: String = path.nfc().collect();
    if result.len() > 1 {
        while result.ends_with('/') || result.ends_with('\\') {
            result.pop();
        }
    }
    result
}
