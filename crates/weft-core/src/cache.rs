//! Content-addressed cache for compiled template binaries.
//!
//! The key is a SHA-256 over the generated source followed by every
//! imported file's contents in import order, hex-encoded so it is safe as
//! a filename. The store keeps one artifact file per key under its root;
//! inserts go through a temp file and an atomic rename, so a failed build
//! can never populate a slot and concurrent misses converge on identical
//! bytes.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::Result;

/// Derive the cache key for a generated program and its imports.
///
/// Import file contents are read here, at key-derivation time, so any
/// single-byte change in an imported file changes the key even when the
/// generated source is unchanged.
pub fn derive_key(source: &str, imports: &[PathBuf]) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    for path in imports {
        hasher.update(std::fs::read(path)?);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// A keyed multi-entry store of compiled binaries at `root/<key>`.
#[derive(Debug, Clone)]
pub struct BinaryCache {
    root: PathBuf,
}

impl BinaryCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the cached binary for `key`, if present.
    pub fn lookup(&self, key: &str) -> Option<PathBuf> {
        let slot = self.root.join(key);
        slot.is_file().then_some(slot)
    }

    /// Store `binary` under `key`, returning the cached path.
    ///
    /// Copies into a temp file beside the slot and renames it into place;
    /// the rename stays on one filesystem so it is atomic.
    pub fn insert(&self, key: &str, binary: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.root)?;
        let staging = self.root.join(format!(".stage-{key}-{}", std::process::id()));
        std::fs::copy(binary, &staging)?;
        let slot = self.root.join(key);
        std::fs::rename(&staging, &slot)?;
        tracing::debug!(key, slot = %slot.display(), "cached binary");
        Ok(slot)
    }
}
