//! Content-addressable blob store.
//!
//! Blobs live at `<root>/<first two hex chars>/<full hex digest>`, raw bytes
//! with no sidecar. Writes are "create if absent": a blob that already exists
//! is left alone, and concurrent writers racing on the same digest each write
//! a private temporary file and rename it into place, so the final state is
//! the same whichever rename lands last.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::util::{is_sha256_hex, sha256_hex, write_atomic};

/// Digest and size of a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRef {
    pub digest: String,
    pub size_bytes: u64,
    /// False when an identical blob was already present.
    pub created: bool,
}

/// A blob store rooted at a directory.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the blob for `digest`.
    pub fn path_for(&self, digest: &str) -> PathBuf {
        let fan_out = digest.get(..2).unwrap_or(digest);
        self.root.join(fan_out).join(digest)
    }

    pub fn contains(&self, digest: &str) -> bool {
        is_sha256_hex(digest) && self.path_for(digest).is_file()
    }

    /// Read a stored blob back.
    pub fn read(&self, digest: &str) -> Result<Vec<u8>> {
        let path = self.path_for(digest);
        fs::read(&path).map_err(|e| Error::unreadable(path, e))
    }

    /// Hash and persist `bytes`.
    pub fn ingest(&self, bytes: &[u8]) -> Result<BlobRef> {
        let digest = sha256_hex(bytes);
        let path = self.path_for(&digest);
        let size_bytes = bytes.len() as u64;

        if let Ok(meta) = fs::metadata(&path)
            && meta.is_file()
            && meta.len() == size_bytes
        {
            debug!(%digest, "blob already present");
            return Ok(BlobRef {
                digest,
                size_bytes,
                created: false,
            });
        }

        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir).map_err(|source| Error::StoreUnwritable {
            path: dir.to_path_buf(),
            source,
        })?;

        write_atomic(&path, bytes).map_err(|source| Error::StoreWriteFailed {
            path: path.clone(),
            source,
        })?;

        debug!(%digest, size_bytes, "blob stored");
        Ok(BlobRef {
            digest,
            size_bytes,
            created: true,
        })
    }

    /// Read `source` and ingest its bytes.
    pub fn ingest_file(&self, source: &Path) -> Result<BlobRef> {
        let bytes = fs::read(source).map_err(|e| Error::unreadable(source, e))?;
        self.ingest(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_is_fanned_out_by_prefix() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path());
        let blob = store.ingest(b"abc").unwrap();

        assert_eq!(blob.digest.len(), 64);
        let expected = dir.path().join(&blob.digest[..2]).join(&blob.digest);
        assert_eq!(store.path_for(&blob.digest), expected);
        assert_eq!(fs::read(expected).unwrap(), b"abc");
    }

    #[test]
    fn test_ingest_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path());
        let first = store.ingest(b"In the beginning").unwrap();
        let second = store.ingest(b"In the beginning").unwrap();

        assert_eq!(first.digest, second.digest);
        assert!(first.created);
        assert!(!second.created);
        assert_eq!(store.read(&first.digest).unwrap(), b"In the beginning");
        assert!(store.contains(&first.digest));
    }

    #[test]
    fn test_unreadable_source() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path().join("store"));
        let err = store.ingest_file(&dir.path().join("missing.xml")).unwrap_err();
        assert!(matches!(err, Error::SourceUnreadable { .. }));
        assert!(err.to_string().starts_with("failed to read file"));
    }

    #[test]
    fn test_unwritable_store() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a dir").unwrap();
        let store = BlobStore::new(&blocker);
        let err = store.ingest(b"x").unwrap_err();
        assert!(matches!(err, Error::StoreUnwritable { .. }));
    }

    #[test]
    fn test_blob_write_failure_is_distinct() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path());
        let digest = sha256_hex(b"blocked");
        let occupied = store.path_for(&digest);
        fs::create_dir_all(occupied.join("inner")).unwrap();

        let err = store.ingest(b"blocked").unwrap_err();
        assert!(matches!(err, Error::StoreWriteFailed { .. }), "{}", err);
        assert!(occupied.is_dir());
    }

    #[test]
    fn test_concurrent_writers_agree() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = BlobStore::new(root.clone());
                std::thread::spawn(move || store.ingest(b"same content").unwrap().digest)
            })
            .collect();
        let digests: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(digests.windows(2).all(|w| w[0] == w[1]));

        let store = BlobStore::new(root);
        assert_eq!(store.read(&digests[0]).unwrap(), b"same content");
        let fan_dir = store.path_for(&digests[0]).parent().unwrap().to_path_buf();
        assert_eq!(fs::read_dir(fan_dir).unwrap().count(), 1);
    }
}
