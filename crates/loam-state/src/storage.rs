//! Persistence primitive.
//!
//! The state engine never touches the filesystem directly; it goes through
//! the [`Storage`] trait so tests can substitute failing or in-memory
//! backends. [`FsStorage`] is the production implementation.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

/// Options for a single write.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Write to a temporary file in the target directory, then rename over
    /// the destination. A crash mid-write leaves the old file intact.
    pub atomic: bool,
    /// Create missing parent directories before writing.
    pub create_dirs: bool,
}

/// Narrow file-store interface consumed by the state engine.
pub trait Storage: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
    fn write(&self, path: &Path, bytes: &[u8], opts: WriteOptions) -> io::Result<()>;
    fn delete(&self, path: &Path) -> io::Result<()>;
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// Shared handle to a storage backend.
pub type SharedStorage = Arc<dyn Storage>;

/// Storage backed by the local filesystem.
pub struct FsStorage;

impl Storage for FsStorage {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, bytes: &[u8], opts: WriteOptions) -> io::Result<()> {
        if opts.create_dirs {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
        }
        if opts.atomic {
            // Temp file must live in the destination directory so the final
            // rename stays on one filesystem.
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
            tmp.write_all(bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(path).map_err(|e| e.error)?;
            Ok(())
        } else {
            fs::write(path, bytes)
        }
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::copy(from, to).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_creates_parents() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("a").join("b").join("state.json");
        let storage = FsStorage;

        storage
            .write(
                &path,
                b"{}",
                WriteOptions {
                    atomic: true,
                    create_dirs: true,
                },
            )
            .unwrap();

        assert!(storage.exists(&path));
        assert_eq!(storage.read(&path).unwrap(), b"{}");
    }

    #[test]
    fn atomic_write_replaces_existing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        let storage = FsStorage;
        let opts = WriteOptions {
            atomic: true,
            create_dirs: false,
        };

        storage.write(&path, b"old", opts).unwrap();
        storage.write(&path, b"new", opts).unwrap();
        assert_eq!(storage.read(&path).unwrap(), b"new");
    }

    #[test]
    fn copy_then_delete() {
        let tmp = tempfile::TempDir::new().unwrap();
        let a = tmp.path().join("a.json");
        let b = tmp.path().join("b.json");
        let storage = FsStorage;

        storage.write(&a, b"data", WriteOptions::default()).unwrap();
        storage.copy(&a, &b).unwrap();
        storage.delete(&a).unwrap();

        assert!(!storage.exists(&a));
        assert_eq!(storage.read(&b).unwrap(), b"data");
    }
}
