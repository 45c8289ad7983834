//! Byte-level persistence for serialized activity state.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Where the recorder keeps its serialized state.
pub trait StateStore {
    /// Returns the stored blob, or `None` if nothing was saved yet.
    fn read(&self) -> io::Result<Option<Vec<u8>>>;

    /// Replaces the stored blob.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Keeps a copy of a blob that is about to be restored or replaced.
    fn backup(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// Appends `suffix` to the final path component.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// A state file on disk with a `.bak` sibling for backups.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        with_suffix(&self.path, ".bak")
    }

    fn ensure_parent(&self) -> io::Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }
}

impl StateStore for FileStore {
    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Writes through a temporary sibling so a crash never leaves a torn file.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.ensure_parent()?;
        let tmp = with_suffix(&self.path, ".tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = ?self.path, bytes = bytes.len(), "wrote activity state");
        Ok(())
    }

    fn backup(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.ensure_parent()?;
        let backup = self.backup_path();
        fs::write(&backup, bytes)?;
        tracing::debug!(path = ?backup, "backed up activity state");
        Ok(())
    }
}

/// In-memory store for hosts that persist elsewhere, and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub state: Option<Vec<u8>>,
    pub backups: Vec<Vec<u8>>,
}

impl StateStore for MemoryStore {
    fn read(&self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.state.clone())
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.state = Some(bytes.to_vec());
        Ok(())
    }

    fn backup(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.backups.push(bytes.to_vec());
        Ok(())
    }
}
