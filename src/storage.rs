//! Where source images are read from and outputs written to.
//!
//! The pipeline never touches the filesystem directly; it goes through a
//! [`Storage`] keyed by `/`-separated names. [`FsStorage`] maps those names
//! under a root directory.

use crate::error::{Result, ThumbnailError};
use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

/// Storage backend for source images and generated outputs.
pub trait Storage: Send + Sync {
    /// Open `name` for reading.
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>>;

    /// Write `bytes` to `name`, replacing any existing content.
    fn save(&self, name: &str, bytes: &[u8]) -> io::Result<()>;

    /// Remove `name`. Missing names report `NotFound`.
    fn delete(&self, name: &str) -> io::Result<()>;

    fn exists(&self, name: &str) -> bool;
}

/// Read a whole source image. The stream is dropped before returning.
pub fn read_source<S: Storage + ?Sized>(storage: &S, name: &str) -> Result<Vec<u8>> {
    let mut reader = storage.open(name).map_err(|e| ThumbnailError::storage(name, e))?;
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| ThumbnailError::storage(name, e))?;
    Ok(bytes)
}

/// Filesystem storage rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a storage name to a path under the root. Names that would
    /// escape the root are rejected.
    pub fn path(&self, name: &str) -> io::Result<PathBuf> {
        let relative = Path::new(name.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("`{name}` escapes the storage root"),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl Storage for FsStorage {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + Send>> {
        let file = fs::File::open(self.path(name)?)?;
        Ok(Box::new(io::BufReader::new(file)))
    }

    fn save(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self.path(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)
    }

    fn delete(&self, name: &str) -> io::Result<()> {
        fs::remove_file(self.path(name)?)
    }

    fn exists(&self, name: &str) -> bool {
        self.path(name).map(|p| p.is_file()).unwrap_or(false)
    }
}
