//! Filesystem abstraction used by the restart loader.
//!
//! The loader only needs three operations: test whether a file exists, read
//! a small text file (`coupler.res`) and open a restart file as a
//! [`Dataset`]. [`LocalFileSystem`] serves local paths; [`MemoryFileSystem`]
//! holds datasets in memory for tests and demos. Other stores (object
//! storage, archives) can implement [`FileSystem`] directly.
//!
//! Implementations must be `Sync`: when ranks run as threads of one process
//! they share a single instance.

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Storage the restart loader reads from.
pub trait FileSystem: Sync {
    /// Whether `path` names an existing regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Read a whole file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Open a restart file.
    ///
    /// A missing file yields an [`Error::Io`] of kind `NotFound`.
    fn open_dataset(&self, path: &Path) -> Result<Dataset>;
}

/// The local filesystem.
///
/// Datasets are read with the NetCDF library when the `netcdf` feature is
/// enabled; without it [`open_dataset`](FileSystem::open_dataset) returns
/// [`Error::NetCdfUnavailable`] for files that exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| Error::io(path, e))
    }

    fn open_dataset(&self, path: &Path) -> Result<Dataset> {
        // Surface the native not-found error before involving the NetCDF layer
        std::fs::metadata(path).map_err(|e| Error::io(path, e))?;
        open_netcdf(path)
    }
}

#[cfg(feature = "netcdf")]
fn open_netcdf(path: &Path) -> Result<Dataset> {
    crate::netcdf_reader::read_dataset(path)
}

#[cfg(not(feature = "netcdf"))]
fn open_netcdf(_path: &Path) -> Result<Dataset> {
    Err(Error::NetCdfUnavailable)
}

#[derive(Debug, Clone)]
enum Entry {
    Dataset(Dataset),
    Text(String),
}

/// An in-memory filesystem.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    entries: RwLock<IndexMap<PathBuf, Entry>>,
}

impl MemoryFileSystem {
    /// Create an empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a dataset at `path`.
    pub fn insert_dataset(&self, path: impl Into<PathBuf>, dataset: Dataset) {
        self.write().insert(path.into(), Entry::Dataset(dataset));
    }

    /// Store a text file at `path`.
    pub fn insert_text(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.write().insert(path.into(), Entry::Text(text.into()));
    }

    /// Remove whatever is stored at `path`.
    pub fn remove(&self, path: &Path) -> bool {
        self.write().shift_remove(path).is_some()
    }

    /// All stored paths, in insertion order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.read().keys().cloned().collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, IndexMap<PathBuf, Entry>> {
        // Poisoning leaves the map intact
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, IndexMap<PathBuf, Entry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    fn get(&self, path: &Path) -> Result<Entry> {
        self.read()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::not_found(path))
    }
}

impl FileSystem for MemoryFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        self.read().contains_key(path)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        match self.get(path)? {
            Entry::Text(text) => Ok(text),
            Entry::Dataset(_) => Err(Error::io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, "not a text file"),
            )),
        }
    }

    fn open_dataset(&self, path: &Path) -> Result<Dataset> {
        match self.get(path)? {
            Entry::Dataset(dataset) => Ok(dataset),
            Entry::Text(_) => Err(Error::io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, "not a dataset"),
            )),
        }
    }
}
