//! Error types for fv3restart

use std::path::PathBuf;
use thiserror::Error;

/// Result type for restart loading and distribution
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for restart loading and distribution
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem failure on a specific path.
    ///
    /// A missing required restart file surfaces here with
    /// [`std::io::ErrorKind::NotFound`].
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path that was being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Total rank count cannot be split evenly across the six tiles
    #[error("total_ranks must be evenly divisible by 6, was given {0}")]
    InvalidRankCount(usize),

    /// Rank outside the communicator or partitioner
    #[error("Invalid rank: {rank} (size {size})")]
    InvalidRank {
        /// Offending rank
        rank: usize,
        /// Number of ranks available
        size: usize,
    },

    /// Array has fewer dimensions than names were supplied
    #[error("cannot apply {expected} dimension names to an array with {actual} dimensions")]
    DimensionMismatch {
        /// Number of names requested
        expected: usize,
        /// Number of dimensions present
        actual: usize,
    },

    /// Data length does not match the declared shape
    #[error("shape {shape:?} needs {expected} elements, got {actual}")]
    ShapeMismatch {
        /// Declared shape
        shape: Vec<usize>,
        /// Element count implied by the shape
        expected: usize,
        /// Element count provided
        actual: usize,
    },

    /// Byte payload is not a whole number of elements
    #[error("payload of {len} bytes is not a multiple of element width {width}")]
    TruncatedPayload {
        /// Payload length in bytes
        len: usize,
        /// Element width in bytes
        width: usize,
    },

    /// Field has no `units` attribute
    #[error("field {0} has no units attribute")]
    MissingUnits(String),

    /// Field name is not known to the model or property tables
    #[error("unknown field name: {0}")]
    UnknownName(String),

    /// Malformed `coupler.res` contents
    #[error("invalid coupler.res: {0}")]
    CouplerRes(String),

    /// Failed to encode or decode a broadcast payload
    #[error("wire encoding error: {0}")]
    Wire(#[from] bincode::Error),

    /// Failed to parse a property table
    #[error("invalid property table: {0}")]
    PropertyTable(#[from] serde_json::Error),

    /// Root rank called a broadcast without a value
    #[error("root rank {0} did not supply a value to broadcast")]
    MissingRootValue(usize),

    /// A peer rank exited before completing a collective
    #[error("communicator peer {0} disconnected")]
    Disconnected(usize),

    /// Communicator failure reported by the MPI backend
    #[error("communicator error: {0}")]
    Comm(String),

    /// Crate was built without the `netcdf` feature
    #[error("NetCDF support is not available (enable the `netcdf` feature)")]
    NetCdfUnavailable,

    /// NetCDF library error
    #[error("NetCDF error on {path}: {message}")]
    NetCdf {
        /// File being read
        path: PathBuf,
        /// Library message
        message: String,
    },

    /// Model was queried before `initialize`
    #[error("model is not initialized")]
    NotInitialized,

    /// A model state or metadata check failed
    #[error("check failed: {0}")]
    Check(String),
}

impl Error {
    /// Wrap an I/O error together with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a not-found error for `path`, as the native filesystem would.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let source = std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no such file: {}", path.display()),
        );
        Error::Io { path, source }
    }

    /// Check whether this error means a file did not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
