//! Error types for bibleir operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while ingesting, extracting or emitting a corpus.
///
/// Detection never produces one of these for file problems; see
/// [`Detection`](crate::adapter::Detection).
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read file: {}: {source}", path.display())]
    SourceUnreadable { path: PathBuf, source: io::Error },

    #[error("failed to create blob dir: {}: {source}", path.display())]
    StoreUnwritable { path: PathBuf, source: io::Error },

    #[error("failed to write blob: {}: {source}", path.display())]
    StoreWriteFailed { path: PathBuf, source: io::Error },

    #[error("failed to write output: {}: {source}", path.display())]
    OutputUnwritable { path: PathBuf, source: io::Error },

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("malformed IR: {0}")]
    MalformedIr(String),

    #[error("{format} does not support {operation}")]
    Unsupported {
        format: &'static str,
        operation: &'static str,
    },

    #[error("unknown format: {0}")]
    UnknownFormat(String),
}

impl Error {
    pub(crate) fn unreadable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::SourceUnreadable {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unwritable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::OutputUnwritable {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
