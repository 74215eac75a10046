//! Error taxonomy for a sanitizer run.
//!
//! Every variant is terminal: the pipeline never returns partial results, and a
//! sink only persists output after the whole run succeeded.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for sanitizer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can abort a run.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or incomplete configuration; raised before any processing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Input file could not be opened, mapped or read.
    #[error("failed to read source '{}': {source}", path.display())]
    SourceIo {
        /// Path of the input file
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Database connection or query execution failed.
    #[error("database error: {0}")]
    Connection(String),

    /// Input bytes are not valid UTF-8.
    #[error("invalid UTF-8 in '{}' at byte offset {offset}", path.display())]
    Encoding {
        /// Path of the input file
        path: PathBuf,
        /// Byte offset of the first invalid sequence
        offset: usize,
    },

    /// Output could not be created, written or persisted.
    #[error("failed to write sink '{}': {source}", path.display())]
    SinkIo {
        /// Destination path
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The run was cancelled before every chunk was dispatched.
    #[error("run cancelled")]
    Cancelled,

    /// The worker pool could not be built.
    #[error("worker pool error: {0}")]
    WorkerPool(String),
}

impl Error {
    pub(crate) fn source_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::SourceIo {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn sink_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::SinkIo {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_path() {
        let e = Error::source_io("in.txt", io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(e.to_string(), "failed to read source 'in.txt': gone");

        let e = Error::Encoding {
            path: "in.txt".into(),
            offset: 7,
        };
        assert_eq!(e.to_string(), "invalid UTF-8 in 'in.txt' at byte offset 7");
    }

    #[test]
    fn configuration_message() {
        let e = Error::Configuration("source must be either 'file' or 'db'".into());
        assert_eq!(
            e.to_string(),
            "configuration error: source must be either 'file' or 'db'"
        );
    }
}
