//! The [`ChunkSource`] capability.

use crate::error::Result;

/// One fragment of input text. Its identity is its position in the sequence.
pub type Chunk = String;

/// Ordered, fallible chunk stream borrowed from a source.
pub type Chunks<'a> = Box<dyn Iterator<Item = Result<Chunk>> + Send + 'a>;

/// A replayable producer of text chunks.
///
/// Every call to [`read`](ChunkSource::read) starts over and must yield the same
/// ordered sequence, because a run may traverse the source twice (once for
/// statistics, once for output). Errors end the sequence: callers stop at the
/// first `Err`.
pub trait ChunkSource: Send + Sync {
    /// Start a fresh traversal.
    fn read(&self) -> Result<Chunks<'_>>;

    /// Short human-readable description used in logs.
    fn describe(&self) -> String;
}

impl<S: ChunkSource + ?Sized> ChunkSource for Box<S> {
    fn read(&self) -> Result<Chunks<'_>> {
        (**self).read()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<S: ChunkSource + ?Sized> ChunkSource for std::sync::Arc<S> {
    fn read(&self) -> Result<Chunks<'_>> {
        (**self).read()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
