//! Memory-mapped file source.
//!
//! The file is mapped read-only and cut into windows of `chunk_size` bytes. A
//! window end that falls inside a multi-byte UTF-8 sequence is moved back to the
//! start of that character, so no character is ever split between two chunks.
//! When a window is smaller than the character at its start, it grows forward to
//! hold that one character instead. Bytes that are not valid UTF-8 surface as
//! [`Error::Encoding`] with the absolute offset of the bad sequence.
//!
//! Each [`read`](ChunkSource::read) maps the file again, so a replay observes the
//! file as it is at that moment.

use crate::error::{Error, Result};
use crate::io::source::{Chunk, ChunkSource, Chunks};
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default window size: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Chunked reader over a UTF-8 text file.
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
    chunk_size: usize,
}

impl FileSource {
    /// Source over `path` using [`DEFAULT_CHUNK_SIZE`] windows.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the window size in bytes. A size of zero is treated as one.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn map(&self) -> Result<Option<Mmap>> {
        let file = File::open(&self.path).map_err(|e| Error::source_io(&self.path, e))?;
        let len = file
            .metadata()
            .map_err(|e| Error::source_io(&self.path, e))?
            .len();
        if len == 0 {
            return Ok(None);
        }
        // SAFETY: the mapping is read-only; the file must not be truncated while a
        // traversal is in progress.
        let mmap = unsafe { MmapOptions::new().map(&file) }
            .map_err(|e| Error::source_io(&self.path, e))?;
        Ok(Some(mmap))
    }
}

impl ChunkSource for FileSource {
    fn read(&self) -> Result<Chunks<'_>> {
        let Some(mmap) = self.map()? else {
            debug!(path = %self.path.display(), "empty input file");
            return Ok(Box::new(std::iter::empty()));
        };
        debug!(
            path = %self.path.display(),
            bytes = mmap.len(),
            chunk_size = self.chunk_size,
            "mapped input file"
        );
        Ok(Box::new(FileChunks {
            mmap,
            path: &self.path,
            pos: 0,
            chunk_size: self.chunk_size,
        }))
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

struct FileChunks<'a> {
    mmap: Mmap,
    path: &'a Path,
    pos: usize,
    chunk_size: usize,
}

impl Iterator for FileChunks<'_> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes: &[u8] = &self.mmap;
        if self.pos >= bytes.len() {
            return None;
        }
        let start = self.pos;
        let end = char_boundary(bytes, start, start.saturating_add(self.chunk_size));
        match std::str::from_utf8(&bytes[start..end]) {
            Ok(s) => {
                self.pos = end;
                Some(Ok(s.to_owned()))
            }
            Err(e) => {
                self.pos = bytes.len();
                Some(Err(Error::Encoding {
                    path: self.path.to_path_buf(),
                    offset: start + e.valid_up_to(),
                }))
            }
        }
    }
}

#[inline]
const fn is_continuation(b: u8) -> bool {
    b & 0xC0 == 0x80
}

/// Largest character boundary in `(start, target]`, or the first boundary after
/// `target` when the window holds no complete character.
fn char_boundary(bytes: &[u8], start: usize, target: usize) -> usize {
    if target >= bytes.len() {
        return bytes.len();
    }
    // Valid UTF-8 has at most three continuation bytes before a lead byte.
    let mut end = target;
    while end > start && target - end < 3 && is_continuation(bytes[end]) {
        end -= 1;
    }
    if end > start && !is_continuation(bytes[end]) {
        return end;
    }
    let mut end = target;
    while end < bytes.len() && is_continuation(bytes[end]) {
        end += 1;
    }
    end
}
