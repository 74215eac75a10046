//! Output sinks.
//!
//! The output document is the normalized chunks concatenated in source order,
//! then [`STATS_HEADER`], then one `"{char}: {count}\n"` line per entry of the
//! statistics in first-occurrence order.
//!
//! [`FileSink`] writes into a temporary file next to the destination and renames it
//! into place only after the whole document was written, so a failed run leaves
//! no output behind. With `echo` on, the persisted document is copied to stdout.

use crate::error::{Error, Result};
use crate::statistics::Statistics;
use std::fs::{create_dir_all, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tempfile::NamedTempFile;
use tracing::info;

/// Line separating the text from the statistics section.
pub const STATS_HEADER: &str = "\nCount of alphabet:\n";

/// Normalized text, one chunk per item, in source order.
pub type TextStream<'a> = Box<dyn Iterator<Item = Result<String>> + 'a>;

/// Destination for one run's normalized text and statistics.
pub trait Sink: Send + Sync {
    /// Consume `text` fully, then write `stats`. Returns the number of bytes written.
    ///
    /// The first `Err` from `text` aborts the write and is returned unchanged.
    fn write(&self, text: TextStream<'_>, stats: &Statistics) -> Result<u64>;
}

/// Write the full output document to `w`.
///
/// Errors from `text` are returned as-is; I/O failures from `w` are reported
/// through `io_err`.
pub fn write_document<W: Write>(
    w: &mut W,
    text: TextStream<'_>,
    stats: &Statistics,
    io_err: impl Fn(io::Error) -> Error,
) -> Result<u64> {
    let mut written = 0u64;
    for chunk in text {
        let chunk = chunk?;
        w.write_all(chunk.as_bytes()).map_err(&io_err)?;
        written += chunk.len() as u64;
    }
    w.write_all(STATS_HEADER.as_bytes()).map_err(&io_err)?;
    written += STATS_HEADER.len() as u64;
    for (c, n) in stats.iter() {
        let line = format!("{c}: {n}\n");
        w.write_all(line.as_bytes()).map_err(&io_err)?;
        written += line.len() as u64;
    }
    w.flush().map_err(&io_err)?;
    Ok(written)
}

/// Atomic file sink.
#[derive(Clone, Debug)]
pub struct FileSink {
    target: PathBuf,
    echo: bool,
}

impl FileSink {
    /// Sink writing to `target`, with stdout echo disabled.
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            echo: false,
        }
    }

    /// Also copy the persisted document to stdout.
    #[must_use]
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    fn echo_to_stdout(&self) -> Result<()> {
        let f = File::open(&self.target).map_err(|e| Error::sink_io(&self.target, e))?;
        let stdout = io::stdout();
        let mut out = stdout.lock();
        io::copy(&mut BufReader::new(f), &mut out).map_err(|e| Error::sink_io("<stdout>", e))?;
        out.flush().map_err(|e| Error::sink_io("<stdout>", e))
    }
}

impl Sink for FileSink {
    fn write(&self, text: TextStream<'_>, stats: &Statistics) -> Result<u64> {
        let target = &self.target;
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                create_dir_all(parent).map_err(|e| Error::sink_io(parent, e))?;
                parent.to_path_buf()
            }
            _ => PathBuf::from("."),
        };
        let tmp = NamedTempFile::new_in(&dir).map_err(|e| Error::sink_io(&dir, e))?;
        let mut w = BufWriter::new(tmp);
        let written = write_document(&mut w, text, stats, |e| Error::sink_io(target, e))?;
        let tmp = w
            .into_inner()
            .map_err(|e| Error::sink_io(target, e.into_error()))?;
        tmp.persist(target)
            .map_err(|e| Error::sink_io(target, e.error))?;
        info!(target = %target.display(), bytes = written, "output written");

        if self.echo {
            self.echo_to_stdout()?;
        }
        Ok(written)
    }
}

/// Captured document of an in-memory sink.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Captured {
    pub chunks: Vec<String>,
    pub statistics: Statistics,
    /// The rendered document, byte for byte what a [`FileSink`] would write.
    pub document: String,
}

impl Captured {
    /// The normalized text as one string.
    #[must_use]
    pub fn text(&self) -> String {
        self.chunks.concat()
    }
}

/// Sink that keeps the last written document in memory.
///
/// Clones share the same buffer, so a clone handed to a pipeline can be
/// inspected afterwards through the original.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<Option<Captured>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The captured document, or `None` if nothing was written successfully.
    #[must_use]
    pub fn captured(&self) -> Option<Captured> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Sink for MemorySink {
    fn write(&self, text: TextStream<'_>, stats: &Statistics) -> Result<u64> {
        let chunks = text.collect::<Result<Vec<_>>>()?;
        let mut buf = Vec::new();
        let replay: TextStream<'_> = Box::new(chunks.iter().cloned().map(Ok));
        let written = write_document(&mut buf, replay, stats, |e| Error::sink_io("<memory>", e))?;
        let document = String::from_utf8(buf).map_err(|e| {
            Error::sink_io("<memory>", io::Error::new(io::ErrorKind::InvalidData, e))
        })?;
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(Captured {
            chunks,
            statistics: stats.clone(),
            document,
        });
        Ok(written)
    }
}
