//! Testing utilities for textbeam pipelines.
//!
//! - **Sources**: [`VecSource`] replays fixed chunks, [`FailingSource`] breaks
//!   after a given number of chunks.
//! - **Database**: [`StaticRowClient`] stands in for a real connection.
//! - **Scheduling**: [`Staggered`] delays chunks unevenly so workers finish out
//!   of order.
//! - **Sinks**: [`MemorySink`] captures the written document.
//! - **Files**: [`TempFilePath`], [`TempDirPath`] and [`text_file`].
//!
//! # Quick Start
//!
//! ```
//! use textbeam::testing::*;
//! use textbeam::{OutputStrategy, Runner};
//!
//! # fn main() -> textbeam::Result<()> {
//! let (doc, _) = run_to_memory(
//!     VecSource::new(["Hello\t", "World"]),
//!     Runner::parallel(Some(2)),
//!     OutputStrategy::Reread,
//! )?;
//! assert_eq!(doc.text(), "hello____world");
//! assert_eq!(doc.statistics.get('l'), 3);
//! # Ok(())
//! # }
//! ```

pub mod mock_io;

pub use crate::io::sink::{Captured, MemorySink};
pub use mock_io::*;

use crate::error::{Error, Result};
use crate::io::db::{Row, RowClient};
use crate::io::source::{ChunkSource, Chunks};
use crate::pipeline::{OutputStrategy, Pipeline, RunReport};
use crate::runner::Runner;
use crate::sanitizer::Sanitizer;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Replayable in-memory source.
#[derive(Debug, Default)]
pub struct VecSource {
    chunks: Vec<String>,
    reads: AtomicUsize,
}

impl VecSource {
    pub fn new<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            reads: AtomicUsize::new(0),
        }
    }

    /// How many traversals have been started.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl ChunkSource for VecSource {
    fn read(&self) -> Result<Chunks<'_>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.chunks.iter().cloned().map(Ok)))
    }

    fn describe(&self) -> String {
        format!("{} in-memory chunks", self.chunks.len())
    }
}

/// Source that yields `ok` chunks, then a [`Error::SourceIo`].
#[derive(Debug)]
pub struct FailingSource {
    chunks: Vec<String>,
}

impl FailingSource {
    #[must_use]
    pub fn after(ok: usize) -> Self {
        Self {
            chunks: (0..ok).map(|i| format!("Chunk{i}\t")).collect(),
        }
    }
}

impl ChunkSource for FailingSource {
    fn read(&self) -> Result<Chunks<'_>> {
        let fail = std::iter::once_with(|| {
            Err(Error::SourceIo {
                path: "<failing>".into(),
                source: std::io::Error::other("injected failure"),
            })
        });
        Ok(Box::new(self.chunks.iter().cloned().map(Ok).chain(fail)))
    }

    fn describe(&self) -> String {
        "failing source".to_string()
    }
}

/// [`RowClient`] answering every query with fixed rows or a fixed connection error.
#[derive(Clone, Debug)]
pub struct StaticRowClient {
    rows: std::result::Result<Vec<Row>, String>,
}

impl StaticRowClient {
    #[must_use]
    pub fn rows(rows: Vec<Row>) -> Self {
        Self { rows: Ok(rows) }
    }

    #[must_use]
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            rows: Err(message.into()),
        }
    }
}

impl RowClient for StaticRowClient {
    fn fetch_rows(&self, _query: &str) -> Result<Vec<Row>> {
        self.rows.clone().map_err(Error::Connection)
    }

    fn endpoint(&self) -> String {
        "static://rows".to_string()
    }
}

/// Wraps a sanitizer and sleeps before each chunk, longer for chunks whose byte
/// length is larger modulo 4.
#[derive(Clone, Copy, Debug)]
pub struct Staggered<S> {
    inner: S,
    step: Duration,
}

impl<S: Sanitizer> Staggered<S> {
    pub fn new(inner: S, step: Duration) -> Self {
        Self { inner, step }
    }
}

impl<S: Sanitizer> Sanitizer for Staggered<S> {
    fn sanitize(&self, chunk: &str) -> String {
        let factor = u32::try_from(chunk.len() % 4).unwrap_or(0);
        std::thread::sleep(self.step * factor);
        self.inner.sanitize(chunk)
    }
}

/// Run a pipeline into a [`MemorySink`] and return what it captured.
///
/// # Errors
///
/// Any error of [`Pipeline::run`], or [`Error::SinkIo`] if the run succeeded but
/// nothing was captured.
pub fn run_to_memory(
    source: impl ChunkSource + 'static,
    runner: Runner,
    output: OutputStrategy,
) -> Result<(Captured, RunReport)> {
    let sink = MemorySink::new();
    let report = Pipeline::new(source, sink.clone())
        .with_runner(runner)
        .with_output_strategy(output)
        .run()?;
    let captured = sink.captured().ok_or_else(|| Error::SinkIo {
        path: "<memory>".into(),
        source: std::io::Error::other("nothing captured"),
    })?;
    Ok((captured, report))
}

/// The expected output document for `text` and `(char, count)` lines.
#[must_use]
pub fn document(text: &str, counts: &[(char, u64)]) -> String {
    let mut doc = format!("{text}\nCount of alphabet:\n");
    for (c, n) in counts {
        doc.push_str(&format!("{c}: {n}\n"));
    }
    doc
}
