//! # textbeam
//!
//! A small batch pipeline that normalizes text and counts its letters.
//!
//! A [`ChunkSource`] (a file read through a memory map, or the rows of a SQL
//! query) yields ordered chunks. A [`Runner`] fans them out to a pool of workers
//! that sanitize each chunk with a [`Sanitizer`] and count its alphabetic
//! characters. Partial [`Statistics`] are merged in chunk order, so results do not
//! depend on scheduling. A [`Sink`] finally writes the document:
//!
//! ```text
//! <normalized text>
//! Count of alphabet:
//! h: 1
//! e: 1
//! ...
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use textbeam::{FileSink, FileSource, Pipeline, Runner};
//!
//! # fn main() -> textbeam::Result<()> {
//! let report = Pipeline::new(FileSource::new("input.txt"), FileSink::new("out/report.txt"))
//!     .with_runner(Runner::parallel(Some(4)))
//!     .run()?;
//! println!("{} letters", report.statistics.total());
//! # Ok(())
//! # }
//! ```
//!
//! ## Sanitizing
//!
//! [`TabLowercase`] lowercases every character and replaces each tab with four
//! underscores. Any `Fn(&str) -> String + Send + Sync` is a [`Sanitizer`] too:
//!
//! ```
//! use textbeam::{Sanitizer, TabLowercase};
//!
//! assert_eq!(TabLowercase.sanitize("Hello\tWorld"), "hello____world");
//! let upper = |s: &str| s.to_uppercase();
//! assert_eq!(upper.sanitize("abc"), "ABC");
//! ```
//!
//! ## Counting
//!
//! ```
//! use textbeam::{count_alphabetic, merge};
//!
//! let stats = merge(count_alphabetic("Hello"), count_alphabetic("World"));
//! assert_eq!(stats.get('l'), 3);
//! assert_eq!(stats.iter().next(), Some(('h', 1)));
//! ```
//!
//! ## Features
//!
//! - `db-postgres` (default): [`PgClient`], a PostgreSQL [`RowClient`] built on `sqlx`.

pub mod combiners;
pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod runner;
pub mod sanitizer;
pub mod statistics;
pub mod testing;

pub use combiners::{AlphabetCount, CombineFn};
pub use config::{Config, ConfigFile, DbConnection, Settings, SourceConfig};
pub use error::{Error, Result};
pub use io::db::{DatabaseSource, Row, RowClient};
pub use io::file::FileSource;
pub use io::sink::{FileSink, MemorySink, Sink};
pub use io::source::{Chunk, ChunkSource, Chunks};
pub use metrics::RunMetrics;
pub use pipeline::{OutputStrategy, Pipeline, RunReport};
pub use runner::{CancelToken, ExecMode, Runner};
pub use sanitizer::{Sanitizer, TabLowercase};
pub use statistics::{count_alphabetic, merge, Statistics};

#[cfg(feature = "db-postgres")]
pub use io::postgres::PgClient;
