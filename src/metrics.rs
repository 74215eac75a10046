//! Run metrics.
//!
//! [`RunMetrics`] records what one run processed. It is filled by the runner and
//! the pipeline, logged at `debug` level when a run finishes, and can be saved as
//! pretty JSON (`--metrics PATH` on the command line).
//!
//! ```no_run
//! use textbeam::metrics::RunMetrics;
//!
//! # fn main() -> textbeam::Result<()> {
//! let mut m = RunMetrics::default();
//! m.chunks = 3;
//! m.save_to_file("metrics.json")?;
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunMetrics {
    /// Chunks taken from the source during the statistics pass.
    pub chunks: u64,
    /// Raw input bytes in those chunks.
    pub bytes_read: u64,
    /// Bytes the sink wrote, header and statistics included.
    pub bytes_written: u64,
    /// Sum of all statistics counts.
    pub alphabetic_chars: u64,
    /// Distinct characters in the statistics.
    pub distinct_chars: u64,
    /// Worker count; 1 for sequential runs.
    pub workers: usize,
    /// Wall time of the statistics pass.
    #[serde(rename = "process_time_ms", serialize_with = "as_millis")]
    pub process_time: Duration,
    /// Wall time of the whole run, sink included.
    #[serde(rename = "total_time_ms", serialize_with = "as_millis")]
    pub total_time: Duration,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

impl RunMetrics {
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!(self)
    }

    /// Save as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SinkIo`] if the file cannot be created or written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let f = File::create(path).map_err(|e| Error::sink_io(path, e))?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, &self.to_json())
            .map_err(|e| Error::sink_io(path, e.into()))?;
        w.write_all(b"\n").map_err(|e| Error::sink_io(path, e))?;
        w.flush().map_err(|e| Error::sink_io(path, e))
    }
}
