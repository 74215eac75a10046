//! Pipeline: source → parallel sanitize + count → sink.
//!
//! One [`Pipeline::run`] performs the statistics pass on the [`Runner`], then
//! builds the normalized text stream according to the [`OutputStrategy`] and hands
//! both to the [`Sink`]. The sink is only invoked after the statistics pass
//! succeeded; any error aborts the run before output is committed.

use crate::combiners::AlphabetCount;
use crate::error::{Error, Result};
use crate::io::sink::{Sink, TextStream};
use crate::io::source::ChunkSource;
use crate::metrics::RunMetrics;
use crate::runner::Runner;
use crate::sanitizer::{Sanitizer, TabLowercase};
use crate::statistics::Statistics;
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, info};

/// How the normalized text reaching the sink is produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputStrategy {
    /// Replay the source and sanitize it again serially.
    #[default]
    Reread,
    /// Keep the sanitized chunks of the parallel pass and emit them in index order.
    Reassemble,
}

impl FromStr for OutputStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reread" => Ok(Self::Reread),
            "reassemble" => Ok(Self::Reassemble),
            other => Err(Error::Configuration(format!(
                "output strategy must be either 'reread' or 'reassemble', got '{other}'"
            ))),
        }
    }
}

/// Result of a completed run.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub statistics: Statistics,
    pub metrics: RunMetrics,
}

/// Normalized text and statistics of a processed source, before any sink sees them.
pub struct Processed<'a> {
    pub text: TextStream<'a>,
    pub statistics: Statistics,
    pub metrics: RunMetrics,
}

pub struct Pipeline {
    source: Box<dyn ChunkSource>,
    sink: Box<dyn Sink>,
    sanitizer: Box<dyn Sanitizer>,
    runner: Runner,
    output: OutputStrategy,
}

impl Pipeline {
    /// Pipeline with [`TabLowercase`], a default parallel runner, and [`OutputStrategy::Reread`].
    pub fn new(source: impl ChunkSource + 'static, sink: impl Sink + 'static) -> Self {
        Self {
            source: Box::new(source),
            sink: Box::new(sink),
            sanitizer: Box::new(TabLowercase),
            runner: Runner::default(),
            output: OutputStrategy::default(),
        }
    }

    #[must_use]
    pub fn with_sanitizer(mut self, sanitizer: impl Sanitizer + 'static) -> Self {
        self.sanitizer = Box::new(sanitizer);
        self
    }

    #[must_use]
    pub fn with_runner(mut self, runner: Runner) -> Self {
        self.runner = runner;
        self
    }

    #[must_use]
    pub fn with_output_strategy(mut self, output: OutputStrategy) -> Self {
        self.output = output;
        self
    }

    #[must_use]
    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    /// Compute statistics and the normalized text stream without writing anything.
    ///
    /// With [`OutputStrategy::Reread`] the returned stream reads the source again
    /// lazily; its items can therefore fail like the first pass could.
    ///
    /// # Errors
    ///
    /// Any error of the statistics pass.
    pub fn process(&self) -> Result<Processed<'_>> {
        let started = Instant::now();
        let keep_text = self.output == OutputStrategy::Reassemble;
        let reduced = self.runner.run::<_, Statistics, Statistics>(
            self.source.as_ref(),
            self.sanitizer.as_ref(),
            &AlphabetCount,
            keep_text,
        )?;
        let statistics = reduced.output;
        let metrics = RunMetrics {
            chunks: reduced.chunks,
            bytes_read: reduced.bytes_read,
            alphabetic_chars: statistics.total(),
            distinct_chars: statistics.len() as u64,
            workers: reduced.workers,
            process_time: started.elapsed(),
            ..Default::default()
        };
        info!(
            chunks = metrics.chunks,
            bytes = metrics.bytes_read,
            letters = metrics.alphabetic_chars,
            workers = metrics.workers,
            "statistics pass complete"
        );

        let text: TextStream<'_> = match self.output {
            OutputStrategy::Reassemble => Box::new(reduced.text.into_iter().map(Ok)),
            OutputStrategy::Reread => {
                debug!(source = %self.source.describe(), "replaying source for output");
                let sanitizer = self.sanitizer.as_ref();
                let chunks = self.source.read()?;
                Box::new(chunks.map(move |c| c.map(|c| sanitizer.sanitize(&c))))
            }
        };
        Ok(Processed {
            text,
            statistics,
            metrics,
        })
    }

    /// Process the source and write the result to the sink.
    ///
    /// # Errors
    ///
    /// Any source, worker pool, cancellation or sink error. Nothing is committed
    /// to the sink when an error is returned.
    pub fn run(&self) -> Result<RunReport> {
        let started = Instant::now();
        info!(source = %self.source.describe(), "run started");
        let Processed {
            text,
            statistics,
            mut metrics,
        } = self.process()?;
        metrics.bytes_written = self.sink.write(text, &statistics)?;
        metrics.total_time = started.elapsed();
        debug!(metrics = %metrics.to_json(), "run finished");
        Ok(RunReport {
            statistics,
            metrics,
        })
    }
}
