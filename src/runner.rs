//! Execution engine for the statistics pass.
//!
//! [`Runner::run`] pulls chunks from a [`ChunkSource`], sanitizes each one, builds
//! a per-chunk accumulator with a [`CombineFn`], and folds all accumulators into a
//! single result.
//!
//! # Parallel mode
//!
//! ```text
//! caller thread            rayon pool (N workers)          reducer thread
//! source.read() ──send──▶ [bounded task queue] ──▶ sanitize + add_input
//!                                                      │
//!                                                      └──send──▶ reorder buffer ─▶ merge
//! ```
//!
//! - The caller thread is the only producer. The task queue is bounded, so at
//!   most `queue_depth` chunks wait for a worker and memory stays flat on large
//!   inputs.
//! - Workers share nothing but the queue and the result channel.
//! - The reducer is the only owner of the accumulator. It merges partials in
//!   chunk-index order, holding early arrivals until their predecessors land, so
//!   the result (enumeration order included) is the same for every schedule.
//! - The pool lives for one call. All workers have finished and the reducer is
//!   joined before `run` returns, on success and on error.
//!
//! On a source error or cancellation the producer stops dispatching, queued
//! chunks are still processed, and the error is returned once everything drained.

use crate::combiners::CombineFn;
use crate::error::{Error, Result};
use crate::io::source::{Chunk, ChunkSource, Chunks};
use crate::sanitizer::Sanitizer;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecMode {
    Sequential,
    /// `threads: None` uses one worker per available core.
    Parallel { threads: Option<usize> },
}

/// Shared flag that stops dispatch of further chunks.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Runner {
    pub mode: ExecMode,
    /// Bound of the task queue; `None` means twice the worker count.
    pub queue_depth: Option<usize>,
    pub cancel: CancelToken,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            mode: ExecMode::Parallel { threads: None },
            queue_depth: None,
            cancel: CancelToken::default(),
        }
    }
}

/// Outcome of one pass.
#[derive(Debug)]
pub struct Reduced<O> {
    pub output: O,
    /// Sanitized chunks in source order; empty unless requested.
    pub text: Vec<String>,
    pub chunks: u64,
    pub bytes_read: u64,
    pub workers: usize,
}

type Task = (usize, Chunk);

struct Partial<A> {
    index: usize,
    acc: A,
    text: Option<String>,
}

struct Reduction<A> {
    acc: A,
    text: Vec<String>,
}

impl Runner {
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            mode: ExecMode::Sequential,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn parallel(threads: Option<usize>) -> Self {
        Self {
            mode: ExecMode::Parallel { threads },
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = Some(depth);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Number of workers this runner uses.
    #[must_use]
    pub fn workers(&self) -> usize {
        match self.mode {
            ExecMode::Sequential => 1,
            ExecMode::Parallel { threads } => threads.unwrap_or_else(num_cpus::get).max(1),
        }
    }

    /// Sanitize and combine every chunk of `source`.
    ///
    /// With `keep_text`, the sanitized chunks are returned in source order.
    ///
    /// # Errors
    ///
    /// Returns the first source error, [`Error::Cancelled`] if the token was set
    /// before all chunks were dispatched, or [`Error::WorkerPool`] if the pool
    /// could not be built.
    pub fn run<C, A, O>(
        &self,
        source: &dyn ChunkSource,
        sanitizer: &dyn Sanitizer,
        comb: &C,
        keep_text: bool,
    ) -> Result<Reduced<O>>
    where
        C: CombineFn<str, A, O>,
        A: Send,
    {
        let chunks = source.read()?;
        match self.mode {
            ExecMode::Sequential => self.exec_seq(chunks, sanitizer, comb, keep_text),
            ExecMode::Parallel { .. } => {
                self.exec_parallel(self.workers(), chunks, sanitizer, comb, keep_text)
            }
        }
    }

    fn check_cancel(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            warn!("cancelled; no further chunks dispatched");
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    fn exec_seq<C, A, O>(
        &self,
        chunks: Chunks<'_>,
        sanitizer: &dyn Sanitizer,
        comb: &C,
        keep_text: bool,
    ) -> Result<Reduced<O>>
    where
        C: CombineFn<str, A, O>,
    {
        let mut acc = comb.create();
        let mut text = Vec::new();
        let (mut n, mut bytes) = (0u64, 0u64);
        for chunk in chunks {
            self.check_cancel()?;
            let chunk = chunk?;
            n += 1;
            bytes += chunk.len() as u64;
            let clean = sanitizer.sanitize(&chunk);
            comb.add_input(&mut acc, &clean);
            if keep_text {
                text.push(clean);
            }
        }
        Ok(Reduced {
            output: comb.finish(acc),
            text,
            chunks: n,
            bytes_read: bytes,
            workers: 1,
        })
    }

    fn exec_parallel<C, A, O>(
        &self,
        workers: usize,
        chunks: Chunks<'_>,
        sanitizer: &dyn Sanitizer,
        comb: &C,
        keep_text: bool,
    ) -> Result<Reduced<O>>
    where
        C: CombineFn<str, A, O>,
        A: Send,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("textbeam-worker-{i}"))
            .build()
            .map_err(|e| Error::WorkerPool(e.to_string()))?;
        let depth = self.queue_depth.unwrap_or(2 * workers).max(1);
        debug!(workers, queue_depth = depth, "worker pool started");

        let (task_tx, task_rx) = mpsc::sync_channel::<Task>(depth);
        let task_rx = Mutex::new(task_rx);
        let (part_tx, part_rx) = mpsc::channel::<Partial<A>>();
        let cancel = &self.cancel;

        let (dispatched, reduction) = std::thread::scope(|ts| {
            let reducer = ts.spawn(move || reduce_in_order::<C, A, O>(part_rx, comb));
            let tasks = &task_rx;
            let dispatched = pool.in_place_scope(move |s| {
                for _ in 0..workers {
                    let out = part_tx.clone();
                    s.spawn(move |_| {
                        work::<C, A, O>(tasks, &out, sanitizer, comb, keep_text, cancel);
                    });
                }
                drop(part_tx);
                self.dispatch(chunks, task_tx)
            });
            (dispatched, reducer.join())
        });
        drop(pool);
        debug!("worker pool drained");

        let reduction = reduction.map_err(|_| Error::WorkerPool("reducer panicked".into()))?;
        let (n, bytes) = dispatched?;
        Ok(Reduced {
            output: comb.finish(reduction.acc),
            text: reduction.text,
            chunks: n,
            bytes_read: bytes,
            workers,
        })
    }

    /// Feed the task queue until the source ends, fails, or the run is cancelled.
    /// Dropping `tasks` on return closes the queue.
    fn dispatch(&self, chunks: Chunks<'_>, tasks: SyncSender<Task>) -> Result<(u64, u64)> {
        let (mut n, mut bytes) = (0u64, 0u64);
        for (index, chunk) in chunks.enumerate() {
            self.check_cancel()?;
            let chunk = chunk?;
            n += 1;
            bytes += chunk.len() as u64;
            debug!(index, bytes = chunk.len(), "dispatch");
            tasks
                .send((index, chunk))
                .map_err(|_| Error::WorkerPool("all workers exited".into()))?;
        }
        Ok((n, bytes))
    }
}

/// Worker loop: take chunks until the queue closes.
fn work<C, A, O>(
    tasks: &Mutex<Receiver<Task>>,
    out: &Sender<Partial<A>>,
    sanitizer: &dyn Sanitizer,
    comb: &C,
    keep_text: bool,
    cancel: &CancelToken,
) where
    C: CombineFn<str, A, O>,
{
    let _guard = DrainOnPanic { tasks, cancel };
    loop {
        let task = tasks.lock().unwrap_or_else(PoisonError::into_inner).recv();
        let Ok((index, chunk)) = task else { break };
        let clean = sanitizer.sanitize(&chunk);
        let mut acc = comb.create();
        comb.add_input(&mut acc, &clean);
        let text = keep_text.then_some(clean);
        if out.send(Partial { index, acc, text }).is_err() {
            break;
        }
    }
}

/// Keeps a blocked producer from waiting forever on a queue nobody consumes when
/// a worker panics: stops dispatch and discards what is left.
struct DrainOnPanic<'a> {
    tasks: &'a Mutex<Receiver<Task>>,
    cancel: &'a CancelToken,
}

impl Drop for DrainOnPanic<'_> {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            return;
        }
        self.cancel.cancel();
        while self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv()
            .is_ok()
        {}
    }
}

/// Merge partials in index order, regardless of arrival order.
fn reduce_in_order<C, A, O>(parts: Receiver<Partial<A>>, comb: &C) -> Reduction<A>
where
    C: CombineFn<str, A, O>,
{
    let mut acc = comb.create();
    let mut text = Vec::new();
    let mut pending: BTreeMap<usize, Partial<A>> = BTreeMap::new();
    let mut next = 0usize;

    let mut fold = |p: Partial<A>, acc: &mut A| {
        comb.merge(acc, p.acc);
        if let Some(t) = p.text {
            text.push(t);
        }
    };

    for part in parts {
        pending.insert(part.index, part);
        while let Some(p) = pending.remove(&next) {
            fold(p, &mut acc);
            next += 1;
        }
    }
    // Only reachable with a gap, i.e. a worker died mid-chunk.
    for (_, p) in pending {
        fold(p, &mut acc);
    }
    Reduction { acc, text }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combiners::AlphabetCount;
    use crate::statistics::{count_alphabetic, Statistics};

    fn partial(index: usize, text: &str) -> Partial<Statistics> {
        Partial {
            index,
            acc: count_alphabetic(text),
            text: Some(text.to_string()),
        }
    }

    #[test]
    fn reducer_restores_index_order() {
        let (tx, rx) = mpsc::channel();
        for (i, t) in [(2, "cc"), (0, "a"), (3, "d"), (1, "bb")] {
            tx.send(partial(i, t)).unwrap();
        }
        drop(tx);
        let r = reduce_in_order::<_, _, Statistics>(rx, &AlphabetCount);
        assert_eq!(r.text, vec!["a", "bb", "cc", "d"]);
        assert_eq!(
            r.acc.iter().collect::<Vec<_>>(),
            vec![('a', 1), ('b', 2), ('c', 2), ('d', 1)]
        );
    }

    #[test]
    fn reducer_on_no_input_yields_identity() {
        let (tx, rx) = mpsc::channel::<Partial<Statistics>>();
        drop(tx);
        let r = reduce_in_order::<_, _, Statistics>(rx, &AlphabetCount);
        assert!(r.acc.is_empty());
        assert!(r.text.is_empty());
    }

    #[test]
    fn workers_default_to_core_count() {
        assert_eq!(Runner::sequential().workers(), 1);
        assert_eq!(Runner::parallel(Some(3)).workers(), 3);
        assert_eq!(Runner::parallel(Some(0)).workers(), 1);
        assert_eq!(Runner::parallel(None).workers(), num_cpus::get().max(1));
    }

    #[test]
    fn cancel_token_is_shared_between_clones() {
        let a = CancelToken::new();
        let b = a.clone();
        b.cancel();
        assert!(a.is_cancelled());
    }
}
