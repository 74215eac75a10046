//! Combiners folded by the runner's reduction stage.
//!
//! A [`CombineFn`] describes a per-chunk accumulator (`create` + `add_input`) and an
//! associative, commutative `merge`. Workers build one accumulator per chunk; the
//! single reducer merges them. Any combiner whose `merge` obeys those laws gives the
//! same result under sequential and parallel execution.

use crate::statistics::Statistics;

/// Accumulator-based aggregation over inputs of type `V`.
pub trait CombineFn<V: ?Sized, A, O>: Send + Sync + 'static {
    fn create(&self) -> A;
    fn add_input(&self, acc: &mut A, v: &V);
    fn merge(&self, acc: &mut A, other: A);
    fn finish(&self, acc: A) -> O;
}

/// Alphabetic character frequency over sanitized chunks.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlphabetCount;

impl CombineFn<str, Statistics, Statistics> for AlphabetCount {
    fn create(&self) -> Statistics {
        Statistics::new()
    }

    fn add_input(&self, acc: &mut Statistics, v: &str) {
        acc.record(v);
    }

    fn merge(&self, acc: &mut Statistics, other: Statistics) {
        acc.merge_from(other);
    }

    fn finish(&self, acc: Statistics) -> Statistics {
        acc
    }
}

/// Total UTF-8 byte length of all inputs.
#[derive(Clone, Copy, Debug, Default)]
pub struct ByteCount;

impl CombineFn<str, u64, u64> for ByteCount {
    fn create(&self) -> u64 {
        0
    }

    fn add_input(&self, acc: &mut u64, v: &str) {
        *acc += v.len() as u64;
    }

    fn merge(&self, acc: &mut u64, other: u64) {
        *acc += other;
    }

    fn finish(&self, acc: u64) -> u64 {
        acc
    }
}
