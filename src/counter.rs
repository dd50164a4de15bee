//! Evaluation accounting

use std::sync::atomic::{AtomicU64, Ordering};

/// Number of evaluations spent by one objective function instance.
///
/// Increments are atomic, so concurrent evaluation neither loses nor duplicates
/// counts. The value only grows between explicit resets.
#[derive(Debug, Default)]
pub struct EvaluationCounter {
    count: AtomicU64,
}

impl EvaluationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one evaluation and return the new count.
    pub fn increment(&self) -> u64 {
        self.count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Set the count back to zero and return the previous value.
    pub fn reset(&self) -> u64 {
        self.count.swap(0, Ordering::Relaxed)
    }
}

impl Clone for EvaluationCounter {
    fn clone(&self) -> Self {
        Self {
            count: AtomicU64::new(self.get()),
        }
    }
}
