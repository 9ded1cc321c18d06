// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! A worker pool for CPU-bound jobs.
//!
//! Expensive operations (safe-prime search, large modular exponentiations)
//! are submitted as closures and run on scoped worker threads. Tasks carry no
//! ordering between each other; `run` blocks until every submitted job has
//! completed.

/// Executes batches of CPU-bound jobs on up to `workers` threads.
#[derive(Clone, Copy, Debug)]
pub struct Pool {
    workers: usize,
}

impl Pool {
    /// A pool running at most `workers` jobs concurrently. A worker count of
    /// zero is treated as one.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Run all `jobs` to completion and return their results.
    ///
    /// Results are returned in submission order, but jobs within a batch run
    /// concurrently and must not rely on ordering between each other.
    pub fn run<T, F>(&self, jobs: Vec<F>) -> Vec<T>
    where
        T: Send,
        F: FnOnce() -> T + Send,
    {
        let mut results = Vec::with_capacity(jobs.len());
        let mut pending = jobs.into_iter();
        loop {
            let batch: Vec<F> = pending.by_ref().take(self.workers).collect();
            if batch.is_empty() {
                break;
            }
            std::thread::scope(|scope| {
                let handles: Vec<_> = batch.into_iter().map(|job| scope.spawn(job)).collect();
                for handle in handles {
                    match handle.join() {
                        Ok(value) => results.push(value),
                        // Re-raise a job panic on the submitting thread.
                        Err(panic) => std::panic::resume_unwind(panic),
                    }
                }
            });
        }
        results
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new(std::thread::available_parallelism().map_or(1, |n| n.get()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_all_jobs() {
        let pool = Pool::new(2);
        let jobs: Vec<_> = (0..7u64).map(|i| move || i * i).collect();
        let results = pool.run(jobs);
        assert_eq!(results, vec![0, 1, 4, 9, 16, 25, 36]);
    }

    #[test]
    fn zero_workers_still_runs() {
        let pool = Pool::new(0);
        let results = pool.run(vec![|| 42]);
        assert_eq!(results, vec![42]);
    }
}
