//! Concurrent stress harness.
//!
//! Several threads increment one shared counter through retried
//! transactions. Every increment must survive: the final value equals the
//! number of committed transactions, however many conflicts occurred.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use stm_core::{Config, CoreResult, Stm};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Committed increments.
    pub commits: u64,
    /// Commits rejected by validation (each one retried).
    pub conflicts: u64,
    /// Increments that exhausted their retry budget.
    pub failures: u64,
    /// Counter value read after all threads finished.
    pub final_value: u64,
    /// Total duration.
    pub duration: Duration,
    /// Commits per second.
    pub commits_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(commits: u64, conflicts: u64, failures: u64, final_value: u64, duration: Duration) -> Self {
        let commits_per_second = if duration.as_secs_f64() > 0.0 {
            commits as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            commits,
            conflicts,
            failures,
            final_value,
            duration,
            commits_per_second,
        }
    }

    /// Returns `true` if no committed increment was lost.
    pub fn is_consistent(&self) -> bool {
        self.final_value == self.commits
    }

    /// Prints a summary of the run.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Commits: {}", self.commits);
        println!("Conflicts: {}", self.conflicts);
        println!("Failures: {}", self.failures);
        println!("Final value: {}", self.final_value);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} commits/sec", self.commits_per_second);
    }
}

/// Configuration for stress runs.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of concurrent threads.
    pub threads: usize,
    /// Increments attempted per thread.
    pub increments: usize,
    /// Retry budget per increment.
    pub max_attempts: u32,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            increments: 1_000,
            max_attempts: 1_000,
        }
    }
}

/// Runs the counter stress on a fresh in-memory engine.
pub fn run_counter_stress(config: &StressConfig) -> CoreResult<StressTestResult> {
    let stm = Stm::with_config(Config::new().max_attempts(config.max_attempts));
    run_counter_stress_on(&stm, config)
}

/// Runs the counter stress on `stm`, using a new pointer as the counter.
///
/// Conflicts are counted from the engine statistics, so `stm` should not
/// be used by anything else during the run.
pub fn run_counter_stress_on(stm: &Stm, config: &StressConfig) -> CoreResult<StressTestResult> {
    let counter = stm.new_pointer::<u64>();
    stm.store(counter, &0)?;
    let conflicts_before = stm.stats().conflicts;

    let commits = AtomicU64::new(0);
    let failures = AtomicU64::new(0);
    let start = Instant::now();

    thread::scope(|scope| {
        for _ in 0..config.threads {
            scope.spawn(|| {
                for _ in 0..config.increments {
                    let result = stm.transact_with_retry(|txn| {
                        *txn.get_mut(counter)? += 1;
                        Ok(())
                    });
                    match result {
                        Ok(()) => commits.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failures.fetch_add(1, Ordering::Relaxed),
                    };
                }
            });
        }
    });

    let duration = start.elapsed();
    Ok(StressTestResult::new(
        commits.into_inner(),
        stm.stats().conflicts - conflicts_before,
        failures.into_inner(),
        stm.load(counter)?,
        duration,
    ))
}
