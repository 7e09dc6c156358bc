//! Stress command implementation.

use serde::Serialize;
use stm_testkit::{run_counter_stress, StressConfig};

/// Stress run result.
#[derive(Debug, Serialize)]
pub struct StressOutput {
    /// Threads used.
    pub threads: usize,
    /// Increments attempted per thread.
    pub increments: usize,
    /// Committed increments.
    pub commits: u64,
    /// Conflicts detected at commit.
    pub conflicts: u64,
    /// Increments that ran out of attempts.
    pub failures: u64,
    /// Final counter value.
    pub final_value: u64,
    /// Whether the counter equals the commit count.
    pub consistent: bool,
    /// Duration in milliseconds.
    pub duration_ms: u128,
    /// Commits per second.
    pub commits_per_second: f64,
}

/// Runs the stress command.
pub fn run(
    threads: usize,
    increments: usize,
    max_attempts: u32,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = StressConfig {
        threads,
        increments,
        max_attempts,
    };
    let result = run_counter_stress(&config)?;
    let output = StressOutput {
        threads,
        increments,
        commits: result.commits,
        conflicts: result.conflicts,
        failures: result.failures,
        final_value: result.final_value,
        consistent: result.is_consistent(),
        duration_ms: result.duration.as_millis(),
        commits_per_second: result.commits_per_second,
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        _ => {
            result.print_summary("Counter stress");
            println!("Consistent: {}", output.consistent);
        }
    }

    if !output.consistent {
        return Err(format!(
            "counter is {} after {} commits",
            output.final_value, output.commits
        )
        .into());
    }
    Ok(())
}
