//! Demo command implementation.

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use stm_core::{CanonicalCbor, Config, CoreError, LogBlobStore, StatsSnapshot, Stm};
use stm_storage::FileBackend;
use stm_testkit::{lookup, register, Registry};
use tracing::info;

/// One observed step of the scenario.
#[derive(Debug, Serialize)]
pub struct DemoStep {
    /// Step label.
    pub step: &'static str,
    /// What the step observed.
    pub observation: String,
}

/// Scenario result.
#[derive(Debug, Serialize)]
pub struct DemoResult {
    /// Steps in order.
    pub steps: Vec<DemoStep>,
    /// Blobs written.
    pub blobs: u64,
    /// Engine counters at the end.
    pub transactions_committed: u64,
    /// Transactions that did not commit.
    pub transactions_aborted: u64,
}

/// Runs the demo command.
pub fn run(blob_log: Option<&Path>, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let stm = match blob_log {
        Some(path) => {
            let backend = FileBackend::open_with_create_dirs(path)?;
            let blobs = LogBlobStore::open(backend)?;
            info!(path = %path.display(), "appending blobs to log");
            Stm::open(Config::default(), Arc::new(blobs), Arc::new(CanonicalCbor))
        }
        None => Stm::new(),
    };

    let result = scenario(&stm)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Runs the registry scenario against `stm`.
pub fn scenario(stm: &Stm) -> Result<DemoResult, CoreError> {
    let mut steps = Vec::new();
    let registry = stm.init_root(&Registry::new())?;
    steps.push(DemoStep {
        step: "init",
        observation: format!("root {} holds an empty registry", registry),
    });

    let foo = register(stm, registry, "test", "foo")?;
    steps.push(DemoStep {
        step: "A",
        observation: format!("committed \"foo\" at {} under \"test\"", foo),
    });

    steps.push(DemoStep {
        step: "B",
        observation: describe(lookup(stm, registry, "test")?),
    });

    let failed = stm.transact(|txn| {
        let bar = txn.new_pointer::<String>()?;
        txn.set(bar, "bar".to_string())?;
        txn.get_mut(registry)?.insert("test".into(), bar);
        Err::<(), _>(CoreError::transaction_aborted("failure after write"))
    });
    steps.push(DemoStep {
        step: "C",
        observation: match failed {
            Ok(()) => "committed unexpectedly".to_string(),
            Err(err) => format!("discarded: {}", err),
        },
    });

    steps.push(DemoStep {
        step: "D",
        observation: describe(lookup(stm, registry, "test")?),
    });

    let StatsSnapshot {
        transactions_committed,
        transactions_aborted,
        ..
    } = stm.stats();
    Ok(DemoResult {
        steps,
        blobs: stm.blobs().len(),
        transactions_committed,
        transactions_aborted,
    })
}

fn describe(value: Option<String>) -> String {
    match value {
        Some(value) => format!("registry[\"test\"] = {:?}", value),
        None => "registry has no \"test\" entry".to_string(),
    }
}

fn print_text_output(result: &DemoResult) {
    println!("STM Registry Demo");
    println!("=================");
    println!();
    for step in &result.steps {
        println!("  [{}] {}", step.step, step.observation);
    }
    println!();
    println!("Blobs written:          {}", result.blobs);
    println!("Transactions committed: {}", result.transactions_committed);
    println!("Transactions aborted:   {}", result.transactions_aborted);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_write_is_not_observed() {
        let stm = Stm::new();
        let result = scenario(&stm).unwrap();
        let observed: Vec<_> = result.steps.iter().map(|s| s.observation.as_str()).collect();
        assert_eq!(observed[2], "registry[\"test\"] = \"foo\"");
        assert_eq!(observed[4], observed[2]);
        assert!(observed[3].starts_with("discarded:"));
        assert_eq!(result.transactions_aborted, 1);
    }

    #[test]
    fn demo_with_blob_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("blobs.log");
        run(Some(path.as_path()), "json").unwrap();
        assert!(path.exists());
    }
}
