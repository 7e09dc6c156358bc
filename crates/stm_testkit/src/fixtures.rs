//! Engine fixtures and common scenarios.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stm_core::{CanonicalCbor, Config, CoreResult, LogBlobStore, Ptr, Stm};
use stm_storage::FileBackend;
use tempfile::TempDir;

/// Name-to-pointer registry used by the end-to-end scenarios.
pub type Registry = HashMap<String, Ptr<String>>;

/// A test engine with automatic cleanup.
pub struct TestStm {
    /// The engine.
    pub stm: Stm,
    /// Kept alive so the blob log is not deleted under the engine.
    temp_dir: Option<TempDir>,
}

impl TestStm {
    /// Creates an in-memory engine.
    pub fn memory() -> Self {
        Self::memory_with_config(Config::default())
    }

    /// Creates an in-memory engine with `config`.
    pub fn memory_with_config(config: Config) -> Self {
        Self {
            stm: Stm::with_config(config),
            temp_dir: None,
        }
    }

    /// Creates an engine whose blobs are appended to a log in a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join(BLOB_LOG);
        let backend =
            FileBackend::open_with_create_dirs(&path).expect("Failed to create blob log backend");
        let blobs = LogBlobStore::open(backend).expect("Failed to open blob log");
        Self {
            stm: Stm::open(Config::default(), Arc::new(blobs), Arc::new(CanonicalCbor)),
            temp_dir: Some(temp_dir),
        }
    }

    /// Path of the blob log if file-based, `None` if in memory.
    pub fn blob_log_path(&self) -> Option<PathBuf> {
        self.temp_dir.as_ref().map(|d| d.path().join(BLOB_LOG))
    }
}

const BLOB_LOG: &str = "blobs.log";

impl std::ops::Deref for TestStm {
    type Target = Stm;

    fn deref(&self) -> &Self::Target {
        &self.stm
    }
}

/// Runs a test with a fresh in-memory engine.
pub fn with_temp_stm<F, R>(f: F) -> R
where
    F: FnOnce(&Stm) -> R,
{
    let test_stm = TestStm::memory();
    f(&test_stm)
}

/// Runs a test with a fresh engine over a temporary blob log.
pub fn with_file_stm<F, R>(f: F) -> R
where
    F: FnOnce(&Stm, &Path) -> R,
{
    let test_stm = TestStm::file();
    let path = test_stm
        .blob_log_path()
        .expect("File engine should have a blob log");
    f(&test_stm, &path)
}

/// An engine whose root holds an empty [`Registry`].
pub fn registry_fixture() -> (TestStm, Ptr<Registry>) {
    let stm = TestStm::memory();
    let root = stm
        .init_root(&Registry::new())
        .expect("Failed to initialise registry root");
    (stm, root)
}

/// Allocates a pointer holding `value` and registers it under `key`.
pub fn register(stm: &Stm, registry: Ptr<Registry>, key: &str, value: &str) -> CoreResult<Ptr<String>> {
    stm.transact(|txn| {
        let ptr = txn.new_pointer::<String>()?;
        txn.set(ptr, value.to_string())?;
        txn.get_mut(registry)?.insert(key.to_string(), ptr);
        Ok(ptr)
    })
}

/// Looks up `key` and reads the value it points to.
pub fn lookup(stm: &Stm, registry: Ptr<Registry>, key: &str) -> CoreResult<Option<String>> {
    stm.transact(|txn| {
        let Some(&ptr) = txn.get(registry)?.get(key) else {
            return Ok(None);
        };
        Ok(Some(txn.get(ptr)?.clone()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stm_core::BlobStore;

    #[test]
    fn registry_round_trip() {
        let (stm, registry) = registry_fixture();
        register(&stm, registry, "test", "foo").unwrap();
        assert_eq!(lookup(&stm, registry, "test").unwrap().as_deref(), Some("foo"));
        assert_eq!(lookup(&stm, registry, "other").unwrap(), None);
    }

    #[test]
    fn file_engine_writes_its_log() {
        with_file_stm(|stm, path| {
            stm.init_root(&"x".to_string()).unwrap();
            assert_eq!(stm.blobs().len(), 1);
            assert!(std::fs::metadata(path).unwrap().len() > 0);
        });
    }

    #[test]
    fn memory_engine_has_no_log() {
        assert!(TestStm::memory().blob_log_path().is_none());
    }
}
