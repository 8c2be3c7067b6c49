//! Storage backends and the common `TodoBackend` trait.
//!
//! Three implementations are provided:
//! - [`orm::OrmBackend`]: sqlx row-mapping layer over SQLite
//! - [`object::ObjectBackend`]: bincode blobs in a KeyDB object store
//! - [`handwritten::HandwrittenBackend`]: hand-written SQL over rusqlite

pub mod handwritten;
pub mod object;
pub mod orm;

use crate::model::Todo;
use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Database file used by the sqlx mapping-layer backend.
pub const ORM_DB_FILE: &str = "orm-benchmark.db";

/// Database file used by the hand-written SQL backend.
pub const HANDWRITTEN_DB_FILE: &str = "hand-written.db";

/// Trait implemented by each storage backend under benchmark.
///
/// Each method corresponds to a class of store operation performed during a
/// benchmark stage. Implementations should use prepared statements (or the
/// closest native equivalent) internally.
pub trait TodoBackend {
    /// Short lowercase name used in stage labels.
    fn name(&self) -> &'static str;

    /// Delete every todo the store currently holds.
    fn reset(&mut self) -> Result<()>;

    /// Insert the whole batch inside a single store-level transaction.
    fn insert_batch(&mut self, todos: &[Todo]) -> Result<()>;

    /// Read back every row ordered by creation time ascending, with all
    /// fields materialized.
    fn scan_all(&mut self) -> Result<Vec<Todo>>;

    /// The store's own row count.
    fn count(&mut self) -> Result<u64>;
}

/// Resolve the database path inside `data_dir`, removing any stale copy
/// (including WAL sidecar files) left behind by a previous run.
pub fn prepare_db_path(data_dir: &Path, file_name: &str) -> Result<PathBuf> {
    let sidecars = [
        file_name.to_string(),
        format!("{file_name}-wal"),
        format!("{file_name}-shm"),
    ];
    for name in &sidecars {
        let stale = data_dir.join(name);
        match fs::remove_file(&stale) {
            Ok(()) => log::debug!("Removed stale database file {}", stale.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to remove stale database file {}", stale.display())
                })
            }
        }
    }
    Ok(data_dir.join(file_name))
}
