//! Record type and deterministic batch generation for the benchmark workload.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};

/// Default rows inserted per operation (one transaction each).
pub const DEFAULT_ITEMS_PER_OP: u32 = 10;

/// Default repetitions of each insert / scan operation.
pub const DEFAULT_OPS: u32 = 100;

/// Title prefix shared by every generated row.
pub const TITLE_PREFIX: &str = "title ";

/// Content prefix shared by every generated row: three repeated lines plus a
/// trailing space before the item number.
pub const CONTENT_PREFIX: &str =
    "content content content\ncontent content content\ncontent content content\n ";

/// The single record type every store persists.
///
/// `id` is assigned by the store on insert and is 0 until then.
#[derive(Debug, Clone, PartialEq)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub done: bool,
    pub created_time: DateTime<Utc>,
}

/// Workload parameters describing how much data each stage moves.
#[derive(Debug, Clone, Copy)]
pub struct WorkloadParams {
    /// Repetitions of each insert / scan operation.
    pub ops: u32,
    /// Rows written per insert operation.
    pub items_per_op: u32,
}

impl WorkloadParams {
    /// Standard workload: 100 operations of 10 rows each.
    pub fn standard() -> Self {
        Self {
            ops: DEFAULT_OPS,
            items_per_op: DEFAULT_ITEMS_PER_OP,
        }
    }

    /// Total rows a full insert stage writes (and every scan must see).
    pub fn total_rows(&self) -> u64 {
        self.ops as u64 * self.items_per_op as u64
    }
}

/// Generate one batch of rows for a single insert operation.
///
/// Item numbering restarts at 0 for every operation, so batch content is
/// identical across operations; all rows in the batch share `created_time`.
pub fn generate_batch(items_per_op: u32, created_time: DateTime<Utc>) -> Vec<Todo> {
    (0..items_per_op)
        .map(|i| Todo {
            id: 0,
            title: format!("{TITLE_PREFIX}{i}"),
            content: format!("{CONTENT_PREFIX}{i}"),
            done: false,
            created_time,
        })
        .collect()
}

/// Convert stored epoch milliseconds back into the model timestamp.
pub fn datetime_from_millis(ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .with_context(|| format!("timestamp {ms}ms is out of range"))
}
