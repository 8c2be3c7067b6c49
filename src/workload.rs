//! Timed insert and full-scan stages run against a single backend.
//!
//! Each stage repeats one operation `params.ops` times and reports both the
//! whole-stage wall-clock time (the headline figure) and per-operation
//! samples for the percentile columns of the report.

use crate::backend::TodoBackend;
use crate::model::{generate_batch, WorkloadParams};
use crate::report::BenchResult;
use anyhow::{bail, Result};
use chrono::Utc;
use std::hint::black_box;
use std::time::Instant;

/// Run the insert stage: `params.ops` transactions of `params.items_per_op`
/// rows each.
///
/// All rows in one operation share a creation timestamp captured at the start
/// of that operation, so timestamps are identical within a batch and
/// non-decreasing across the stage.
pub fn run_insert_stage(
    backend: &mut dyn TodoBackend,
    params: &WorkloadParams,
) -> Result<BenchResult> {
    let label = format!("{}/insert", backend.name());
    let mut op_durations = Vec::with_capacity(params.ops as usize);

    let stage_start = Instant::now();
    for _ in 0..params.ops {
        let op_start = Instant::now();

        let created_time = Utc::now();
        let batch = generate_batch(params.items_per_op, created_time);
        backend.insert_batch(&batch)?;

        op_durations.push(op_start.elapsed());
    }
    let elapsed = stage_start.elapsed();

    Ok(BenchResult {
        label,
        elapsed,
        op_durations,
        rows: params.total_rows(),
    })
}

/// Run the scan stage: `params.ops` full ordered scans.
///
/// Every scan materializes all fields of every row, then cross-checks the
/// rows seen against the store's own count and the expected insert total. A
/// mismatch aborts the whole run.
pub fn run_scan_stage(
    backend: &mut dyn TodoBackend,
    params: &WorkloadParams,
) -> Result<BenchResult> {
    let label = format!("{}/scan", backend.name());
    let expected = params.total_rows();
    let mut op_durations = Vec::with_capacity(params.ops as usize);

    let stage_start = Instant::now();
    for _ in 0..params.ops {
        let op_start = Instant::now();

        let todos = backend.scan_all()?;
        let mut seen: u64 = 0;
        for todo in &todos {
            black_box((
                &todo.id,
                &todo.title,
                &todo.content,
                &todo.done,
                &todo.created_time,
            ));
            seen += 1;
        }

        let store_count = backend.count()?;
        if seen != store_count || seen != expected {
            bail!("{label}: scanned {seen} rows, store counts {store_count}, expected {expected}");
        }

        op_durations.push(op_start.elapsed());
        log::debug!("{label} saw {seen} rows");
    }
    let elapsed = stage_start.elapsed();

    Ok(BenchResult {
        label,
        elapsed,
        op_durations,
        rows: expected,
    })
}
