//! Benchmark runner: times fixed insert and full-scan workloads against the
//! three todo storage backends and prints a comparison report.
//!
//! Usage:
//!   cargo run --release
//!   cargo run --release -- --ops 200 --items 50 --data-dir /tmp/todo-bench
//!
//! The KeyDB backend needs a reachable server (`--keydb-url` or
//! `TODO_BENCH_KEYDB_URL`). When none answers, that backend is skipped with a
//! warning instead of failing the run; pass `--skip-keydb` to not even try.

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use std::fs;
use std::path::PathBuf;
use std::process;
use todo_bench::backend::{
    self, handwritten::HandwrittenBackend, object::ObjectBackend, orm::OrmBackend, TodoBackend,
};
use todo_bench::logging;
use todo_bench::model::{WorkloadParams, DEFAULT_ITEMS_PER_OP, DEFAULT_OPS};
use todo_bench::report::{print_report, print_result_line, BenchResult};
use todo_bench::workload::{run_insert_stage, run_scan_stage};

#[derive(Parser, Debug)]
#[command(name = "todo-bench")]
#[command(about = "Times insert and full-scan workloads against three todo storage backends")]
struct Args {
    /// Repetitions of each insert / scan operation
    #[arg(long, default_value_t = DEFAULT_OPS)]
    ops: u32,

    /// Rows inserted per operation (one transaction each)
    #[arg(long, default_value_t = DEFAULT_ITEMS_PER_OP)]
    items: u32,

    /// Directory holding the benchmark database files
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// KeyDB connection URL for the object-store backend
    #[arg(long, env = "TODO_BENCH_KEYDB_URL", default_value = backend::object::DEFAULT_KEYDB_URL)]
    keydb_url: String,

    /// Skip the KeyDB backend without probing for a server
    #[arg(long)]
    skip_keydb: bool,

    /// Also append log output to this file
    #[arg(long)]
    log_file: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Open every available backend, in stage order: sqlx, keydb, handwritten.
///
/// Stale database files from previous runs are removed before the SQLite
/// backends open them. An unreachable KeyDB server drops that backend from
/// the run; any other failure is fatal.
fn build_backends(args: &Args) -> Result<Vec<Box<dyn TodoBackend>>> {
    fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("failed to create data directory {}", args.data_dir.display()))?;

    let mut backends: Vec<Box<dyn TodoBackend>> = Vec::with_capacity(3);

    let orm_path = backend::prepare_db_path(&args.data_dir, backend::ORM_DB_FILE)?;
    backends.push(Box::new(OrmBackend::open(&orm_path)?));

    if args.skip_keydb {
        log::info!("KeyDB backend skipped (--skip-keydb)");
    } else {
        match ObjectBackend::connect(&args.keydb_url) {
            Ok(store) => backends.push(Box::new(store)),
            Err(e) => {
                log::warn!("KeyDB not reachable at {}: {e:#}", args.keydb_url);
                eprintln!("  KeyDB not reachable — skipping the keydb backend.");
            }
        }
    }

    let handwritten_path = backend::prepare_db_path(&args.data_dir, backend::HANDWRITTEN_DB_FILE)?;
    backends.push(Box::new(HandwrittenBackend::open(&handwritten_path)?));

    Ok(backends)
}

fn run(args: &Args) -> Result<()> {
    let params = WorkloadParams {
        ops: args.ops,
        items_per_op: args.items,
    };
    log::info!(
        "Starting todo-bench: {} ops x {} rows, data dir {}",
        params.ops,
        params.items_per_op,
        args.data_dir.display()
    );

    let mut backends = build_backends(args)?;

    // Start every store from zero rows, not just the freshly-created files.
    for backend in backends.iter_mut() {
        backend
            .reset()
            .with_context(|| format!("failed to reset the {} backend", backend.name()))?;
    }

    println!("Running todo storage benchmark...");
    println!("  Operations per stage: {}", params.ops);
    println!("  Rows per operation:   {}", params.items_per_op);
    println!();

    let mut results: Vec<BenchResult> = Vec::with_capacity(backends.len() * 2);
    for backend in backends.iter_mut() {
        let result = run_insert_stage(backend.as_mut(), &params)?;
        print_result_line(&result);
        results.push(result);
    }
    for backend in backends.iter_mut() {
        let result = run_scan_stage(backend.as_mut(), &params)?;
        print_result_line(&result);
        results.push(result);
    }

    print_report(&results);
    Ok(())
}

fn main() {
    let args = Args::parse();

    let log_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(log_level, args.log_file.as_deref()).unwrap_or_else(|e| {
        eprintln!("Failed to initialize logger: {e:#}. Exiting.");
        process::exit(1);
    });

    if let Err(e) = run(&args) {
        log::error!("Benchmark failed: {e:#}");
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
