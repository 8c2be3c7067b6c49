//! Todo Storage Latency Benchmark
//!
//! Times fixed batches of insert and full-table-scan operations against three
//! persistence approaches for one `Todo` record type:
//! - **sqlx**: ORM-style row mapping over SQLite
//! - **keydb**: bincode-encoded records in a KeyDB object store
//! - **handwritten**: hand-written SQL over rusqlite
//!
//! Each stage reports its total elapsed milliseconds as the headline figure,
//! with per-operation samples feeding the percentile columns of the final
//! comparison report.
//!
//! Run the suite: `cargo run --release`
//! Run benchmarks: `cargo bench`
//! Run tests: `cargo test`

pub mod backend;
pub mod logging;
pub mod model;
pub mod report;
pub mod workload;
