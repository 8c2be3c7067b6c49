//! Report module: per-stage result lines and the formatted comparison table.

use std::time::Duration;

/// Results from one timed benchmark stage.
#[derive(Debug, Clone)]
pub struct BenchResult {
    /// Stage label, e.g. `handwritten/insert`.
    pub label: String,
    /// Wall-clock time for the whole stage.
    pub elapsed: Duration,
    /// Individual operation durations, in stage order.
    pub op_durations: Vec<Duration>,
    /// Rows written (insert stages) or rows seen per scan (scan stages).
    pub rows: u64,
}

impl BenchResult {
    /// Whole-stage elapsed time in integer milliseconds. This is the headline
    /// figure printed next to each stage label.
    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }

    /// Mean operation duration in microseconds.
    pub fn mean_us(&self) -> f64 {
        if self.op_durations.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .op_durations
            .iter()
            .map(|d| d.as_secs_f64() * 1e6)
            .sum();
        sum / self.op_durations.len() as f64
    }

    /// Nearest-rank percentile of operation duration in microseconds.
    pub fn percentile_us(&self, pct: f64) -> f64 {
        if self.op_durations.is_empty() {
            return 0.0;
        }
        let mut sorted: Vec<f64> = self
            .op_durations
            .iter()
            .map(|d| d.as_secs_f64() * 1e6)
            .collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let idx = ((pct / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    }

    /// Operations completed per second over the whole stage.
    pub fn ops_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.op_durations.len() as f64 / secs
    }
}

/// Print the result line for a completed stage: label, then elapsed
/// milliseconds.
pub fn print_result_line(result: &BenchResult) {
    println!("  {:<24} {:>8}ms", result.label, result.elapsed_ms());
}

/// Print a formatted report comparing all completed stages.
pub fn print_report(results: &[BenchResult]) {
    println!("\n{}", "=".repeat(80));
    println!("  Todo Storage Benchmark Report");
    println!("{}", "=".repeat(80));

    println!(
        "\n  {:<24} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Stage", "Total (ms)", "Mean (µs)", "p50 (µs)", "p95 (µs)", "p99 (µs)", "Ops/sec"
    );
    println!("  {}", "-".repeat(90));

    for r in results {
        println!(
            "  {:<24} {:>10} {:>10.0} {:>10.0} {:>10.0} {:>10.0} {:>10.1}",
            r.label,
            r.elapsed_ms(),
            r.mean_us(),
            r.percentile_us(50.0),
            r.percentile_us(95.0),
            r.percentile_us(99.0),
            r.ops_per_sec(),
        );
    }

    println!();
}
