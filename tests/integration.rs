//! Integration tests: exercise each storage backend against a real store and
//! run the workload stages end to end.
//!
//! The KeyDB tests need a reachable server and are ignored by default; run
//! them with `cargo test -- --ignored` (honors `TODO_BENCH_KEYDB_URL`).

use chrono::{TimeZone, Utc};
use tempfile::TempDir;
use todo_bench::backend::{
    handwritten::HandwrittenBackend,
    object::{ObjectBackend, DEFAULT_KEYDB_URL},
    orm::OrmBackend,
    prepare_db_path, TodoBackend, HANDWRITTEN_DB_FILE, ORM_DB_FILE,
};
use todo_bench::model::{generate_batch, Todo, WorkloadParams, CONTENT_PREFIX, TITLE_PREFIX};
use todo_bench::workload::{run_insert_stage, run_scan_stage};

fn small_params() -> WorkloadParams {
    WorkloadParams {
        ops: 5,
        items_per_op: 4,
    }
}

fn open_handwritten(dir: &TempDir) -> HandwrittenBackend {
    HandwrittenBackend::open(&dir.path().join(HANDWRITTEN_DB_FILE)).expect("open handwritten")
}

fn open_orm(dir: &TempDir) -> OrmBackend {
    OrmBackend::open(&dir.path().join(ORM_DB_FILE)).expect("open orm")
}

/// One batch with a fixed timestamp, for content checks.
fn fixed_batch(items: u32) -> Vec<Todo> {
    let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    generate_batch(items, created)
}

fn check_insert_and_scan(backend: &mut dyn TodoBackend) {
    let batch = fixed_batch(4);
    backend.insert_batch(&batch).expect("insert_batch");

    assert_eq!(backend.count().expect("count"), 4);

    let mut scanned = backend.scan_all().expect("scan_all");
    assert_eq!(scanned.len(), 4);
    // All four rows share one timestamp; order within the tie is up to the
    // store, so compare against the canonical title order.
    scanned.sort_by(|a, b| a.title.cmp(&b.title));
    for (i, todo) in scanned.iter().enumerate() {
        assert_eq!(todo.title, format!("{TITLE_PREFIX}{i}"));
        assert_eq!(todo.content, format!("{CONTENT_PREFIX}{i}"));
        assert!(!todo.done);
        assert_eq!(
            todo.created_time.timestamp_millis(),
            batch[i].created_time.timestamp_millis()
        );
        assert!(todo.id > 0, "store should assign ids, got {}", todo.id);
    }
}

fn check_scan_orders_by_created_time(backend: &mut dyn TodoBackend) {
    let earlier = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let later = earlier + chrono::Duration::milliseconds(250);

    // Insert the later batch first: ordering must come from the store.
    backend
        .insert_batch(&generate_batch(3, later))
        .expect("insert later batch");
    backend
        .insert_batch(&generate_batch(3, earlier))
        .expect("insert earlier batch");

    let scanned = backend.scan_all().expect("scan_all");
    assert_eq!(scanned.len(), 6);

    let times: Vec<i64> = scanned
        .iter()
        .map(|t| t.created_time.timestamp_millis())
        .collect();
    let mut sorted = times.clone();
    sorted.sort();
    assert_eq!(times, sorted, "scan must order by created_time ascending");
    assert_eq!(times[0], earlier.timestamp_millis());
    assert_eq!(times[5], later.timestamp_millis());
}

fn check_reset_empties_the_store(backend: &mut dyn TodoBackend) {
    backend.insert_batch(&fixed_batch(3)).expect("insert_batch");
    assert_eq!(backend.count().expect("count"), 3);

    backend.reset().expect("reset");
    assert_eq!(backend.count().expect("count"), 0);
    assert!(backend.scan_all().expect("scan_all").is_empty());
}

// ── Hand-written SQL backend ────────────────────────────────────────

#[test]
fn handwritten_insert_and_scan() {
    let dir = TempDir::new().expect("tempdir");
    let mut backend = open_handwritten(&dir);
    check_insert_and_scan(&mut backend);
}

#[test]
fn handwritten_scan_orders_by_created_time() {
    let dir = TempDir::new().expect("tempdir");
    let mut backend = open_handwritten(&dir);
    check_scan_orders_by_created_time(&mut backend);
}

#[test]
fn handwritten_reset_empties_the_store() {
    let dir = TempDir::new().expect("tempdir");
    let mut backend = open_handwritten(&dir);
    check_reset_empties_the_store(&mut backend);
}

#[test]
fn handwritten_scan_of_empty_store_is_empty() {
    let dir = TempDir::new().expect("tempdir");
    let mut backend = open_handwritten(&dir);
    assert_eq!(backend.count().expect("count"), 0);
    assert!(backend.scan_all().expect("scan_all").is_empty());
}

// ── sqlx mapping-layer backend ──────────────────────────────────────

#[test]
fn orm_insert_and_scan() {
    let dir = TempDir::new().expect("tempdir");
    let mut backend = open_orm(&dir);
    check_insert_and_scan(&mut backend);
}

#[test]
fn orm_scan_orders_by_created_time() {
    let dir = TempDir::new().expect("tempdir");
    let mut backend = open_orm(&dir);
    check_scan_orders_by_created_time(&mut backend);
}

#[test]
fn orm_reset_empties_the_store() {
    let dir = TempDir::new().expect("tempdir");
    let mut backend = open_orm(&dir);
    check_reset_empties_the_store(&mut backend);
}

// ── Stale file handling ─────────────────────────────────────────────

#[test]
fn prepare_db_path_removes_stale_files() {
    let dir = TempDir::new().expect("tempdir");
    for name in [
        "hand-written.db",
        "hand-written.db-wal",
        "hand-written.db-shm",
    ] {
        std::fs::write(dir.path().join(name), b"stale").expect("write stale file");
    }

    let path = prepare_db_path(dir.path(), HANDWRITTEN_DB_FILE).expect("prepare_db_path");
    assert_eq!(path, dir.path().join(HANDWRITTEN_DB_FILE));
    assert!(!path.exists());
    assert!(!dir.path().join("hand-written.db-wal").exists());
    assert!(!dir.path().join("hand-written.db-shm").exists());
}

#[test]
fn prepare_db_path_accepts_missing_files() {
    let dir = TempDir::new().expect("tempdir");
    let path = prepare_db_path(dir.path(), ORM_DB_FILE).expect("prepare_db_path");
    assert_eq!(path, dir.path().join(ORM_DB_FILE));
}

// ── Workload stages ─────────────────────────────────────────────────

#[test]
fn insert_stage_writes_all_rows() {
    let dir = TempDir::new().expect("tempdir");
    let mut backend = open_handwritten(&dir);
    let params = small_params();

    let result = run_insert_stage(&mut backend, &params).expect("insert stage");
    assert_eq!(result.label, "handwritten/insert");
    assert_eq!(result.rows, params.total_rows());
    assert_eq!(result.op_durations.len(), params.ops as usize);
    assert_eq!(backend.count().expect("count"), params.total_rows());
}

#[test]
fn scan_stage_verifies_row_count() {
    let dir = TempDir::new().expect("tempdir");
    let mut backend = open_orm(&dir);
    let params = small_params();

    run_insert_stage(&mut backend, &params).expect("insert stage");
    let result = run_scan_stage(&mut backend, &params).expect("scan stage");

    assert_eq!(result.label, "sqlx/scan");
    assert_eq!(result.rows, params.total_rows());
    assert_eq!(result.op_durations.len(), params.ops as usize);
}

#[test]
fn scan_stage_rejects_unexpected_row_count() {
    let dir = TempDir::new().expect("tempdir");
    let mut backend = open_handwritten(&dir);
    let params = small_params();

    run_insert_stage(&mut backend, &params).expect("insert stage");
    // One extra batch the workload does not know about.
    backend.insert_batch(&fixed_batch(1)).expect("insert_batch");

    let err = run_scan_stage(&mut backend, &params).expect_err("scan stage must fail");
    assert!(err.to_string().contains("expected"), "got: {err}");
}

#[test]
fn empty_workload_produces_empty_stages() {
    let dir = TempDir::new().expect("tempdir");
    let mut backend = open_handwritten(&dir);
    let params = WorkloadParams {
        ops: 0,
        items_per_op: 10,
    };

    let insert = run_insert_stage(&mut backend, &params).expect("insert stage");
    assert_eq!(insert.rows, 0);
    assert!(insert.op_durations.is_empty());

    let scan = run_scan_stage(&mut backend, &params).expect("scan stage");
    assert_eq!(scan.rows, 0);
    assert!(scan.op_durations.is_empty());
}

#[test]
fn zero_item_operations_scan_cleanly() {
    let dir = TempDir::new().expect("tempdir");
    let mut backend = open_handwritten(&dir);
    let params = WorkloadParams {
        ops: 3,
        items_per_op: 0,
    };

    run_insert_stage(&mut backend, &params).expect("insert stage");
    let scan = run_scan_stage(&mut backend, &params).expect("scan stage");
    assert_eq!(scan.rows, 0);
    assert_eq!(scan.op_durations.len(), 3);
}

#[test]
fn repeated_runs_do_not_double_count() {
    let dir = TempDir::new().expect("tempdir");
    let mut backend = open_orm(&dir);
    let params = small_params();

    run_insert_stage(&mut backend, &params).expect("first insert stage");
    backend.reset().expect("reset");
    run_insert_stage(&mut backend, &params).expect("second insert stage");

    run_scan_stage(&mut backend, &params).expect("scan stage");
    assert_eq!(backend.count().expect("count"), params.total_rows());
}

// ── Cross-backend consistency ───────────────────────────────────────

#[test]
fn sql_backends_agree_on_scan_contents() {
    let dir = TempDir::new().expect("tempdir");
    let mut handwritten = open_handwritten(&dir);
    let mut orm = open_orm(&dir);
    let params = small_params();

    run_insert_stage(&mut handwritten, &params).expect("handwritten insert");
    run_insert_stage(&mut orm, &params).expect("orm insert");

    assert_eq!(
        handwritten.count().expect("count"),
        orm.count().expect("count")
    );

    let titles = |rows: &[Todo]| {
        let mut t: Vec<String> = rows.iter().map(|r| r.title.clone()).collect();
        t.sort();
        t
    };
    let handwritten_rows = handwritten.scan_all().expect("scan_all");
    let orm_rows = orm.scan_all().expect("scan_all");
    assert_eq!(handwritten_rows.len(), orm_rows.len());
    assert_eq!(titles(&handwritten_rows), titles(&orm_rows));
}

// ── KeyDB object store ──────────────────────────────────────────────

fn keydb_url() -> String {
    std::env::var("TODO_BENCH_KEYDB_URL").unwrap_or_else(|_| DEFAULT_KEYDB_URL.to_string())
}

#[test]
fn keydb_connect_rejects_invalid_url() {
    assert!(ObjectBackend::connect("not-a-url").is_err());
}

/// Single combined cycle so concurrent test threads never share the key
/// space.
#[test]
#[ignore = "needs a running KeyDB/Redis server"]
fn keydb_full_cycle() {
    let url = keydb_url();
    let mut backend = ObjectBackend::connect(&url).expect("connect");
    backend.reset().expect("reset");

    check_insert_and_scan(&mut backend);

    backend.reset().expect("reset");
    check_scan_orders_by_created_time(&mut backend);

    backend.reset().expect("reset");
    check_reset_empties_the_store(&mut backend);

    let params = small_params();
    run_insert_stage(&mut backend, &params).expect("insert stage");
    let result = run_scan_stage(&mut backend, &params).expect("scan stage");
    assert_eq!(result.label, "keydb/scan");
    assert_eq!(result.rows, params.total_rows());

    backend.reset().expect("reset");
}
