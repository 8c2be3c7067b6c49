//! ORM-style backend: sqlx row mapping over SQLite.
//!
//! Rows go through the full mapping stack on both sides: bound parameters on
//! insert (including chrono timestamp encoding) and `query_as` row structs on
//! read. The backend owns a current-thread tokio runtime so the synchronous
//! `TodoBackend` trait can drive the async pool.

use super::TodoBackend;
use crate::model::Todo;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use tokio::runtime::Runtime;

pub struct OrmBackend {
    pool: SqlitePool,
    rt: Runtime,
}

impl OrmBackend {
    /// Open (or create) the database file, configure the pool, and run the
    /// inline migration.
    pub fn open(path: &Path) -> Result<Self> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to build the sqlx backend runtime")?;

        let pool = rt.block_on(Self::connect(path))?;
        Ok(Self { pool, rt })
    }

    async fn connect(path: &Path) -> Result<SqlitePool> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to connect to SQLite database {}", path.display()))?;

        // Migration (inline for simplicity)
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS todo (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                done BOOLEAN NOT NULL,
                created_time DATETIME NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create todo table")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS index_todo_created_time ON todo (created_time)
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create todo index")?;

        Ok(pool)
    }
}

impl TodoBackend for OrmBackend {
    fn name(&self) -> &'static str {
        "sqlx"
    }

    fn reset(&mut self) -> Result<()> {
        let pool = &self.pool;
        self.rt.block_on(async move {
            sqlx::query("DELETE FROM todo")
                .execute(pool)
                .await
                .context("failed to delete todo rows")?;
            Ok(())
        })
    }

    fn insert_batch(&mut self, todos: &[Todo]) -> Result<()> {
        let pool = &self.pool;
        self.rt.block_on(async move {
            let mut tx = pool.begin().await.context("failed to begin transaction")?;
            for todo in todos {
                sqlx::query(
                    r#"
                    INSERT INTO todo (title, content, done, created_time)
                    VALUES (?1, ?2, ?3, ?4)
                    "#,
                )
                .bind(&todo.title)
                .bind(&todo.content)
                .bind(todo.done)
                .bind(todo.created_time)
                .execute(&mut *tx)
                .await
                .context("failed to insert todo row")?;
            }
            tx.commit().await.context("failed to commit insert batch")?;
            Ok(())
        })
    }

    fn scan_all(&mut self) -> Result<Vec<Todo>> {
        let pool = &self.pool;
        let rows: Vec<TodoRow> = self.rt.block_on(async move {
            sqlx::query_as(
                r#"
                SELECT id, title, content, done, created_time
                FROM todo ORDER BY created_time ASC
                "#,
            )
            .fetch_all(pool)
            .await
            .context("failed to scan todo rows")
        })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    fn count(&mut self) -> Result<u64> {
        let pool = &self.pool;
        let count: i64 = self.rt.block_on(async move {
            sqlx::query_scalar("SELECT COUNT(*) FROM todo")
                .fetch_one(pool)
                .await
                .context("failed to count todo rows")
        })?;
        Ok(count as u64)
    }
}

// Helper struct for sqlx query_as
#[derive(sqlx::FromRow)]
struct TodoRow {
    id: i64,
    title: String,
    content: String,
    done: bool,
    created_time: DateTime<Utc>,
}

impl From<TodoRow> for Todo {
    fn from(r: TodoRow) -> Self {
        Todo {
            id: r.id,
            title: r.title,
            content: r.content,
            done: r.done,
            created_time: r.created_time,
        }
    }
}
