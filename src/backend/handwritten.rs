//! Hand-written SQL backend: raw statements over rusqlite.
//!
//! This is the no-abstraction baseline the other backends are measured
//! against. Rows are written through a cached prepared statement inside an
//! explicit transaction, and read back with a plain ordered SELECT.

use super::TodoBackend;
use crate::model::{datetime_from_millis, Todo};
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;

pub struct HandwrittenBackend {
    conn: Connection,
}

impl HandwrittenBackend {
    /// Open (or create) the database file and prepare the schema.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open SQLite database {}", path.display()))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .context("failed to configure SQLite connection")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS todo (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                title           TEXT NOT NULL,
                content         TEXT NOT NULL,
                done            INTEGER NOT NULL,
                created_time    INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS index_todo_created_time ON todo (created_time);
            ",
        )
        .context("failed to create todo schema")?;

        Ok(Self { conn })
    }
}

impl TodoBackend for HandwrittenBackend {
    fn name(&self) -> &'static str {
        "handwritten"
    }

    fn reset(&mut self) -> Result<()> {
        self.conn
            .execute("DELETE FROM todo", [])
            .context("failed to delete todo rows")?;
        Ok(())
    }

    fn insert_batch(&mut self, todos: &[Todo]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO todo (title, content, done, created_time)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for todo in todos {
                stmt.execute(params![
                    todo.title,
                    todo.content,
                    todo.done,
                    todo.created_time.timestamp_millis(),
                ])?;
            }
        }
        tx.commit().context("failed to commit insert batch")?;
        Ok(())
    }

    fn scan_all(&mut self) -> Result<Vec<Todo>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, title, content, done, created_time
             FROM todo ORDER BY created_time ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;

        let mut todos = Vec::new();
        for row in rows {
            let (id, title, content, done, created_ms) = row?;
            todos.push(Todo {
                id,
                title,
                content,
                done,
                created_time: datetime_from_millis(created_ms)?,
            });
        }
        Ok(todos)
    }

    fn count(&mut self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM todo", [], |row| row.get(0))
            .context("failed to count todo rows")?;
        Ok(count as u64)
    }
}
