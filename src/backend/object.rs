//! Object-store backend: bincode-encoded records in KeyDB.
//!
//! Each todo is stored as a bincode blob keyed per-record, with a sorted set
//! serving as the creation-time index. Ids come from an in-process counter,
//! so a reconnecting process must `reset()` before reusing the key space.
//!
//! Key schema:
//! - `todo:{id}`: bincode `StoredTodo` blob
//! - `todo:created_idx`: sorted set (member = id, score = created-time millis)

use super::TodoBackend;
use crate::model::{datetime_from_millis, Todo};
use anyhow::{bail, Context, Result};
use bincode::{Decode, Encode};
use redis::{pipe, Commands, Connection};

/// Default server URL when neither the CLI flag nor the environment override
/// it.
pub const DEFAULT_KEYDB_URL: &str = "redis://127.0.0.1:6379/";

const TODO_KEY_PREFIX: &str = "todo:";
const CREATED_INDEX_KEY: &str = "todo:created_idx";

pub struct ObjectBackend {
    con: Connection,
    next_id: i64,
}

impl ObjectBackend {
    /// Connect to the KeyDB server and verify it answers.
    pub fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .with_context(|| format!("failed to open KeyDB client for {url}"))?;
        let mut con = client
            .get_connection()
            .with_context(|| format!("failed to connect to KeyDB at {url}"))?;
        redis::cmd("PING")
            .query::<String>(&mut con)
            .with_context(|| format!("KeyDB at {url} did not answer PING"))?;

        Ok(Self { con, next_id: 0 })
    }

    fn indexed_ids(&mut self) -> Result<Vec<i64>> {
        self.con
            .zrange(CREATED_INDEX_KEY, 0, -1)
            .context("KeyDB ZRANGE on the created-time index failed")
    }
}

impl TodoBackend for ObjectBackend {
    fn name(&self) -> &'static str {
        "keydb"
    }

    fn reset(&mut self) -> Result<()> {
        let ids = self.indexed_ids()?;

        let mut pipeline = pipe();
        pipeline.atomic();
        for id in &ids {
            pipeline.cmd("DEL").arg(format!("{TODO_KEY_PREFIX}{id}"));
        }
        pipeline.cmd("DEL").arg(CREATED_INDEX_KEY);
        pipeline
            .query::<()>(&mut self.con)
            .context("KeyDB pipeline DEL failed")?;

        self.next_id = 0;
        Ok(())
    }

    fn insert_batch(&mut self, todos: &[Todo]) -> Result<()> {
        if todos.is_empty() {
            return Ok(());
        }

        let mut pipeline = pipe();
        pipeline.atomic();
        for todo in todos {
            self.next_id += 1;
            let record = StoredTodo::from_todo(self.next_id, todo);
            let bytes = bincode::encode_to_vec(&record, bincode::config::standard())
                .with_context(|| format!("failed to encode todo {}", record.id))?;

            pipeline
                .cmd("SET")
                .arg(format!("{TODO_KEY_PREFIX}{}", record.id))
                .arg(bytes);
            pipeline
                .cmd("ZADD")
                .arg(CREATED_INDEX_KEY)
                .arg(record.created_ms)
                .arg(record.id);
        }
        pipeline
            .query::<()>(&mut self.con)
            .context("KeyDB pipeline SET/ZADD failed")?;
        Ok(())
    }

    fn scan_all(&mut self) -> Result<Vec<Todo>> {
        let ids = self.indexed_ids()?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipeline = pipe();
        for id in &ids {
            pipeline.cmd("GET").arg(format!("{TODO_KEY_PREFIX}{id}"));
        }
        let blobs: Vec<Vec<u8>> = pipeline
            .query(&mut self.con)
            .context("KeyDB pipeline GET failed")?;

        let mut todos = Vec::with_capacity(ids.len());
        for (id, bytes) in ids.iter().zip(blobs) {
            if bytes.is_empty() {
                bail!("missing record for indexed todo {id}");
            }
            let (record, _): (StoredTodo, usize) =
                bincode::decode_from_slice(&bytes, bincode::config::standard())
                    .with_context(|| format!("failed to decode todo {id}"))?;
            todos.push(record.into_todo()?);
        }
        Ok(todos)
    }

    fn count(&mut self) -> Result<u64> {
        self.con
            .zcard(CREATED_INDEX_KEY)
            .context("KeyDB ZCARD on the created-time index failed")
    }
}

/// Wire form of a todo record: timestamps travel as epoch milliseconds.
#[derive(Debug, Encode, Decode)]
struct StoredTodo {
    id: i64,
    title: String,
    content: String,
    done: bool,
    created_ms: i64,
}

impl StoredTodo {
    fn from_todo(id: i64, todo: &Todo) -> Self {
        Self {
            id,
            title: todo.title.clone(),
            content: todo.content.clone(),
            done: todo.done,
            created_ms: todo.created_time.timestamp_millis(),
        }
    }

    fn into_todo(self) -> Result<Todo> {
        Ok(Todo {
            id: self.id,
            title: self.title,
            content: self.content,
            done: self.done,
            created_time: datetime_from_millis(self.created_ms)?,
        })
    }
}
