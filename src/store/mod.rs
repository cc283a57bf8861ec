//! Transactional JSON document store over SQLite.
//!
//! Records live in a single `documents` table keyed by `(collection, id)`,
//! with the record body stored as one JSON object. Field filters, ordering,
//! and server-side increments go through SQLite's built-in JSON functions.
//!
//! A dedicated worker thread owns the connection; callers send closures over
//! a channel and await the reply, so every operation — including multi-record
//! transactions — executes serially against a consistent view.

mod batch;
mod document;
mod migrations;
pub mod paths;

pub use batch::{WriteBatch, MAX_BATCH_OPS};
pub use document::{Direction, Document, FieldDelta, Filter, Query};

use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tokio::sync::oneshot;

use crate::error::{LedgerError, Result};
use document::to_fields;
use migrations::run_migrations;

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to store thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join store thread: {join_err:?}");
            }
        }
    }
}

#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
    db_path: Arc<Option<PathBuf>>,
}

impl Database {
    pub fn open(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }
        Self::spawn_worker(Some(db_path))
    }

    /// In-memory store; the backing database lives as long as this handle.
    pub fn open_in_memory() -> Result<Self> {
        Self::spawn_worker(None)
    }

    fn spawn_worker(db_path: Option<PathBuf>) -> Result<Self> {
        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("lockin-store".into())
            .spawn(move || {
                let opened = match &path_for_thread {
                    Some(path) => Connection::open(path),
                    None => Connection::open_in_memory(),
                };
                let mut conn = match opened {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("failed to open SQLite database")));
                        return;
                    }
                };

                if path_for_thread.is_some() {
                    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                        error!("Failed to enable WAL mode: {err}");
                    }
                }

                let init_result =
                    run_migrations(&mut conn).context("failed to run schema migrations");
                if ready_tx.send(init_result).is_err() {
                    error!("Store initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => {
                            task(&mut conn);
                        }
                        DbCommand::Shutdown => break,
                    }
                }

                info!("Store thread shutting down");
            })
            .with_context(|| "failed to spawn store worker thread")?;

        ready_rx
            .recv()
            .context("store worker exited before signaling readiness")??;

        if let Some(path) = &db_path {
            info!("Document store initialized at {}", path.display());
        }

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub(crate) async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("Store caller dropped before receiving result");
            }
        }));

        self.inner
            .sender
            .send(command)
            .map_err(|err| {
                LedgerError::Transport(anyhow!("failed to send command to store thread: {err}"))
            })?;

        reply_rx
            .await
            .map_err(|_| LedgerError::Transport(anyhow!("store worker terminated unexpectedly")))?
    }

    pub async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collection = collection.to_string();
        let id = id.to_string();
        self.execute(move |conn| get_doc(conn, &collection, &id)).await
    }

    pub async fn get_as<T>(&self, collection: &str, id: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        self.get(collection, id)
            .await?
            .map(|doc| doc.deserialize())
            .transpose()
    }

    /// Upsert with full overwrite of the document body.
    pub async fn set<T: Serialize>(&self, collection: &str, id: &str, value: &T) -> Result<()> {
        let fields = to_fields(value)?;
        let collection = collection.to_string();
        let id = id.to_string();
        self.execute(move |conn| set_doc(conn, &collection, &id, &fields))
            .await
    }

    /// Deleting an absent document is a no-op.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let collection = collection.to_string();
        let id = id.to_string();
        self.execute(move |conn| delete_doc(conn, &collection, &id))
            .await
    }

    /// Applies per-field deltas to an existing document; fails `NotFound`
    /// when the document is absent.
    pub async fn update(
        &self,
        collection: &str,
        id: &str,
        deltas: Vec<(String, FieldDelta)>,
    ) -> Result<()> {
        let collection = collection.to_string();
        let id = id.to_string();
        self.execute(move |conn| update_doc(conn, &collection, &id, &deltas))
            .await
    }

    pub async fn query(&self, collection: &str, query: Query) -> Result<Vec<Document>> {
        let collection = collection.to_string();
        self.execute(move |conn| query_docs(conn, &collection, &query))
            .await
    }

    /// Runs `f` against a transactional handle; all of its writes commit
    /// atomically or not at all. Conflicts surface as `TransactionConflict`
    /// and are the caller's responsibility to retry.
    pub async fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut StoreTransaction<'_>) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.execute(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let mut handle = StoreTransaction { tx };
            let value = f(&mut handle)?;
            handle.tx.commit()?;
            Ok(value)
        })
        .await
    }

    pub fn batch(&self) -> WriteBatch {
        WriteBatch::new(self.clone())
    }
}

/// Read/write handle passed to [`Database::transaction`] closures.
pub struct StoreTransaction<'conn> {
    tx: rusqlite::Transaction<'conn>,
}

impl StoreTransaction<'_> {
    pub fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        get_doc(&self.tx, collection, id)
    }

    pub fn set<T: Serialize>(&mut self, collection: &str, id: &str, value: &T) -> Result<()> {
        set_doc(&self.tx, collection, id, &to_fields(value)?)
    }

    pub fn update(
        &mut self,
        collection: &str,
        id: &str,
        deltas: Vec<(String, FieldDelta)>,
    ) -> Result<()> {
        update_doc(&self.tx, collection, id, &deltas)
    }

    pub fn delete(&mut self, collection: &str, id: &str) -> Result<()> {
        delete_doc(&self.tx, collection, id)
    }
}

fn get_doc(conn: &Connection, collection: &str, id: &str) -> Result<Option<Document>> {
    let mut stmt =
        conn.prepare("SELECT fields FROM documents WHERE collection = ?1 AND id = ?2")?;
    let raw: Option<String> = stmt
        .query_row(params![collection, id], |row| row.get(0))
        .optional()?;

    match raw {
        Some(raw) => {
            let fields: Map<String, Value> = serde_json::from_str(&raw)?;
            Ok(Some(Document {
                id: id.to_string(),
                fields,
            }))
        }
        None => Ok(None),
    }
}

fn set_doc(
    conn: &Connection,
    collection: &str,
    id: &str,
    fields: &Map<String, Value>,
) -> Result<()> {
    let raw = serde_json::to_string(fields)?;
    conn.execute(
        "INSERT INTO documents (collection, id, fields) VALUES (?1, ?2, ?3)
         ON CONFLICT (collection, id) DO UPDATE SET fields = excluded.fields",
        params![collection, id, raw],
    )?;
    Ok(())
}

fn delete_doc(conn: &Connection, collection: &str, id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
        params![collection, id],
    )?;
    Ok(())
}

fn update_doc(
    conn: &Connection,
    collection: &str,
    id: &str,
    deltas: &[(String, FieldDelta)],
) -> Result<()> {
    for (field, delta) in deltas {
        let path = format!("$.{field}");
        let affected = match delta {
            FieldDelta::Set(value) => conn.execute(
                "UPDATE documents SET fields = json_set(fields, ?3, json(?4))
                 WHERE collection = ?1 AND id = ?2",
                params![collection, id, path, serde_json::to_string(value)?],
            )?,
            // Arithmetic add applied in SQL; a missing field counts as zero.
            FieldDelta::Increment(amount) => conn.execute(
                "UPDATE documents
                 SET fields = json_set(fields, ?3, COALESCE(json_extract(fields, ?3), 0) + ?4)
                 WHERE collection = ?1 AND id = ?2",
                params![collection, id, path, amount],
            )?,
        };

        if affected == 0 {
            return Err(LedgerError::NotFound(format!(
                "document {collection}/{id}"
            )));
        }
    }
    Ok(())
}

fn query_docs(conn: &Connection, collection: &str, query: &Query) -> Result<Vec<Document>> {
    let mut sql = String::from("SELECT id, fields FROM documents WHERE collection = ?1");
    if query.filter.is_some() {
        sql.push_str(" AND json_extract(fields, ?2) > ?3");
    }
    if let Some((field, direction)) = &query.order {
        // Ties under the order key fall back to scan order, which is not
        // deterministic for equal values.
        let keyword = match direction {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        };
        sql.push_str(&format!(
            " ORDER BY json_extract(fields, '$.{field}') {keyword}"
        ));
    }
    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = match &query.filter {
        Some(Filter::GreaterThan(field, bound)) => {
            stmt.query(params![collection, format!("$.{field}"), bound])?
        }
        None => stmt.query(params![collection])?,
    };

    let mut documents = Vec::new();
    while let Some(row) = rows.next()? {
        let id: String = row.get(0)?;
        let raw: String = row.get(1)?;
        let fields: Map<String, Value> = serde_json::from_str(&raw)?;
        documents.push(Document { id, fields });
    }

    Ok(documents)
}
