//! Bounded multi-write batches, committed as one transaction.

use anyhow::anyhow;
use rusqlite::TransactionBehavior;
use serde::Serialize;
use serde_json::{Map, Value};

use super::{delete_doc, document::to_fields, set_doc, update_doc, Database, FieldDelta};
use crate::error::{LedgerError, Result};

/// Upper bound on writes grouped into one batch commit.
pub const MAX_BATCH_OPS: usize = 500;

enum BatchOp {
    Set {
        collection: String,
        id: String,
        fields: Map<String, Value>,
    },
    Update {
        collection: String,
        id: String,
        deltas: Vec<(String, FieldDelta)>,
    },
    Delete {
        collection: String,
        id: String,
    },
}

/// Accumulates up to [`MAX_BATCH_OPS`] writes; `commit` applies all of them
/// atomically. Partial commits are never attempted: any failing operation
/// rolls the whole batch back.
pub struct WriteBatch {
    db: Database,
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub(crate) fn new(db: Database) -> Self {
        Self {
            db,
            ops: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn set<T: Serialize>(&mut self, collection: &str, id: &str, value: &T) -> Result<()> {
        let fields = to_fields(value)?;
        self.push(BatchOp::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        })
    }

    pub fn update(
        &mut self,
        collection: &str,
        id: &str,
        deltas: Vec<(String, FieldDelta)>,
    ) -> Result<()> {
        self.push(BatchOp::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            deltas,
        })
    }

    pub fn delete(&mut self, collection: &str, id: &str) -> Result<()> {
        self.push(BatchOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        })
    }

    fn push(&mut self, op: BatchOp) -> Result<()> {
        if self.ops.len() >= MAX_BATCH_OPS {
            return Err(LedgerError::Transport(anyhow!(
                "write batch exceeds {MAX_BATCH_OPS} operations"
            )));
        }
        self.ops.push(op);
        Ok(())
    }

    pub async fn commit(self) -> Result<()> {
        let WriteBatch { db, ops } = self;
        if ops.is_empty() {
            return Ok(());
        }

        db.execute(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            for op in &ops {
                match op {
                    BatchOp::Set {
                        collection,
                        id,
                        fields,
                    } => set_doc(&tx, collection, id, fields)?,
                    BatchOp::Update {
                        collection,
                        id,
                        deltas,
                    } => update_doc(&tx, collection, id, deltas)?,
                    BatchOp::Delete { collection, id } => delete_doc(&tx, collection, id)?,
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }
}
