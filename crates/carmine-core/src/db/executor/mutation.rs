use crate::{
    change::{ChangeKind, ChangeRecord},
    error::{ErrorOrigin, StoreError},
    key::{self, DataKey, IndexKey},
    value::{Value, wire},
};
use redis::aio::MultiplexedConnection;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

///
/// StoreOp
/// One queued store command; payloads are fully rendered before I/O.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum StoreOp {
    HashSet {
        key: DataKey,
        fields: Vec<(String, Vec<u8>)>,
    },
    HashDelete {
        key: DataKey,
        fields: Vec<String>,
    },
    KeyDelete {
        key: DataKey,
    },
    SetAdd {
        key: IndexKey,
        member: String,
    },
    SetRemove {
        key: IndexKey,
        member: String,
    },
}

///
/// Condition
/// Commit-time precondition attached to the whole batch.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Condition {
    /// The primary-key index for an entity type must exist; guards
    /// updates against rows that were never inserted or concurrently
    /// deleted.
    IndexExists(IndexKey),
}

impl Condition {
    pub(crate) fn key(&self) -> &str {
        match self {
            Self::IndexExists(key) => key.as_str(),
        }
    }
}

///
/// TransactionPlan
///
/// Pure translation of a change batch into store commands. Building a
/// plan performs no I/O; executing it is one atomic unit.
///

#[derive(Debug)]
pub struct TransactionPlan {
    conditions: Vec<Condition>,
    ops: Vec<StoreOp>,
    records: usize,
}

impl TransactionPlan {
    pub fn build(batch: &[ChangeRecord]) -> Result<Self, StoreError> {
        let mut plan = Self {
            conditions: Vec::new(),
            ops: Vec::new(),
            records: batch.len(),
        };

        for record in batch {
            match record.kind() {
                ChangeKind::Insert { values } => plan.plan_insert(record, values)?,
                ChangeKind::Update { current, original } => {
                    plan.plan_update(record, current, original)?;
                }
                ChangeKind::Delete { original } => plan.plan_delete(record, original)?,
            }
        }

        Ok(plan)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records == 0
    }

    pub(crate) fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub(crate) fn ops(&self) -> &[StoreOp] {
        &self.ops
    }

    pub(crate) const fn records(&self) -> usize {
        self.records
    }

    // Write one field per non-null value; nulls are field absence. The
    // primary-key encoding joins the index set in the same unit.
    fn plan_insert(
        &mut self,
        record: &ChangeRecord,
        values: &[Option<Value>],
    ) -> Result<(), StoreError> {
        let entity = record.entity();
        let encoding = key::primary_key_encoding(entity, values)?;
        let data_key = key::data_key(entity, &encoding);

        let fields: Vec<(String, Vec<u8>)> = entity
            .properties()
            .iter()
            .zip(values)
            .filter_map(|(property, slot)| {
                slot.as_ref()
                    .map(|value| (property.name.clone(), wire::encode(value)))
            })
            .collect();

        if !fields.is_empty() {
            self.ops.push(StoreOp::HashSet {
                key: data_key,
                fields,
            });
        }
        self.ops.push(StoreOp::SetAdd {
            key: key::index_key(entity),
            member: encoding.as_str().to_string(),
        });

        Ok(())
    }

    // The row is addressed by its *original* key; the index key must
    // still exist at commit time. Only fields whose value actually
    // changed are touched.
    fn plan_update(
        &mut self,
        record: &ChangeRecord,
        current: &[Option<Value>],
        original: &[Option<Value>],
    ) -> Result<(), StoreError> {
        let entity = record.entity();
        let encoding = key::primary_key_encoding(entity, original)?;
        let data_key = key::data_key(entity, &encoding);

        self.conditions
            .push(Condition::IndexExists(key::index_key(entity)));

        let mut cleared = Vec::new();
        let mut written = Vec::new();
        for (property, (now, before)) in entity
            .properties()
            .iter()
            .zip(current.iter().zip(original))
        {
            match now {
                None if before.is_some() => cleared.push(property.name.clone()),
                Some(value) if now != before => {
                    written.push((property.name.clone(), wire::encode(value)));
                }
                _ => {}
            }
        }

        if !cleared.is_empty() {
            self.ops.push(StoreOp::HashDelete {
                key: data_key.clone(),
                fields: cleared,
            });
        }
        if !written.is_empty() {
            self.ops.push(StoreOp::HashSet {
                key: data_key,
                fields: written,
            });
        }

        Ok(())
    }

    fn plan_delete(
        &mut self,
        record: &ChangeRecord,
        original: &[Option<Value>],
    ) -> Result<(), StoreError> {
        let entity = record.entity();
        let encoding = key::primary_key_encoding(entity, original)?;

        self.ops.push(StoreOp::KeyDelete {
            key: key::data_key(entity, &encoding),
        });
        self.ops.push(StoreOp::SetRemove {
            key: key::index_key(entity),
            member: encoding.as_str().to_string(),
        });

        Ok(())
    }
}

///
/// MutationApplier
///
/// Executes one plan as one atomic unit: WATCH the condition keys,
/// verify them, then MULTI/EXEC every queued command. A failed condition
/// or a concurrent touch of a watched key aborts the whole batch, which
/// reports as zero records applied. A store failure is an error, never
/// a zero count.
///

pub struct MutationApplier {
    connection: MultiplexedConnection,
    /// Serializes WATCH state across tasks sharing the multiplexed
    /// connection; without it another task's EXEC would consume our
    /// watch. Cross-process coordination stays with the store.
    gate: Arc<Mutex<()>>,
}

impl MutationApplier {
    pub(crate) const fn new(connection: MultiplexedConnection, gate: Arc<Mutex<()>>) -> Self {
        Self { connection, gate }
    }

    /// Apply the plan, returning how many records landed (0 if the
    /// transaction aborted as a unit).
    pub async fn execute(
        &mut self,
        plan: &TransactionPlan,
        cancel: &CancellationToken,
    ) -> Result<usize, StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::cancelled(ErrorOrigin::Transaction));
        }
        if plan.is_empty() {
            return Ok(0);
        }

        let gate = Arc::clone(&self.gate);
        let _guard = gate.lock().await;

        if !plan.conditions().is_empty() {
            let mut watch = redis::cmd("WATCH");
            for condition in plan.conditions() {
                watch.arg(condition.key());
            }
            watch
                .query_async::<()>(&mut self.connection)
                .await
                .map_err(StoreError::from)?;

            for condition in plan.conditions() {
                let holds = match self.check(condition).await {
                    Ok(holds) => holds,
                    Err(err) => {
                        self.unwatch().await;
                        return Err(err);
                    }
                };
                if !holds {
                    self.unwatch().await;
                    return Ok(0);
                }
            }
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in plan.ops() {
            append_op(&mut pipe, op);
        }

        let outcome: Option<redis::Value> = pipe
            .query_async(&mut self.connection)
            .await
            .map_err(StoreError::from)?;

        match outcome {
            Some(_) => {
                info!(entities = plan.records(), "saved changes");
                Ok(plan.records())
            }
            // A watched key changed between WATCH and EXEC.
            None => Ok(0),
        }
    }

    async fn check(&mut self, condition: &Condition) -> Result<bool, StoreError> {
        let exists: bool = redis::cmd("EXISTS")
            .arg(condition.key())
            .query_async(&mut self.connection)
            .await
            .map_err(StoreError::from)?;
        Ok(exists)
    }

    // Best effort; a failed UNWATCH leaves at most a spurious abort.
    async fn unwatch(&mut self) {
        let _: Result<(), _> = redis::cmd("UNWATCH")
            .query_async::<()>(&mut self.connection)
            .await;
    }
}

fn append_op(pipe: &mut redis::Pipeline, op: &StoreOp) {
    match op {
        StoreOp::HashSet { key, fields } => {
            let cmd = pipe.cmd("HSET").arg(key.as_str());
            for (field, value) in fields {
                cmd.arg(field).arg(value.as_slice());
            }
            cmd.ignore();
        }
        StoreOp::HashDelete { key, fields } => {
            let cmd = pipe.cmd("HDEL").arg(key.as_str());
            for field in fields {
                cmd.arg(field);
            }
            cmd.ignore();
        }
        StoreOp::KeyDelete { key } => {
            pipe.cmd("DEL").arg(key.as_str()).ignore();
        }
        StoreOp::SetAdd { key, member } => {
            pipe.cmd("SADD").arg(key.as_str()).arg(member).ignore();
        }
        StoreOp::SetRemove { key, member } => {
            pipe.cmd("SREM").arg(key.as_str()).arg(member).ignore();
        }
    }
}
