use crate::{
    db::{
        config::StoreConfig,
        connection::ConnectionProvider,
        query::{QuerySpec, Row},
    },
    error::{ErrorOrigin, StoreError},
    key::{self, KeyEncoding},
    model::EntityModel,
    value::wire,
};
use redis::aio::MultiplexedConnection;
use std::{collections::HashMap, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

///
/// ResultRetriever
///
/// Reads full or partial property sets for one or many entities. The
/// enumeration algorithm is: one round trip for the index-set
/// membership, then one read per member.
///

pub struct ResultRetriever {
    connection: MultiplexedConnection,
}

impl ResultRetriever {
    pub(crate) const fn new(connection: MultiplexedConnection) -> Self {
        Self { connection }
    }

    /// Read one entity's requested properties.
    pub async fn read_one(
        &mut self,
        query: &QuerySpec,
        key: &KeyEncoding,
    ) -> Result<Row, StoreError> {
        fetch_row(&mut self.connection, query, key).await
    }

    /// Eager read of every stored entity of the query's type. The
    /// returned list iterates without further suspension; this is the
    /// pull-style counterpart of `RowScan`.
    pub async fn rows(&mut self, query: &QuerySpec) -> Result<Vec<Row>, StoreError> {
        let members = index_members(&mut self.connection, query.entity()).await?;

        let mut rows = Vec::with_capacity(members.len());
        for member in &members {
            rows.push(fetch_row(&mut self.connection, query, member).await?);
        }
        Ok(rows)
    }
}

///
/// RowScan
///
/// Lazily-driven asynchronous sequence of rows. The index membership is
/// fetched on the first advance, not at construction; every advance
/// afterwards costs exactly one round trip and yields one row.
/// Exhaustion is terminal and releases the held connection; the scan is
/// not restartable. The cancellation signal is checked before every
/// round trip.
///

pub struct RowScan {
    query: QuerySpec,
    cancel: CancellationToken,
    config: StoreConfig,
    provider: Arc<ConnectionProvider>,
    state: ScanState,
}

enum ScanState {
    Unstarted,
    Active {
        connection: MultiplexedConnection,
        keys: Vec<KeyEncoding>,
        offset: usize,
    },
    Done,
}

impl RowScan {
    pub(crate) const fn new(
        query: QuerySpec,
        cancel: CancellationToken,
        config: StoreConfig,
        provider: Arc<ConnectionProvider>,
    ) -> Self {
        Self {
            query,
            cancel,
            config,
            provider,
            state: ScanState::Unstarted,
        }
    }

    /// Advance to the next row. Returns `Ok(None)` once exhausted, and
    /// keeps returning it afterwards.
    pub async fn next(&mut self) -> Result<Option<Row>, StoreError> {
        if matches!(self.state, ScanState::Done) {
            return Ok(None);
        }

        if self.cancel.is_cancelled() {
            self.state = ScanState::Done;
            return Err(StoreError::cancelled(ErrorOrigin::Query));
        }

        if matches!(self.state, ScanState::Unstarted) {
            let mut connection = self.provider.get_or_create(&self.config).await?;
            let keys = index_members(&mut connection, self.query.entity()).await?;
            debug!(
                entity = self.query.entity().name(),
                members = keys.len(),
                "scan started"
            );
            self.state = ScanState::Active {
                connection,
                keys,
                offset: 0,
            };
        }

        let ScanState::Active {
            connection,
            keys,
            offset,
        } = &mut self.state
        else {
            return Ok(None);
        };

        if *offset >= keys.len() {
            self.state = ScanState::Done;
            return Ok(None);
        }

        let member = keys[*offset].clone();
        *offset += 1;

        let row = fetch_row(connection, &self.query, &member).await?;
        Ok(Some(row))
    }
}

/// One round trip for the full index-set membership of an entity type.
pub(crate) async fn index_members(
    connection: &mut MultiplexedConnection,
    entity: &EntityModel,
) -> Result<Vec<KeyEncoding>, StoreError> {
    let members: Vec<String> = redis::cmd("SMEMBERS")
        .arg(key::index_key(entity).as_str())
        .query_async(connection)
        .await
        .map_err(StoreError::from)?;

    Ok(members.into_iter().map(KeyEncoding::from_stored).collect())
}

/// One round trip for one entity's requested properties.
///
/// A full-width query is an HGETALL with absent fields decoded as null
/// slots at each property's ordinal; a selection is an HMGET whose row
/// preserves the caller's property order.
pub(crate) async fn fetch_row(
    connection: &mut MultiplexedConnection,
    query: &QuerySpec,
    member: &KeyEncoding,
) -> Result<Row, StoreError> {
    let entity = query.entity();
    let data_key = key::data_key(entity, member);

    if query.is_full_width() {
        let mut stored: HashMap<String, Vec<u8>> = redis::cmd("HGETALL")
            .arg(data_key.as_str())
            .query_async(connection)
            .await
            .map_err(StoreError::from)?;

        let mut slots = vec![None; entity.properties().len()];
        for property in entity.properties() {
            if let Some(bytes) = stored.remove(&property.name) {
                slots[property.ordinal] = Some(wire::decode(&bytes, property, entity.name())?);
            }
        }
        return Ok(Row::new(slots));
    }

    let mut cmd = redis::cmd("HMGET");
    cmd.arg(data_key.as_str());
    for property in query.selected_properties() {
        cmd.arg(&property.name);
    }

    let stored: Vec<Option<Vec<u8>>> = cmd
        .query_async(connection)
        .await
        .map_err(StoreError::from)?;

    let mut slots = Vec::with_capacity(stored.len());
    for (property, bytes) in query.selected_properties().zip(stored) {
        slots.push(match bytes {
            Some(bytes) => Some(wire::decode(&bytes, property, entity.name())?),
            None => None,
        });
    }
    Ok(Row::new(slots))
}
