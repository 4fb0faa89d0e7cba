use crate::{
    error::{ErrorOrigin, StoreError},
    key::{self, SequenceKey},
    model::{EntityModel, PropertyModel},
};
use redis::aio::MultiplexedConnection;
use tokio_util::sync::CancellationToken;

///
/// SequenceGenerator
///
/// Produces generated integer values from a per-(entity, property)
/// counter. The store's atomic increment is the sole source of ordering:
/// concurrent callers anywhere draw distinct values with no gaps and no
/// client-side locking.
///

pub struct SequenceGenerator {
    connection: MultiplexedConnection,
}

impl SequenceGenerator {
    pub(crate) const fn new(connection: MultiplexedConnection) -> Self {
        Self { connection }
    }

    /// Increment and return the counter.
    ///
    /// `increment_by` above 1 reserves a contiguous block ending at the
    /// returned value; splitting the block into individual values is the
    /// caller's arithmetic. A `sequence_name` override addresses a
    /// caller-owned counter key verbatim.
    pub async fn next_value(
        &mut self,
        entity: &EntityModel,
        property: &PropertyModel,
        increment_by: i64,
        sequence_name: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<i64, StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::cancelled(ErrorOrigin::Sequence));
        }

        let counter = sequence_name.map_or_else(
            || key::sequence_key(entity, property),
            SequenceKey::from_override,
        );

        let value: i64 = redis::cmd("INCRBY")
            .arg(counter.as_str())
            .arg(increment_by)
            .query_async(&mut self.connection)
            .await
            .map_err(StoreError::from)?;

        Ok(value)
    }
}
