//! The Redis-backed store engine.
//!
//! `Db` is the single runtime handle the rest of the system talks to; it
//! composes the connection provider with the executors and exposes the
//! operation surface: ensure-created, flush, execute-transaction,
//! result retrieval, and generated values.

pub mod config;
pub mod connection;
pub mod executor;
pub mod query;
pub mod transaction;

use crate::{
    change::ChangeRecord,
    error::{ErrorOrigin, StoreError},
    key::KeyEncoding,
    model::{EntityModel, PropertyModel},
};
use executor::{MutationApplier, ResultRetriever, RowScan, SequenceGenerator, TransactionPlan};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::error;

pub use config::StoreConfig;
pub use connection::ConnectionProvider;
pub use query::{QuerySpec, Row};
pub use transaction::NoopTransaction;

///
/// Db
///

#[derive(Clone)]
pub struct Db {
    config: StoreConfig,
    provider: Arc<ConnectionProvider>,
    transaction_gate: Arc<Mutex<()>>,
}

impl Db {
    #[must_use]
    pub fn new(config: StoreConfig, provider: Arc<ConnectionProvider>) -> Self {
        Self {
            config,
            provider,
            transaction_gate: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Administrative operations
    // ------------------------------------------------------------------

    /// Probe reachability without mutating data. Degrades to a boolean
    /// for operational convenience; the failure is logged, not raised.
    pub async fn ensure_created(&self) -> bool {
        match self.ping().await {
            Ok(()) => true,
            Err(err) => {
                error!(%err, "store probe failed");
                false
            }
        }
    }

    /// Blocking form of [`Self::ensure_created`].
    #[must_use]
    pub fn ensure_created_blocking(&self) -> bool {
        match self.ping_blocking() {
            Ok(()) => true,
            Err(err) => {
                error!(%err, "store probe failed");
                false
            }
        }
    }

    /// Delete every key in the configured logical database.
    pub async fn flush(&self) -> bool {
        match self.flush_inner().await {
            Ok(()) => true,
            Err(err) => {
                error!(%err, "flush failed");
                false
            }
        }
    }

    /// Blocking form of [`Self::flush`].
    #[must_use]
    pub fn flush_blocking(&self) -> bool {
        match self.flush_blocking_inner() {
            Ok(()) => true,
            Err(err) => {
                error!(%err, "flush failed");
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Apply a change batch as one atomic transaction.
    ///
    /// Returns how many records landed: all of them, or 0 if the store
    /// aborted the transaction (an expected concurrent-modification
    /// outcome, distinct from an `Err`).
    pub async fn save_changes(
        &self,
        batch: &[ChangeRecord],
        cancel: &CancellationToken,
    ) -> Result<usize, StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::cancelled(ErrorOrigin::Transaction));
        }

        let plan = TransactionPlan::build(batch)?;
        let connection = self.provider.get_or_create(&self.config).await?;
        let mut applier = MutationApplier::new(connection, Arc::clone(&self.transaction_gate));
        applier.execute(&plan, cancel).await
    }

    /// Open the explicit-transaction surface; see [`NoopTransaction`].
    pub fn begin_transaction(&self) -> Result<NoopTransaction, StoreError> {
        NoopTransaction::open(self.config.ignore_transactions)
    }

    // ------------------------------------------------------------------
    // Retrieval
    // ------------------------------------------------------------------

    /// Read one entity's requested properties by primary-key encoding.
    pub async fn read_one(
        &self,
        query: &QuerySpec,
        key: &KeyEncoding,
    ) -> Result<Row, StoreError> {
        let connection = self.provider.get_or_create(&self.config).await?;
        ResultRetriever::new(connection).read_one(query, key).await
    }

    /// Eagerly read every row matching the query.
    pub async fn rows(&self, query: &QuerySpec) -> Result<Vec<Row>, StoreError> {
        let connection = self.provider.get_or_create(&self.config).await?;
        ResultRetriever::new(connection).rows(query).await
    }

    /// Start a lazy asynchronous scan; no I/O happens until the first
    /// advance.
    #[must_use]
    pub fn scan(&self, query: QuerySpec, cancel: CancellationToken) -> RowScan {
        RowScan::new(
            query,
            cancel,
            self.config.clone(),
            Arc::clone(&self.provider),
        )
    }

    // ------------------------------------------------------------------
    // Generated values
    // ------------------------------------------------------------------

    /// Next generated value for a property's sequence.
    pub async fn next_value(
        &self,
        entity: &EntityModel,
        property: &PropertyModel,
        increment_by: i64,
        sequence_name: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<i64, StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::cancelled(ErrorOrigin::Sequence));
        }

        let connection = self.provider.get_or_create(&self.config).await?;
        SequenceGenerator::new(connection)
            .next_value(entity, property, increment_by, sequence_name, cancel)
            .await
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn ping(&self) -> Result<(), StoreError> {
        let mut connection = self.provider.get_or_create(&self.config).await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(StoreError::from)?;
        Ok(())
    }

    fn ping_blocking(&self) -> Result<(), StoreError> {
        let mut connection = self.provider.blocking_connection(&self.config)?;
        let _: String = redis::cmd("PING")
            .query(&mut connection)
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn flush_inner(&self) -> Result<(), StoreError> {
        let mut connection = self.provider.get_or_create(&self.config).await?;
        let _: String = redis::cmd("FLUSHDB")
            .query_async(&mut connection)
            .await
            .map_err(StoreError::from)?;
        Ok(())
    }

    fn flush_blocking_inner(&self) -> Result<(), StoreError> {
        let mut connection = self.provider.blocking_connection(&self.config)?;
        let _: String = redis::cmd("FLUSHDB")
            .query(&mut connection)
            .map_err(StoreError::from)?;
        Ok(())
    }
}
