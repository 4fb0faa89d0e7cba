use crate::{db::config::StoreConfig, error::StoreError};
use redis::aio::MultiplexedConnection;
use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

///
/// ConnectionProvider
///
/// Process-lifetime cache of one multiplexed connection per distinct
/// configuration. Owned by the application and passed by handle to every
/// component that needs store access; there is no hidden global.
///
/// Concurrent first-time callers for the same configuration may both
/// connect; exactly one connection is retained and the loser's handle is
/// dropped. Callers must not assume the connection they created is the
/// one cached.
///

#[derive(Default)]
pub struct ConnectionProvider {
    connections: RwLock<HashMap<String, MultiplexedConnection>>,
}

impl ConnectionProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the cached connection for this configuration, connecting
    /// on first use.
    pub async fn get_or_create(
        &self,
        config: &StoreConfig,
    ) -> Result<MultiplexedConnection, StoreError> {
        let key = config.cache_key();

        if let Some(connection) = self.read_cached(&key) {
            return Ok(connection);
        }

        // Connect outside the lock; the map lock is never held across
        // an await point.
        let client = redis::Client::open(config.connection_info())
            .map_err(|err| StoreError::unavailable(err.to_string()))?;
        let connection = client
            .get_multiplexed_async_connection_with_timeouts(
                config.response_timeout,
                config.connect_timeout,
            )
            .await
            .map_err(|err| StoreError::unavailable(err.to_string()))?;

        let mut map = self
            .connections
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        // A racing caller may have inserted first; its connection wins.
        Ok(map.entry(key).or_insert(connection).clone())
    }

    /// A dedicated blocking connection for the synchronous administrative
    /// operations. Not cached; these are rare probe/flush calls.
    pub(crate) fn blocking_connection(
        &self,
        config: &StoreConfig,
    ) -> Result<redis::Connection, StoreError> {
        let client = redis::Client::open(config.connection_info())
            .map_err(|err| StoreError::unavailable(err.to_string()))?;
        let connection = client
            .get_connection_with_timeout(config.connect_timeout)
            .map_err(|err| StoreError::unavailable(err.to_string()))?;
        connection
            .set_read_timeout(Some(config.response_timeout))
            .map_err(|err| StoreError::unavailable(err.to_string()))?;
        Ok(connection)
    }

    fn read_cached(&self, key: &str) -> Option<MultiplexedConnection> {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}
