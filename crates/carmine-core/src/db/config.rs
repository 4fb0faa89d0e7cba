use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use serde::{Deserialize, Serialize};
use std::time::Duration;

///
/// StoreConfig
///
/// Everything needed to reach one logical Redis database. The canonical
/// cache-key string identifies a distinct configuration; two configs with
/// the same cache key share one multiplexed connection.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    /// Logical database index (SELECT).
    pub database: i64,
    pub connect_timeout: Duration,
    pub response_timeout: Duration,
    /// Treat the explicit-transaction surface as no-ops instead of
    /// rejecting it. Batches commit atomically either way.
    pub ignore_transactions: bool,
}

impl StoreConfig {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Canonical configuration string; the connection-cache key.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!(
            "{}:{},db={},connectTimeout={},syncTimeout={}",
            self.host,
            self.port,
            self.database,
            self.connect_timeout.as_millis(),
            self.response_timeout.as_millis(),
        )
    }

    pub(crate) fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            addr: ConnectionAddr::Tcp(self.host.clone(), self.port),
            redis: RedisConnectionInfo {
                db: self.database,
                ..RedisConnectionInfo::default()
            },
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            database: 0,
            connect_timeout: Duration::from_secs(5),
            response_timeout: Duration::from_secs(5),
            ignore_transactions: false,
        }
    }
}

///
/// TESTS
///
