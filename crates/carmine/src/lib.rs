//! Carmine: a schema-driven typed entity store for Redis.
//!
//! ## Crate layout
//! - `core`: runtime model, values, wire codec, keyspace, and the store
//!   engine. This crate re-exports it and adds the user-facing prelude.
//!
//! Entities are described by [`core::model::EntityModel`]s owned by the
//! host application; the engine persists each instance as one Redis hash,
//! indexed by a per-type primary-key set, and applies change batches as
//! single atomic transactions.

pub use carmine_core as core;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use core::error::StoreError;

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::{
        change::ChangeRecord,
        db::{
            ConnectionProvider, Db, NoopTransaction, QuerySpec, Row, StoreConfig,
            executor::RowScan,
        },
        error::{ErrorClass, ErrorOrigin, StoreError},
        key::{self, KeyEncoding},
        model::{EntityModel, PropertyModel, ScalarType},
        value::Value,
    };
    pub use tokio_util::sync::CancellationToken;
}
