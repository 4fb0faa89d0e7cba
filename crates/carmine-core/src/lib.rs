//! Core runtime for Carmine: schema metadata, typed values, the wire
//! codec, keyspace construction, and the Redis-backed store engine.
#![warn(unreachable_pub)]

pub mod change;
pub mod db;
pub mod error;
pub mod key;
pub mod model;
pub mod value;

///
/// Prelude
///
/// Domain vocabulary only; executors and internals stay behind their
/// modules.
///

pub mod prelude {
    pub use crate::{
        change::ChangeRecord,
        db::{ConnectionProvider, Db, QuerySpec, Row, StoreConfig},
        error::StoreError,
        model::{EntityModel, PropertyModel, ScalarType},
        value::Value,
    };
}
