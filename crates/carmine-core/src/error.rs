use derive_more::Display;
use thiserror::Error as ThisError;

///
/// StoreError
///
/// Structured runtime error with a stable internal classification.
/// `class` is what callers branch on; `origin` localizes the failing
/// subsystem for diagnosis.
///

#[derive(Debug, ThisError)]
#[error("{origin}:{class}: {message}")]
pub struct StoreError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl StoreError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct a connection-origin unavailability error.
    pub(crate) fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unavailable, ErrorOrigin::Connection, message)
    }

    /// Construct a cancellation error for a specific origin.
    pub(crate) fn cancelled(origin: ErrorOrigin) -> Self {
        Self::new(ErrorClass::Cancelled, origin, "operation cancelled")
    }

    /// Construct a transaction-origin unsupported error.
    pub(crate) fn transaction_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Transaction, message)
    }

    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self.class, ErrorClass::Unavailable)
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.class, ErrorClass::Cancelled)
    }
}

///
/// ErrorClass
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ErrorClass {
    /// The store could not be reached or the connection dropped mid-flight.
    Unavailable,
    /// Stored bytes do not match the declared property type.
    Decode,
    /// The operation is rejected in the current configuration.
    Unsupported,
    /// A cancellation signal fired before a round trip.
    Cancelled,
    /// Everything else; indicates a bug or an unexpected store reply.
    Internal,
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ErrorOrigin {
    Connection,
    Key,
    Codec,
    Transaction,
    Query,
    Sequence,
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        let class = if err.is_io_error()
            || err.is_timeout()
            || err.is_connection_refusal()
            || err.is_connection_dropped()
        {
            ErrorClass::Unavailable
        } else {
            ErrorClass::Internal
        };

        Self::new(class, ErrorOrigin::Connection, err.to_string())
    }
}
