use crate::error::StoreError;

///
/// NoopTransaction
///
/// The explicit-transaction surface. Change batches already commit as
/// one atomic unit, so an explicit transaction has nothing to add: it is
/// rejected unless the configuration opts into treating it as a no-op.
///

#[derive(Debug, Default)]
pub struct NoopTransaction(());

impl NoopTransaction {
    pub(crate) fn open(ignore_transactions: bool) -> Result<Self, StoreError> {
        if ignore_transactions {
            Ok(Self(()))
        } else {
            Err(StoreError::transaction_unsupported(
                "explicit transactions are not supported by the redis store; \
                 change batches commit atomically on their own. Set \
                 ignore_transactions to accept no-op transactions",
            ))
        }
    }

    /// Nothing to commit; the batch already landed atomically.
    pub const fn commit(self) {}

    /// Nothing to roll back.
    pub const fn rollback(self) {}
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_unless_ignored() {
        let err = NoopTransaction::open(false).unwrap_err();
        assert!(matches!(err.class, crate::error::ErrorClass::Unsupported));
    }

    #[test]
    fn noop_when_ignored() {
        let txn = NoopTransaction::open(true).unwrap();
        txn.commit();
    }
}
