//! Transaction state and queued operations.

use catalogdb_codec::Product;
use std::fmt;

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is open and can queue operations.
    Open,
    /// Transaction has been committed.
    Committed,
    /// Transaction has been rolled back.
    RolledBack,
}

/// Kind of a queued operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Append a new record.
    Create,
    /// Replace the record with the same id.
    Update,
    /// Remove every record with the same id.
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// A change queued in a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// What the operation does.
    pub kind: OperationKind,
    /// The record to create, the replacement, or the record to delete.
    pub record: Product,
    /// The record an update replaces.
    pub original: Option<Product>,
}

impl Operation {
    /// Creates a create operation.
    #[must_use]
    pub fn create(record: Product) -> Self {
        Self {
            kind: OperationKind::Create,
            record,
            original: None,
        }
    }

    /// Creates an update operation replacing `original` with `record`.
    #[must_use]
    pub fn update(record: Product, original: Product) -> Self {
        Self {
            kind: OperationKind::Update,
            record,
            original: Some(original),
        }
    }

    /// Creates a delete operation.
    #[must_use]
    pub fn delete(record: Product) -> Self {
        Self {
            kind: OperationKind::Delete,
            record,
            original: None,
        }
    }
}
