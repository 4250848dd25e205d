//! Error types for CatalogDB core.

use crate::transaction::OperationKind;
use catalogdb_codec::{CodecError, ProductId, Violation};
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in CatalogDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// File access error.
    #[error("storage error: {0}")]
    Storage(#[from] catalogdb_storage::StorageError),

    /// Record encoding error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A record broke one or more field rules.
    #[error("validation failed: {}", join(.violations))]
    Validation {
        /// Every broken rule.
        violations: Vec<Violation>,
    },

    /// A direct write would leave the store with duplicate ids or more than
    /// one featured product.
    #[error("invariant violated: {}", join(.breaches))]
    InvariantViolation {
        /// The store-wide rules the write would break.
        breaches: Vec<InvariantBreach>,
    },

    /// A transaction failed to commit and was rolled back.
    #[error("commit rejected: {}", join(.problems))]
    CommitRejected {
        /// Everything found wrong with the transaction.
        problems: Vec<CommitProblem>,
    },

    /// No product has the requested id.
    #[error("product not found: {id}")]
    NotFound {
        /// The id that was looked up.
        id: ProductId,
    },

    /// The store file does not exist and creation was disabled.
    #[error("store not found: {}", .path.display())]
    StoreMissing {
        /// Path of the missing store.
        path: PathBuf,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a validation error.
    pub fn validation(violations: Vec<Violation>) -> Self {
        Self::Validation { violations }
    }

    /// Creates a not found error.
    pub fn not_found(id: ProductId) -> Self {
        Self::NotFound { id }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true for [`CoreError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// A store-wide rule broken by a set of records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantBreach {
    /// Two or more records share an id.
    #[error("duplicate product id {0}")]
    DuplicateId(ProductId),

    /// More than one record is featured.
    #[error("{} products are featured ({})", .0.len(), join(.0))]
    MultipleFeatured(Vec<ProductId>),
}

/// One reason a transaction could not commit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitProblem {
    /// A queued record broke a field rule.
    #[error("operation {index} ({kind} of product {id}): {violation}")]
    InvalidRecord {
        /// Position of the operation in the queue.
        index: usize,
        /// Kind of the operation.
        kind: OperationKind,
        /// Id of the queued record.
        id: ProductId,
        /// The broken rule.
        violation: Violation,
    },

    /// An update was queued without the record it replaces.
    #[error("operation {index} (update of product {id}): no original record")]
    MissingOriginal {
        /// Position of the operation in the queue.
        index: usize,
        /// Id of the queued record.
        id: ProductId,
    },

    /// An update tried to change the id of the record it replaces.
    #[error("operation {index}: update changes id {from} to {to}")]
    IdChanged {
        /// Position of the operation in the queue.
        index: usize,
        /// Id of the original record.
        from: ProductId,
        /// Id of the queued record.
        to: ProductId,
    },

    /// An update names a product that is not in the store.
    #[error("operation {index} (update of product {id}): no such product")]
    UpdateTargetMissing {
        /// Position of the operation in the queue.
        index: usize,
        /// Id of the queued record.
        id: ProductId,
    },

    /// A stored record could not be decoded.
    #[error("stored record unreadable: {0}")]
    Unparsable(CodecError),

    /// The result would break a store-wide rule.
    #[error("{0}")]
    Invariant(InvariantBreach),

    /// Reading or writing the store failed.
    #[error("storage failure: {0}")]
    Storage(String),
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalogdb_codec::Field;

    #[test]
    fn validation_lists_every_violation() {
        let err = CoreError::validation(vec![
            Violation::new(Field::Name, "is required"),
            Violation::new(Field::Quantity, "must be between 0 and 150, got 200"),
        ]);
        assert_eq!(
            err.to_string(),
            "validation failed: name: is required; quantity: must be between 0 and 150, got 200"
        );
    }

    #[test]
    fn multiple_featured_names_ids() {
        let breach = InvariantBreach::MultipleFeatured(vec![ProductId::new(1), ProductId::new(4)]);
        assert_eq!(breach.to_string(), "2 products are featured (1; 4)");
    }

    #[test]
    fn commit_problem_display() {
        let problem = CommitProblem::InvalidRecord {
            index: 2,
            kind: OperationKind::Create,
            id: ProductId::new(9),
            violation: Violation::new(Field::Image, "must end in one of .jpg"),
        };
        assert_eq!(
            problem.to_string(),
            "operation 2 (create of product 9): image: must end in one of .jpg"
        );
    }

    #[test]
    fn not_found_helper() {
        let err = CoreError::not_found(ProductId::new(3));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "product not found: 3");
    }
}
