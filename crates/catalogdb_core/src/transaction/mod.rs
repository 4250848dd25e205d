//! All-or-nothing batches of record operations.
//!
//! A [`Transaction`] holds the store's lock from open to drop and keeps a
//! backup copy of the file:
//! - **Atomicity**: every queued operation is written, or none is
//! - **Consistency**: field rules, unique ids and the single featured
//!   product are checked before anything is written
//! - **Isolation**: no other writer can touch the file while it is open
//! - **Recovery**: a failed commit or an abandoned transaction restores the
//!   backup

mod coordinator;
mod state;

pub use coordinator::Transaction;
pub use state::{Operation, OperationKind, TransactionState};
