//! Batch transactions over a store file.

use crate::error::{CommitProblem, CoreError, CoreResult};
use crate::records::{check_invariants, parse_strict, LoadedStore};
use crate::transaction::state::{Operation, OperationKind, TransactionState};
use catalogdb_codec::{serialize, validate, Field, Product, Violation};
use catalogdb_storage::{FileAccessManager, FileGuard};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// An all-or-nothing group of operations against one store file.
///
/// Opening a transaction takes the file's lock and copies the file to a
/// uniquely named backup. The lock is held until the transaction is
/// dropped, so nothing else can change the file while operations are
/// queued and committed.
///
/// [`commit`](Self::commit) validates every queued operation, applies them
/// to the current contents, checks the store-wide rules and writes the
/// result. Any failure restores the backup, leaving the file byte for byte
/// as it was when the transaction opened.
///
/// A transaction dropped while still open is rolled back.
pub struct Transaction<'a> {
    guard: FileGuard<'a>,
    backup: Option<PathBuf>,
    operations: Vec<Operation>,
    state: TransactionState,
}

impl<'a> Transaction<'a> {
    /// Opens a transaction on `files`, blocking until its lock is free.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup copy cannot be made.
    pub fn begin(files: &'a FileAccessManager) -> CoreResult<Self> {
        let guard = files.lock();
        let backup_path = backup_path_for(files);

        let backup = match guard.copy_to(&backup_path) {
            Ok(true) => Some(backup_path),
            Ok(false) => None,
            Err(err) => {
                let _ = fs::remove_file(&backup_path);
                return Err(err.into());
            }
        };

        debug!(path = %files.path().display(), backup = ?backup, "transaction opened");
        Ok(Self {
            guard,
            backup,
            operations: Vec::new(),
            state: TransactionState::Open,
        })
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Checks if the transaction is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == TransactionState::Open
    }

    /// Returns the queued operations.
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Returns the number of queued operations.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// Path of the backup taken when the transaction opened.
    ///
    /// `None` if the store file did not exist yet, or once the backup has
    /// been discarded.
    #[must_use]
    pub fn backup_path(&self) -> Option<&Path> {
        self.backup.as_deref()
    }

    /// Queues an operation.
    ///
    /// Nothing is checked here; every problem is reported together by
    /// [`commit`](Self::commit).
    pub fn add_operation(&mut self, operation: Operation) -> CoreResult<()> {
        self.ensure_open()?;
        self.operations.push(operation);
        Ok(())
    }

    /// Queues the creation of `record`.
    pub fn create(&mut self, record: Product) -> CoreResult<()> {
        self.add_operation(Operation::create(record))
    }

    /// Queues replacing `original` with `record`.
    pub fn update(&mut self, record: Product, original: Product) -> CoreResult<()> {
        self.add_operation(Operation::update(record, original))
    }

    /// Queues the deletion of every record with the id of `record`.
    pub fn delete(&mut self, record: Product) -> CoreResult<()> {
        self.add_operation(Operation::delete(record))
    }

    /// Returns the store as it would look if the transaction committed now.
    ///
    /// Records that fail to decode are left out, and operations that could
    /// not apply are skipped. Use [`commit`](Self::commit) for the checked
    /// result.
    pub fn staged(&self) -> CoreResult<Vec<Product>> {
        let contents = self.guard.read_bytes()?;
        let mut products = LoadedStore::parse(contents).into_products();
        for op in &self.operations {
            let _ = apply(&mut products, op);
        }
        Ok(products)
    }

    /// Validates, applies and writes the queued operations.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CommitRejected`] with every problem found. The
    /// store file is restored from the backup before returning.
    pub fn commit(&mut self) -> CoreResult<()> {
        self.ensure_open()?;
        let started = Instant::now();

        match self.try_commit() {
            Ok(()) => {
                self.state = TransactionState::Committed;
                self.discard_backup();
                info!(
                    operations = self.operations.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "transaction committed"
                );
                Ok(())
            }
            Err(mut problems) => {
                warn!(
                    operations = self.operations.len(),
                    problems = problems.len(),
                    "transaction rejected, restoring backup"
                );
                match self.restore() {
                    Ok(()) => self.discard_backup(),
                    Err(err) => {
                        problems.push(CommitProblem::Storage(format!("restore failed: {err}")));
                        self.keep_backup();
                    }
                }
                self.state = TransactionState::RolledBack;
                Err(CoreError::CommitRejected { problems })
            }
        }
    }

    /// Restores the store to its state when the transaction opened.
    ///
    /// Does nothing once the transaction is committed or rolled back.
    pub fn rollback(&mut self) -> CoreResult<()> {
        if !self.is_open() {
            return Ok(());
        }
        self.state = TransactionState::RolledBack;
        if let Err(err) = self.restore() {
            self.keep_backup();
            return Err(err);
        }
        self.discard_backup();
        debug!(operations = self.operations.len(), "transaction rolled back");
        Ok(())
    }

    fn try_commit(&self) -> Result<(), Vec<CommitProblem>> {
        let mut problems = self.check_operations();

        let contents = self
            .guard
            .read_bytes()
            .map_err(|err| vec![CommitProblem::Storage(err.to_string())])?;
        let mut products = match parse_strict(contents) {
            Ok(products) => products,
            Err(errors) => {
                problems.extend(errors.into_iter().map(CommitProblem::Unparsable));
                return Err(problems);
            }
        };
        if !problems.is_empty() {
            return Err(problems);
        }

        for (index, op) in self.operations.iter().enumerate() {
            if !apply(&mut products, op) {
                problems.push(CommitProblem::UpdateTargetMissing {
                    index,
                    id: op.record.id,
                });
            }
        }
        problems.extend(check_invariants(&products).into_iter().map(CommitProblem::Invariant));
        if !problems.is_empty() {
            return Err(problems);
        }

        let lines: Vec<String> = products.iter().map(serialize).collect();
        self.guard
            .write_all_lines(&lines)
            .map_err(|err| vec![CommitProblem::Storage(err.to_string())])
    }

    fn check_operations(&self) -> Vec<CommitProblem> {
        let mut problems = Vec::new();

        for (index, op) in self.operations.iter().enumerate() {
            let record = &op.record;
            let violations = match op.kind {
                OperationKind::Create | OperationKind::Update => validate(record),
                OperationKind::Delete if record.id.is_assigned() => Vec::new(),
                OperationKind::Delete => {
                    vec![Violation::new(Field::Id, "must be a positive integer")]
                }
            };
            problems.extend(violations.into_iter().map(|violation| {
                CommitProblem::InvalidRecord {
                    index,
                    kind: op.kind,
                    id: record.id,
                    violation,
                }
            }));

            if op.kind == OperationKind::Update {
                match &op.original {
                    None => problems.push(CommitProblem::MissingOriginal {
                        index,
                        id: record.id,
                    }),
                    Some(original) if original.id != record.id => {
                        problems.push(CommitProblem::IdChanged {
                            index,
                            from: original.id,
                            to: record.id,
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        problems
    }

    fn restore(&self) -> CoreResult<()> {
        match &self.backup {
            Some(backup) => self.guard.restore_from(backup)?,
            None => {
                self.guard.remove()?;
            }
        }
        Ok(())
    }

    fn discard_backup(&mut self) {
        if let Some(backup) = self.backup.take() {
            if let Err(err) = fs::remove_file(&backup) {
                warn!(backup = %backup.display(), error = %err, "failed to remove transaction backup");
            }
        }
    }

    fn keep_backup(&mut self) {
        if let Some(backup) = self.backup.take() {
            error!(
                path = %self.guard.path().display(),
                backup = %backup.display(),
                "store could not be restored; backup kept for manual recovery"
            );
        }
    }

    fn ensure_open(&self) -> CoreResult<()> {
        match self.state {
            TransactionState::Open => Ok(()),
            TransactionState::Committed => Err(CoreError::invalid_operation(
                "transaction already committed",
            )),
            TransactionState::RolledBack => Err(CoreError::invalid_operation(
                "transaction already rolled back",
            )),
        }
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.is_open() {
            if let Err(err) = self.rollback() {
                error!(error = %err, "rollback on drop failed");
            }
        } else {
            self.discard_backup();
        }
    }
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("path", &self.guard.path())
            .field("backup", &self.backup)
            .field("operations", &self.operations.len())
            .field("state", &self.state)
            .finish()
    }
}

/// Applies one operation, returning false if an update found no target.
fn apply(products: &mut Vec<Product>, op: &Operation) -> bool {
    match op.kind {
        OperationKind::Create => products.push(op.record.clone()),
        OperationKind::Update => {
            match products.iter_mut().find(|p| p.id == op.record.id) {
                Some(slot) => *slot = op.record.clone(),
                None => return false,
            }
        }
        OperationKind::Delete => products.retain(|p| p.id != op.record.id),
    }
    true
}

/// `<store>.backup_<millis>_<random>`, unique per transaction.
fn backup_path_for(files: &FileAccessManager) -> PathBuf {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    let random = Uuid::new_v4().simple().to_string();
    files.snapshot_path(&format!("{millis}_{}", &random[..8]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvariantBreach;
    use catalogdb_codec::{Price, ProductId};
    use catalogdb_storage::LockRegistry;
    use tempfile::TempDir;

    const SEED: &str = "1,Widget,A widget,9.99,5,widget.jpg,false\n\
                        2,Gadget,A gadget,19.99,2,gadget.png,true\n";

    struct Fixture {
        _dir: TempDir,
        path: PathBuf,
        registry: LockRegistry,
    }

    impl Fixture {
        fn new(contents: Option<&str>) -> Self {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("products.csv");
            if let Some(contents) = contents {
                fs::write(&path, contents).unwrap();
            }
            Self {
                _dir: dir,
                path,
                registry: LockRegistry::new(),
            }
        }

        fn files(&self) -> FileAccessManager {
            FileAccessManager::new(&self.path, &self.registry)
        }

        fn contents(&self) -> String {
            fs::read_to_string(&self.path).unwrap()
        }

        fn leftover_backups(&self) -> Vec<PathBuf> {
            fs::read_dir(self.path.parent().unwrap())
                .unwrap()
                .map(|e| e.unwrap().path())
                .filter(|p| p.to_string_lossy().contains(".backup_"))
                .collect()
        }
    }

    fn product(id: u64, name: &str) -> Product {
        Product::new(name, "Something", Price::from_cents(500), 3, "thing.jpg")
            .with_id(ProductId::new(id))
    }

    fn problems(err: CoreError) -> Vec<CommitProblem> {
        match err {
            CoreError::CommitRejected { problems } => problems,
            other => panic!("expected CommitRejected, got {other:?}"),
        }
    }

    #[test]
    fn begin_takes_backup() {
        let fx = Fixture::new(Some(SEED));
        let files = fx.files();
        let txn = Transaction::begin(&files).unwrap();

        let backup = txn.backup_path().unwrap().to_path_buf();
        assert!(backup.to_string_lossy().contains("products.csv.backup_"));
        assert_eq!(fs::read_to_string(&backup).unwrap(), SEED);
        assert!(txn.is_open());
    }

    #[test]
    fn commit_applies_operations_in_order() {
        let fx = Fixture::new(Some(SEED));
        let files = fx.files();
        let mut txn = Transaction::begin(&files).unwrap();

        let widget = product(1, "Widget");
        txn.create(product(3, "Lamp")).unwrap();
        txn.update(product(1, "Widget Pro"), widget).unwrap();
        txn.delete(product(2, "Gadget")).unwrap();
        txn.commit().unwrap();

        assert_eq!(txn.state(), TransactionState::Committed);
        let contents = fx.contents();
        assert_eq!(
            contents,
            "1,Widget Pro,Something,5.00,3,thing.jpg,false\n\
             3,Lamp,Something,5.00,3,thing.jpg,false\n"
        );
        drop(txn);
        assert!(fx.leftover_backups().is_empty());
    }

    #[test]
    fn failed_commit_leaves_file_byte_identical() {
        let fx = Fixture::new(Some(SEED));
        let before = fs::read(&fx.path).unwrap();
        let files = fx.files();

        let mut txn = Transaction::begin(&files).unwrap();
        txn.create(product(3, "Lamp")).unwrap();
        let mut bad = product(4, "Broken");
        bad.image = "broken.bmp".to_string();
        txn.create(bad).unwrap();

        let problems = problems(txn.commit().unwrap_err());
        assert_eq!(problems.len(), 1);
        assert!(matches!(
            &problems[0],
            CommitProblem::InvalidRecord { index: 1, kind: OperationKind::Create, violation, .. }
                if violation.field == Field::Image
        ));

        assert_eq!(txn.state(), TransactionState::RolledBack);
        assert_eq!(fs::read(&fx.path).unwrap(), before);
        drop(txn);
        assert!(fx.leftover_backups().is_empty());
    }

    #[test]
    fn all_problems_reported_together() {
        let fx = Fixture::new(Some(SEED));
        let files = fx.files();
        let mut txn = Transaction::begin(&files).unwrap();

        let mut invalid = product(5, "");
        invalid.quantity = 200;
        txn.create(invalid).unwrap();
        txn.add_operation(Operation {
            kind: OperationKind::Update,
            record: product(1, "Widget"),
            original: None,
        })
        .unwrap();
        txn.update(product(7, "Other"), product(1, "Widget")).unwrap();
        txn.delete(product(0, "Nothing")).unwrap();

        let problems = problems(txn.commit().unwrap_err());
        assert_eq!(problems.len(), 5, "{problems:?}");
        assert!(problems.contains(&CommitProblem::MissingOriginal {
            index: 1,
            id: ProductId::new(1)
        }));
        assert!(problems.contains(&CommitProblem::IdChanged {
            index: 2,
            from: ProductId::new(1),
            to: ProductId::new(7)
        }));
        assert_eq!(fx.contents(), SEED);
    }

    #[test]
    fn unparsable_store_rejects_commit() {
        let text = "1,Widget,A widget,9.99,5,widget.jpg,false\n2,Gadget,A gadget,19.99,2,gadget.png\n";
        let fx = Fixture::new(Some(text));
        let files = fx.files();
        let mut txn = Transaction::begin(&files).unwrap();
        txn.create(product(3, "Lamp")).unwrap();

        let problems = problems(txn.commit().unwrap_err());
        assert!(matches!(&problems[..], [CommitProblem::Unparsable(err)] if err.line() == 2));
        assert_eq!(fx.contents(), text);
    }

    #[test]
    fn update_of_missing_product_is_rejected() {
        let fx = Fixture::new(Some(SEED));
        let files = fx.files();
        let mut txn = Transaction::begin(&files).unwrap();
        txn.update(product(9, "Ghost"), product(9, "Ghost")).unwrap();

        let problems = problems(txn.commit().unwrap_err());
        assert_eq!(
            problems,
            vec![CommitProblem::UpdateTargetMissing {
                index: 0,
                id: ProductId::new(9)
            }]
        );
    }

    #[test]
    fn second_featured_product_is_rejected() {
        let fx = Fixture::new(Some(SEED));
        let files = fx.files();
        let mut txn = Transaction::begin(&files).unwrap();
        txn.create(product(3, "Lamp").with_featured(true)).unwrap();

        let problems = problems(txn.commit().unwrap_err());
        assert_eq!(
            problems,
            vec![CommitProblem::Invariant(InvariantBreach::MultipleFeatured(vec![
                ProductId::new(2),
                ProductId::new(3)
            ]))]
        );
        assert_eq!(fx.contents(), SEED);
    }

    #[test]
    fn duplicate_create_is_rejected() {
        let fx = Fixture::new(Some(SEED));
        let files = fx.files();
        let mut txn = Transaction::begin(&files).unwrap();
        txn.create(product(2, "Copy")).unwrap();

        let problems = problems(txn.commit().unwrap_err());
        assert_eq!(
            problems,
            vec![CommitProblem::Invariant(InvariantBreach::DuplicateId(
                ProductId::new(2)
            ))]
        );
    }

    #[test]
    fn explicit_rollback_restores_contents() {
        let fx = Fixture::new(Some(SEED));
        let files = fx.files();
        let mut txn = Transaction::begin(&files).unwrap();
        txn.create(product(3, "Lamp")).unwrap();
        txn.rollback().unwrap();

        assert_eq!(txn.state(), TransactionState::RolledBack);
        assert!(txn.backup_path().is_none());
        assert_eq!(fx.contents(), SEED);
        assert!(fx.leftover_backups().is_empty());

        assert!(txn.create(product(4, "Late")).is_err());
        assert!(txn.rollback().is_ok());
    }

    #[test]
    fn drop_while_open_rolls_back() {
        let fx = Fixture::new(Some(SEED));
        let files = fx.files();
        {
            let mut txn = Transaction::begin(&files).unwrap();
            txn.create(product(3, "Lamp")).unwrap();
        }
        assert_eq!(fx.contents(), SEED);
        assert!(fx.leftover_backups().is_empty());
    }

    #[test]
    fn no_operations_after_commit() {
        let fx = Fixture::new(Some(SEED));
        let files = fx.files();
        let mut txn = Transaction::begin(&files).unwrap();
        txn.commit().unwrap();

        let err = txn.create(product(3, "Lamp")).unwrap_err();
        assert!(matches!(err, CoreError::InvalidOperation { .. }));
        assert!(txn.commit().is_err());
    }

    #[test]
    fn missing_store_is_created_on_commit() {
        let fx = Fixture::new(None);
        let files = fx.files();
        let mut txn = Transaction::begin(&files).unwrap();
        assert!(txn.backup_path().is_none());

        txn.create(product(1, "First")).unwrap();
        txn.commit().unwrap();
        assert_eq!(fx.contents(), "1,First,Something,5.00,3,thing.jpg,false\n");
    }

    #[test]
    fn rollback_of_missing_store_removes_file() {
        let fx = Fixture::new(None);
        let files = fx.files();
        let mut txn = Transaction::begin(&files).unwrap();
        txn.create(product(1, "First")).unwrap();
        txn.rollback().unwrap();
        assert!(!fx.path.exists());
    }

    #[test]
    fn staged_view_applies_queue() {
        let fx = Fixture::new(Some(SEED));
        let files = fx.files();
        let mut txn = Transaction::begin(&files).unwrap();
        txn.delete(product(1, "Widget")).unwrap();
        txn.create(product(3, "Lamp")).unwrap();

        let ids: Vec<_> = txn.staged().unwrap().iter().map(|p| p.id.as_u64()).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(fx.contents(), SEED);
    }

    #[test]
    fn transaction_blocks_other_writers() {
        let fx = Fixture::new(Some(SEED));
        let files = fx.files();
        let other = fx.files();

        let txn = Transaction::begin(&files).unwrap();
        assert!(other.try_lock_for(std::time::Duration::from_millis(20)).is_none());
        drop(txn);
        assert!(other.try_lock_for(std::time::Duration::from_millis(20)).is_some());
    }

    #[test]
    fn backup_names_are_unique() {
        let fx = Fixture::new(Some(SEED));
        let files = fx.files();
        let a = backup_path_for(&files);
        let b = backup_path_for(&files);
        assert_ne!(a, b);
        assert!(a
            .to_string_lossy()
            .starts_with(&*files.path().to_string_lossy()));
        assert_eq!(files.leftover_snapshots().unwrap(), Vec::<PathBuf>::new());
    }

    #[test]
    fn open_transaction_snapshot_is_listed_as_leftover() {
        let fx = Fixture::new(Some(SEED));
        let files = fx.files();

        let txn = Transaction::begin(&files).unwrap();
        let snapshot = txn.backup.clone().unwrap();
        assert_eq!(files.leftover_snapshots().unwrap(), vec![snapshot]);
        drop(txn);
        assert!(files.leftover_snapshots().unwrap().is_empty());
    }
}
