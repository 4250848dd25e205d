//! Verify command implementation.

use catalogdb_codec::{split_records, Product};
use catalogdb_core::{check_invariants, LockRegistry};
use catalogdb_storage::FileAccessManager;
use std::path::Path;

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Number of records checked.
    pub records_checked: usize,
    /// Number of records that decoded and passed every field rule.
    pub valid_records: usize,
    /// Every problem found.
    pub errors: Vec<String>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs the verify command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No store found at {}", path.display()).into());
    }
    println!("Verifying store at {}", path.display());
    println!();

    let registry = LockRegistry::new();
    let contents = FileAccessManager::new(path, &registry).read_bytes()?;
    let result = verify_contents(&contents);

    println!("Records checked: {}", result.records_checked);
    println!("Valid records:   {}", result.valid_records);
    for error in &result.errors {
        println!("  - {error}");
    }

    println!();
    if result.is_ok() {
        println!("✓ Store verification passed");
        Ok(())
    } else {
        println!("✗ Store verification failed");
        Err("Verification failed".into())
    }
}

fn verify_contents(contents: &[u8]) -> VerifyResult {
    let mut result = VerifyResult::default();
    let mut products: Vec<Product> = Vec::new();

    for raw in split_records(contents) {
        result.records_checked += 1;
        match raw.decode() {
            Ok(product) => {
                let violations = product.validate();
                if violations.is_empty() {
                    result.valid_records += 1;
                }
                for violation in violations {
                    result
                        .errors
                        .push(format!("line {}: {violation}", raw.line));
                }
                products.push(product);
            }
            Err(err) => result.errors.push(err.to_string()),
        }
    }

    result.errors.extend(
        check_invariants(&products)
            .into_iter()
            .map(|breach| breach.to_string()),
    );
    result
}
