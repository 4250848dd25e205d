//! Inspect command implementation.

use serde::Serialize;
use std::fs;
use std::path::Path;

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store path.
    pub path: String,
    /// File size in bytes.
    pub file_size: u64,
    /// Number of readable products.
    pub product_count: usize,
    /// Number of records that failed to decode.
    pub unreadable_records: u64,
    /// Id of the featured product.
    pub featured_id: Option<u64>,
    /// Id the next added product would get.
    pub next_id: u64,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_text_output(&result),
    }
    Ok(())
}

fn inspect(path: &Path) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let repo = super::open(path, false)?;
    let products = repo.get_all()?;
    let unreadable_records = repo.stats().skipped_lines;
    let next_id = repo.get_next_id()?;

    Ok(InspectResult {
        path: path.display().to_string(),
        file_size: fs::metadata(path)?.len(),
        product_count: products.len(),
        unreadable_records,
        featured_id: products.iter().find(|p| p.featured).map(|p| p.id.as_u64()),
        next_id: next_id.as_u64(),
    })
}

fn print_text_output(result: &InspectResult) {
    println!("Store: {}", result.path);
    println!();
    println!("File size:          {} bytes", result.file_size);
    println!("Products:           {}", result.product_count);
    println!("Unreadable records: {}", result.unreadable_records);
    match result.featured_id {
        Some(id) => println!("Featured product:   {id}"),
        None => println!("Featured product:   none"),
    }
    println!("Next id:            {}", result.next_id);
}
