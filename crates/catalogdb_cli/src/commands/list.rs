//! List and show commands.

use catalogdb_core::{Page, Product, ProductId};
use std::path::Path;

/// Runs the list command.
pub fn run(
    path: &Path,
    search: Option<&str>,
    page: usize,
    page_size: usize,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = super::open(path, false)?;
    let result = repo.get_paged(page, page_size, search)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print!("{}", render_page(&result)),
    }
    Ok(())
}

/// Runs the show command.
pub fn show(path: &Path, id: u64, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let repo = super::open(path, false)?;
    let id = ProductId::new(id);
    let product = repo
        .get_by_id(id)?
        .ok_or_else(|| format!("No product with id {id}"))?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&product)?),
        _ => print!("{}", render_product(&product)),
    }
    Ok(())
}

fn render_page(page: &Page<Product>) -> String {
    let mut out = String::new();
    if page.items.is_empty() {
        out.push_str("No products\n");
    } else {
        out.push_str(&format!(
            "{:>5}  {:<32} {:>10} {:>5}  {}\n",
            "ID", "NAME", "PRICE", "QTY", "IMAGE"
        ));
        for product in &page.items {
            let marker = if product.featured { " *" } else { "" };
            out.push_str(&format!(
                "{:>5}  {:<32} {:>10} {:>5}  {}{}\n",
                product.id,
                truncate(&product.name, 32),
                product.price,
                product.quantity,
                product.image,
                marker
            ));
        }
    }
    out.push_str(&format!(
        "\nPage {} of {} ({} products)\n",
        page.page,
        page.total_pages.max(1),
        page.total_count
    ));
    out
}

fn render_product(product: &Product) -> String {
    format!(
        "ID:          {}\n\
         Name:        {}\n\
         Description: {}\n\
         Price:       {}\n\
         Quantity:    {}\n\
         Image:       {}\n\
         Featured:    {}\n",
        product.id,
        product.name,
        product.description,
        product.price,
        product.quantity,
        product.image,
        if product.featured { "yes" } else { "no" }
    )
}

fn truncate(text: &str, max: usize) -> String {
    let single_line = text.replace(['\r', '\n'], " ");
    if single_line.chars().count() <= max {
        single_line
    } else {
        let mut cut: String = single_line.chars().take(max - 1).collect();
        cut.push('…');
        cut
    }
}
