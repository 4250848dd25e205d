//! CatalogDB CLI
//!
//! Command-line tools for CatalogDB product stores.
//!
//! # Commands
//!
//! - `list` - List products, optionally filtered and paged
//! - `show` - Show one product
//! - `add` - Add a product
//! - `delete` - Delete a product
//! - `feature` / `unfeature` - Move the featured flag
//! - `inspect` - Display store statistics
//! - `verify` - Check every record and the store-wide rules

mod commands;

use catalogdb_codec::Price;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// CatalogDB command-line store tools.
#[derive(Parser)]
#[command(name = "catalogdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the product store file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    List {
        /// Only products whose name contains this text
        #[arg(short, long)]
        search: Option<String>,

        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: usize,

        /// Products per page
        #[arg(long, default_value = "20")]
        page_size: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show one product
    Show {
        /// Product id
        id: u64,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Add a product
    Add {
        /// Product name
        #[arg(long)]
        name: String,

        /// Product description
        #[arg(long)]
        description: String,

        /// Unit price, e.g. 12.50
        #[arg(long)]
        price: Price,

        /// Units in stock
        #[arg(long, default_value = "0")]
        quantity: u32,

        /// Image file name
        #[arg(long)]
        image: String,

        /// Make this the featured product
        #[arg(long)]
        featured: bool,
    },

    /// Delete a product
    Delete {
        /// Product id
        id: u64,
    },

    /// Make a product the featured one
    Feature {
        /// Product id
        id: u64,
    },

    /// Clear the featured flag of a product
    Unfeature {
        /// Product id
        id: u64,
    },

    /// Display store statistics
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Verify every record and the store-wide rules
    Verify,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Version = cli.command {
        println!("CatalogDB CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("CatalogDB Core v{}", catalogdb_core::VERSION);
        return Ok(());
    }

    let path = cli.path.ok_or("Store path required (--path)")?;

    match cli.command {
        Commands::List {
            search,
            page,
            page_size,
            format,
        } => {
            commands::list::run(&path, search.as_deref(), page, page_size, &format)?;
        }
        Commands::Show { id, format } => {
            commands::list::show(&path, id, &format)?;
        }
        Commands::Add {
            name,
            description,
            price,
            quantity,
            image,
            featured,
        } => {
            let product = catalogdb_codec::Product::new(name, description, price, quantity, image)
                .with_featured(featured);
            commands::edit::add(&path, product)?;
        }
        Commands::Delete { id } => commands::edit::delete(&path, id)?,
        Commands::Feature { id } => commands::edit::feature(&path, id)?,
        Commands::Unfeature { id } => commands::edit::unfeature(&path, id)?,
        Commands::Inspect { format } => commands::inspect::run(&path, &format)?,
        Commands::Verify => commands::verify::run(&path)?,
        Commands::Version => {}
    }

    Ok(())
}
