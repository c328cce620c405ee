//! GoMarketplace CLI - Inspect and edit the persisted cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! gm-cart list
//!
//! # Add a product (or one more unit of it)
//! gm-cart add --id A --title Shirt --image-url https://img/a.png --price 10
//!
//! # Change quantities
//! gm-cart increment A
//! gm-cart decrement A
//!
//! # Drop a line, or everything
//! gm-cart remove A
//! gm-cart clear
//!
//! # Show totals
//! gm-cart summary
//! ```
//!
//! # Commands
//!
//! - `list` - Print every line
//! - `add` - Add one unit of a product
//! - `increment` / `decrement` - Change a line's quantity by one
//! - `remove` / `clear` - Drop lines
//! - `summary` - Print line count, item count and subtotal

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use go_marketplace_cart::CartConfig;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "gm-cart")]
#[command(author, version, about = "GoMarketplace cart tools")]
struct Cli {
    /// Directory holding the cart file (overrides `GO_MARKETPLACE_STORAGE_DIR`)
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    /// Storage slot key (overrides `GO_MARKETPLACE_STORAGE_KEY`)
    #[arg(long, global = true)]
    key: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every line in the cart
    List,
    /// Add one unit of a product
    Add {
        /// Product id
        #[arg(long)]
        id: String,

        /// Product title
        #[arg(long)]
        title: String,

        /// Product image URL
        #[arg(long)]
        image_url: String,

        /// Unit price (e.g. 19.99)
        #[arg(long)]
        price: String,
    },
    /// Raise a line's quantity by one
    Increment {
        /// Product id
        id: String,
    },
    /// Lower a line's quantity by one (lines stay at zero)
    Decrement {
        /// Product id
        id: String,
    },
    /// Drop a line from the cart
    Remove {
        /// Product id
        id: String,
    },
    /// Drop every line
    Clear,
    /// Print cart totals
    Summary,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.log_json);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Install the global subscriber; logs go to stderr so command output stays clean.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = CartConfig::from_env()?.with_overrides(cli.storage_dir, cli.key)?;

    let cart = config.open_cart().await;

    let output = match cli.command {
        Commands::List => commands::cart::list(&cart).await,
        Commands::Add {
            id,
            title,
            image_url,
            price,
        } => commands::cart::add(&cart, &id, title, image_url, &price).await?,
        Commands::Increment { id } => commands::cart::increment(&cart, &id).await?,
        Commands::Decrement { id } => commands::cart::decrement(&cart, &id).await?,
        Commands::Remove { id } => commands::cart::remove(&cart, &id).await?,
        Commands::Clear => commands::cart::clear(&cart).await?,
        Commands::Summary => commands::cart::summary(&cart).await,
    };

    commands::print(&output);
    Ok(())
}
