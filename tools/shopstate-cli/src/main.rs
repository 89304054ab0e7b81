//! Shopstate CLI - drive the cart and checkout engine from a terminal.
//!
//! Commands:
//! - `shopstate cart` - Add, edit and select cart lines
//! - `shopstate checkout` - Preview and place orders, manage addresses
//! - `shopstate compare` - Manage the product comparison set
//! - `shopstate wishlist` - Manage saved products
//! - `shopstate reviews` - List and write product reviews
//! - `shopstate config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CartArgs, CheckoutArgs, CompareArgs, ConfigArgs, ReviewsArgs, WishlistArgs};

/// Shopstate CLI - client-held cart, checkout, comparison and wishlist state
#[derive(Parser)]
#[command(name = "shopstate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Directory holding the persisted records
    #[arg(long, global = true)]
    data_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage cart lines
    Cart(CartArgs),

    /// Preview or place an order
    Checkout(CheckoutArgs),

    /// Manage the comparison set
    Compare(CompareArgs),

    /// Manage the wishlist
    Wishlist(WishlistArgs),

    /// List or write product reviews
    Reviews(ReviewsArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let ctx = context::Context::load(cli.config.as_deref(), cli.data_dir.as_deref(), output)?;

    // Execute command
    let result = match cli.command {
        Commands::Cart(args) => commands::cart::run(args, &ctx).await,
        Commands::Checkout(args) => commands::checkout::run(args, &ctx).await,
        Commands::Compare(args) => commands::compare::run(args, &ctx).await,
        Commands::Wishlist(args) => commands::wishlist::run(args, &ctx).await,
        Commands::Reviews(args) => commands::reviews::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

/// Logs go to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
