//! Market CLI - Command line client for the marketplace cart.
//!
//! Commands:
//! - `market show` - Print the cart
//! - `market add` - Add a product (merges with an existing line)
//! - `market inc` / `market dec` - Change a line's quantity
//! - `market clear` - Empty the cart
//! - `market config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{AddArgs, ConfigArgs, QuantityArgs};

/// Market CLI - Inspect and edit the persisted shopping cart
#[derive(Parser)]
#[command(name = "market")]
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

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cart
    Show,

    /// Add a product to the cart
    Add(AddArgs),

    /// Increase a product's quantity by one
    Inc(QuantityArgs),

    /// Decrease a product's quantity by one, removing it at zero
    Dec(QuantityArgs),

    /// Remove every product from the cart
    Clear,

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
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    // Execute command
    let result = match cli.command {
        Commands::Show => commands::cart::show(&ctx).await,
        Commands::Add(args) => commands::cart::add(args, &ctx).await,
        Commands::Inc(args) => commands::cart::increment(args, &ctx).await,
        Commands::Dec(args) => commands::cart::decrement(args, &ctx).await,
        Commands::Clear => commands::cart::clear(&ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the level picked from `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
