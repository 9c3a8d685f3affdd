//! CLI command implementations.

pub mod cart;
pub mod config;

use clap::{Args, Subcommand};

/// Arguments for the add command.
#[derive(Args)]
pub struct AddArgs {
    /// Product ID.
    #[arg(long)]
    pub id: String,

    /// Product title.
    #[arg(long)]
    pub title: String,

    /// Product image URL.
    #[arg(long, default_value = "")]
    pub image_url: String,

    /// Unit price.
    #[arg(long)]
    pub price: f64,
}

/// Arguments for the inc and dec commands.
#[derive(Args)]
pub struct QuantityArgs {
    /// Product ID.
    pub id: String,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Write a default config file
    Init {
        /// Where to write (default: market.toml in the working directory).
        #[arg(long)]
        path: Option<String>,

        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
}
