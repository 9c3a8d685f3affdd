//! Configuration management commands.

use anyhow::{bail, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::CliConfig;
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Init { path, force } => init_config(path, force, ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Current Configuration");

    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    match ctx.config_path {
        Some(ref path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    // Storage section
    ctx.output.info("[storage]");
    ctx.output.kv("data_dir", &ctx.data_dir().display().to_string());

    // Cart section
    let cart = &ctx.config.cart;
    ctx.output.info("[cart]");
    ctx.output.kv("namespace", &cart.namespace);
    ctx.output.kv("storage_key", &cart.storage_key());
    ctx.output.kv("on_corrupt", &format!("{:?}", cart.on_corrupt).to_lowercase());
    ctx.output.kv("retry.max_retries", &cart.retry.max_retries.to_string());
    ctx.output.kv("retry.backoff", &format!("{:?}", cart.retry.backoff));

    Ok(())
}

async fn init_config(path: Option<String>, force: bool, ctx: &Context) -> Result<()> {
    let target = ctx.resolve_path(path.as_deref().unwrap_or("market.toml"));

    if target.exists() && !force {
        bail!(
            "Config file already exists: {} (use --force to overwrite)",
            target.display()
        );
    }

    CliConfig::default().save(&target.to_string_lossy())?;
    ctx.output
        .success(&format!("Wrote default config to {}", target.display()));
    Ok(())
}
