//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CONFIG_FILE_NAMES};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Init { force } => init_config(force, ctx).await,
        ConfigCommand::Validate => validate_config(ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Current Configuration");

    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    let engine = &ctx.config.engine;

    // Store section
    ctx.output.info("");
    ctx.output.info("[store]");
    ctx.output.kv("data_dir", &ctx.data_dir().display().to_string());
    if let Some(ref namespace) = ctx.config.store.namespace {
        ctx.output.kv("namespace", namespace);
    }

    // Engine section
    ctx.output.info("");
    ctx.output.info("[engine]");
    ctx.output.kv("currency", engine.currency.code());
    ctx.output
        .kv("compare_capacity", &engine.compare_capacity.to_string());
    ctx.output.kv(
        "shipping.regular",
        &engine.shipping.regular(engine.currency).display(),
    );
    ctx.output.kv(
        "shipping.express",
        &engine.shipping.express(engine.currency).display(),
    );

    // Storage keys
    ctx.output.info("");
    ctx.output.info("[engine.storage]");
    ctx.output.kv("cart", &engine.storage.cart);
    ctx.output.kv("wishlist", &engine.storage.wishlist);
    ctx.output.kv("checkout", &engine.storage.checkout);
    ctx.output.kv("compare", &engine.storage.compare);
    ctx.output.kv("reviews", &engine.storage.reviews);

    if !engine.seed_addresses.is_empty() {
        ctx.output.info("");
        ctx.output.info("Seed addresses:");
        for address in &engine.seed_addresses {
            ctx.output.list_item(&address.label);
        }
    }

    Ok(())
}

async fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_FILE_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())?;

    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

async fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    if let Err(e) = ctx.config.engine.validate() {
        errors.push(e.to_string());
    }

    let engine = &ctx.config.engine;
    if engine.shipping.express_minor < engine.shipping.regular_minor {
        warnings.push("engine.shipping.express_minor is cheaper than regular".to_string());
    }

    for (i, address) in engine.seed_addresses.iter().enumerate() {
        if address.phone.is_empty() || address.full_address.is_empty() {
            errors.push(format!(
                "engine.seed_addresses[{}] needs phone and full_address",
                i
            ));
        }
    }

    if ctx.config.store.data_dir.trim().is_empty() {
        errors.push("store.data_dir must not be empty".to_string());
    }

    // Print results
    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}
