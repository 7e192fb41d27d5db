use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use stitchline_core::config::{self, StitchlineConfig};
use std::path::Path;

use crate::output::Output;

/// Show current configuration, with the token masked
pub async fn show(config: &StitchlineConfig) -> Result<()> {
    let output = Output::new();

    output.section("Current Configuration");
    println!();

    let mut shown = config.clone();
    if shown.discord.token.is_some() {
        shown.discord.token = Some("********".to_string());
    }
    let toml_str = toml::to_string_pretty(&shown).into_diagnostic()?;
    println!("{}", toml_str);

    Ok(())
}

/// Save current configuration to file. The token is never written.
pub async fn save(config: &StitchlineConfig, path: &Path) -> Result<()> {
    let output = Output::new();

    output.info("Saving", &format!("configuration to {}", path.display()));

    let mut saved = config.clone();
    saved.discord.token = None;
    config::save_config(&saved, path).await?;

    output.success("Configuration saved successfully!");
    println!();
    println!("To use this configuration, run:");
    println!(
        "  {} --config {} run",
        "stitchline".bright_green(),
        path.display()
    );

    Ok(())
}
