use miette::Result;
use owo_colors::OwoColorize;
use std::sync::Arc;
use stitchline_core::{StitchlineConfig, Workshop};
use tracing::{info, warn};

use crate::output::Output;

/// Bootstrap the store and serve the bot until the gateway connection ends
pub async fn run(config: &StitchlineConfig) -> Result<()> {
    let output = Output::new();

    output.section("Stitchline");
    let workshop = Arc::new(Workshop::from_config(config));
    workshop.gateway().connect().await?;
    output.success("Database ready");

    match config.workflow.privileged_chat() {
        Some(chat) => output.info("Cutter chat:", &chat.to_string().bright_white().to_string()),
        None => {
            warn!("No CUTTER_CHAT_ID configured, nobody can be registered as the cutter");
            output.warning("No cutter chat configured; batch creation will be unavailable");
        }
    }
    if let Some(ttl) = config.workflow.session_ttl() {
        output.info("Session TTL:", &format!("{}s", ttl.as_secs()));
    }
    if !config.discord.allowed_channels.is_empty() {
        output.info(
            "Channels:",
            &format!("{} guild channels plus direct messages", config.discord.allowed_channels.len()),
        );
    }
    output.status("Connecting to Discord...");

    info!("Starting stitchline bot");
    stitchline_discord::run_bot(&config.discord, workshop).await?;
    Ok(())
}
