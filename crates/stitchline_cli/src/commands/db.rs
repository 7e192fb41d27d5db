use miette::Result;
use owo_colors::OwoColorize;
use stitchline_core::db::Gateway;

use crate::output::Output;

/// Connect and apply any pending schema migrations
pub async fn init(gateway: &Gateway) -> Result<()> {
    let output = Output::new();

    output.section("Database");
    gateway.connect().await?;
    let version = gateway.schema_version().await?;
    output.success(&format!("Schema ready at version {version}"));

    Ok(())
}

/// Show database statistics
pub async fn stats(gateway: &Gateway) -> Result<()> {
    let output = Output::new();

    output.section("Database Statistics");
    let stats = gateway.stats().await?;
    output.kv("Users", &stats.users.to_string().bright_white().to_string());
    output.kv("Batches", &stats.batches.to_string().bright_white().to_string());
    output.kv(
        "Material lines",
        &stats.materials.to_string().bright_white().to_string(),
    );

    if stats.users == 0 {
        println!();
        output.warning("No users registered yet. The cutter should send /start first.");
    }

    Ok(())
}
