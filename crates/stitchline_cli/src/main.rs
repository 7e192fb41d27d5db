mod commands;
mod output;

use clap::{Parser, Subcommand};
use miette::Result;
use std::path::PathBuf;
use stitchline_core::{
    config::{self, StitchlineConfig},
    db::{DatabaseConfig, Gateway},
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "stitchline")]
#[command(about = "Garment production batch tracker")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Database file path (overrides config and environment)
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the chat bot
    Run,
    /// Database maintenance
    Db {
        #[command(subcommand)]
        cmd: DbCommands,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Create the schema if it does not exist yet
    Init,
    /// Show row counts
    Stats,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Save current configuration to file
    Save {
        /// Path to save configuration
        #[arg(default_value = "stitchline.toml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .rgb_colors(miette::RgbColors::Preferred)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))?;
    miette::set_panic_hook();
    let cli = Cli::parse();

    let mut config = if let Some(config_path) = &cli.config {
        config::load_config(config_path).await?
    } else {
        config::load_config_from_standard_locations().await?
    };
    config.apply_process_env()?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_tracing(cli.debug, &config);
    info!("Configuration loaded");

    // Apply CLI overrides
    if let Some(db_path) = &cli.db_path {
        info!("Overriding database path with: {:?}", db_path);
        config.database = DatabaseConfig::Embedded {
            path: db_path.to_string_lossy().to_string(),
        };
    }

    tracing::debug!("Using database config: {:?}", config.database);

    match &cli.command {
        Commands::Run => commands::run::run(&config).await?,
        Commands::Db { cmd } => {
            let gateway = Gateway::new(config.database.clone());
            match cmd {
                DbCommands::Init => commands::db::init(&gateway).await?,
                DbCommands::Stats => commands::db::stats(&gateway).await?,
            }
        }
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show => commands::config::show(&config).await?,
            ConfigCommands::Save { path } => commands::config::save(&config, path).await?,
        },
    }

    Ok(())
}

/// Console logging, plus daily rolling files when a log directory is set.
fn init_tracing(
    debug: bool,
    config: &StitchlineConfig,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("stitchline_core=debug,stitchline_discord=debug,stitchline_cli=debug,warn")
        } else {
            EnvFilter::new("stitchline_core=info,stitchline_discord=info,stitchline_cli=info,warn")
        }
    });

    let console = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_timer(fmt::time::LocalTime::rfc_3339())
        .compact();

    let (file_layer, guard) = match &config.logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "stitchline.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = if config.logging.json {
                fmt::layer().json().with_writer(writer).boxed()
            } else {
                fmt::layer().with_ansi(false).with_writer(writer).boxed()
            };
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .init();
    guard
}
