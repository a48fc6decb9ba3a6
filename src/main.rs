use clap::{Parser, builder::styling};
use eyre::Result;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tap_googleanalytics::cli;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// Singer tap for Google Analytics: extracts daily reports as typed records on stdout
#[derive(Parser)]
#[command(name = "tap-googleanalytics", version, styles = STYLES)]
struct Cli {
    /// JSON config file with start_date, view_id and OAuth credentials
    #[arg(short, long)]
    config: PathBuf,

    /// Catalog file selecting streams and marking dimensions
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Print the catalog of available streams and exit
    #[arg(short, long)]
    discover: bool,

    /// Directory of schema files to use instead of the built-in ones
    #[arg(long)]
    schemas: Option<PathBuf>,

    /// The dotenv file to source GA_* credentials from
    #[arg(short, long, default_value = ".env")]
    env: PathBuf,

    /// More verbose logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.env.exists() {
        dotenvy::from_path(&cli.env)?;
    }

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    let config = cli::load_config(&cli.config)?;

    if cli.discover {
        log::info!("Running discovery");
        let catalog = cli::discover(cli.schemas.as_deref())?;
        println!("{}", catalog.to_json_pretty()?);
        return Ok(());
    }

    log::info!(
        "Syncing view {} starting {}",
        config.view_id.cyan(),
        config.start_date.bright_black()
    );
    let summary = cli::run_sync(&config, cli.catalog.as_deref(), cli.schemas.as_deref()).await?;
    log::info!(
        "✓ Emitted {} record(s) from {} stream(s)",
        summary.records.green(),
        summary.streams
    );

    Ok(())
}
