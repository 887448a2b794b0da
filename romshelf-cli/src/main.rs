//! romshelf CLI
//!
//! Scrapes ScreenScraper metadata and media into an ES-DE library.

use clap::{Parser, Subcommand};

mod commands;

use commands::config::ConfigAction;
use commands::scrape::ScrapeArgs;

#[derive(Parser)]
#[command(name = "romshelf")]
#[command(about = "Scrape game metadata and media into an ES-DE library", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape one system folder
    Scrape(ScrapeArgs),

    /// Manage ScreenScraper credentials
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(filter)
        .format_timestamp(None)
        .init();

    match cli.command {
        Commands::Scrape(args) => commands::scrape::run(args).await,
        Commands::Config { action } => commands::config::run(action),
    }
}
