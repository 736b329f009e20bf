use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// Weekly agenda: routine blocks merged with your own events
#[derive(Parser, Debug)]
#[command(name = "agenda", version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to <config dir>/weekly-agenda/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the event and deletion files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// IANA timezone used to resolve "today"
    #[arg(long, global = true)]
    timezone: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the Monday-Sunday week containing a date
    Week(commands::DateArgs),
    /// Show a single day
    Day(commands::DateArgs),
    /// Show totals for the week containing a date
    Summary(commands::DateArgs),
    /// Create a custom event and print its refreshed week
    Add(commands::AddArgs),
    /// Edit a custom event; unchanged fields keep their values
    Edit(commands::EditArgs),
    /// Delete an event by identity (custom events are removed, others hidden)
    Delete(commands::KeyArgs),
    /// Delete the Nth event (0-based) of a day as listed by `day`
    DeleteAt {
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Position within the day
        #[arg(long)]
        index: usize,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = commands::AppContext::load(
        cli.config.as_deref(),
        cli.data_dir.clone(),
        cli.timezone.as_deref(),
    )
    .context("failed to load configuration")?;

    match cli.command {
        Commands::Week(args) => commands::week(&ctx, &args),
        Commands::Day(args) => commands::day(&ctx, &args),
        Commands::Summary(args) => commands::summary(&ctx, &args),
        Commands::Add(args) => commands::add(&ctx, args),
        Commands::Edit(args) => commands::edit(&ctx, args),
        Commands::Delete(args) => commands::delete(&ctx, &args),
        Commands::DeleteAt { date, index } => commands::delete_at(&ctx, &date, index),
    }
}
