use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use dotenvy::dotenv;
use magick_rust::magick_wand_genesis;
use mfcsv::config::Config;
use mfcsv::tags::LoftyTagReader;
use mfcsv::upload::LitterboxHost;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod prompt;

use prompt::ExportMode;

/// Turn folders of tagged audio files into catalog-import CSV rows
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Release folders (drag and drop them onto the executable)
    folders: Vec<PathBuf>,

    /// Skip the interactive menu when several folders are found
    #[arg(long, value_enum)]
    mode: Option<ExportMode>,

    /// Where CSV files are written [default: desktop]
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Load environment variables from a .env file if present
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
    magick_wand_genesis();

    let cli = Cli::parse();
    if cli.folders.is_empty() {
        println!("Drag and drop one or more folders onto this program.\n");
        Cli::command().print_help()?;
        return Ok(());
    }

    let config = Config::from_env();
    let host = LitterboxHost::from_config(&config).context("Failed to set up image upload")?;
    let output_dir = cli.output_dir.unwrap_or(config.output_dir);

    commands::export::export_folders(
        &cli.folders,
        &output_dir,
        &LoftyTagReader,
        &host,
        |_| match cli.mode {
            Some(mode) => Ok(mode),
            None => prompt::prompt_export_mode(
                io::stdin().lock(),
                io::stdout(),
                prompt::MAX_PROMPT_ATTEMPTS,
            ),
        },
    )?;

    Ok(())
}
