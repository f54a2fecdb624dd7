//! CLI entry point: download a single URL into a directory.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use mc_fetch::{FetchOptions, FetchRequest, FileDownloadStatus, SharedFetch};
use tracing::{debug, info};

mod cli;

use cli::Args;

fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let options = FetchOptions::from_env().context("invalid FETCH_* environment")?;
    let shared = SharedFetch::new(&args.command, &options)?;

    let mut request = FetchRequest::parse(&args.url)?
        .use_shared_fetch(shared)
        .user_agent_command(args.command.as_str())
        .accept_content_types(args.accept.iter().cloned());
    for (name, value) in &args.headers {
        request = request.header(name.as_str(), value.as_str());
    }

    let spinner = if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    let status_spinner = spinner.clone();

    let path = request
        .to_directory(&args.output_dir)?
        .skip_existing(args.skip_existing)
        .handle_status(move |status, uri, _file| match status {
            FileDownloadStatus::Downloading => {
                status_spinner.set_message(format!("downloading {uri}"));
                status_spinner.enable_steady_tick(Duration::from_millis(120));
            }
            FileDownloadStatus::Downloaded
            | FileDownloadStatus::SkipFileExists
            | FileDownloadStatus::SkipFileUpToDate => status_spinner.finish_and_clear(),
        })
        .handle_downloaded(|uri, file, bytes| {
            info!(%uri, path = %file.display(), bytes, "saved");
        })
        .execute()
        .inspect_err(|_| spinner.finish_and_clear())?;

    println!("{}", path.display());
    Ok(())
}
