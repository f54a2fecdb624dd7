//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Download one URL into a directory, naming the file from the server response.
///
/// Client timeouts come from the `FETCH_*` environment variables.
#[derive(Parser, Debug)]
#[command(name = "mc-fetch")]
#[command(author, version, about)]
pub struct Args {
    /// URL to download
    pub url: String,

    /// Directory to save into (must exist)
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Do not download again when the resolved file already exists
    #[arg(short, long)]
    pub skip_existing: bool,

    /// Accepted response content type (repeatable)
    #[arg(short, long = "accept", value_name = "MIME")]
    pub accept: Vec<String>,

    /// Extra request header as NAME=VALUE (repeatable)
    #[arg(short = 'H', long = "header", value_name = "NAME=VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Command name reported in the User-Agent
    #[arg(long, default_value = "mc-fetch")]
    pub command: String,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("header name is empty in {raw:?}"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
