//! CLI argument definitions using clap derive macros.

use clap::Parser;

/// Safely collect images from the web.
///
/// imgfetch downloads each URL in turn, keeps only payloads that are
/// genuinely images within the size limit, and skips content it has
/// already saved this run.
#[derive(Parser, Debug)]
#[command(name = "imgfetch")]
#[command(author, version, about)]
pub struct Args {
    /// Image URLs to fetch (reads stdin when omitted)
    pub urls: Vec<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error log output and the banner
    #[arg(short, long)]
    pub quiet: bool,
}
