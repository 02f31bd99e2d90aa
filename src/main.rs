//! CLI entry point for the imgfetch tool.

use std::io::{self, IsTerminal, Read, Write};

use anyhow::Result;
use clap::Parser;
use console::style;
use imgfetch_core::{DigestStore, ImagePipeline, Outcome, RunSummary, parse_input};
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    if !args.quiet {
        println!(
            "{} {}",
            style("imgfetch").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        );
        println!("Collecting images from the web, safely.\n");
    }

    // Read input: from positional args, an interactive prompt, or piped stdin
    let input_text = if args.urls.is_empty() {
        read_stdin_input()?
    } else {
        args.urls.join(" ")
    };

    let parsed = parse_input(&input_text);
    for token in &parsed.skipped {
        println!("{} Skipped (not a URL): {token}", style("✗").red());
    }

    if parsed.is_empty() {
        println!("{} No URLs provided. Exiting.", style("✗").red());
        return Ok(());
    }

    info!(
        urls = parsed.len(),
        skipped = parsed.skipped_count(),
        "parsed input"
    );

    let pipeline = ImagePipeline::new();
    let mut store = DigestStore::new();
    let mut summary = RunSummary::new();

    // One URL at a time, in input order; no failure aborts the batch.
    for item in &parsed.items {
        match pipeline.process_url(&item.value, &mut store).await {
            Ok(outcome) => {
                report(&item.raw, &outcome);
                summary.record(&outcome);
            }
            Err(error) => {
                warn!(url = %item.value, error = %error, "unexpected failure");
                println!("{} Error for {}: {error}", style("✗").red(), item.raw);
                summary.record_error();
            }
        }
    }

    println!();
    println!("{} All done: {summary}.", style("✓").green());
    Ok(())
}

/// Collects one batch of URLs from stdin.
///
/// Interactive terminals get a prompt and a single line; piped input is
/// read to EOF.
fn read_stdin_input() -> Result<String> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        print!("Enter image URLs (separated by spaces): ");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        Ok(line)
    } else {
        let mut buffer = String::new();
        stdin.read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}

/// Prints the one-line (or two-line, for saves) outcome for a URL.
fn report(url: &str, outcome: &Outcome) {
    match outcome {
        Outcome::Saved { filename, path } => {
            println!("{} Successfully fetched: {filename}", style("✓").green());
            println!("{} Image saved to {}", style("✓").green(), path.display());
        }
        Outcome::RejectedHeaders { reason }
        | Outcome::RejectedSize { reason }
        | Outcome::RejectedInvalid { reason }
        | Outcome::RejectedDuplicate { reason } => {
            println!("{} Skipped ({reason}): {url}", style("✗").red());
        }
        Outcome::TransportError { reason } => {
            println!("{} Connection error for {url}: {reason}", style("✗").red());
        }
    }
}
