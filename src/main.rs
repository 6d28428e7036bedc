//! amz-reviews - Harvest every 5-star review of an Amazon product
//!
//! Uses TLS fingerprint emulation so the review listing can be walked page by page.

use amz_reviews::commands::HarvestCommand;
use amz_reviews::config::{Config, OutputFormat};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "amz-reviews",
    version,
    about = "Harvest every 5-star review of an Amazon product",
    long_about = "Follows the product page's review link, then walks every review page and prints the 5-star reviews."
)]
struct Cli {
    /// Product page URL or ASIN
    product: String,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, env = "AMZ_PROXY")]
    proxy: Option<String>,

    /// Delay between requests in milliseconds
    #[arg(long, env = "AMZ_DELAY")]
    delay: Option<u64>,

    /// Overall harvest deadline in seconds
    #[arg(long, env = "AMZ_TIMEOUT")]
    timeout: Option<u64>,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format (json, table, markdown, csv)
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging on stderr so stdout carries only the results
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = Some(timeout);
    }
    if let Some(format) = cli.format {
        config.format = format;
    }

    // Ctrl-C stops the walk at the next page boundary
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing with the reviews collected so far");
            on_interrupt.cancel();
        }
    });

    let cmd = HarvestCommand::new(config);
    let output = cmd.execute(&cli.product, cancel).await?;
    println!("{}", output.rendered);
    if let Some(status_line) = &output.status_line {
        eprintln!("{}", status_line);
    }

    if !output.response.is_success() {
        std::process::exit(1);
    }

    Ok(())
}
