use profile_stats::cli::Args;
use profile_stats::display::display_profile_table;
use profile_stats::output::OutputWriter;
use profile_stats::query::run_query;
use profile_stats::types::OutputFormat;
use profile_stats::usage::UsageTracker;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the messages
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = args.into_config()?;

    info!(
        "Looking up {} profile {} (reference {})",
        config.profile.platform, config.profile.username, config.reference
    );

    let tracker = UsageTracker::new(config.state_dir.clone(), config.max_usage)?;
    info!("Usage ledger: {}", tracker.ledger_path().display());

    let messages = run_query(&config, &tracker).await?;

    let failures = messages.iter().filter(|m| m.is_error()).count();
    if failures > 0 {
        warn!("{} of {} sections failed", failures, messages.len());
    }

    match config.format {
        OutputFormat::Json => OutputWriter::new(config.output.clone()).write_messages(&messages)?,
        OutputFormat::Table => {
            display_profile_table(&messages);
            if config.output.is_some() {
                OutputWriter::new(config.output.clone()).write_messages(&messages)?;
            }
        }
    }

    if let Some(path) = &config.output {
        info!("Wrote {} messages to {}", messages.len(), path.display());
    }

    Ok(())
}
