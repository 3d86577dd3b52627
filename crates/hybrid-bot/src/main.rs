//! Hybrid grid / launch bot - Entry Point
//!
//! Replay mode: evaluate a recorded JSON-lines sample file.
//! Live mode: read JSON-lines samples from stdin and evaluate on a fixed tick.

use anyhow::Result;
use clap::Parser;
use hybrid_bot::feed::{ChannelFeed, ReplayFeed};
use hybrid_bot::{AppConfig, Application};
use hybrid_feed::SampleParser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Hybrid grid / launch decision bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "HYBRID_CONFIG", default_value = "config/default.toml")]
    config: String,

    /// Replay a JSON-lines sample file instead of reading stdin
    #[arg(long)]
    replay: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = AppConfig::from_file(&args.config)?;
    hybrid_telemetry::init_logging(&config.telemetry.log_level)?;

    info!("Starting hybrid bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        config_path = %args.config,
        pair = %config.market.pair,
        "Configuration loaded"
    );

    let channel_capacity = config.engine.event_channel_capacity;
    let mut app = Application::new(config)?;

    match args.replay {
        Some(path) => {
            let mut feed = ReplayFeed::open(&path)?;
            app.run_replay(&mut feed)?;
        }
        None => {
            let (tx, rx) = mpsc::channel(channel_capacity);
            let reader = tokio::spawn(async move {
                let mut parser = SampleParser::new();
                let mut lines = BufReader::new(tokio::io::stdin()).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    match parser.parse_line(&line) {
                        Ok(Some(parsed)) => {
                            if tx.send(parsed).await.is_err() {
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => warn!(error = %e, "Skipping malformed sample"),
                    }
                }
                info!(rejected = parser.rejected(), "Stdin closed");
            });

            let mut feed = ChannelFeed::new(rx);
            app.run_live(&mut feed).await?;
            reader.abort();
        }
    }

    Ok(())
}
