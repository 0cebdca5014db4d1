//! FraudFeed CLI — consume the realtime fraud-scoring stream.
//!
//! # Commands
//! ```
//! fraudfeed tail   --endpoint <wss://...> [--topic <dest>] [--capacity <n>]
//! fraudfeed replay --file <recording.json> [--speed <x>]
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd_replay;
mod cmd_tail;
mod logging;

#[derive(Parser)]
#[command(
    name = "fraudfeed",
    about = "Realtime fraud-scoring stream consumer — FraudFeed CLI",
    version
)]
struct Cli {
    /// Log level: trace | debug | info | warn | error
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit JSON structured logs
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tail the live transaction-score stream
    Tail {
        /// Broker WebSocket endpoint, e.g. "wss://scoring.example.com/stream"
        #[arg(long)]
        endpoint: String,
        /// Destination topic
        #[arg(long, default_value = "/topic/transactions")]
        topic: String,
        /// Maximum number of events retained by the window
        #[arg(long, default_value_t = fraudfeed_core::DEFAULT_WINDOW_CAPACITY)]
        capacity: usize,
        /// Delay between reconnect attempts, in milliseconds
        #[arg(long, default_value_t = 3_000)]
        retry_delay_ms: u64,
        /// Print each event as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Replay a recorded event file through the playback controller
    Replay {
        /// JSON recording: {"transactions": [...]} or a bare array
        #[arg(short, long)]
        file: PathBuf,
        /// Speed multiplier (virtual seconds per wall second)
        #[arg(long, default_value_t = fraudfeed_playback::DEFAULT_SPEED)]
        speed: f64,
        /// Print each event as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&logging::LogConfig {
        level: cli.log_level.clone(),
        json: cli.log_json,
    });

    match cli.command {
        Commands::Tail {
            endpoint,
            topic,
            capacity,
            retry_delay_ms,
            json,
        } => cmd_tail::run(endpoint, topic, capacity, retry_delay_ms, json).await,
        Commands::Replay { file, speed, json } => cmd_replay::run(file, speed, json).await,
    }
}
