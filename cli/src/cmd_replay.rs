//! `fraudfeed replay` — play a recorded event set through the virtual clock.

use anyhow::{ensure, Context, Result};
use fraudfeed_core::TransactionScoreEvent;
use fraudfeed_playback::Playback;
use serde_json::Value;
use std::path::PathBuf;

pub async fn run(file: PathBuf, speed: f64, json: bool) -> Result<()> {
    let raw = std::fs::read_to_string(&file)
        .with_context(|| format!("reading {}", file.display()))?;
    let v: Value = serde_json::from_str(&raw).context("recording is not valid JSON")?;

    let records = v
        .get("transactions")
        .and_then(Value::as_array)
        .or_else(|| v.as_array())
        .context("recording has no `transactions` array")?;

    // Same lossy policy as the live stream: invalid records are skipped.
    let events: Vec<_> = records
        .iter()
        .filter_map(|r| TransactionScoreEvent::from_value(r).ok())
        .collect();
    ensure!(!events.is_empty(), "no valid events in recording");

    let skipped = records.len() - events.len();
    if skipped > 0 {
        tracing::warn!(skipped, "skipped invalid records in recording");
    }
    println!("Replaying {} events at {speed}×", events.len());

    let (_handle, mut rx) = Playback::start(events, speed);
    while let Some(e) = rx.recv().await {
        if json {
            println!("{}", serde_json::to_string(&e)?);
        } else {
            println!(
                "{} {:>10.2} {:<24} score={:.3} [{}]",
                e.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
                e.amount,
                e.merchant,
                e.score,
                e.prediction.as_str()
            );
        }
    }
    println!("Replay finished");
    Ok(())
}
