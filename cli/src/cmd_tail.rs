//! `fraudfeed tail` — stream scored transactions to stdout.

use anyhow::Result;
use fraudfeed_connector::{
    ConnectorConfig, StompWsListener, StreamConnector, StreamEvent, WindowAccumulator,
};
use fraudfeed_core::TransactionScoreEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

const HEARTBEAT_PERIOD: Duration = Duration::from_secs(30);

pub async fn run(
    endpoint: String,
    topic: String,
    capacity: usize,
    retry_delay_ms: u64,
    json: bool,
) -> Result<()> {
    let mut config = ConnectorConfig::new(endpoint);
    config.topic = topic;
    config.window_capacity = capacity;
    config.retry_delay_ms = retry_delay_ms;

    let listener = Arc::new(StompWsListener::new(
        config.endpoint.clone(),
        config.topic.clone(),
    ));
    let (connector, mut rx) = StreamConnector::new(config, listener);
    let (mut accumulator, _snapshots) = WindowAccumulator::new(capacity);
    connector.connect();

    println!(
        "─── Tailing {} (Ctrl-C to stop) ──────────────────────────────",
        connector.config().topic
    );

    // Periodic even when the stream is busy; first tick after one period.
    let mut heartbeat = interval_at(Instant::now() + HEARTBEAT_PERIOD, HEARTBEAT_PERIOD);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                println!("\n─── Shutting down ───────────────────────────────────────");
                break;
            }
            event = rx.recv() => {
                let Some(event) = event else { break };
                match &event {
                    StreamEvent::SessionUp => println!("● stream online"),
                    StreamEvent::SessionDown => println!("○ stream offline — retrying"),
                    StreamEvent::Batch(events) => {
                        for e in events {
                            print_event(e, json)?;
                        }
                    }
                }
                accumulator.apply(event);
            }
            _ = heartbeat.tick() => {
                let snap = accumulator.snapshot();
                let flagged = snap.iter().filter(|e| e.is_flagged()).count();
                println!(
                    "  [heartbeat] window={} flagged={} online={}",
                    snap.len(),
                    flagged,
                    connector.is_online()
                );
            }
        }
    }

    connector.disconnect();
    let snap = accumulator.snapshot();
    println!(
        "Window holds {} events ({} flagged as fraud)",
        snap.len(),
        snap.iter().filter(|e| e.is_flagged()).count()
    );
    Ok(())
}

fn print_event(e: &TransactionScoreEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(e)?);
    } else {
        println!(
            "{} {:>10.2} {:<24} score={:.3} [{}]",
            e.timestamp.format("%H:%M:%S%.3f"),
            e.amount,
            e.merchant,
            e.score,
            e.prediction.as_str()
        );
    }
    Ok(())
}
