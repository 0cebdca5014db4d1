//! # fraudfeed-playback
//!
//! Playback controller for recorded transaction-score events.
//!
//! The live dashboard's transport controls (play/pause/seek/speed) need a
//! virtual clock that is authoritative over delivery rate: while playing,
//! virtual time advances at `speed ×` wall clock and events become due as
//! their timestamps pass. [`PlaybackState`] is the deterministic core;
//! [`Playback`] drives it on a Tokio timer and delivers due events over a
//! channel.

pub mod state;

pub use state::{PlaybackError, PlaybackState, DEFAULT_SPEED};

use fraudfeed_core::TransactionScoreEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

/// Control messages accepted while a playback is running.
#[derive(Debug, Clone)]
pub enum PlaybackCommand {
    Play,
    Pause,
    Seek(chrono::DateTime<chrono::Utc>),
    SetSpeed(f64),
}

/// Handle to a running playback task.
#[derive(Clone)]
pub struct PlaybackHandle {
    cmd_tx: mpsc::UnboundedSender<PlaybackCommand>,
}

impl PlaybackHandle {
    pub fn play(&self) {
        let _ = self.cmd_tx.send(PlaybackCommand::Play);
    }

    pub fn pause(&self) {
        let _ = self.cmd_tx.send(PlaybackCommand::Pause);
    }

    pub fn seek(&self, to: chrono::DateTime<chrono::Utc>) {
        let _ = self.cmd_tx.send(PlaybackCommand::Seek(to));
    }

    pub fn set_speed(&self, speed: f64) {
        let _ = self.cmd_tx.send(PlaybackCommand::SetSpeed(speed));
    }
}

/// A playback session over a fixed recording.
pub struct Playback;

impl Playback {
    /// Spawn a playback task over `events`, already playing. Returns the
    /// control handle and the receiver of due events.
    ///
    /// The task ends once the recording is exhausted (the event channel
    /// closes), or earlier if the receiver is dropped.
    pub fn start(
        events: Vec<TransactionScoreEvent>,
        speed: f64,
    ) -> (PlaybackHandle, mpsc::Receiver<TransactionScoreEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::channel(256);

        let mut state = PlaybackState::new(events);
        if state.set_speed(speed).is_err() {
            debug!(speed, "ignoring non-positive playback speed, using default");
        }
        state.play();

        tokio::spawn(run(state, cmd_rx, out_tx));
        (PlaybackHandle { cmd_tx }, out_rx)
    }
}

/// Fixed-tick driver: every tick, advance the virtual clock by the wall
/// time elapsed and deliver whatever became due.
async fn run(
    mut state: PlaybackState,
    mut cmd_rx: mpsc::UnboundedReceiver<PlaybackCommand>,
    out_tx: mpsc::Sender<TransactionScoreEvent>,
) {
    const TICK: Duration = Duration::from_millis(50);
    let mut last_tick = Instant::now();

    while !state.is_finished() {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    None => return, // handle dropped — stop
                    Some(PlaybackCommand::Play) => state.play(),
                    Some(PlaybackCommand::Pause) => state.pause(),
                    Some(PlaybackCommand::Seek(to)) => state.seek(to),
                    Some(PlaybackCommand::SetSpeed(speed)) => {
                        if state.set_speed(speed).is_err() {
                            debug!(speed, "rejecting non-positive playback speed");
                        }
                    }
                }
                // Control changes re-anchor the wall clock so paused time
                // never counts toward virtual time.
                last_tick = Instant::now();
            }
            _ = tokio::time::sleep(TICK) => {
                let elapsed = last_tick.elapsed();
                last_tick = Instant::now();
                for event in state.advance(elapsed) {
                    if out_tx.send(event).await.is_err() {
                        return; // receiver dropped
                    }
                }
            }
        }
    }
}
