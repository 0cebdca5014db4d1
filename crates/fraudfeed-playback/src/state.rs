//! Deterministic playback state machine.
//!
//! Pure logic: no timers, no channels. The driver feeds wall-clock
//! durations into [`PlaybackState::advance`] and delivers whatever comes
//! back.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use fraudfeed_core::TransactionScoreEvent;
use std::time::Duration;
use thiserror::Error;

/// Default speed multiplier (virtual seconds per wall second).
pub const DEFAULT_SPEED: f64 = 10.0;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Playback speed must be a positive finite number, got {0}")]
    InvalidSpeed(f64),
}

/// Playback over a timestamp-sorted recording with a virtual clock.
#[derive(Debug, Clone)]
pub struct PlaybackState {
    events: Vec<TransactionScoreEvent>,
    cursor: usize,
    playing: bool,
    speed: f64,
    virtual_time: DateTime<Utc>,
}

impl PlaybackState {
    /// Sort `events` by timestamp and anchor virtual time at the earliest
    /// event (or now, for an empty recording). Starts paused at the
    /// default speed.
    pub fn new(mut events: Vec<TransactionScoreEvent>) -> Self {
        events.sort_by_key(|e| e.timestamp);
        let virtual_time = events.first().map(|e| e.timestamp).unwrap_or_else(Utc::now);
        Self {
            events,
            cursor: 0,
            playing: false,
            speed: DEFAULT_SPEED,
            virtual_time,
        }
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn virtual_time(&self) -> DateTime<Utc> {
        self.virtual_time
    }

    /// All events delivered.
    pub fn is_finished(&self) -> bool {
        self.cursor == self.events.len()
    }

    pub fn remaining(&self) -> usize {
        self.events.len() - self.cursor
    }

    /// Set the speed multiplier; must be positive and finite.
    pub fn set_speed(&mut self, speed: f64) -> Result<(), PlaybackError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(PlaybackError::InvalidSpeed(speed));
        }
        self.speed = speed;
        Ok(())
    }

    /// Re-anchor virtual time. Events strictly before `to` are skipped;
    /// seeking backward rewinds the cursor so they play again.
    pub fn seek(&mut self, to: DateTime<Utc>) {
        self.virtual_time = to;
        self.cursor = self.events.partition_point(|e| e.timestamp < to);
    }

    /// Advance the virtual clock by `wall_elapsed × speed` (if playing)
    /// and return the events that became due, in timestamp order.
    pub fn advance(&mut self, wall_elapsed: Duration) -> Vec<TransactionScoreEvent> {
        if !self.playing || self.is_finished() {
            return Vec::new();
        }

        let virtual_elapsed = wall_elapsed.as_secs_f64() * self.speed;
        let delta = ChronoDuration::from_std(Duration::from_secs_f64(virtual_elapsed))
            .unwrap_or(ChronoDuration::zero());
        self.virtual_time += delta;

        let start = self.cursor;
        while self.cursor < self.events.len()
            && self.events[self.cursor].timestamp <= self.virtual_time
        {
            self.cursor += 1;
        }
        self.events[start..self.cursor].to_vec()
    }

    /// Wall-clock time until the next event is due at the current speed.
    /// `None` when finished; zero when overdue or paused state is ignored.
    pub fn next_due_in(&self) -> Option<Duration> {
        let next = self.events.get(self.cursor)?;
        let virtual_gap = (next.timestamp - self.virtual_time)
            .to_std()
            .unwrap_or(Duration::ZERO);
        Some(Duration::from_secs_f64(
            virtual_gap.as_secs_f64() / self.speed,
        ))
    }
}
