//! Reporting loop shared by every bot.
//!
//! ```text
//! prepare → initial delay → ┌─▶ Collecting → Formatting → Sending ─┐
//!                           └────────────── wait ◀─────────────────┘
//! ```
//!
//! A failed cycle is logged and the loop goes straight back to waiting. There
//! is no retry inside a cycle and no backoff.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::{debug, error, info, instrument, warn};

use crate::discord::{ChannelId, DiscordError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Every(Duration),
    /// Uniform over whole seconds in `min..=max`
    Random { min: Duration, max: Duration },
}

impl Schedule {
    pub fn next_delay(&self) -> Duration {
        match *self {
            Schedule::Every(interval) => interval,
            Schedule::Random { min, max } => {
                let (min, max) = (min.as_secs(), max.as_secs().max(min.as_secs()));
                Duration::from_secs(rand::rng().random_range(min..=max))
            }
        }
    }
}

/// What a successful cycle did, for the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub summary: String,
}

impl CycleReport {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
        }
    }
}

#[derive(Debug)]
pub enum CycleError {
    /// The target channel does not exist; the cycle is skipped
    ChannelNotFound(ChannelId),

    /// Reading host metrics failed
    Collection(anyhow::Error),

    /// Sending or editing a message failed
    Delivery(DiscordError),

    /// The keepalive workload failed
    Workload(anyhow::Error),
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleError::ChannelNotFound(channel) => write!(f, "channel {channel} not found"),
            CycleError::Collection(err) => write!(f, "metric collection failed: {err:#}"),
            CycleError::Delivery(err) => write!(f, "message delivery failed: {err}"),
            CycleError::Workload(err) => write!(f, "workload failed: {err:#}"),
        }
    }
}

impl std::error::Error for CycleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CycleError::Delivery(err) => Some(err),
            CycleError::Collection(err) | CycleError::Workload(err) => Some(&**err),
            CycleError::ChannelNotFound(_) => None,
        }
    }
}

impl From<DiscordError> for CycleError {
    fn from(err: DiscordError) -> Self {
        match err {
            DiscordError::UnknownChannel(channel) => CycleError::ChannelNotFound(channel),
            other => CycleError::Delivery(other),
        }
    }
}

/// One bot's unit of periodic work
#[async_trait]
pub trait Cycle: Send {
    fn name(&self) -> &str;

    /// Runs once before the first cycle; a failure is logged, not fatal
    async fn prepare(&mut self) -> Result<(), CycleError> {
        Ok(())
    }

    async fn run_cycle(&mut self) -> Result<CycleReport, CycleError>;
}

/// Runs one cycle and applies the logging policy to its outcome
pub async fn tick<C: Cycle + ?Sized>(bot: &mut C) -> Result<CycleReport, CycleError> {
    let result = bot.run_cycle().await;

    match &result {
        Ok(report) => info!("{}: {}", bot.name(), report.summary),
        Err(CycleError::ChannelNotFound(channel)) => {
            warn!("{}: channel {channel} not found, skipping cycle", bot.name());
        }
        Err(e) => error!("{}: cycle failed: {e}", bot.name()),
    }

    result
}

/// Drives the bot forever
#[instrument(skip(bot), fields(bot = bot.name()))]
pub async fn drive<C: Cycle>(mut bot: C, schedule: Schedule, initial_delay: Duration) {
    if let Err(e) = bot.prepare().await {
        warn!("{}: preparation failed: {e}", bot.name());
    }

    if !initial_delay.is_zero() {
        info!("{}: first cycle in {}s", bot.name(), initial_delay.as_secs());
        tokio::time::sleep(initial_delay).await;
    }

    loop {
        let _ = tick(&mut bot).await;

        let delay = schedule.next_delay();
        debug!(
            "{}: next cycle in {}m {}s",
            bot.name(),
            delay.as_secs() / 60,
            delay.as_secs() % 60
        );
        tokio::time::sleep(delay).await;
    }
}
