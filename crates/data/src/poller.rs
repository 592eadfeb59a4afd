//! Fixed-interval polling of market data.
//!
//! A [`Poller`] runs a fetch on every tick, publishes successes into a
//! [`LatestValue`] and reports every outcome over an optional channel.
//! Failures are logged and polling continues.

use crate::cache::LatestValue;
use crate::error::FetchError;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, info, warn};

/// Default market-data refresh interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Outcome of one poll.
#[derive(Debug, Clone)]
pub enum PollOutcome<T> {
    Updated(T),
    Failed(String),
}

/// Event sent after each poll.
#[derive(Debug, Clone)]
pub struct PollEvent<T> {
    /// Poller name.
    pub name: String,
    /// Poll sequence number, starting at 1.
    pub sequence: u64,
    pub outcome: PollOutcome<T>,
    pub completed_at: Instant,
}

/// Handle for stopping a running poller from elsewhere.
#[derive(Debug, Clone)]
pub struct PollerHandle {
    running: Arc<AtomicBool>,
}

impl PollerHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

pub struct Poller {
    name: String,
    interval: Duration,
    max_polls: Option<u64>,
    running: Arc<AtomicBool>,
}

impl Poller {
    /// Intervals below one millisecond are raised to one millisecond.
    pub fn new(name: impl Into<String>, interval: Duration) -> Self {
        Self {
            name: name.into(),
            interval: interval.max(Duration::from_millis(1)),
            max_polls: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn every_secs(name: impl Into<String>, secs: u64) -> Self {
        Self::new(name, Duration::from_secs(secs))
    }

    /// Stops after `count` polls.
    #[must_use]
    pub fn with_max_polls(mut self, count: u64) -> Self {
        self.max_polls = Some(count);
        self
    }

    pub fn handle(&self) -> PollerHandle {
        PollerHandle {
            running: self.running.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Polls until stopped or `max_polls` is reached. The first poll runs
    /// immediately.
    pub async fn run<T, F, Fut>(
        &self,
        latest: Arc<LatestValue<T>>,
        events: Option<mpsc::Sender<PollEvent<T>>>,
        mut fetch: F,
    ) where
        T: Clone,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        self.running.store(true, Ordering::SeqCst);
        info!(poller = %self.name, interval_ms = self.interval.as_millis() as u64, "Starting poller");

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut sequence = 0u64;

        while self.running.load(Ordering::SeqCst) {
            ticker.tick().await;
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            sequence += 1;

            let ticket = latest.ticket();
            let outcome = match fetch().await {
                Ok(value) => {
                    latest.publish(ticket, value.clone()).await;
                    debug!(poller = %self.name, sequence, "Poll succeeded");
                    PollOutcome::Updated(value)
                }
                Err(err) => {
                    warn!(poller = %self.name, sequence, error = %err, "Poll failed");
                    PollOutcome::Failed(err.to_string())
                }
            };

            if let Some(tx) = &events {
                let event = PollEvent {
                    name: self.name.clone(),
                    sequence,
                    outcome,
                    completed_at: Instant::now(),
                };
                if let Err(e) = tx.send(event).await {
                    warn!(poller = %self.name, error = %e, "Failed to send poll event");
                }
            }

            if self.max_polls.is_some_and(|max| sequence >= max) {
                self.running.store(false, Ordering::SeqCst);
            }
        }

        info!(poller = %self.name, polls = sequence, "Poller stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[tokio::test(start_paused = true)]
    async fn test_polls_on_interval_and_publishes() {
        let poller = Poller::every_secs("gas", 10).with_max_polls(3);
        let latest = Arc::new(LatestValue::new());
        let (tx, mut rx) = mpsc::channel(8);
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        poller
            .run(latest.clone(), Some(tx), || {
                let calls = calls.clone();
                async move { Ok::<_, FetchError>(calls.fetch_add(1, Ordering::SeqCst) + 1) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(latest.get().await, Some(3));
        assert_eq!(start.elapsed(), Duration::from_secs(20));
        assert!(!poller.is_running());

        let mut sequences = Vec::new();
        while let Ok(event) = rx.try_recv() {
            assert!(matches!(event.outcome, PollOutcome::Updated(_)));
            sequences.push(event.sequence);
        }
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_keep_polling() {
        let poller = Poller::every_secs("apr", 1).with_max_polls(2);
        let latest: Arc<LatestValue<u32>> = Arc::new(LatestValue::new());
        let (tx, mut rx) = mpsc::channel(8);

        poller
            .run(latest.clone(), Some(tx), || async {
                Err::<u32, _>(FetchError::RateLimited)
            })
            .await;

        assert_eq!(latest.get().await, None);
        let first = rx.recv().await.unwrap();
        assert!(matches!(first.outcome, PollOutcome::Failed(_)));
        let second = rx.recv().await.unwrap();
        assert_eq!(second.sequence, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_stops_poller() {
        let poller = Poller::every_secs("stop", 1);
        let handle = poller.handle();
        let latest = Arc::new(LatestValue::new());

        poller
            .run(latest, None, || {
                let handle = handle.clone();
                async move {
                    handle.stop();
                    Ok::<_, FetchError>(())
                }
            })
            .await;

        assert!(!handle.is_running());
    }
}
