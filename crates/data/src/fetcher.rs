//! Rate-limited batch fetcher.
//!
//! Outbound requests are grouped into named buckets, each allowing at most
//! `max_requests` dispatches in any rolling `window`. Callers beyond the
//! limit wait in submission order. Failed fetches are retried after a
//! fixed backoff, re-entering the bucket queue each time, until the retry
//! budget runs out.

use crate::error::FetchError;
use futures::future::join_all;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Configuration of one rate-limit bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketConfig {
    pub name: String,
    /// Dispatches allowed per window. Always at least 1.
    pub max_requests: u32,
    pub window: Duration,
}

impl BucketConfig {
    pub fn new(name: impl Into<String>, max_requests: u32, window: Duration) -> Self {
        Self {
            name: name.into(),
            max_requests: max_requests.max(1),
            window,
        }
    }
}

/// Fixed-backoff retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

/// A single keyed fetch moving through a bucket.
#[derive(Debug, Clone)]
pub struct PriceFetchJob {
    pub id: Uuid,
    pub instrument_key: String,
    pub retry_count: u32,
}

impl PriceFetchJob {
    pub fn new(instrument_key: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            instrument_key: instrument_key.into(),
            retry_count: 0,
        }
    }
}

/// Counters for one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketStats {
    /// Attempts released by the rate limiter.
    pub dispatched: u64,
    pub succeeded: u64,
    pub retried: u64,
    pub exhausted: u64,
}

#[derive(Default)]
struct BucketCounters {
    dispatched: AtomicU64,
    succeeded: AtomicU64,
    retried: AtomicU64,
    exhausted: AtomicU64,
}

struct Bucket {
    config: BucketConfig,
    /// Dispatch instants inside the current window, oldest first.
    window: Mutex<VecDeque<Instant>>,
    counters: BucketCounters,
}

impl Bucket {
    /// Raises `max_requests` to 1 for configs built without
    /// [`BucketConfig::new`].
    fn new(mut config: BucketConfig) -> Self {
        config.max_requests = config.max_requests.max(1);
        Self {
            window: Mutex::new(VecDeque::with_capacity(config.max_requests as usize)),
            config,
            counters: BucketCounters::default(),
        }
    }

    /// Waits until a dispatch slot is free and claims it.
    ///
    /// The lock is held while sleeping: tokio's mutex is fair, so later
    /// callers queue behind earlier ones in FIFO order.
    async fn acquire(&self) {
        let mut window = self.window.lock().await;
        loop {
            let now = Instant::now();
            while let Some(&oldest) = window.front() {
                if now.duration_since(oldest) >= self.config.window {
                    window.pop_front();
                } else {
                    break;
                }
            }

            if window.len() < self.config.max_requests as usize {
                window.push_back(now);
                self.counters.dispatched.fetch_add(1, Ordering::SeqCst);
                return;
            }

            if let Some(&oldest) = window.front() {
                // A window too large to add to an instant never frees a slot.
                let wait = oldest
                    .checked_add(self.config.window)
                    .map_or(Duration::MAX, |ready| ready.saturating_duration_since(now));
                debug!(bucket = %self.config.name, wait_ms = wait.as_millis() as u64, "Bucket full, waiting");
                sleep(wait).await;
            }
        }
    }

    fn stats(&self) -> BucketStats {
        BucketStats {
            dispatched: self.counters.dispatched.load(Ordering::SeqCst),
            succeeded: self.counters.succeeded.load(Ordering::SeqCst),
            retried: self.counters.retried.load(Ordering::SeqCst),
            exhausted: self.counters.exhausted.load(Ordering::SeqCst),
        }
    }
}

/// Throttles fetches per named bucket and retries failures.
pub struct BatchFetcher {
    buckets: HashMap<String, Arc<Bucket>>,
    retry: RetryPolicy,
}

impl BatchFetcher {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            buckets: HashMap::new(),
            retry,
        }
    }

    /// Adds a bucket, replacing any bucket with the same name.
    #[must_use]
    pub fn with_bucket(mut self, config: BucketConfig) -> Self {
        let bucket = Bucket::new(config);
        info!(
            bucket = %bucket.config.name,
            max_requests = bucket.config.max_requests,
            window_ms = bucket.config.window.as_millis() as u64,
            "Registering rate-limit bucket"
        );
        self.buckets
            .insert(bucket.config.name.clone(), Arc::new(bucket));
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn has_bucket(&self, name: &str) -> bool {
        self.buckets.contains_key(name)
    }

    pub fn stats(&self, bucket: &str) -> Option<BucketStats> {
        self.buckets.get(bucket).map(|b| b.stats())
    }

    /// Runs `fetch` through `bucket`, retrying on any error.
    ///
    /// `fetch` is called once per attempt, so it must build a fresh request
    /// each time.
    ///
    /// # Errors
    /// [`FetchError::UnknownBucket`] if the bucket is not registered, or
    /// [`FetchError::Exhausted`] with the last error once retries run out.
    pub async fn enqueue<T, F, Fut>(
        &self,
        bucket: &str,
        request_key: impl Into<String>,
        mut fetch: F,
    ) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let bucket = self
            .buckets
            .get(bucket)
            .cloned()
            .ok_or_else(|| FetchError::UnknownBucket(bucket.to_string()))?;
        let mut job = PriceFetchJob::new(request_key);

        loop {
            bucket.acquire().await;
            debug!(
                bucket = %bucket.config.name,
                key = %job.instrument_key,
                job_id = %job.id,
                attempt = job.retry_count + 1,
                "Dispatching fetch"
            );

            match fetch().await {
                Ok(value) => {
                    bucket.counters.succeeded.fetch_add(1, Ordering::SeqCst);
                    return Ok(value);
                }
                Err(err) if job.retry_count >= self.retry.max_retries => {
                    bucket.counters.exhausted.fetch_add(1, Ordering::SeqCst);
                    warn!(
                        bucket = %bucket.config.name,
                        key = %job.instrument_key,
                        attempts = job.retry_count + 1,
                        error = %err,
                        "Fetch failed, retries exhausted"
                    );
                    return Err(FetchError::Exhausted {
                        key: job.instrument_key,
                        attempts: job.retry_count + 1,
                        last: Box::new(err),
                    });
                }
                Err(err) => {
                    job.retry_count += 1;
                    bucket.counters.retried.fetch_add(1, Ordering::SeqCst);
                    warn!(
                        bucket = %bucket.config.name,
                        key = %job.instrument_key,
                        retry = job.retry_count,
                        error = %err,
                        "Fetch failed, retrying"
                    );
                    sleep(self.retry.backoff).await;
                }
            }
        }
    }

    /// Enqueues one fetch per key and returns results in input order.
    pub async fn enqueue_batch<T, F, Fut>(
        &self,
        bucket: &str,
        keys: Vec<String>,
        fetch: F,
    ) -> Vec<(String, Result<T, FetchError>)>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let fetch = &fetch;
        let jobs = keys.into_iter().map(|key| async move {
            let result = self
                .enqueue(bucket, key.clone(), || fetch(key.clone()))
                .await;
            (key, result)
        });
        join_all(jobs).await
    }
}

impl Default for BatchFetcher {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}
