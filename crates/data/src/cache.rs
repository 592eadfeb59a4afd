//! Caller-owned caching and latest-wins publication.
//!
//! Both types are plain values: whoever creates them owns their lifetime,
//! and dropping them drops the cached state.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Time-bounded key/value cache.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: RwLock<HashMap<K, (Instant, V)>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached value if it has not expired.
    pub async fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|(stored_at, _)| stored_at.elapsed() < self.ttl)
            .map(|(_, value)| value.clone())
    }

    pub async fn insert(&self, key: K, value: V) {
        self.entries
            .write()
            .await
            .insert(key, (Instant::now(), value));
    }

    /// Returns the cached value or fetches, stores and returns a new one.
    ///
    /// Errors from `fetch` are returned as-is and nothing is cached.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            return Ok(value);
        }
        debug!("Cache miss, fetching");
        let value = fetch().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }

    /// Removes `key`; returns whether it was present.
    pub async fn invalidate(&self, key: &K) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Drops expired entries and returns how many remain.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        entries.retain(|_, (stored_at, _)| stored_at.elapsed() < self.ttl);
        entries.len()
    }
}

/// Ticket identifying one request for a [`LatestValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// A value stamped with the ticket that produced it.
#[derive(Debug, Clone)]
pub struct Stamped<T> {
    pub value: T,
    pub ticket: Ticket,
    pub published_at: Instant,
}

/// Holds the result of the most recently *issued* request.
///
/// Take a [`Ticket`] before starting a request and publish the result with
/// it. A result whose ticket is older than the stored one is discarded, so
/// a slow stale response cannot overwrite a fresher one.
pub struct LatestValue<T> {
    next_ticket: AtomicU64,
    current: RwLock<Option<Stamped<T>>>,
}

impl<T: Clone> LatestValue<T> {
    pub fn new() -> Self {
        Self {
            next_ticket: AtomicU64::new(1),
            current: RwLock::new(None),
        }
    }

    pub fn ticket(&self) -> Ticket {
        Ticket(self.next_ticket.fetch_add(1, Ordering::SeqCst))
    }

    /// Stores `value` unless a newer ticket already published. Returns
    /// whether the value was stored.
    pub async fn publish(&self, ticket: Ticket, value: T) -> bool {
        let mut current = self.current.write().await;
        if let Some(existing) = current.as_ref()
            && existing.ticket >= ticket
        {
            debug!(ticket = ticket.0, latest = existing.ticket.0, "Dropping stale result");
            return false;
        }
        *current = Some(Stamped {
            value,
            ticket,
            published_at: Instant::now(),
        });
        true
    }

    pub async fn get(&self) -> Option<T> {
        self.current.read().await.as_ref().map(|s| s.value.clone())
    }

    pub async fn snapshot(&self) -> Option<Stamped<T>> {
        self.current.read().await.clone()
    }
}

impl<T: Clone> Default for LatestValue<T> {
    fn default() -> Self {
        Self::new()
    }
}
