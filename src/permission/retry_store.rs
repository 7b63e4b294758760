//! Password retry counter store
//!
//! Best-effort external counter used only to bound trade-password retries.
//! Callers treat every failure as "no limit available" (fail-open): a
//! counter outage degrades lockout enforcement but never blocks trading.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::Result;

#[async_trait]
pub trait RetryCounterStore: Send + Sync {
    /// Increment the counter behind `key` and return the new value,
    /// (re)arming its expiry.
    async fn incr_and_get(&self, key: &str, ttl: Duration) -> Result<i64>;

    /// Drop the counter behind `key`.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory counter store for tests and single-node deployments.
#[derive(Default)]
pub struct MemoryCounterStore {
    counters: DashMap<String, (i64, Instant)>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RetryCounterStore for MemoryCounterStore {
    async fn incr_and_get(&self, key: &str, ttl: Duration) -> Result<i64> {
        let now = Instant::now();
        let mut entry = self.counters.entry(key.to_string()).or_insert((0, now + ttl));
        let (count, expires_at) = entry.value_mut();
        if *expires_at <= now {
            *count = 0;
        }
        *count += 1;
        *expires_at = now + ttl;
        Ok(*count)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.counters.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_incr_and_get_counts_up() {
        let store = MemoryCounterStore::new();
        assert_eq!(store.incr_and_get("k", TTL).await.unwrap(), 1);
        assert_eq!(store.incr_and_get("k", TTL).await.unwrap(), 2);
        assert_eq!(store.incr_and_get("k", TTL).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let store = MemoryCounterStore::new();
        store.incr_and_get("a", TTL).await.unwrap();
        store.incr_and_get("a", TTL).await.unwrap();
        assert_eq!(store.incr_and_get("b", TTL).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove_resets() {
        let store = MemoryCounterStore::new();
        store.incr_and_get("k", TTL).await.unwrap();
        store.incr_and_get("k", TTL).await.unwrap();
        store.remove("k").await.unwrap();
        assert_eq!(store.incr_and_get("k", TTL).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_expired_counter_restarts() {
        let store = MemoryCounterStore::new();
        store
            .incr_and_get("k", Duration::from_millis(0))
            .await
            .unwrap();
        // TTL of zero expires immediately; the next increment starts over.
        assert_eq!(store.incr_and_get("k", TTL).await.unwrap(), 1);
    }
}
