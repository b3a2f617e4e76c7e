//! Expired-Entry Sweeper
//!
//! Background task that periodically removes expired entries from a
//! [`CacheStore`]. It is the only unprompted mutation of the cache and runs
//! until its shutdown channel flips to `true` (or its sender is dropped).
//! The first sweep happens one interval after start.
//!
//! ```ignore
//! let (shutdown_tx, shutdown_rx) = watch::channel(false);
//! let handle = tokio::spawn(sweep_task(cache, SweeperConfig::default(), shutdown_rx));
//!
//! // Later
//! let _ = shutdown_tx.send(true);
//! let metrics = handle.await?;
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use halcyon_core::constants::DEFAULT_SWEEP_INTERVAL_MS;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::store::CacheStore;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// How often to sweep (default: 60 seconds)
    pub interval: Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_SWEEP_INTERVAL_MS),
        }
    }
}

impl SweeperConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

// ============================================================================
// METRICS
// ============================================================================

#[derive(Debug, Default)]
pub struct SweeperMetrics {
    /// Sweep cycles completed
    pub sweep_cycles: AtomicU64,

    /// Expired entries removed since startup
    pub entries_swept: AtomicU64,
}

impl SweeperMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SweeperSnapshot {
        SweeperSnapshot {
            sweep_cycles: self.sweep_cycles.load(Ordering::Relaxed),
            entries_swept: self.entries_swept.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweeperSnapshot {
    pub sweep_cycles: u64,
    pub entries_swept: u64,
}

// ============================================================================
// BACKGROUND TASK
// ============================================================================

pub async fn sweep_task(
    cache: Arc<CacheStore>,
    config: SweeperConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Arc<SweeperMetrics> {
    let metrics = Arc::new(SweeperMetrics::new());

    let mut sweep_interval = interval_at(Instant::now() + config.interval, config.interval);
    sweep_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        interval_ms = config.interval.as_millis() as u64,
        "Cache sweeper started"
    );

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    tracing::info!("Cache sweeper shutting down");
                    break;
                }
            }

            _ = sweep_interval.tick() => {
                sweep_once(&cache, &metrics);
            }
        }
    }

    let snapshot = metrics.snapshot();
    tracing::info!(
        sweep_cycles = snapshot.sweep_cycles,
        entries_swept = snapshot.entries_swept,
        "Cache sweeper stopped"
    );

    metrics
}

fn sweep_once(cache: &CacheStore, metrics: &SweeperMetrics) {
    metrics.sweep_cycles.fetch_add(1, Ordering::Relaxed);
    let swept = cache.sweep_expired() as u64;
    metrics.entries_swept.fetch_add(swept, Ordering::Relaxed);

    if swept > 0 {
        tracing::info!(swept, remaining = cache.len(), "Cache sweep completed");
    } else {
        tracing::trace!("Cache sweep completed with no expired entries");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_removes_expired_and_stops() {
        let cache = Arc::new(CacheStore::new(Duration::from_secs(60)));
        cache.put("/short", Arc::new(1u8), Duration::from_secs(5));
        cache.put("/long", Arc::new(2u8), Duration::from_secs(600));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let config = SweeperConfig::default().with_interval(Duration::from_secs(10));
        let handle = tokio::spawn(sweep_task(Arc::clone(&cache), config, shutdown_rx));

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert!(cache.peek("/short").is_none());
        assert!(cache.peek("/long").is_some());

        shutdown_tx.send(true).unwrap();
        let metrics = handle.await.unwrap().snapshot();
        assert_eq!(metrics.entries_swept, 1);
        assert!(metrics.sweep_cycles >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_stops_when_sender_dropped() {
        let cache = Arc::new(CacheStore::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(sweep_task(cache, SweeperConfig::default(), shutdown_rx));
        drop(shutdown_tx);
        let metrics = handle.await.unwrap().snapshot();
        assert!(metrics.sweep_cycles <= 1);
    }
}
