use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::cache::InMemoryCache;

/// Periodic background sweep of expired cache entries.
///
/// The loop runs one cleanup pass, then waits for either the configured
/// interval or a shutdown signal. Cancellation is cooperative: `stop()`
/// signals the loop and joins the task, so an in-flight pass always
/// completes before `stop()` returns.
pub struct CacheCleanupTask {
    cache: Arc<InMemoryCache>,
    interval: Duration,
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl CacheCleanupTask {
    pub fn new(cache: Arc<InMemoryCache>, interval: Duration) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            cache,
            interval,
            shutdown,
            handle: None,
        }
    }

    /// Spawns the sweep loop. No-op if already running.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }

        let cache = Arc::clone(&self.cache);
        let interval = self.interval;
        let mut shutdown_rx = self.shutdown.subscribe();

        self.handle = Some(tokio::spawn(async move {
            loop {
                let removed = cache.cleanup_expired().await;
                tracing::debug!(removed, "cache sweep finished");

                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            tracing::info!("cache cleanup task stopped");
        }));

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "started cache cleanup task"
        );
    }

    /// Signals the loop and waits for it to finish. No-op if not running.
    pub async fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        let _ = self.shutdown.send(true);
        if let Err(err) = handle.await {
            tracing::error!(error = %err, "cache cleanup task failed to join");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WeatherRecord;

    fn sample_record() -> WeatherRecord {
        WeatherRecord::new("London", 15.5, 65, 12.3, "Partly cloudy").unwrap()
    }

    #[tokio::test]
    async fn test_sweeps_expired_entries() {
        let cache = Arc::new(InMemoryCache::new());
        cache.set("weather:london", &sample_record(), 0).await.unwrap();

        let mut task = CacheCleanupTask::new(Arc::clone(&cache), Duration::from_millis(20));
        task.start();

        // The first pass runs as soon as the task is spawned
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cache.size().await, 0);

        task.stop().await;
    }

    #[tokio::test]
    async fn test_leaves_fresh_entries_alone() {
        let cache = Arc::new(InMemoryCache::new());
        cache.set("weather:london", &sample_record(), 300).await.unwrap();

        let mut task = CacheCleanupTask::new(Arc::clone(&cache), Duration::from_millis(10));
        task.start();
        tokio::time::sleep(Duration::from_millis(40)).await;
        task.stop().await;

        assert_eq!(cache.size().await, 1);
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let cache = Arc::new(InMemoryCache::new());
        let mut task = CacheCleanupTask::new(cache, Duration::from_secs(60));

        task.start();
        task.start();
        assert!(task.handle.is_some());

        task.stop().await;
        assert!(task.handle.is_none());
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let cache = Arc::new(InMemoryCache::new());
        let mut task = CacheCleanupTask::new(cache, Duration::from_secs(60));
        task.stop().await;
    }

    #[tokio::test]
    async fn test_stop_interrupts_long_wait() {
        let cache = Arc::new(InMemoryCache::new());
        let mut task = CacheCleanupTask::new(cache, Duration::from_secs(3600));
        task.start();

        // stop() must not wait out the hour-long interval
        tokio::time::timeout(Duration::from_secs(1), task.stop())
            .await
            .expect("stop did not return promptly");
    }
}
