//! Development-only background reporter that logs list cache statistics.

use std::time::Duration;

use tokio::time::interval;
use tracing::{debug, info};

use super::list_cache::ListCaches;

pub struct CacheStatsService {
    caches: ListCaches,
    poll_interval: Duration,
}

impl CacheStatsService {
    /// Spawn the background cache statistics reporter
    pub async fn spawn(caches: ListCaches, poll_interval: Duration) -> tokio::task::JoinHandle<()> {
        let service = Self {
            caches,
            poll_interval,
        };
        tokio::spawn(async move {
            service.start().await;
        })
    }

    async fn start(&self) {
        info!(
            "Starting cache statistics reporter with interval {:?}",
            self.poll_interval
        );

        let mut interval = interval(self.poll_interval);
        // first tick completes immediately; skip it so the first report has data
        interval.tick().await;

        loop {
            interval.tick().await;
            self.report().await;
        }
    }

    async fn report(&self) {
        let stats = self.caches.stats().await;
        let total_entries: u64 = stats.iter().map(|s| s.entries).sum();
        if stats.iter().all(|s| s.hits + s.misses == 0) {
            debug!("List caches idle");
            return;
        }

        for s in &stats {
            info!(
                cache = %s.name,
                entries = s.entries,
                hits = s.hits,
                misses = s.misses,
                invalidations = s.invalidations,
                hit_rate = %format!("{:.1}%", s.hit_rate * 100.0),
                "List cache statistics"
            );
        }
        info!(total_entries, "List cache totals");
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn reporter_runs_until_aborted() {
        let caches = ListCaches::new(Duration::from_secs(60));
        caches
            .addresses()
            .get_or_load("k".into(), || async {
                Ok::<_, Infallible>(utils::pagination::Page::new(
                    vec![],
                    0,
                    &Default::default(),
                ))
            })
            .await
            .unwrap();

        let handle = CacheStatsService::spawn(caches.clone(), Duration::from_secs(30)).await;
        tokio::time::sleep(Duration::from_secs(95)).await;
        assert!(!handle.is_finished());

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}
