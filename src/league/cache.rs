//! Process-wide league cache.
//!
//! Each league id owns a `OnceCell`, so concurrent first requests for the same
//! league share one load while different leagues load in parallel. A failed
//! load drops its slot and the next request retries. When the cache is full
//! the least recently used loaded league is dropped; requests already holding
//! its data keep their `Arc`. Slots still loading are never evicted, so the
//! cache may briefly exceed its capacity while loads are in flight.

use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use crate::error::{PredictError, PredictResult};

use super::{LeagueData, LeagueSource};

#[derive(Clone)]
pub struct LeagueCache {
    source: Arc<dyn LeagueSource>,
    capacity: usize,
    inner: Arc<Mutex<CacheInner>>,
}

struct CacheInner {
    /// league id → slot
    entries: HashMap<String, Slot>,
    /// monotonically increasing access counter for LRU ordering
    tick: u64,
}

struct Slot {
    cell: Arc<OnceCell<Arc<LeagueData>>>,
    last_used: u64,
}

impl Slot {
    /// Loaded, or empty with nobody waiting on it.
    fn evictable(&self) -> bool {
        self.cell.initialized() || Arc::strong_count(&self.cell) == 1
    }
}

impl LeagueCache {
    pub fn new(source: Arc<dyn LeagueSource>, capacity: usize) -> Self {
        LeagueCache {
            source,
            capacity: capacity.max(1),
            inner: Arc::new(Mutex::new(CacheInner {
                entries: HashMap::new(),
                tick: 0,
            })),
        }
    }

    /// League data, loading it through the source on first use.
    pub async fn get(&self, league: &str) -> PredictResult<Arc<LeagueData>> {
        let cell = self.slot(league).await;
        let result = cell
            .get_or_try_init(|| async {
                info!("Loading league {} from {}", league, self.source.name());
                let data = self.source.load(league).await.map_err(|e| {
                    warn!("Loading league {} failed: {}", league, e);
                    e
                })?;
                Ok::<_, PredictError>(Arc::new(data))
            })
            .await
            .map(Arc::clone);
        if result.is_err() {
            self.discard_failed(league, &cell).await;
        }
        result
    }

    /// Preload several leagues concurrently. Returns how many loaded.
    pub async fn warm(&self, leagues: &[String]) -> usize {
        let results = join_all(leagues.iter().map(|l| self.get(l))).await;
        let loaded = results.iter().filter(|r| r.is_ok()).count();
        info!("Warmed {}/{} leagues", loaded, leagues.len());
        loaded
    }

    /// League ids known to the underlying source.
    pub async fn available(&self) -> PredictResult<Vec<String>> {
        self.source.list_leagues().await
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    /// Drop the empty slot left by a failed load unless other requests are
    /// still waiting on it; they retry the load on the same cell.
    async fn discard_failed(&self, league: &str, cell: &Arc<OnceCell<Arc<LeagueData>>>) {
        let mut inner = self.inner.lock().await;
        let idle = inner.entries.get(league).map_or(false, |slot| {
            Arc::ptr_eq(&slot.cell, cell)
                && !slot.cell.initialized()
                && Arc::strong_count(&slot.cell) == 2
        });
        if idle {
            inner.entries.remove(league);
            debug!("LeagueCache: dropped failed slot {}", league);
        }
    }

    /// Slot for `league`, creating it (and evicting LRU entries) if needed.
    async fn slot(&self, league: &str) -> Arc<OnceCell<Arc<LeagueData>>> {
        let mut inner = self.inner.lock().await;
        inner.tick += 1;
        let tick = inner.tick;

        if let Some(slot) = inner.entries.get_mut(league) {
            slot.last_used = tick;
            return Arc::clone(&slot.cell);
        }

        while inner.entries.len() >= self.capacity {
            let oldest = inner
                .entries
                .iter()
                .filter(|(_, s)| s.evictable())
                .min_by_key(|(_, s)| s.last_used)
                .map(|(k, _)| k.clone());
            let Some(key) = oldest else {
                debug!(
                    "LeagueCache: {} slots loading, over capacity {}",
                    inner.entries.len(),
                    self.capacity
                );
                break;
            };
            inner.entries.remove(&key);
            debug!("LeagueCache: evicted {}", key);
        }

        let cell = Arc::new(OnceCell::new());
        inner.entries.insert(
            league.to_string(),
            Slot {
                cell: Arc::clone(&cell),
                last_used: tick,
            },
        );
        cell
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::stub::linear_artifact;
    use crate::db::models::LeagueHistory;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Source that counts loads per league and can fail the first N attempts.
    struct CountingSource {
        loads: std::sync::Mutex<HashMap<String, usize>>,
        fail_first: usize,
        attempts: AtomicUsize,
        delay: Duration,
        /// leagues that never load
        missing: Vec<String>,
    }

    impl CountingSource {
        fn new(fail_first: usize) -> Arc<Self> {
            Self::with(fail_first, Duration::from_millis(20), &[])
        }

        fn with(fail_first: usize, delay: Duration, missing: &[&str]) -> Arc<Self> {
            Arc::new(CountingSource {
                loads: std::sync::Mutex::new(HashMap::new()),
                fail_first,
                attempts: AtomicUsize::new(0),
                delay,
                missing: missing.iter().map(|l| l.to_string()).collect(),
            })
        }

        fn loads(&self, league: &str) -> usize {
            self.loads.lock().unwrap().get(league).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl LeagueSource for CountingSource {
        async fn load(&self, league: &str) -> PredictResult<LeagueData> {
            tokio::time::sleep(self.delay).await;
            if self.attempts.fetch_add(1, Ordering::SeqCst) < self.fail_first
                || self.missing.iter().any(|m| m == league)
            {
                return Err(PredictError::NotFound(format!("Data for '{league}' not found")));
            }
            *self.loads.lock().unwrap().entry(league.to_string()).or_default() += 1;
            Ok(LeagueData {
                history: LeagueHistory::new(league, Vec::new()),
                model: linear_artifact(&["shots"], &[0.1], 0.5),
            })
        }

        async fn list_leagues(&self) -> PredictResult<Vec<String>> {
            Ok(vec!["premier_league".into()])
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn concurrent_first_access_loads_once() {
        let source = CountingSource::new(0);
        let cache = LeagueCache::new(source.clone(), 4);

        let results = join_all((0..8).map(|_| cache.get("premier_league"))).await;
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(source.loads("premier_league"), 1);

        let a = cache.get("premier_league").await.unwrap();
        let b = cache.get("premier_league").await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(source.loads("premier_league"), 1);
    }

    #[tokio::test]
    async fn different_leagues_load_independently() {
        let source = CountingSource::new(0);
        let cache = LeagueCache::new(source.clone(), 4);

        let (a, b) = tokio::join!(cache.get("la_liga"), cache.get("serie_a"));
        assert_eq!(a.unwrap().history.league, "la_liga");
        assert_eq!(b.unwrap().history.league, "serie_a");
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn least_recently_used_league_is_evicted() {
        let source = CountingSource::new(0);
        let cache = LeagueCache::new(source.clone(), 2);

        cache.get("a").await.unwrap();
        cache.get("b").await.unwrap();
        cache.get("a").await.unwrap();
        cache.get("c").await.unwrap(); // evicts b
        assert_eq!(cache.len().await, 2);

        cache.get("a").await.unwrap();
        assert_eq!(source.loads("a"), 1);

        cache.get("b").await.unwrap();
        assert_eq!(source.loads("b"), 2);
    }

    #[tokio::test]
    async fn failed_load_is_retried() {
        let source = CountingSource::new(1);
        let cache = LeagueCache::new(source.clone(), 2);

        assert!(cache.get("mls").await.is_err());
        assert!(cache.get("mls").await.is_ok());
        assert_eq!(source.loads("mls"), 1);
    }

    #[tokio::test]
    async fn warm_reports_loaded_count() {
        let source = CountingSource::new(1);
        let cache = LeagueCache::new(source.clone(), 4);

        let leagues = vec!["ucl".to_string(), "uel".to_string()];
        let loaded = cache.warm(&leagues).await;
        assert_eq!(loaded, 1);
        assert_eq!(cache.warm(&leagues).await, 2);
    }

    #[tokio::test]
    async fn loading_league_is_not_evicted_by_a_newer_request() {
        let source = CountingSource::with(0, Duration::from_millis(100), &[]);
        let cache = LeagueCache::new(source.clone(), 1);

        let first = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get("x").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let (y, x) = tokio::join!(cache.get("y"), cache.get("x"));
        assert!(y.is_ok() && x.is_ok());
        assert!(first.await.unwrap().is_ok());
        assert_eq!(source.loads("x"), 1);
        assert_eq!(source.loads("y"), 1);
        assert_eq!(cache.len().await, 2);

        // Back under capacity once both loads are done.
        cache.get("z").await.unwrap();
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn failed_league_does_not_take_a_slot() {
        let source = CountingSource::with(0, Duration::from_millis(5), &["bad"]);
        let cache = LeagueCache::new(source.clone(), 2);

        cache.get("a").await.unwrap();
        assert!(cache.get("bad").await.is_err());
        assert_eq!(cache.len().await, 1);

        cache.get("b").await.unwrap();
        cache.get("a").await.unwrap();
        assert_eq!(source.loads("a"), 1);
        assert_eq!(cache.len().await, 2);
    }
}
