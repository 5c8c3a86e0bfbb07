//! Shared caches for schedule data and the routing graph.
//!
//! The schedule store keeps parsed lines in moka caches with a TTL. The
//! graph is built lazily from those lines and then kept until explicitly
//! invalidated or rebuilt; it does not follow the schedule TTL.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::info;

use crate::graph::{Graph, build_graph};
use crate::schedule::{ScheduleError, ScheduleStore};

/// Configuration for the schedule caches.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached lines and stops.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(600),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Size of the graph currently held, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphStats {
    pub stops: usize,
    pub edges: usize,
    pub lines: usize,
}

impl GraphStats {
    fn of(graph: &Graph) -> Self {
        Self {
            stops: graph.stop_count(),
            edges: graph.edge_count(),
            lines: graph.line_count(),
        }
    }
}

/// Memoised routing graph.
///
/// Readers get an `Arc` to a complete graph. A rebuild constructs the new
/// graph first and swaps it in under the write lock, so in-flight requests
/// keep the graph they started with.
#[derive(Default)]
pub struct GraphCache {
    graph: RwLock<Option<Arc<Graph>>>,
}

impl GraphCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached graph, building it from `store` on first use.
    pub async fn get_or_build(&self, store: &ScheduleStore) -> Result<Arc<Graph>, ScheduleError> {
        if let Some(graph) = self.graph.read().await.as_ref() {
            return Ok(Arc::clone(graph));
        }

        let mut guard = self.graph.write().await;
        // Another task may have built it while we waited for the lock
        if let Some(graph) = guard.as_ref() {
            return Ok(Arc::clone(graph));
        }

        let lines = store.lines().await?;
        let graph = Arc::new(build_graph(&lines));
        *guard = Some(Arc::clone(&graph));
        Ok(graph)
    }

    /// Build a fresh graph from `store` and replace the cached one.
    ///
    /// On failure the previous graph is kept.
    pub async fn rebuild(&self, store: &ScheduleStore) -> Result<GraphStats, ScheduleError> {
        let lines = store.lines().await?;
        let graph = Arc::new(build_graph(&lines));
        let stats = GraphStats::of(&graph);

        *self.graph.write().await = Some(graph);
        info!(
            stops = stats.stops,
            edges = stats.edges,
            "Routing graph rebuilt"
        );
        Ok(stats)
    }

    /// Drop the cached graph. The next request builds a new one.
    pub async fn invalidate(&self) {
        *self.graph.write().await = None;
        info!("Routing graph invalidated");
    }

    /// Stats of the cached graph, without building one.
    pub async fn stats(&self) -> Option<GraphStats> {
        self.graph.read().await.as_deref().map(GraphStats::of)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ScheduleCorpus;

    const LINE: &str = r#"{
        "bus_id": "87", "lineName": "87", "direction": "OUTWARD",
        "stops": [
            {"name": "A", "city": "", "latitude": "43.100", "longitude": "5.880",
             "stopPointId": "A", "accessible": false, "times": ["07:00"]},
            {"name": "B", "city": "", "latitude": "43.101", "longitude": "5.881",
             "stopPointId": "B", "accessible": false, "times": ["07:02"]}
        ]
    }"#;

    const OTHER_LINE: &str = r#"{
        "bus_id": "19", "lineName": "19", "direction": "OUTWARD",
        "stops": [
            {"name": "B", "city": "", "latitude": "43.101", "longitude": "5.881",
             "stopPointId": "B", "accessible": false, "times": ["08:00"]},
            {"name": "C", "city": "", "latitude": "43.102", "longitude": "5.882",
             "stopPointId": "C", "accessible": false, "times": ["08:03"]}
        ]
    }"#;

    #[test]
    fn default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(600));

        let config = CacheConfig::new().with_ttl(Duration::from_secs(5));
        assert_eq!(config.ttl, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn builds_once_and_shares() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("87_horaires.json"), LINE).unwrap();
        let store = ScheduleStore::new(ScheduleCorpus::new(dir.path()), &CacheConfig::default());
        let cache = GraphCache::new();

        assert!(cache.stats().await.is_none());

        let first = cache.get_or_build(&store).await.unwrap();
        let second = cache.get_or_build(&store).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.edge_count(), 2);
    }

    #[tokio::test]
    async fn graph_survives_store_invalidation_until_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("87_horaires.json"), LINE).unwrap();
        let store = ScheduleStore::new(ScheduleCorpus::new(dir.path()), &CacheConfig::default());
        let cache = GraphCache::new();

        let before = cache.get_or_build(&store).await.unwrap();
        std::fs::write(dir.path().join("19_horaires.json"), OTHER_LINE).unwrap();
        store.invalidate();

        // Still the old graph
        let still = cache.get_or_build(&store).await.unwrap();
        assert!(Arc::ptr_eq(&before, &still));

        let stats = cache.rebuild(&store).await.unwrap();
        assert_eq!(
            stats,
            GraphStats {
                stops: 3,
                edges: 4,
                lines: 2
            }
        );

        // In-flight holders keep the graph they had
        assert_eq!(before.edge_count(), 2);
        assert_eq!(cache.get_or_build(&store).await.unwrap().edge_count(), 4);
    }

    #[tokio::test]
    async fn invalidate_forces_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("87_horaires.json"), LINE).unwrap();
        let store = ScheduleStore::new(ScheduleCorpus::new(dir.path()), &CacheConfig::default());
        let cache = GraphCache::new();

        let before = cache.get_or_build(&store).await.unwrap();
        cache.invalidate().await;
        assert!(cache.stats().await.is_none());

        let after = cache.get_or_build(&store).await.unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[tokio::test]
    async fn failed_rebuild_keeps_previous_graph() {
        let dir = tempfile::tempdir().unwrap();
        let corpus_dir = dir.path().join("corpus");
        std::fs::create_dir(&corpus_dir).unwrap();
        std::fs::write(corpus_dir.join("87_horaires.json"), LINE).unwrap();
        let store = ScheduleStore::new(ScheduleCorpus::new(&corpus_dir), &CacheConfig::default());
        let cache = GraphCache::new();

        cache.get_or_build(&store).await.unwrap();
        std::fs::remove_dir_all(&corpus_dir).unwrap();
        store.invalidate();

        assert!(cache.rebuild(&store).await.is_err());
        assert_eq!(cache.stats().await.map(|s| s.edges), Some(2));
    }
}
