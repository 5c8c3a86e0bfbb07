//! Cached read model over the schedule corpus.
//!
//! Parsed line records and the deduplicated stop list are held in moka caches
//! with a time-to-live. Each cache holds a single entry that is replaced as a
//! whole, so readers see either the old collection or the new one.

use std::collections::HashSet;
use std::sync::Arc;

use moka::future::Cache as MokaCache;
use tracing::{debug, info};

use crate::cache::CacheConfig;
use crate::domain::{
    GeoPoint, LineId, LineRecord, LineSummary, NearbyStop, PassingLine, StopDetails, StopId,
    StopSummary, haversine_m,
};

use super::corpus::ScheduleCorpus;
use super::error::ScheduleError;

/// Every parsed line record, in corpus file order.
pub type LinesEntry = Arc<Vec<Arc<LineRecord>>>;

/// Every distinct stop, first occurrence wins.
pub type StopsEntry = Arc<Vec<StopSummary>>;

/// Snapshot of what the corpus and caches currently hold.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusStats {
    /// File names of the line files on disk.
    pub files: Vec<String>,
    /// Whether parsed lines are currently cached.
    pub lines_cached: bool,
    /// Whether the stop list is currently cached.
    pub stops_cached: bool,
}

/// Schedule lookups backed by the corpus directory.
pub struct ScheduleStore {
    corpus: ScheduleCorpus,
    lines: MokaCache<(), LinesEntry>,
    stops: MokaCache<(), StopsEntry>,
}

impl ScheduleStore {
    /// Create a store with the given cache configuration.
    pub fn new(corpus: ScheduleCorpus, config: &CacheConfig) -> Self {
        let lines = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(1)
            .build();
        let stops = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(1)
            .build();

        Self {
            corpus,
            lines,
            stops,
        }
    }

    /// All line records, loading the corpus on a cache miss.
    ///
    /// Concurrent misses share one load.
    pub async fn lines(&self) -> Result<LinesEntry, ScheduleError> {
        self.lines
            .try_get_with((), async {
                let lines = self.corpus.load_lines().await?;
                info!(lines = lines.len(), "Schedule lines loaded");
                Ok::<_, ScheduleError>(Arc::new(lines.into_iter().map(Arc::new).collect()))
            })
            .await
            .map_err(|e: Arc<ScheduleError>| (*e).clone())
    }

    /// All distinct stops across every line.
    pub async fn all_stops(&self) -> Result<StopsEntry, ScheduleError> {
        self.stops
            .try_get_with((), async {
                let lines = self.lines().await?;
                let stops = dedup_stops(&lines);
                debug!(stops = stops.len(), "Stop list rebuilt");
                Ok::<_, ScheduleError>(Arc::new(stops))
            })
            .await
            .map_err(|e: Arc<ScheduleError>| (*e).clone())
    }

    /// A stop with every line that calls at it.
    ///
    /// Attributes come from the first line that lists the stop.
    pub async fn stop_details(&self, stop_id: &StopId) -> Result<StopDetails, ScheduleError> {
        let lines = self.lines().await?;
        let mut details: Option<StopDetails> = None;

        for line in lines.iter() {
            let Some(position) = line.position_of(stop_id) else {
                continue;
            };
            let stop = &line.stops[position];

            let entry = details.get_or_insert_with(|| StopDetails {
                id: stop_id.clone(),
                name: stop.name.clone(),
                city: stop.city.clone(),
                location: stop.location,
                accessible: stop.accessible,
                passing_lines: Vec::new(),
            });
            entry.passing_lines.push(PassingLine {
                line_id: line.id.clone(),
                line_name: line.name.clone(),
                direction: line.direction.clone(),
                times: stop.times.clone(),
            });
        }

        details.ok_or_else(|| ScheduleError::StopNotFound(stop_id.clone()))
    }

    /// Stops within `radius_m` of `point`, nearest first.
    ///
    /// Stops without coordinates never match.
    pub async fn find_nearby(
        &self,
        point: GeoPoint,
        radius_m: f64,
    ) -> Result<Vec<NearbyStop>, ScheduleError> {
        let stops = self.all_stops().await?;
        Ok(nearby_in(&stops, point, radius_m))
    }

    /// Id and name of every line.
    pub async fn all_lines(&self) -> Result<Vec<LineSummary>, ScheduleError> {
        let lines = self.lines().await?;
        Ok(lines.iter().map(|l| l.summary()).collect())
    }

    /// The full record of one line.
    pub async fn line_by_id(&self, id: &LineId) -> Result<Arc<LineRecord>, ScheduleError> {
        let lines = self.lines().await?;
        lines
            .iter()
            .find(|l| &l.id == id)
            .cloned()
            .ok_or_else(|| ScheduleError::LineNotFound(id.clone()))
    }

    /// Lines whose name or id contains `query`, ignoring case.
    pub async fn search_lines(&self, query: &str) -> Result<Vec<LineSummary>, ScheduleError> {
        let needle = query.trim().to_lowercase();
        let lines = self.lines().await?;
        Ok(lines
            .iter()
            .filter(|l| {
                l.name.to_lowercase().contains(&needle)
                    || l.id.as_str().to_lowercase().contains(&needle)
            })
            .map(|l| l.summary())
            .collect())
    }

    /// Stops whose name contains `query`, ignoring case.
    pub async fn search_stops(&self, query: &str) -> Result<Vec<StopSummary>, ScheduleError> {
        let needle = query.trim().to_lowercase();
        let stops = self.all_stops().await?;
        Ok(stops
            .iter()
            .filter(|s| s.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    /// Drop cached lines and stops. The next read reloads the corpus.
    pub fn invalidate(&self) {
        self.lines.invalidate_all();
        self.stops.invalidate_all();
        info!("Schedule caches invalidated");
    }

    pub async fn stats(&self) -> Result<CorpusStats, ScheduleError> {
        let files = self
            .corpus
            .list_files()
            .await?
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect();

        Ok(CorpusStats {
            files,
            lines_cached: self.lines.contains_key(&()),
            stops_cached: self.stops.contains_key(&()),
        })
    }
}

/// Distinct stops in line order; the first occurrence of an id wins.
fn dedup_stops(lines: &[Arc<LineRecord>]) -> Vec<StopSummary> {
    let mut seen: HashSet<&StopId> = HashSet::new();
    let mut stops = Vec::new();

    for line in lines {
        for stop in &line.stops {
            let Some(id) = &stop.stop_id else {
                continue;
            };
            if !seen.insert(id) {
                continue;
            }
            stops.push(StopSummary {
                id: id.clone(),
                name: stop.name.clone(),
                city: stop.city.clone(),
                location: stop.location,
            });
        }
    }

    stops
}

fn nearby_in(stops: &[StopSummary], point: GeoPoint, radius_m: f64) -> Vec<NearbyStop> {
    let mut nearby: Vec<NearbyStop> = stops
        .iter()
        .filter_map(|stop| {
            let location = stop.location?;
            let distance_m = haversine_m(point, location);
            (distance_m <= radius_m).then(|| NearbyStop {
                stop: stop.clone(),
                location,
                distance_m,
            })
        })
        .collect();

    nearby.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
    nearby
}
