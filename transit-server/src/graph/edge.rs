//! Routing graph types.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{LineId, LineRecord, StopId};

/// Which way an edge runs relative to its line's timetable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Same order as the timetable lists the stops.
    Scheduled,
    /// Against the timetable; inferred, not published.
    Reverse,
}

/// A directed hop between two stops on one line.
#[derive(Debug, Clone)]
pub struct Edge {
    pub from: StopId,
    pub to: StopId,
    pub line: Arc<LineRecord>,
    pub direction: Direction,
    pub duration_min: u32,
    pub distance_m: f64,
    /// Number of stop-to-stop hops this edge spans.
    pub stop_count: u32,
    /// Positions of `from` and `to` in `line.stops`.
    pub from_index: usize,
    pub to_index: usize,
}

impl Edge {
    pub fn line_id(&self) -> &LineId {
        &self.line.id
    }

    pub fn line_name(&self) -> &str {
        &self.line.name
    }

    pub fn is_reverse(&self) -> bool {
        self.direction == Direction::Reverse
    }

    /// Direction tag as it appears in the corpus, or the synthetic
    /// `*_VIRTUAL` tag for reverse edges.
    pub fn direction_tag(&self) -> Option<&str> {
        match self.direction {
            Direction::Scheduled => self.line.direction_tag(),
            Direction::Reverse => Some(self.line.reverse_direction_tag()),
        }
    }
}

/// Adjacency lists keyed by stop id. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    adjacency: HashMap<StopId, Vec<Edge>>,
    edge_count: usize,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stop with no edges if it is not present yet.
    pub(crate) fn add_stop(&mut self, stop: &StopId) {
        self.adjacency.entry(stop.clone()).or_default();
    }

    pub(crate) fn add_edge(&mut self, edge: Edge) {
        self.add_stop(&edge.to);
        self.adjacency
            .entry(edge.from.clone())
            .or_default()
            .push(edge);
        self.edge_count += 1;
    }

    /// Outgoing edges of `stop`, empty when unknown.
    pub fn edges_from(&self, stop: &StopId) -> &[Edge] {
        self.adjacency.get(stop).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, stop: &StopId) -> bool {
        self.adjacency.contains_key(stop)
    }

    pub fn stop_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn line_count(&self) -> usize {
        let mut lines: Vec<&LineId> = self
            .adjacency
            .values()
            .flatten()
            .map(Edge::line_id)
            .collect();
        lines.sort();
        lines.dedup();
        lines.len()
    }
}
