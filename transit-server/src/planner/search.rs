//! Cost-based shortest path search over the routing graph.
//!
//! Dijkstra over stop ids where an edge costs its duration, plus a penalty
//! for riding against the timetable direction, plus a penalty when it changes
//! line relative to the edge that reached the current stop.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use tracing::debug;

use crate::domain::{LineId, StopId};
use crate::graph::{Edge, Graph};

use super::config::PlannerConfig;

/// Error from path search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// Endpoint has no edges in the graph
    #[error("stop {0} is not in the routing graph")]
    StopNotInGraph(StopId),

    /// Endpoints are not connected, or are the same stop
    #[error("no path from {from} to {to}")]
    NoPath { from: StopId, to: StopId },

    /// Search gave up before reaching the destination
    #[error("search stopped after {0} iterations")]
    IterationLimit(usize),
}

/// Search constraints for one invocation.
#[derive(Debug, Clone)]
pub struct SearchParams<'a> {
    pub excluded_lines: &'a HashSet<LineId>,
    pub max_iterations: usize,
    pub reverse_penalty: u32,
    pub transfer_penalty: u32,
}

impl<'a> SearchParams<'a> {
    pub fn from_config(config: &PlannerConfig, excluded_lines: &'a HashSet<LineId>) -> Self {
        Self {
            excluded_lines,
            max_iterations: config.max_iterations,
            reverse_penalty: config.reverse_penalty,
            transfer_penalty: config.transfer_penalty,
        }
    }
}

/// Frontier entry. Ordered so the lowest cost pops first from a max-heap,
/// with ties going to the earliest pushed entry.
#[derive(Debug, PartialEq, Eq)]
struct Frontier<'g> {
    cost: u32,
    seq: u64,
    stop: &'g StopId,
}

impl Ord for Frontier<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Frontier<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lowest-cost edge path from `start` to `end`, one edge per stop pair.
pub fn shortest_path(
    graph: &Graph,
    start: &StopId,
    end: &StopId,
    params: &SearchParams<'_>,
) -> Result<Vec<Edge>, SearchError> {
    if !graph.contains(start) {
        return Err(SearchError::StopNotInGraph(start.clone()));
    }
    if !graph.contains(end) {
        return Err(SearchError::StopNotInGraph(end.clone()));
    }
    if start == end {
        return Err(SearchError::NoPath {
            from: start.clone(),
            to: end.clone(),
        });
    }

    let mut best: HashMap<&StopId, u32> = HashMap::new();
    let mut reached_by: HashMap<&StopId, &Edge> = HashMap::new();
    let mut settled: HashSet<&StopId> = HashSet::new();
    let mut frontier = BinaryHeap::new();
    let mut seq = 0u64;
    let mut iterations = 0usize;
    let mut found = false;

    best.insert(start, 0);
    frontier.push(Frontier {
        cost: 0,
        seq,
        stop: start,
    });

    while let Some(Frontier { cost, stop, .. }) = frontier.pop() {
        iterations += 1;
        if iterations > params.max_iterations {
            debug!(%start, %end, iterations, "Search hit iteration limit");
            return Err(SearchError::IterationLimit(params.max_iterations));
        }

        if !settled.insert(stop) {
            continue;
        }
        if stop == end {
            found = true;
            break;
        }

        let arriving_line = reached_by.get(stop).copied().map(Edge::line_id);

        for edge in graph.edges_from(stop) {
            if params.excluded_lines.contains(edge.line_id()) || settled.contains(&edge.to) {
                continue;
            }

            let mut next_cost = cost + edge.duration_min;
            if edge.is_reverse() {
                next_cost += params.reverse_penalty;
            }
            if arriving_line.is_some_and(|line| line != edge.line_id()) {
                next_cost += params.transfer_penalty;
            }

            if best.get(&edge.to).is_none_or(|&known| next_cost < known) {
                best.insert(&edge.to, next_cost);
                reached_by.insert(&edge.to, edge);
                seq += 1;
                frontier.push(Frontier {
                    cost: next_cost,
                    seq,
                    stop: &edge.to,
                });
            }
        }
    }

    if !found {
        debug!(%start, %end, iterations, "No path");
        return Err(SearchError::NoPath {
            from: start.clone(),
            to: end.clone(),
        });
    }

    let mut path = Vec::new();
    let mut current = end;
    while let Some(edge) = reached_by.get(current) {
        path.push((*edge).clone());
        current = &edge.from;
        if current == start {
            break;
        }
    }
    path.reverse();

    debug!(%start, %end, iterations, edges = path.len(), "Path found");
    Ok(path)
}

/// Collapse consecutive edges on the same line and direction into one ride.
///
/// Durations, distances and stop counts are summed; the first edge's origin
/// and the last edge's destination are kept.
pub fn merge_consecutive(edges: Vec<Edge>) -> Vec<Edge> {
    let mut merged: Vec<Edge> = Vec::with_capacity(edges.len());

    for edge in edges {
        match merged.last_mut() {
            Some(current)
                if current.line_id() == edge.line_id() && current.direction == edge.direction =>
            {
                current.to = edge.to;
                current.to_index = edge.to_index;
                current.duration_min += edge.duration_min;
                current.distance_m += edge.distance_m;
                current.stop_count += edge.stop_count;
            }
            _ => merged.push(edge),
        }
    }

    merged
}

/// Shortest path with consecutive same-line edges merged into rides.
pub fn find_path(
    graph: &Graph,
    start: &StopId,
    end: &StopId,
    params: &SearchParams<'_>,
) -> Result<Vec<Edge>, SearchError> {
    shortest_path(graph, start, end, params).map(merge_consecutive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::graph::test_support::{line, stop};
    use std::sync::Arc;

    fn id(s: &str) -> StopId {
        StopId::parse(s).unwrap()
    }

    fn line_id(s: &str) -> LineId {
        LineId::parse(s).unwrap()
    }

    /// 87 runs A-B-C-D every 30 minutes, 19 runs A-E-D slowly.
    fn network() -> Graph {
        let l87 = line(
            "87",
            Some("OUTWARD"),
            vec![
                stop("A", 43.100, 5.880, &["07:00", "07:30"]),
                stop("B", 43.101, 5.881, &["07:02", "07:32"]),
                stop("C", 43.102, 5.882, &["07:05", "07:35"]),
                stop("D", 43.103, 5.883, &["07:07", "07:37"]),
            ],
        );
        let l19 = line(
            "19",
            Some("OUTWARD"),
            vec![
                stop("A", 43.100, 5.880, &["07:10"]),
                stop("E", 43.105, 5.870, &["07:20"]),
                stop("D", 43.103, 5.883, &["07:35"]),
            ],
        );
        build_graph(&[Arc::new(l87), Arc::new(l19)])
    }

    fn search(
        graph: &Graph,
        from: &str,
        to: &str,
        excluded: &HashSet<LineId>,
    ) -> Result<Vec<Edge>, SearchError> {
        let params = SearchParams::from_config(&PlannerConfig::default(), excluded);
        find_path(graph, &id(from), &id(to), &params)
    }

    #[test]
    fn direct_ride_is_merged() {
        let graph = network();
        let path = search(&graph, "A", "D", &HashSet::new()).unwrap();

        assert_eq!(path.len(), 1);
        let ride = &path[0];
        assert_eq!(ride.line_id(), &line_id("87"));
        assert_eq!(ride.from, id("A"));
        assert_eq!(ride.to, id("D"));
        assert_eq!((ride.from_index, ride.to_index), (0, 3));
        assert_eq!(ride.stop_count, 3);
        assert_eq!(ride.duration_min, 7);
        assert!(!ride.is_reverse());
    }

    #[test]
    fn excluded_line_forces_alternative() {
        let graph = network();
        let excluded = HashSet::from([line_id("87")]);
        let path = search(&graph, "A", "D", &excluded).unwrap();

        assert_eq!(path.len(), 1);
        assert_eq!(path[0].line_id(), &line_id("19"));
        assert_eq!(path[0].duration_min, 25);
    }

    #[test]
    fn reverse_edges_are_usable_at_a_penalty() {
        let graph = network();
        let path = search(&graph, "D", "B", &HashSet::new()).unwrap();

        assert_eq!(path.len(), 1);
        assert!(path[0].is_reverse());
        assert_eq!(path[0].direction_tag(), Some("INWARD_VIRTUAL"));
        assert_eq!((path[0].from_index, path[0].to_index), (3, 1));
    }

    #[test]
    fn physical_ride_beats_equal_reverse_ride() {
        // "R" runs Y to X, so X to Y on it is a reverse ride of equal length
        let forward = line(
            "P",
            Some("OUTWARD"),
            vec![
                stop("X", 43.100, 5.880, &["07:00"]),
                stop("Y", 43.101, 5.881, &["07:04"]),
            ],
        );
        let backward = line(
            "R",
            Some("OUTWARD"),
            vec![
                stop("Y", 43.101, 5.881, &["07:00"]),
                stop("X", 43.100, 5.880, &["07:04"]),
            ],
        );

        for lines in [
            vec![Arc::new(forward.clone()), Arc::new(backward.clone())],
            vec![Arc::new(backward.clone()), Arc::new(forward.clone())],
        ] {
            let graph = build_graph(&lines);
            let path = search(&graph, "X", "Y", &HashSet::new()).unwrap();
            assert_eq!(path.len(), 1);
            assert_eq!(path[0].line_id(), &line_id("P"));
            assert!(!path[0].is_reverse());
        }
    }

    #[test]
    fn unknown_stop() {
        let graph = network();
        assert_eq!(
            search(&graph, "Z", "D", &HashSet::new()).unwrap_err(),
            SearchError::StopNotInGraph(id("Z"))
        );
        assert_eq!(
            search(&graph, "A", "Z", &HashSet::new()).unwrap_err(),
            SearchError::StopNotInGraph(id("Z"))
        );
    }

    #[test]
    fn same_stop_has_no_path() {
        let graph = network();
        assert!(matches!(
            search(&graph, "A", "A", &HashSet::new()),
            Err(SearchError::NoPath { .. })
        ));
    }

    #[test]
    fn disconnected_stops() {
        let island = line(
            "U",
            None,
            vec![stop("X", 43.2, 5.9, &[]), stop("Y", 43.201, 5.9, &[])],
        );
        let main = line(
            "87",
            None,
            vec![stop("A", 43.1, 5.88, &[]), stop("B", 43.101, 5.88, &[])],
        );
        let graph = build_graph(&[Arc::new(island), Arc::new(main)]);
        assert!(matches!(
            search(&graph, "A", "Y", &HashSet::new()),
            Err(SearchError::NoPath { .. })
        ));
    }

    #[test]
    fn iteration_limit() {
        let graph = network();
        let excluded = HashSet::new();
        let mut params = SearchParams::from_config(&PlannerConfig::default(), &excluded);
        params.max_iterations = 1;
        assert_eq!(
            find_path(&graph, &id("A"), &id("D"), &params).unwrap_err(),
            SearchError::IterationLimit(1)
        );
    }

    #[test]
    fn transfer_penalty_prefers_staying_on_line() {
        // 87 A-B-C (2 + 2), 19 B-C (1). Switching at B saves a minute
        // but the transfer penalty outweighs it.
        let l87 = line(
            "87",
            Some("OUTWARD"),
            vec![
                stop("A", 43.100, 5.880, &["07:00"]),
                stop("B", 43.101, 5.881, &["07:02"]),
                stop("C", 43.102, 5.882, &["07:04"]),
            ],
        );
        let l19 = line(
            "19",
            Some("OUTWARD"),
            vec![
                stop("B", 43.101, 5.881, &["07:10"]),
                stop("C", 43.102, 5.882, &["07:11"]),
            ],
        );
        let graph = build_graph(&[Arc::new(l87), Arc::new(l19)]);
        let path = search(&graph, "A", "C", &HashSet::new()).unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(path[0].line_id(), &line_id("87"));
    }

    #[test]
    fn merge_keeps_line_changes() {
        let graph = network();
        let edge = |from: &str, to: &str| {
            graph
                .edges_from(&id(from))
                .iter()
                .find(|e| e.to == id(to))
                .unwrap()
                .clone()
        };
        let (ab, bc, ae) = (edge("A", "B"), edge("B", "C"), edge("A", "E"));

        let merged = merge_consecutive(vec![ab.clone(), bc.clone()]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].distance_m, ab.distance_m + bc.distance_m);

        let mixed = merge_consecutive(vec![ae, ab, bc]);
        assert_eq!(mixed.len(), 2);
        assert!(merge_consecutive(vec![]).is_empty());
    }

    #[test]
    fn heap_pops_cheapest_then_oldest() {
        let (a, b, c) = (id("A"), id("B"), id("C"));
        let mut heap = BinaryHeap::new();
        heap.push(Frontier { cost: 5, seq: 0, stop: &a });
        heap.push(Frontier { cost: 3, seq: 1, stop: &b });
        heap.push(Frontier { cost: 3, seq: 2, stop: &c });

        assert_eq!(heap.pop().unwrap().stop, &b);
        assert_eq!(heap.pop().unwrap().stop, &c);
        assert_eq!(heap.pop().unwrap().stop, &a);
    }
}
