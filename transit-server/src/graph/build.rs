//! Graph construction from line records.
//!
//! Every adjacent stop pair of every line becomes two edges: one in the
//! timetable's direction and one synthetic reverse edge carrying the same
//! cost, so that search can still ride a line backwards at a penalty.

use std::sync::Arc;

use tracing::info;

use crate::domain::{LineRecord, LineStop, haversine_m};

use super::edge::{Direction, Edge, Graph};

/// Hop duration used when a stop pair has no usable samples.
pub const DEFAULT_HOP_MIN: u32 = 5;

/// Samples at or above this many minutes are treated as misaligned.
pub const MAX_SAMPLED_HOP_MIN: u32 = 120;

/// Mean scheduled minutes between two consecutive stops of a line.
///
/// Samples come from aligned trip indices. A clock that goes backwards is
/// taken to cross midnight. Samples outside `1..120` are discarded; with no
/// samples left the result is [`DEFAULT_HOP_MIN`].
pub fn average_hop_duration(from: &LineStop, to: &LineStop) -> u32 {
    let trips = from.times.len().min(to.times.len());
    let samples: Vec<u32> = (0..trips)
        .filter_map(|i| {
            let departure = from.time_at(i)?;
            let arrival = to.time_at(i)?;
            let minutes = departure.minutes_until(arrival);
            (minutes > 0 && minutes < MAX_SAMPLED_HOP_MIN).then_some(minutes)
        })
        .collect();

    if samples.is_empty() {
        return DEFAULT_HOP_MIN;
    }

    let total: u32 = samples.iter().sum();
    (f64::from(total) / samples.len() as f64).round() as u32
}

/// Build the routing graph.
///
/// Stop pairs missing an id or coordinates on either side are skipped.
pub fn build_graph(lines: &[Arc<LineRecord>]) -> Graph {
    let mut graph = Graph::new();

    for line in lines {
        for (i, pair) in line.stops.windows(2).enumerate() {
            let (from, to) = (&pair[0], &pair[1]);
            let (Some(from_id), Some(to_id)) = (&from.stop_id, &to.stop_id) else {
                continue;
            };
            let (Some(from_loc), Some(to_loc)) = (from.location, to.location) else {
                continue;
            };

            let distance_m = haversine_m(from_loc, to_loc);
            let duration_min = average_hop_duration(from, to);

            graph.add_edge(Edge {
                from: from_id.clone(),
                to: to_id.clone(),
                line: Arc::clone(line),
                direction: Direction::Scheduled,
                duration_min,
                distance_m,
                stop_count: 1,
                from_index: i,
                to_index: i + 1,
            });
            graph.add_edge(Edge {
                from: to_id.clone(),
                to: from_id.clone(),
                line: Arc::clone(line),
                direction: Direction::Reverse,
                duration_min,
                distance_m,
                stop_count: 1,
                from_index: i + 1,
                to_index: i,
            });
        }
    }

    info!(
        stops = graph.stop_count(),
        edges = graph.edge_count(),
        lines = lines.len(),
        "Built transport graph"
    );
    graph
}



#[cfg(test)]
mod proptests {
    use super::test_support::{line, stop};
    use super::*;
    use proptest::prelude::*;

    fn line_strategy() -> impl Strategy<Value = Vec<bool>> {
        prop::collection::vec(prop::bool::weighted(0.8), 0..12)
    }

    proptest! {
        #[test]
        fn edge_count_is_twice_complete_pairs(lines in prop::collection::vec(line_strategy(), 1..5)) {
            let mut records = Vec::new();
            let mut expected_pairs = 0;

            for (n, ids) in lines.iter().enumerate() {
                let stops: Vec<_> = ids
                    .iter()
                    .enumerate()
                    .map(|(i, has_id)| {
                        let mut s = stop(&format!("L{n}S{i}"), 43.0 + i as f64 * 0.001, 5.88, &[]);
                        if !has_id {
                            s.stop_id = None;
                        }
                        s
                    })
                    .collect();
                expected_pairs += ids.windows(2).filter(|w| w[0] && w[1]).count();
                records.push(Arc::new(line(&format!("{n}"), Some("OUTWARD"), stops)));
            }

            let graph = build_graph(&records);
            prop_assert_eq!(graph.edge_count(), 2 * expected_pairs);
        }

        #[test]
        fn hop_duration_is_plausible(
            deps in prop::collection::vec(0u32..1440, 0..20),
            gaps in prop::collection::vec(0u32..300, 0..20),
        ) {
            let fmt = |m: u32| format!("{:02}:{:02}", (m / 60) % 24, m % 60);
            let from_times: Vec<String> = deps.iter().map(|&d| fmt(d)).collect();
            let to_times: Vec<String> = deps.iter().zip(&gaps).map(|(&d, &g)| fmt(d + g)).collect();
            let from_refs: Vec<&str> = from_times.iter().map(String::as_str).collect();
            let to_refs: Vec<&str> = to_times.iter().map(String::as_str).collect();

            let a = stop("A", 43.0, 5.88, &from_refs);
            let b = stop("B", 43.001, 5.88, &to_refs);
            let d = average_hop_duration(&a, &b);
            prop_assert!(d >= 1 && d < MAX_SAMPLED_HOP_MIN);
        }
    }
}
