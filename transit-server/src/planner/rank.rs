//! Itinerary ranking for route results.
//!
//! Orders itineraries best-first by composite score and prunes options that
//! break the request's limits or repeat a better option's rides.

use std::collections::HashSet;

use crate::domain::{ClockTime, Itinerary, MINUTES_PER_DAY};

/// Rank itineraries by score, lowest first.
///
/// Equal scores fall back to earlier arrival.
pub fn rank_itineraries(mut itineraries: Vec<Itinerary>) -> Vec<Itinerary> {
    itineraries.sort_by(|a, b| {
        a.score()
            .total_cmp(&b.score())
            .then_with(|| a.arrival().cmp(&b.arrival()))
    });
    itineraries
}

/// Keep one itinerary per ride signature.
///
/// Expects ranked input, so the first of each signature is the best one.
pub fn deduplicate(itineraries: Vec<Itinerary>) -> Vec<Itinerary> {
    let mut seen = HashSet::new();
    itineraries
        .into_iter()
        .filter(|it| seen.insert(it.ride_signature()))
        .collect()
}

/// Drop itineraries with more transfers than allowed.
pub fn within_transfers(itineraries: Vec<Itinerary>, max_transfers: u32) -> Vec<Itinerary> {
    itineraries
        .into_iter()
        .filter(|it| it.transfers() <= max_transfers)
        .collect()
}

/// Drop itineraries arriving after `arrival_by`.
///
/// The limit is a time of day, so it is compared on the itinerary's own
/// service day.
pub fn arriving_by(itineraries: Vec<Itinerary>, arrival_by: ClockTime) -> Vec<Itinerary> {
    itineraries
        .into_iter()
        .filter(|it| {
            let arrival = it.arrival().as_minutes();
            let day_start = (it.departure().as_minutes() / MINUTES_PER_DAY) * MINUTES_PER_DAY;
            arrival <= day_start + arrival_by.as_minutes()
        })
        .collect()
}

/// Rank, deduplicate and keep the best `limit`.
pub fn select_best(itineraries: Vec<Itinerary>, limit: usize) -> Vec<Itinerary> {
    let mut best = deduplicate(rank_itineraries(itineraries));
    best.truncate(limit);
    best
}
