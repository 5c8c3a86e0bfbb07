//! Matching a ride against a line's published trips.

use crate::domain::{ClockTime, LineRecord, MINUTES_PER_DAY};

/// Longest plausible ride between two stops of one trip, in minutes.
pub const MAX_RIDE_MIN: u32 = 180;

/// A concrete trip for a ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripMatch {
    /// Trip index into the line's time columns.
    pub trip: usize,
    pub departure: ClockTime,
    pub arrival: ClockTime,
    pub duration_min: u32,
}

/// Earliest trip of `line` leaving stop `from_index` no earlier than
/// `not_before` and reaching stop `to_index` within [`MAX_RIDE_MIN`].
///
/// Only rides in timetable order can match. When every trip has already left,
/// the first trip of the next day is used. Returned times are on the same
/// continuous clock as `not_before`, so they may exceed 24:00.
pub fn match_trip(
    line: &LineRecord,
    from_index: usize,
    to_index: usize,
    not_before: ClockTime,
) -> Option<TripMatch> {
    if from_index >= to_index {
        return None;
    }
    let from = line.stops.get(from_index)?;
    let to = line.stops.get(to_index)?;

    // (trip, departure minutes within its service day, ride duration)
    let candidates: Vec<(usize, u32, u32)> = (0..line.trip_count())
        .filter_map(|trip| {
            let departure = from.time_at(trip)?;
            let arrival = to.time_at(trip)?;
            let duration = departure.minutes_until(arrival);
            (1..=MAX_RIDE_MIN)
                .contains(&duration)
                .then_some((trip, departure.as_minutes(), duration))
        })
        .collect();

    let day_start = (not_before.as_minutes() / MINUTES_PER_DAY) * MINUTES_PER_DAY;

    let same_day = candidates
        .iter()
        .map(|&(trip, dep, duration)| (trip, day_start + dep, duration))
        .filter(|&(_, dep, _)| dep >= not_before.as_minutes())
        .min_by_key(|&(_, dep, _)| dep);

    let (trip, departure, duration_min) = match same_day {
        Some(found) => found,
        None => candidates
            .iter()
            .map(|&(trip, dep, duration)| (trip, day_start + MINUTES_PER_DAY + dep, duration))
            .min_by_key(|&(_, dep, _)| dep)?,
    };

    let departure = ClockTime::from_minutes(departure);
    Some(TripMatch {
        trip,
        departure,
        arrival: departure.add_minutes(duration_min),
        duration_min,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_support::{line, stop};

    fn t(s: &str) -> ClockTime {
        ClockTime::parse_hhmm(s).unwrap()
    }

    fn line_87() -> LineRecord {
        line(
            "87",
            Some("OUTWARD"),
            vec![
                stop("A", 43.100, 5.880, &["07:00", "07:30", "08:00"]),
                stop("B", 43.101, 5.881, &["07:02", "07:32", "08:02"]),
                stop("C", 43.102, 5.882, &["07:05", "07:36", "08:05"]),
            ],
        )
    }

    #[test]
    fn earliest_trip_at_or_after() {
        let m = match_trip(&line_87(), 0, 2, t("07:10")).unwrap();
        assert_eq!(m.trip, 1);
        assert_eq!(m.departure, t("07:30"));
        assert_eq!(m.arrival, t("07:36"));
        assert_eq!(m.duration_min, 6);

        let exact = match_trip(&line_87(), 0, 2, t("07:00")).unwrap();
        assert_eq!(exact.trip, 0);
    }

    #[test]
    fn rolls_to_next_day() {
        let m = match_trip(&line_87(), 1, 2, t("22:00")).unwrap();
        assert_eq!(m.trip, 0);
        assert_eq!(m.departure.as_minutes(), MINUTES_PER_DAY + 7 * 60 + 2);
        assert!(m.departure.is_next_day());
        assert_eq!(m.departure.to_string(), "07:02");
        assert_eq!(m.duration_min, 3);
    }

    #[test]
    fn mixed_midnight_notation() {
        let l = line(
            "N1",
            None,
            vec![
                stop("A", 43.100, 5.880, &["30:00", "23:50"]),
                stop("B", 43.101, 5.881, &["01:00", "24:05"]),
            ],
        );
        // The first trip's 19 hour gap is not a ride
        let m = match_trip(&l, 0, 1, t("06:00")).unwrap();
        assert_eq!(m.trip, 1);
        assert_eq!(m.departure, t("23:50"));
        assert_eq!(m.duration_min, 15);
    }

    #[test]
    fn reverse_rides_do_not_match() {
        assert!(match_trip(&line_87(), 2, 0, t("07:00")).is_none());
        assert!(match_trip(&line_87(), 1, 1, t("07:00")).is_none());
    }

    #[test]
    fn out_of_range_indices() {
        assert!(match_trip(&line_87(), 0, 9, t("07:00")).is_none());
    }

    #[test]
    fn skips_gaps_and_implausible_trips() {
        let l = line(
            "19",
            None,
            vec![
                stop("A", 43.100, 5.880, &["07:00", "07:20", "07:40"]),
                // no time for trip 0, trip 1 is a misaligned 4 hour ride
                stop("B", 43.101, 5.881, &["", "11:20", "07:50"]),
            ],
        );
        let m = match_trip(&l, 0, 1, t("06:00")).unwrap();
        assert_eq!(m.trip, 2);
        assert_eq!(m.duration_min, 10);
    }

    #[test]
    fn ride_across_midnight() {
        let l = line(
            "U",
            None,
            vec![
                stop("A", 43.100, 5.880, &["23:55"]),
                stop("B", 43.101, 5.881, &["00:10"]),
            ],
        );
        let m = match_trip(&l, 0, 1, t("23:00")).unwrap();
        assert_eq!(m.duration_min, 15);
        assert_eq!(m.arrival.as_minutes(), MINUTES_PER_DAY + 10);
    }

    #[test]
    fn continuous_clock_past_midnight() {
        // Already on day two after an earlier rollover
        let m = match_trip(&line_87(), 0, 1, t("31:10")).unwrap();
        assert_eq!(m.departure.as_minutes(), MINUTES_PER_DAY + 7 * 60 + 30);
    }

    #[test]
    fn no_trips() {
        let l = line(
            "U",
            None,
            vec![stop("A", 43.100, 5.880, &[]), stop("B", 43.101, 5.881, &[])],
        );
        assert!(match_trip(&l, 0, 1, t("07:00")).is_none());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::graph::test_support::{line, stop};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn match_is_never_before_request(
            deps in prop::collection::vec(0u32..1440, 1..12),
            ride in 1u32..60,
            request in 0u32..1440,
        ) {
            let fmt = |m: u32| format!("{:02}:{:02}", (m / 60) % 24, m % 60);
            let from: Vec<String> = deps.iter().map(|&d| fmt(d)).collect();
            let to: Vec<String> = deps.iter().map(|&d| fmt(d + ride)).collect();
            let from: Vec<&str> = from.iter().map(String::as_str).collect();
            let to: Vec<&str> = to.iter().map(String::as_str).collect();

            let l = line(
                "87",
                None,
                vec![stop("A", 43.1, 5.88, &from), stop("B", 43.101, 5.88, &to)],
            );
            let not_before = ClockTime::from_minutes(request);
            let m = match_trip(&l, 0, 1, not_before).unwrap();

            prop_assert!(m.departure >= not_before);
            prop_assert!(m.departure.as_minutes() < request + 2 * MINUTES_PER_DAY);
            prop_assert_eq!(m.duration_min, ride);
            prop_assert_eq!(m.departure.minutes_until(m.arrival), ride);
        }
    }
}
