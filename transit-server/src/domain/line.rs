//! Validated schedule records.
//!
//! A [`LineRecord`] is one directional timetable. Each [`LineStop`] carries
//! one column of departure times; index `i` of every column describes the
//! same vehicle run.

use super::{ClockTime, GeoPoint, LineId, StopId};

/// Direction tag used by the corpus for the documented outward run.
pub const OUTWARD: &str = "OUTWARD";

/// Tag of a synthetic reverse hop on an outward line.
pub const INWARD_VIRTUAL: &str = "INWARD_VIRTUAL";

/// Tag of a synthetic reverse hop on any other line.
pub const OUTWARD_VIRTUAL: &str = "OUTWARD_VIRTUAL";

/// One stop position within a line's timetable.
#[derive(Debug, Clone, PartialEq)]
pub struct LineStop {
    /// `None` when the corpus gave no usable id for this position.
    pub stop_id: Option<StopId>,
    pub name: String,
    pub city: String,
    /// `None` when coordinates were missing or unparseable.
    pub location: Option<GeoPoint>,
    pub accessible: bool,
    /// Departure times, one per trip. Unparseable entries are `None`.
    pub times: Vec<Option<ClockTime>>,
}

impl LineStop {
    /// Departure of a given trip, if present.
    pub fn time_at(&self, trip: usize) -> Option<ClockTime> {
        self.times.get(trip).copied().flatten()
    }
}

/// Id and display name of a line, for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSummary {
    pub id: LineId,
    pub name: String,
    pub direction: Option<String>,
}

/// One directional timetable for one bus route.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRecord {
    pub id: LineId,
    /// Display name; falls back to the id when the corpus has none.
    pub name: String,
    pub direction: Option<String>,
    /// Operator-side line reference (`lineId` in the corpus).
    pub line_ref: Option<String>,
    pub stops: Vec<LineStop>,
    pub notes: Vec<String>,
}

impl LineRecord {
    /// Tag applied to hops travelled in the documented direction.
    pub fn direction_tag(&self) -> Option<&str> {
        self.direction.as_deref()
    }

    /// Tag applied to synthetic hops against the documented direction.
    ///
    /// ```
    /// use transit_server::domain::{LineId, LineRecord};
    ///
    /// let mut line = LineRecord {
    ///     id: LineId::parse("87").unwrap(),
    ///     name: "87".into(),
    ///     direction: Some("OUTWARD".into()),
    ///     line_ref: None,
    ///     stops: vec![],
    ///     notes: vec![],
    /// };
    /// assert_eq!(line.reverse_direction_tag(), "INWARD_VIRTUAL");
    ///
    /// line.direction = Some("INWARD".into());
    /// assert_eq!(line.reverse_direction_tag(), "OUTWARD_VIRTUAL");
    /// ```
    pub fn reverse_direction_tag(&self) -> &'static str {
        if self.direction.as_deref() == Some(OUTWARD) {
            INWARD_VIRTUAL
        } else {
            OUTWARD_VIRTUAL
        }
    }

    /// Number of trips usable across every stop of the line.
    ///
    /// This is the shortest time column; longer columns have unaligned tails.
    pub fn trip_count(&self) -> usize {
        self.stops.iter().map(|s| s.times.len()).min().unwrap_or(0)
    }

    /// Whether every stop lists the same number of trips.
    pub fn is_aligned(&self) -> bool {
        let mut lens = self.stops.iter().map(|s| s.times.len());
        match lens.next() {
            Some(first) => lens.all(|len| len == first),
            None => true,
        }
    }

    /// Position of the first stop with the given id.
    pub fn position_of(&self, stop_id: &StopId) -> Option<usize> {
        self.stops
            .iter()
            .position(|s| s.stop_id.as_ref() == Some(stop_id))
    }

    pub fn summary(&self) -> LineSummary {
        LineSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            direction: self.direction.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(id: &str, times: &[&str]) -> LineStop {
        LineStop {
            stop_id: Some(StopId::parse(id).unwrap()),
            name: id.to_string(),
            city: "La Seyne".to_string(),
            location: None,
            accessible: false,
            times: times.iter().map(|t| ClockTime::parse_hhmm(t).ok()).collect(),
        }
    }

    fn line(stops: Vec<LineStop>) -> LineRecord {
        LineRecord {
            id: LineId::parse("87").unwrap(),
            name: "87".to_string(),
            direction: Some(OUTWARD.to_string()),
            line_ref: None,
            stops,
            notes: vec![],
        }
    }

    #[test]
    fn trip_count_uses_shortest_column() {
        let l = line(vec![
            stop("A", &["07:00", "07:30", "08:00"]),
            stop("B", &["07:02", "07:32"]),
        ]);
        assert_eq!(l.trip_count(), 2);
        assert!(!l.is_aligned());
    }

    #[test]
    fn empty_line_has_no_trips() {
        let l = line(vec![]);
        assert_eq!(l.trip_count(), 0);
        assert!(l.is_aligned());
    }

    #[test]
    fn time_at_skips_gaps() {
        let s = stop("A", &["07:00", "--", "08:00"]);
        assert_eq!(s.time_at(0), ClockTime::parse_hhmm("07:00").ok());
        assert_eq!(s.time_at(1), None);
        assert_eq!(s.time_at(9), None);
    }

    #[test]
    fn position_lookup() {
        let l = line(vec![stop("A", &[]), stop("B", &[]), stop("C", &[])]);
        let b = StopId::parse("B").unwrap();
        let z = StopId::parse("Z").unwrap();
        assert_eq!(l.position_of(&b), Some(1));
        assert_eq!(l.position_of(&z), None);
    }

    #[test]
    fn missing_direction_reverses_to_outward_virtual() {
        let mut l = line(vec![]);
        l.direction = None;
        assert_eq!(l.direction_tag(), None);
        assert_eq!(l.reverse_direction_tag(), OUTWARD_VIRTUAL);
    }
}
