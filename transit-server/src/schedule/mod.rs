//! Schedule corpus loading and lookups.
//!
//! The corpus is the directory of per-line timetable files. [`ScheduleStore`]
//! answers stop and line queries over it, caching parsed records with a TTL.

mod corpus;
mod error;
mod store;

pub use corpus::{RawCoordinate, RawLine, RawStop, SCHEDULE_FILE_SUFFIX, ScheduleCorpus, parse_line};
pub use error::{ConversionError, ScheduleError};
pub use store::{CorpusStats, LinesEntry, ScheduleStore, StopsEntry};
