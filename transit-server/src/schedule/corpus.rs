//! Schedule corpus files.
//!
//! The corpus is a directory of `<line>_horaires.json` files, one line
//! record per file, written by the ingestion pipeline. Source data is
//! sparse: coordinates may be strings, numbers or null, and stop ids are
//! sometimes missing. Conversion keeps what is usable and drops the rest at
//! the smallest granularity.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{GeoPoint, LineId, LineRecord, LineStop, StopId, parse_time_column};

use super::error::{ConversionError, ScheduleError};

/// Suffix of every line file in the corpus directory.
pub const SCHEDULE_FILE_SUFFIX: &str = "_horaires.json";

/// A line record as written by the ingestion pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLine {
    #[serde(rename = "bus_id")]
    pub bus_id: String,
    pub line_name: Option<String>,
    pub direction: Option<String>,
    pub line_id: Option<String>,
    #[serde(default)]
    pub stops: Vec<RawStop>,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// One stop entry of a raw line record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStop {
    #[serde(default)]
    pub name: String,
    pub city: Option<String>,
    pub latitude: Option<RawCoordinate>,
    pub longitude: Option<RawCoordinate>,
    pub stop_point_id: Option<String>,
    #[serde(default)]
    pub accessible: bool,
    #[serde(default)]
    pub times: Vec<Option<String>>,
}

/// Coordinates appear both as strings and as numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawCoordinate {
    Number(f64),
    Text(String),
}

impl RawCoordinate {
    fn value(&self) -> Option<f64> {
        match self {
            RawCoordinate::Number(n) => Some(*n),
            RawCoordinate::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl RawStop {
    fn location(&self) -> Option<GeoPoint> {
        let lat = self.latitude.as_ref()?.value()?;
        let lon = self.longitude.as_ref()?.value()?;
        GeoPoint::new(lat, lon).ok()
    }

    fn into_line_stop(self) -> LineStop {
        let location = self.location();
        let stop_id = self
            .stop_point_id
            .as_deref()
            .and_then(|id| StopId::parse(id).ok());
        let times: Vec<&str> = self
            .times
            .iter()
            .map(|t| t.as_deref().unwrap_or(""))
            .collect();

        LineStop {
            stop_id,
            name: self.name.trim().to_string(),
            city: self.city.unwrap_or_default(),
            location,
            accessible: self.accessible,
            times: parse_time_column(&times),
        }
    }
}

/// Convert a raw record into a validated line.
///
/// Fails only when the line has no usable id.
pub fn convert_line(raw: RawLine) -> Result<LineRecord, ConversionError> {
    let id = LineId::parse(&raw.bus_id)?;
    let name = raw
        .line_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| id.as_str().to_string());

    Ok(LineRecord {
        id,
        name,
        direction: raw.direction.filter(|d| !d.trim().is_empty()),
        line_ref: raw.line_id,
        stops: raw.stops.into_iter().map(RawStop::into_line_stop).collect(),
        notes: raw.notes,
    })
}

/// Parse one line file's contents.
pub fn parse_line(json: &str) -> Result<LineRecord, ConversionError> {
    let raw: RawLine = serde_json::from_str(json)?;
    convert_line(raw)
}

/// Handle on the corpus directory.
#[derive(Debug, Clone)]
pub struct ScheduleCorpus {
    dir: PathBuf,
}

impl ScheduleCorpus {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Line files in the corpus, sorted by name.
    pub async fn list_files(&self) -> Result<Vec<PathBuf>, ScheduleError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| ScheduleError::io(&self.dir, e))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ScheduleError::io(&self.dir, e))?
        {
            let path = entry.path();
            let is_schedule = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(SCHEDULE_FILE_SUFFIX));
            if is_schedule {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Read and parse a single line file.
    pub async fn load_file(&self, path: &Path) -> Result<LineRecord, ScheduleError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ScheduleError::io(path, e))?;
        parse_line(&contents).map_err(|source| ScheduleError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load every line file in the corpus.
    ///
    /// Files that cannot be read or parsed are skipped with a warning. Only
    /// an unreadable directory is an error.
    pub async fn load_lines(&self) -> Result<Vec<LineRecord>, ScheduleError> {
        let files = self.list_files().await?;
        let mut lines = Vec::with_capacity(files.len());

        for path in &files {
            match self.load_file(path).await {
                Ok(line) => {
                    if !line.is_aligned() {
                        warn!(
                            line = %line.id,
                            usable_trips = line.trip_count(),
                            "Time columns have different lengths; extra trips ignored"
                        );
                    }
                    lines.push(line);
                }
                Err(e) => {
                    warn!(error = %e, "Skipping schedule file");
                }
            }
        }

        debug!(
            dir = %self.dir.display(),
            files = files.len(),
            lines = lines.len(),
            "Loaded schedule corpus"
        );
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE_87: &str = r#"{
        "bus_id": "87",
        "lineName": "Ligne 87",
        "direction": "OUTWARD",
        "lineId": "MISTRAL:87",
        "stops": [
            {
                "name": "Seyne Centre",
                "city": "La Seyne-sur-Mer",
                "latitude": "43.10121",
                "longitude": "5.8834",
                "stopPointId": "MISTRAL:SECENN",
                "accessible": true,
                "times": ["07:00", "07:30"]
            },
            {
                "name": "Lycée Beaussier",
                "city": "La Seyne-sur-Mer",
                "latitude": 43.09914,
                "longitude": 5.87973,
                "stopPointId": "MISTRAL:SELBEO",
                "accessible": false,
                "times": ["07:04", null]
            }
        ],
        "notes": ["Ne circule pas le dimanche"]
    }"#;

    #[test]
    fn parse_full_record() {
        let line = parse_line(LINE_87).unwrap();
        assert_eq!(line.id.as_str(), "87");
        assert_eq!(line.name, "Ligne 87");
        assert_eq!(line.direction.as_deref(), Some("OUTWARD"));
        assert_eq!(line.line_ref.as_deref(), Some("MISTRAL:87"));
        assert_eq!(line.stops.len(), 2);
        assert_eq!(line.notes.len(), 1);

        let first = &line.stops[0];
        assert_eq!(first.stop_id.as_ref().unwrap().as_str(), "MISTRAL:SECENN");
        assert!(first.location.is_some());
        assert!(first.accessible);
        assert_eq!(first.times.len(), 2);

        // Numeric coordinates and null times
        let second = &line.stops[1];
        assert!(second.location.is_some());
        assert_eq!(second.times.len(), 2);
        assert!(second.times[1].is_none());
    }

    #[test]
    fn tolerate_missing_fields() {
        let json = r#"{
            "bus_id": "19",
            "lineName": null,
            "direction": null,
            "stops": [
                {"name": "Nowhere", "city": null, "latitude": null, "longitude": "5.8",
                 "stopPointId": null, "accessible": false, "times": ["bad", "08:00"]},
                {"name": "Somewhere", "latitude": "north", "longitude": "5.8",
                 "stopPointId": "  ", "times": []}
            ]
        }"#;

        let line = parse_line(json).unwrap();
        assert_eq!(line.name, "19");
        assert!(line.direction.is_none());
        assert!(line.notes.is_empty());

        let first = &line.stops[0];
        assert!(first.stop_id.is_none());
        assert!(first.location.is_none());
        assert_eq!(first.city, "");
        assert_eq!(first.times.len(), 2);
        assert!(first.times[0].is_none());
        assert!(first.times[1].is_some());

        let second = &line.stops[1];
        assert!(second.stop_id.is_none());
        assert!(second.location.is_none());
    }

    #[test]
    fn reject_blank_line_id() {
        assert!(matches!(
            parse_line(r#"{"bus_id": " ", "stops": []}"#),
            Err(ConversionError::InvalidLineId(_))
        ));
        assert!(matches!(parse_line("not json"), Err(ConversionError::Json(_))));
    }

    #[tokio::test]
    async fn load_directory_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("87_horaires.json"), LINE_87).unwrap();
        std::fs::write(dir.path().join("99_horaires.json"), "{ broken").unwrap();
        std::fs::write(dir.path().join("README.md"), "not a line").unwrap();

        let corpus = ScheduleCorpus::new(dir.path());
        let files = corpus.list_files().await.unwrap();
        assert_eq!(files.len(), 2);

        let lines = corpus.load_lines().await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].id.as_str(), "87");
    }

    #[tokio::test]
    async fn missing_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = ScheduleCorpus::new(dir.path().join("missing"));
        let err = corpus.load_lines().await.unwrap_err();
        assert!(matches!(err, ScheduleError::Io { .. }));
    }

    #[tokio::test]
    async fn load_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1_horaires.json");
        std::fs::write(&path, "[]").unwrap();

        let corpus = ScheduleCorpus::new(dir.path());
        let err = corpus.load_file(&path).await.unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::Parse {
                source: ConversionError::Json(_),
                ..
            }
        ));
    }
}
