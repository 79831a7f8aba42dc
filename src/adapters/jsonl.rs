//! JSON Lines Record Source
//!
//! Implements the `RecordSource` port over two newline-delimited JSON exports
//! of the measurement store: one row per query attempt and one row per
//! correctness check.
//!
//! A row's `timestamp` decides whether it belongs to the window. Its sampling
//! instant is the measurement run named by the record id, so every query of
//! one run lands in the same time bucket however the queries were spread over
//! the run.
//!
//! ```text
//! {"record_id":"202402011200-vp01-17","operator":"a","internet":"v4","transport":"udp",
//!  "elapsed_time":0.021,"timed_out":false,"published_serial":2024020101,
//!  "timestamp":"2024-02-01T12:00:00Z"}
//! {"record_id":"202402011200-vp01-18","operator":"a","is_correct":true}
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::domain::ports::RecordSource;
use crate::domain::{
    CorrectnessRecord, NetworkFamily, Operator, Pair, QueryAttemptRecord, RecordId, Transport,
};
use crate::error::{Error, Result};
use crate::schedule::ReportWindow;

// =============================================================================
// Row Schemas
// =============================================================================

/// A query-attempt row as exported by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRow {
    pub record_id: String,
    pub operator: String,
    pub internet: String,
    pub transport: String,
    #[serde(default)]
    pub elapsed_time: Option<f64>,
    pub timed_out: bool,
    #[serde(default)]
    pub published_serial: Option<u32>,
    pub timestamp: DateTime<Utc>,
}

impl QueryRow {
    /// Convert to a typed record.
    ///
    /// The vantage point and the sampling instant come from the record id.
    pub fn into_record(self) -> Result<QueryAttemptRecord> {
        let id = RecordId::parse(&self.record_id)?;
        let family: NetworkFamily = self
            .internet
            .parse()
            .map_err(|e: String| Error::malformed(&self.record_id, e))?;
        let transport: Transport = self
            .transport
            .parse()
            .map_err(|e: String| Error::malformed(&self.record_id, e))?;

        Ok(QueryAttemptRecord {
            record_id: self.record_id,
            operator: Operator::new(self.operator),
            vantage_point: id.vantage_point,
            pair: Pair::new(family, transport),
            timestamp: id.taken_at,
            elapsed_time: self.elapsed_time,
            timed_out: self.timed_out,
            published_serial: self.published_serial,
        })
    }
}

/// A correctness row as exported by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectnessRow {
    pub record_id: String,
    pub operator: String,
    pub is_correct: bool,
}

impl CorrectnessRow {
    pub fn into_record(self) -> CorrectnessRecord {
        CorrectnessRecord::new(self.record_id, Operator::new(self.operator), self.is_correct)
    }
}

// =============================================================================
// Source
// =============================================================================

/// Reads records from JSON Lines exports
#[derive(Debug, Clone)]
pub struct JsonLinesSource {
    query_path: PathBuf,
    correctness_path: PathBuf,
}

impl JsonLinesSource {
    pub fn new(query_path: impl Into<PathBuf>, correctness_path: impl Into<PathBuf>) -> Self {
        Self {
            query_path: query_path.into(),
            correctness_path: correctness_path.into(),
        }
    }

    pub fn query_path(&self) -> &Path {
        &self.query_path
    }

    pub fn correctness_path(&self) -> &Path {
        &self.correctness_path
    }
}

impl RecordSource for JsonLinesSource {
    #[instrument(skip(self), fields(path = %self.query_path.display()))]
    fn query_records(&self, window: &ReportWindow) -> Result<Vec<QueryAttemptRecord>> {
        let mut records = Vec::new();
        let mut skipped = 0usize;

        for row in read_rows::<QueryRow>(&self.query_path)? {
            if !window.contains(row.timestamp) {
                skipped += 1;
                continue;
            }
            records.push(row.into_record()?);
        }

        // Stable, so queries of one measurement run keep file order
        records.sort_by_key(|r| r.timestamp);

        info!(records = records.len(), skipped, "Loaded query-attempt records");
        Ok(records)
    }

    #[instrument(skip(self), fields(path = %self.correctness_path.display()))]
    fn correctness_records(&self, window: &ReportWindow) -> Result<Vec<CorrectnessRecord>> {
        let mut records = Vec::new();
        let mut skipped = 0usize;

        for row in read_rows::<CorrectnessRow>(&self.correctness_path)? {
            let id = RecordId::parse(&row.record_id)?;
            if !window.contains(id.taken_at) {
                skipped += 1;
                continue;
            }
            records.push(row.into_record());
        }

        info!(records = records.len(), skipped, "Loaded correctness records");
        Ok(records)
    }
}

/// Parse every non-blank line of `path` as one `T`
fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let reader = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row = serde_json::from_str(line).map_err(|e| {
            Error::malformed(format!("{}:{}", path.display(), number + 1), e.to_string())
        })?;
        rows.push(row);
    }

    debug!(path = %path.display(), rows = rows.len(), "Read JSON lines");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    fn window() -> ReportWindow {
        ReportWindow::monthly(
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap(),
        )
    }

    fn scratch(name: &str, lines: &[&str]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rssac047-jsonl-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    // =========================================================================
    // Row Conversion
    // =========================================================================

    #[test]
    fn test_query_row_conversion() {
        let row: QueryRow = serde_json::from_str(
            r#"{"record_id":"202402011200-vp07-3","operator":"K","internet":"v6","transport":"tcp",
                "elapsed_time":0.031,"timed_out":false,"published_serial":2024020101,
                "timestamp":"2024-02-01T12:00:05Z"}"#,
        )
        .unwrap();
        let rec = row.into_record().unwrap();

        assert_eq!(rec.operator.as_str(), "k");
        assert_eq!(rec.vantage_point.as_str(), "vp07");
        assert_eq!(rec.timestamp, Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap());
        assert_eq!(rec.pair, Pair::V6Tcp);
        assert_eq!(rec.elapsed_time, Some(0.031));
        assert_eq!(rec.published_serial, Some(2024020101));
    }

    #[test]
    fn test_timeout_row_without_optional_fields() {
        let row: QueryRow = serde_json::from_str(
            r#"{"record_id":"202402011200-vp07-3","operator":"a","internet":"v4","transport":"udp",
                "timed_out":true,"timestamp":"2024-02-01T12:00:05Z"}"#,
        )
        .unwrap();
        let rec = row.into_record().unwrap();
        assert!(rec.timed_out);
        assert_eq!(rec.elapsed_time, None);
    }

    #[test]
    fn test_unknown_transport_is_malformed() {
        let row = QueryRow {
            record_id: "202402011200-vp07-3".into(),
            operator: "a".into(),
            internet: "v4".into(),
            transport: "quic".into(),
            elapsed_time: Some(0.01),
            timed_out: false,
            published_serial: None,
            timestamp: Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap(),
        };
        assert!(matches!(row.into_record(), Err(Error::MalformedRecord { .. })));
    }

    // =========================================================================
    // Source
    // =========================================================================

    #[test]
    fn test_source_filters_and_sorts() {
        let query = scratch(
            "query.jsonl",
            &[
                r#"{"record_id":"202402011201-vp1-2","operator":"a","internet":"v4","transport":"udp","elapsed_time":0.02,"timed_out":false,"timestamp":"2024-02-01T12:01:00Z"}"#,
                "",
                r#"{"record_id":"202402011200-vp1-1","operator":"a","internet":"v4","transport":"udp","elapsed_time":0.02,"timed_out":false,"timestamp":"2024-02-01T12:00:00Z"}"#,
                r#"{"record_id":"202403010000-vp1-3","operator":"a","internet":"v4","transport":"udp","timed_out":true,"timestamp":"2024-03-01T00:00:00Z"}"#,
            ],
        );
        let correctness = scratch(
            "correctness.jsonl",
            &[
                r#"{"record_id":"202402011200-vp1-4","operator":"a","is_correct":true}"#,
                r#"{"record_id":"202401311200-vp1-5","operator":"a","is_correct":false}"#,
            ],
        );

        let source = JsonLinesSource::new(&query, &correctness);
        let records = source.query_records(&window()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].record_id, "202402011200-vp1-1");

        let checks = source.correctness_records(&window()).unwrap();
        assert_eq!(checks.len(), 1);
        assert!(checks[0].is_correct);
    }

    #[test]
    fn test_queries_of_one_run_share_an_instant() {
        let query = scratch(
            "staggered.jsonl",
            &[
                r#"{"record_id":"202402011200-vp1-1","operator":"a","internet":"v4","transport":"udp","elapsed_time":0.02,"timed_out":false,"timestamp":"2024-02-01T12:00:41Z"}"#,
                r#"{"record_id":"202402011200-vp1-2","operator":"b","internet":"v4","transport":"udp","elapsed_time":0.02,"timed_out":false,"timestamp":"2024-02-01T12:00:03Z"}"#,
                r#"{"record_id":"202402011201-vp1-3","operator":"a","internet":"v4","transport":"udp","elapsed_time":0.02,"timed_out":false,"timestamp":"2024-02-01T12:01:02Z"}"#,
            ],
        );
        let source = JsonLinesSource::new(&query, &query);
        let records = source.query_records(&window()).unwrap();

        let run = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
        assert_eq!(records[0].timestamp, run);
        assert_eq!(records[1].timestamp, run);
        assert_eq!(records[0].operator.as_str(), "a");
        assert_eq!(records[2].timestamp, run + chrono::Duration::minutes(1));
    }

    #[test]
    fn test_bad_line_reports_position() {
        let query = scratch("bad.jsonl", &["{not json"]);
        let source = JsonLinesSource::new(&query, &query);

        match source.query_records(&window()) {
            Err(Error::MalformedRecord { record_id, .. }) => assert!(record_id.ends_with(":1")),
            other => panic!("expected malformed record, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = JsonLinesSource::new("/nonexistent/q.jsonl", "/nonexistent/c.jsonl");
        assert!(matches!(source.query_records(&window()), Err(Error::Io(_))));
    }
}
