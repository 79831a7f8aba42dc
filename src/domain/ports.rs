//! Domain Ports
//!
//! Abstractions over where observation records come from. The engine itself
//! never performs I/O; adapters implementing these traits sit at the boundary.
//!
//! ```text
//! ┌──────────────────────┐     ┌──────────────────────┐     ┌──────────────┐
//! │  RecordSource (port) │ ──▶ │  Engine (pure core)  │ ──▶ │  Formatters  │
//! │  JsonLinesSource     │     │  index → collators   │     │  text/json/  │
//! │  (adapter)           │     │  → thresholds        │     │  prometheus  │
//! └──────────────────────┘     └──────────────────────┘     └──────────────┘
//! ```

use super::record::{CorrectnessRecord, QueryAttemptRecord, RecordId};
use crate::error::Result;
use crate::schedule::ReportWindow;

/// Port for acquiring the records of one reporting window.
///
/// Implementations must return query-attempt records sorted ascending by
/// timestamp and only records that fall inside `window`.
pub trait RecordSource {
    /// Query-attempt records inside the window, ascending by timestamp.
    fn query_records(&self, window: &ReportWindow) -> Result<Vec<QueryAttemptRecord>>;

    /// Correctness records inside the window.
    fn correctness_records(&self, window: &ReportWindow) -> Result<Vec<CorrectnessRecord>>;
}

/// In-memory source, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticRecordSource {
    pub query: Vec<QueryAttemptRecord>,
    pub correctness: Vec<CorrectnessRecord>,
}

impl StaticRecordSource {
    pub fn new(query: Vec<QueryAttemptRecord>, correctness: Vec<CorrectnessRecord>) -> Self {
        Self { query, correctness }
    }
}

impl RecordSource for StaticRecordSource {
    fn query_records(&self, window: &ReportWindow) -> Result<Vec<QueryAttemptRecord>> {
        let mut records: Vec<QueryAttemptRecord> = self
            .query
            .iter()
            .filter(|r| window.contains(r.timestamp))
            .cloned()
            .collect();
        records.sort_by_key(|r| r.timestamp);
        Ok(records)
    }

    /// Correctness records carry no timestamp; the record id's date places them
    fn correctness_records(&self, window: &ReportWindow) -> Result<Vec<CorrectnessRecord>> {
        let mut records = Vec::new();
        for rec in &self.correctness {
            if window.contains(RecordId::parse(&rec.record_id)?.taken_at) {
                records.push(rec.clone());
            }
        }
        Ok(records)
    }
}
