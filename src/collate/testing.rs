//! Record builders shared by the collator tests

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::index::GroupingIndex;
use crate::config::{DeploymentConfig, VantagePointRegistry};
use crate::domain::{CorrectnessRecord, Operator, Pair, QueryAttemptRecord, VantagePoint};
use crate::error::Result;

/// Instant `offset` seconds into the test window
pub fn at(offset: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap() + Duration::seconds(offset)
}

/// The 13-operator reference deployment
pub fn config() -> DeploymentConfig {
    DeploymentConfig::default()
}

/// `vp1` .. `vp20`
pub fn registry() -> VantagePointRegistry {
    VantagePointRegistry::from_names((1..=20).map(|i| format!("vp{}", i))).unwrap()
}

fn record_id(op: &str, vp: &str, pair: Pair, offset: i64) -> String {
    format!(
        "{}-{}-{}{}{}",
        at(offset).format("%Y%m%d%H%M"),
        vp,
        op,
        pair.code(),
        offset
    )
}

pub fn answered(
    op: &str,
    vp: &str,
    pair: Pair,
    offset: i64,
    elapsed: f64,
    serial: Option<u32>,
) -> QueryAttemptRecord {
    QueryAttemptRecord::answered(
        record_id(op, vp, pair, offset),
        Operator::new(op),
        VantagePoint::new(vp),
        pair,
        at(offset),
        elapsed,
        serial,
    )
}

pub fn timeout(op: &str, vp: &str, pair: Pair, offset: i64) -> QueryAttemptRecord {
    QueryAttemptRecord::timeout(
        record_id(op, vp, pair, offset),
        Operator::new(op),
        VantagePoint::new(vp),
        pair,
        at(offset),
    )
}

pub fn check(op: &str, is_correct: bool) -> CorrectnessRecord {
    CorrectnessRecord::new(format!("202402010000-vp1-{}", op), Operator::new(op), is_correct)
}

/// Index over the reference deployment
pub fn build(query: &[QueryAttemptRecord], correctness: &[CorrectnessRecord]) -> Result<GroupingIndex> {
    GroupingIndex::build(&config(), &registry(), query, correctness)
}

/// Every operator answers on every pair from `vp` at `offset` with `elapsed`
pub fn full_round(vp: &str, offset: i64, elapsed: f64, serial: Option<u32>) -> Vec<QueryAttemptRecord> {
    let mut records = Vec::new();
    for op in config().operators {
        for pair in Pair::ALL {
            records.push(answered(op.as_str(), vp, pair, offset, elapsed, serial));
        }
    }
    records
}
