//! Grouping Index
//!
//! A single pass over the window's records that builds every grouping the
//! collators need. The records themselves are never modified; the index owns
//! only derived tallies and copies of the values it groups.
//!
//! ```text
//!   records ──▶ validate ──┬──▶ (operator, pair)          → attempts, elapsed times
//!                          ├──▶ (vantage point, bucket)   → per-pair attempts
//!                          ├──▶ bucket                    → per-pair elapsed times
//!                          ├──▶ serial sightings          (timestamp order)
//!                          └──▶ operator                  → correctness tallies
//! ```

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::{DeploymentConfig, VantagePointRegistry};
use crate::domain::{CorrectnessRecord, Operator, Pair, QueryAttemptRecord, VantagePoint};
use crate::error::{Error, Result};

// =============================================================================
// Time Buckets
// =============================================================================

/// A discrete sampling interval, identified by its start instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TimeBucket(DateTime<Utc>);

impl TimeBucket {
    pub fn start(&self) -> DateTime<Utc> {
        self.0
    }
}

/// How instants map to buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BucketGranularity {
    /// One bucket per distinct timestamp value
    #[default]
    Exact,
    /// Fixed-width buckets aligned to the epoch
    Seconds(u32),
}

impl BucketGranularity {
    pub fn from_config(config: &DeploymentConfig) -> Self {
        match config.bucket_granularity_secs {
            Some(secs) if secs > 0 => BucketGranularity::Seconds(secs),
            _ => BucketGranularity::Exact,
        }
    }

    pub fn bucket_of(&self, instant: DateTime<Utc>) -> TimeBucket {
        match self {
            BucketGranularity::Exact => TimeBucket(instant),
            BucketGranularity::Seconds(width) => {
                let secs = instant.timestamp();
                let floored = secs - secs.rem_euclid(i64::from(*width));
                // Flooring an in-range instant stays in range
                TimeBucket(DateTime::from_timestamp(floored, 0).unwrap_or(instant))
            }
        }
    }
}

// =============================================================================
// Tallies
// =============================================================================

/// Successful and total attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AttemptCounts {
    pub answered: u64,
    pub total: u64,
}

impl AttemptCounts {
    fn record(&mut self, answered: bool) {
        if answered {
            self.answered += 1;
        }
        self.total += 1;
    }
}

/// Correct and total correctness checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CorrectnessCounts {
    pub correct: u64,
    pub total: u64,
}

/// A non-timeout response carrying a published serial
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSighting {
    pub operator: Operator,
    pub pair: Pair,
    pub serial: u32,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Grouping Index
// =============================================================================

/// Read-only groupings of one window's records
#[derive(Debug, Clone, Default)]
pub struct GroupingIndex {
    attempts: BTreeMap<(Operator, Pair), AttemptCounts>,
    elapsed: BTreeMap<(Operator, Pair), Vec<f64>>,
    cells: BTreeMap<(VantagePoint, TimeBucket), [AttemptCounts; 4]>,
    bucket_elapsed: BTreeMap<TimeBucket, [Vec<f64>; 4]>,
    sightings: Vec<SerialSighting>,
    correctness: BTreeMap<Operator, CorrectnessCounts>,
    query_count: u64,
    correctness_count: u64,
}

impl GroupingIndex {
    /// Build the index.
    ///
    /// Query-attempt records must be ascending by timestamp; the first record
    /// that goes backwards fails the whole build.
    #[instrument(skip_all, fields(query = query.len(), correctness = correctness.len()))]
    pub fn build(
        config: &DeploymentConfig,
        registry: &VantagePointRegistry,
        query: &[QueryAttemptRecord],
        correctness: &[CorrectnessRecord],
    ) -> Result<Self> {
        let granularity = BucketGranularity::from_config(config);
        let operators: HashSet<&Operator> = config.operators.iter().collect();
        let mut index = Self::default();
        let mut previous: Option<DateTime<Utc>> = None;

        for rec in query {
            if let Some(prev) = previous {
                if rec.timestamp < prev {
                    return Err(Error::OutOfOrderRecord {
                        record_id: rec.record_id.clone(),
                        previous: prev,
                        found: rec.timestamp,
                    });
                }
            }
            previous = Some(rec.timestamp);

            if !operators.contains(&rec.operator) {
                return Err(Error::UnknownOperator(rec.operator.to_string()));
            }
            if !registry.contains(&rec.vantage_point) {
                return Err(Error::UnknownVantagePoint(rec.vantage_point.to_string()));
            }

            let response_time = rec.response_time()?;
            index.add_attempt(rec, granularity.bucket_of(rec.timestamp), response_time);
        }

        for rec in correctness {
            if !operators.contains(&rec.operator) {
                return Err(Error::UnknownOperator(rec.operator.to_string()));
            }
            let counts = index.correctness.entry(rec.operator.clone()).or_default();
            if rec.is_correct {
                counts.correct += 1;
            }
            counts.total += 1;
            index.correctness_count += 1;
        }

        debug!(
            cells = index.cells.len(),
            buckets = index.bucket_elapsed.len(),
            sightings = index.sightings.len(),
            "Grouping index built"
        );

        Ok(index)
    }

    fn add_attempt(&mut self, rec: &QueryAttemptRecord, bucket: TimeBucket, response_time: Option<f64>) {
        let key = (rec.operator.clone(), rec.pair);
        let slot = rec.pair.index();

        self.attempts
            .entry(key.clone())
            .or_default()
            .record(response_time.is_some());

        self.cells
            .entry((rec.vantage_point.clone(), bucket))
            .or_default()[slot]
            .record(response_time.is_some());

        let bucket_values = self.bucket_elapsed.entry(bucket).or_default();

        if let Some(elapsed) = response_time {
            self.elapsed.entry(key).or_default().push(elapsed);
            bucket_values[slot].push(elapsed);

            if let Some(serial) = rec.published_serial {
                self.sightings.push(SerialSighting {
                    operator: rec.operator.clone(),
                    pair: rec.pair,
                    serial,
                    timestamp: rec.timestamp,
                });
            }
        }

        self.query_count += 1;
    }

    /// Attempts for one operator and pair (zero if never measured)
    pub fn attempts(&self, operator: &Operator, pair: Pair) -> AttemptCounts {
        self.attempts
            .get(&(operator.clone(), pair))
            .copied()
            .unwrap_or_default()
    }

    /// Elapsed times of non-timeouts for one operator and pair
    pub fn elapsed(&self, operator: &Operator, pair: Pair) -> &[f64] {
        self.elapsed
            .get(&(operator.clone(), pair))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every (vantage point, bucket) cell that saw at least one attempt
    pub fn cells(&self) -> impl Iterator<Item = (&VantagePoint, TimeBucket, &[AttemptCounts; 4])> {
        self.cells.iter().map(|((vp, bucket), counts)| (vp, *bucket, counts))
    }

    /// Per-bucket elapsed times for one pair, across all vantage points and operators
    pub fn bucket_elapsed(&self, pair: Pair) -> impl Iterator<Item = (TimeBucket, &[f64])> {
        self.bucket_elapsed
            .iter()
            .map(move |(bucket, values)| (*bucket, values[pair.index()].as_slice()))
    }

    /// Serial sightings in timestamp order
    pub fn sightings(&self) -> &[SerialSighting] {
        &self.sightings
    }

    /// Correctness tallies for one operator (zero if never checked)
    pub fn correctness(&self, operator: &Operator) -> CorrectnessCounts {
        self.correctness.get(operator).copied().unwrap_or_default()
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_elapsed.len()
    }

    pub fn query_count(&self) -> u64 {
        self.query_count
    }

    pub fn correctness_count(&self) -> u64 {
        self.correctness_count
    }

    /// Query-attempt plus correctness records
    pub fn measurement_count(&self) -> u64 {
        self.query_count + self.correctness_count
    }
}
