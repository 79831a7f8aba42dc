//! Publication-Latency Collator
//!
//! Reconstructs, for every serial an operator served, how long it took from
//! the serial's first sighting until every pair that ever served it had done
//! so. Sightings are replayed in timestamp order:
//!
//! ```text
//!   first sighting of (operator, serial) ──▶ first_seen = t, pair_seen[pair] = t
//!   later sighting on a new pair         ──▶ pair_seen[pair] = t
//!   later sighting on a known pair       ──▶ ignored
//!   end of window                        ──▶ latency = max(pair_seen) - first_seen
//! ```
//!
//! Pairs that never serve a serial are left out of the max, so an outage on
//! one pair shows up in that pair's availability, not here. Latencies are
//! whole seconds, truncated.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use super::index::{GroupingIndex, SerialSighting};
use super::stats::{mean, median};
use super::Collated;
use crate::config::{DeploymentConfig, FirstSeenScope};
use crate::domain::{MetricDetail, MetricKind, Operator, Pair, Scope};
use crate::error::{Error, Result};

// =============================================================================
// Serial Tracking
// =============================================================================

/// When one serial was first seen and when each pair first served it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialTrack {
    pub first_seen: DateTime<Utc>,
    pub pair_seen: [Option<DateTime<Utc>>; 4],
}

impl SerialTrack {
    fn new(first_seen: DateTime<Utc>) -> Self {
        Self {
            first_seen,
            pair_seen: [None; 4],
        }
    }

    pub fn seen_on(&self, pair: Pair) -> Option<DateTime<Utc>> {
        self.pair_seen[pair.index()]
    }

    /// Latest first-sighting across the pairs that served the serial
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.pair_seen.iter().flatten().max().copied()
    }
}

/// Serial tracking for one operator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatorLatencyTrack {
    serials: BTreeMap<u32, SerialTrack>,
}

impl OperatorLatencyTrack {
    /// Apply one sighting; `first_seen` is used only if the serial is new
    pub fn observe(&mut self, first_seen: DateTime<Utc>, sighting: &SerialSighting) {
        let track = self
            .serials
            .entry(sighting.serial)
            .or_insert_with(|| SerialTrack::new(first_seen));

        let slot = &mut track.pair_seen[sighting.pair.index()];
        if slot.is_none() {
            *slot = Some(sighting.timestamp);
        }
    }

    pub fn get(&self, serial: u32) -> Option<&SerialTrack> {
        self.serials.get(&serial)
    }

    pub fn len(&self) -> usize {
        self.serials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.serials.is_empty()
    }

    /// Publication latency in whole seconds for every tracked serial
    pub fn latencies(&self, operator: &Operator) -> Result<Vec<(u32, i64)>> {
        self.serials
            .iter()
            .map(|(serial, track)| {
                let last = track
                    .last_seen()
                    .ok_or_else(|| Error::IncompleteSerialTracking {
                        operator: operator.to_string(),
                        serial: *serial,
                    })?;
                let secs = (last - track.first_seen).num_seconds();
                if secs < 0 {
                    return Err(Error::Internal(format!(
                        "serial {} for operator {} served before it was first seen",
                        serial, operator
                    )));
                }
                Ok((*serial, secs))
            })
            .collect()
    }
}

/// Replay the index's sightings into one track per operator
pub fn track(
    index: &GroupingIndex,
    scope: FirstSeenScope,
) -> BTreeMap<Operator, OperatorLatencyTrack> {
    let mut system_first: HashMap<u32, DateTime<Utc>> = HashMap::new();
    let mut tracks: BTreeMap<Operator, OperatorLatencyTrack> = BTreeMap::new();

    for sighting in index.sightings() {
        let anywhere = *system_first
            .entry(sighting.serial)
            .or_insert(sighting.timestamp);
        let first_seen = match scope {
            FirstSeenScope::Operator => sighting.timestamp,
            FirstSeenScope::System => anywhere,
        };

        tracks
            .entry(sighting.operator.clone())
            .or_default()
            .observe(first_seen, sighting);
    }

    tracks
}

// =============================================================================
// Collation
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PublicationLatencyMetrics {
    /// Median latency in seconds per operator
    pub per_operator: BTreeMap<Operator, Collated>,
    /// Median latency in seconds over every (operator, serial)
    pub rss: Collated,
    pub tracks: BTreeMap<Operator, OperatorLatencyTrack>,
}

#[instrument(skip_all)]
pub fn collate(
    index: &GroupingIndex,
    config: &DeploymentConfig,
) -> Result<PublicationLatencyMetrics> {
    let tracks = track(index, config.first_seen_scope);
    let empty = OperatorLatencyTrack::default();

    let mut per_operator = BTreeMap::new();
    let mut pooled: Vec<f64> = Vec::new();

    for operator in &config.operators {
        let latencies = tracks.get(operator).unwrap_or(&empty).latencies(operator)?;
        let values: Vec<f64> = latencies.iter().map(|(_, secs)| *secs as f64).collect();

        let value = median(&values).ok_or_else(|| {
            Error::empty(MetricKind::PublicationLatency, Scope::rsi(operator, None))
        })?;
        debug!(operator = %operator, serials = values.len(), median = value, "Publication latency");

        per_operator.insert(operator.clone(), Collated::new(value, values.len() as u64));
        pooled.extend(values);
    }

    let (Some(rss_value), Some(rss_mean)) = (median(&pooled), mean(&pooled)) else {
        return Err(Error::empty(MetricKind::PublicationLatency, Scope::rss(None)));
    };

    Ok(PublicationLatencyMetrics {
        per_operator,
        rss: Collated::new(rss_value, pooled.len() as u64)
            .with_detail(MetricDetail::Mean { mean: rss_mean }),
        tracks,
    })
}
