//! Availability Collator
//!
//! Per-operator availability is the plain share of non-timeout attempts.
//! RSS availability caps the credit of each (vantage point, bucket) cell at
//! `k`: a cell contributes `min(k, answered)` to the numerator and `k` to the
//! denominator, so a handful of vantage points cannot carry the system and a
//! minority of briefly unreachable ones cannot sink it.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use super::index::GroupingIndex;
use super::Collated;
use crate::config::DeploymentConfig;
use crate::domain::{MetricDetail, MetricKind, Operator, Pair, Scope};
use crate::error::{Error, Result};

/// Collated availability for one window
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityMetrics {
    pub per_operator: BTreeMap<(Operator, Pair), Collated>,
    pub rss: BTreeMap<Pair, Collated>,
}

/// Capped RSS tally for one pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CappedTally {
    pub numerator: u64,
    pub denominator: u64,
    pub attempts: u64,
}

/// Sum the capped per-cell credit for `pair`
pub fn rss_tally(index: &GroupingIndex, pair: Pair, k: usize) -> CappedTally {
    let k = k as u64;
    let mut tally = CappedTally::default();

    for (_, _, counts) in index.cells() {
        let cell = counts[pair.index()];
        tally.numerator += cell.answered.min(k);
        tally.denominator += k;
        tally.attempts += cell.total;
    }

    tally
}

#[instrument(skip_all)]
pub fn collate(index: &GroupingIndex, config: &DeploymentConfig) -> Result<AvailabilityMetrics> {
    let mut per_operator = BTreeMap::new();

    for operator in &config.operators {
        for pair in Pair::ALL {
            let counts = index.attempts(operator, pair);
            if counts.total == 0 {
                return Err(Error::empty(
                    MetricKind::Availability,
                    Scope::rsi(operator, Some(pair)),
                ));
            }
            per_operator.insert(
                (operator.clone(), pair),
                Collated::ratio(counts.answered, counts.total, counts.total),
            );
        }
    }

    let k = config.rss_k();
    let mut rss = BTreeMap::new();

    for pair in Pair::ALL {
        let tally = rss_tally(index, pair, k);
        if tally.denominator == 0 {
            return Err(Error::empty(MetricKind::Availability, Scope::rss(Some(pair))));
        }
        debug!(
            pair = %pair,
            numerator = tally.numerator,
            denominator = tally.denominator,
            "RSS availability tally"
        );
        rss.insert(
            pair,
            Collated::ratio(tally.numerator, tally.denominator, tally.attempts).with_detail(
                MetricDetail::Ratio {
                    numerator: tally.numerator,
                    denominator: tally.denominator,
                },
            ),
        );
    }

    Ok(AvailabilityMetrics { per_operator, rss })
}
