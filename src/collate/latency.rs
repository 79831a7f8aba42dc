//! Latency Collator
//!
//! Per-operator latency is the median response time over the whole window.
//! RSS latency is a two-level median: within each bucket the `k` fastest
//! responses are medianed, then the per-bucket values are medianed across
//! the window. The slowest minority of vantage points in any one interval
//! never reaches the second level.

use std::collections::BTreeMap;

use tracing::{debug, instrument, trace};

use super::index::GroupingIndex;
use super::stats::{lowest_k_median, mean, median};
use super::Collated;
use crate::config::DeploymentConfig;
use crate::domain::{MetricDetail, MetricKind, Operator, Pair, Scope};
use crate::error::{Error, Result};

/// Collated response latency (seconds) for one window
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyMetrics {
    pub per_operator: BTreeMap<(Operator, Pair), Collated>,
    pub rss: BTreeMap<Pair, Collated>,
}

/// Per-bucket k-trimmed medians for one pair, in bucket order.
///
/// Buckets with no responses on `pair` are skipped.
pub fn bucket_medians(index: &GroupingIndex, pair: Pair, k: usize) -> (Vec<f64>, u64) {
    let mut medians = Vec::with_capacity(index.bucket_count());
    let mut samples = 0u64;

    for (bucket, values) in index.bucket_elapsed(pair) {
        samples += values.len() as u64;
        if let Some(m) = lowest_k_median(values, k) {
            trace!(bucket = %bucket.start(), pair = %pair, median = m, "Bucket median");
            medians.push(m);
        }
    }

    (medians, samples)
}

#[instrument(skip_all)]
pub fn collate(index: &GroupingIndex, config: &DeploymentConfig) -> Result<LatencyMetrics> {
    let mut per_operator = BTreeMap::new();

    for operator in &config.operators {
        for pair in Pair::ALL {
            let values = index.elapsed(operator, pair);
            let value = median(values).ok_or_else(|| {
                Error::empty(MetricKind::ResponseLatency, Scope::rsi(operator, Some(pair)))
            })?;
            per_operator.insert(
                (operator.clone(), pair),
                Collated::new(value, values.len() as u64),
            );
        }
    }

    let k = config.rss_k();
    let mut rss = BTreeMap::new();

    for pair in Pair::ALL {
        let (medians, samples) = bucket_medians(index, pair, k);
        let (Some(value), Some(average)) = (median(&medians), mean(&medians)) else {
            return Err(Error::empty(MetricKind::ResponseLatency, Scope::rss(Some(pair))));
        };
        debug!(pair = %pair, buckets = medians.len(), median = value, "RSS latency");
        rss.insert(
            pair,
            Collated::new(value, samples).with_detail(MetricDetail::Mean { mean: average }),
        );
    }

    Ok(LatencyMetrics { per_operator, rss })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collate::testing::*;
    use crate::domain::QueryAttemptRecord;

    /// One bucket where operator i answers in (i + 1) ms on every pair from vp1
    fn staggered_round(offset: i64) -> Vec<QueryAttemptRecord> {
        let mut records = Vec::new();
        for (i, op) in config().operators.iter().enumerate() {
            for pair in Pair::ALL {
                records.push(answered(
                    op.as_str(),
                    "vp1",
                    pair,
                    offset,
                    (i + 1) as f64 / 1000.0,
                    None,
                ));
            }
        }
        records
    }

    #[test]
    fn test_operator_latency_is_median() {
        let mut records = Vec::new();
        for (offset, elapsed) in [(0, 0.300), (60, 0.100), (120, 0.200)] {
            let mut round = full_round("vp1", offset, 0.05, None);
            for rec in round.iter_mut() {
                if rec.operator.as_str() == "a" && rec.pair == Pair::V4Udp {
                    rec.elapsed_time = Some(elapsed);
                }
            }
            records.extend(round);
        }

        let index = build(&records, &[]).unwrap();
        let metrics = collate(&index, &config()).unwrap();
        let a = metrics.per_operator[&(Operator::new("a"), Pair::V4Udp)];

        assert_eq!(a.value, 0.200);
        assert_eq!(a.sample_count, 3);
    }

    #[test]
    fn test_timeouts_do_not_count_toward_latency() {
        let mut records = full_round("vp1", 0, 0.05, None);
        records.push(timeout("a", "vp2", Pair::V4Udp, 0));

        let index = build(&records, &[]).unwrap();
        let metrics = collate(&index, &config()).unwrap();
        assert_eq!(
            metrics.per_operator[&(Operator::new("a"), Pair::V4Udp)].sample_count,
            1
        );
    }

    #[test]
    fn test_rss_bucket_uses_lowest_k() {
        // Values 1..=13 ms; k = 8 keeps 1..=8 ms, median 4.5 ms
        let records = staggered_round(0);
        let index = build(&records, &[]).unwrap();

        let (medians, samples) = bucket_medians(&index, Pair::V4Udp, 8);
        assert_eq!(medians, vec![(0.004 + 0.005) / 2.0]);
        assert_eq!(samples, 13);
    }

    #[test]
    fn test_rss_outlier_among_worst_does_not_move_bucket() {
        let baseline = staggered_round(0);
        let mut spiked = baseline.clone();
        for rec in spiked.iter_mut() {
            if rec.operator.as_str() == "m" && rec.pair == Pair::V4Udp {
                rec.elapsed_time = Some(10.0);
            }
        }

        let base = collate(&build(&baseline, &[]).unwrap(), &config()).unwrap();
        let spike = collate(&build(&spiked, &[]).unwrap(), &config()).unwrap();

        assert_eq!(base.rss[&Pair::V4Udp].value, spike.rss[&Pair::V4Udp].value);
        assert_ne!(
            base.per_operator[&(Operator::new("m"), Pair::V4Udp)].value,
            spike.per_operator[&(Operator::new("m"), Pair::V4Udp)].value
        );
    }

    #[test]
    fn test_rss_median_of_bucket_medians() {
        // Three buckets at uniform 10, 30 and 20 ms
        let mut records = full_round("vp1", 0, 0.010, None);
        records.extend(full_round("vp1", 60, 0.030, None));
        records.extend(full_round("vp1", 120, 0.020, None));

        let index = build(&records, &[]).unwrap();
        let metrics = collate(&index, &config()).unwrap();

        assert_eq!(metrics.rss[&Pair::V6Tcp].value, 0.020);
        assert_eq!(metrics.rss[&Pair::V6Tcp].sample_count, 39);
        assert_eq!(
            metrics.rss[&Pair::V6Tcp].detail,
            Some(MetricDetail::Mean {
                mean: (0.010 + 0.030 + 0.020) / 3.0
            })
        );
    }

    #[test]
    fn test_rss_skips_buckets_without_responses() {
        let mut records = full_round("vp1", 0, 0.010, None);
        for op in config().operators {
            records.push(timeout(op.as_str(), "vp2", Pair::V4Udp, 60));
        }
        let index = build(&records, &[]).unwrap();

        let (medians, _) = bucket_medians(&index, Pair::V4Udp, 8);
        assert_eq!(medians, vec![0.010]);
    }

    #[test]
    fn test_operator_without_responses_is_empty_window() {
        let mut records = full_round("vp1", 0, 0.010, None);
        for rec in records.iter_mut() {
            if rec.operator.as_str() == "b" && rec.pair == Pair::V6Tcp {
                *rec = timeout("b", "vp1", Pair::V6Tcp, 0);
            }
        }
        let index = build(&records, &[]).unwrap();

        assert!(matches!(
            collate(&index, &config()),
            Err(Error::EmptyWindow { .. })
        ));
    }
}
