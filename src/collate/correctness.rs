//! Correctness Collator
//!
//! Per-operator ratio of correct responses, and the RSS ratio pooled over all
//! operators (no order-statistic trimming: incorrect answers are not expected
//! to cluster on a minority of vantage points).

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use super::index::GroupingIndex;
use super::Collated;
use crate::config::DeploymentConfig;
use crate::domain::{MetricDetail, MetricKind, Operator, Scope};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct CorrectnessMetrics {
    pub per_operator: BTreeMap<Operator, Collated>,
    pub rss: Collated,
}

#[instrument(skip_all)]
pub fn collate(index: &GroupingIndex, config: &DeploymentConfig) -> Result<CorrectnessMetrics> {
    let mut per_operator = BTreeMap::new();
    let mut correct = 0u64;
    let mut total = 0u64;

    for operator in &config.operators {
        let counts = index.correctness(operator);
        if counts.total == 0 {
            return Err(Error::empty(
                MetricKind::Correctness,
                Scope::rsi(operator, None),
            ));
        }
        per_operator.insert(
            operator.clone(),
            Collated::ratio(counts.correct, counts.total, counts.total).with_detail(
                MetricDetail::Incorrect {
                    count: counts.total - counts.correct,
                },
            ),
        );
        correct += counts.correct;
        total += counts.total;
    }

    if total == 0 {
        return Err(Error::empty(MetricKind::Correctness, Scope::rss(None)));
    }

    debug!(correct, total, "RSS correctness");

    Ok(CorrectnessMetrics {
        per_operator,
        rss: Collated::ratio(correct, total, total).with_detail(MetricDetail::Incorrect {
            count: total - correct,
        }),
    })
}
