//! Window Evaluation
//!
//! Runs one closed reporting window through the whole pipeline:
//!
//! ```text
//!   records ──▶ GroupingIndex ──▶ collators ──▶ thresholds ──▶ MetricReport
//! ```
//!
//! Evaluation is synchronous and side-effect free. Any error aborts the
//! window; a partial report is never returned.

use tracing::{info, instrument};

use crate::collate::{
    availability, correctness, latency, publication, AvailabilityMetrics, Collated,
    CorrectnessMetrics, GroupingIndex, LatencyMetrics, PublicationLatencyMetrics,
};
use crate::config::{DeploymentConfig, VantagePointRegistry};
use crate::domain::{
    CorrectnessRecord, MetricKind, MetricReport, MetricResult, Pair, QueryAttemptRecord,
    RecordSource, Scope,
};
use crate::error::Result;
use crate::schedule::ReportWindow;
use crate::threshold;

/// Evaluates reporting windows for one deployment
#[derive(Debug, Clone)]
pub struct Engine {
    config: DeploymentConfig,
    registry: VantagePointRegistry,
}

impl Engine {
    /// Create an engine; the configuration is validated up front
    pub fn new(config: DeploymentConfig, registry: VantagePointRegistry) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, registry })
    }

    pub fn config(&self) -> &DeploymentConfig {
        &self.config
    }

    pub fn registry(&self) -> &VantagePointRegistry {
        &self.registry
    }

    /// Evaluate one window from already-fetched records.
    ///
    /// Query-attempt records must be ascending by timestamp.
    #[instrument(skip_all, fields(window = %window))]
    pub fn evaluate(
        &self,
        window: ReportWindow,
        query: &[QueryAttemptRecord],
        correctness: &[CorrectnessRecord],
    ) -> Result<MetricReport> {
        info!(
            query = query.len(),
            correctness = correctness.len(),
            "Evaluating window"
        );

        let index = GroupingIndex::build(&self.config, &self.registry, query, correctness)?;

        let results = self.assemble(
            &availability::collate(&index, &self.config)?,
            &latency::collate(&index, &self.config)?,
            &correctness::collate(&index, &self.config)?,
            &publication::collate(&index, &self.config)?,
        )?;

        let report = MetricReport {
            window,
            measurement_count: index.measurement_count(),
            rss_k: self.config.rss_k(),
            results,
        };

        info!(
            results = report.results.len(),
            failures = report.failures().count(),
            "Window evaluated"
        );

        Ok(report)
    }

    /// Fetch the window's records from `source` and evaluate them
    pub fn evaluate_source(
        &self,
        source: &dyn RecordSource,
        window: ReportWindow,
    ) -> Result<MetricReport> {
        let query = source.query_records(&window)?;
        let correctness = source.correctness_records(&window)?;
        self.evaluate(window, &query, &correctness)
    }

    /// Order results RSI first (per metric), then RSS
    fn assemble(
        &self,
        availability: &AvailabilityMetrics,
        latency: &LatencyMetrics,
        correctness: &CorrectnessMetrics,
        publication: &PublicationLatencyMetrics,
    ) -> Result<Vec<MetricResult>> {
        let operators = &self.config.operators;
        let mut results = Vec::new();

        for (kind, per_pair) in [
            (MetricKind::Availability, &availability.per_operator),
            (MetricKind::ResponseLatency, &latency.per_operator),
        ] {
            for operator in operators {
                for pair in Pair::ALL {
                    if let Some(collated) = per_pair.get(&(operator.clone(), pair)) {
                        results.push(judge(kind, Scope::rsi(operator, Some(pair)), collated)?);
                    }
                }
            }
        }

        for (kind, per_operator) in [
            (MetricKind::Correctness, &correctness.per_operator),
            (MetricKind::PublicationLatency, &publication.per_operator),
        ] {
            for operator in operators {
                if let Some(collated) = per_operator.get(operator) {
                    results.push(judge(kind, Scope::rsi(operator, None), collated)?);
                }
            }
        }

        for (kind, rss) in [
            (MetricKind::Availability, &availability.rss),
            (MetricKind::ResponseLatency, &latency.rss),
        ] {
            for pair in Pair::ALL {
                if let Some(collated) = rss.get(&pair) {
                    results.push(judge(kind, Scope::rss(Some(pair)), collated)?);
                }
            }
        }

        results.push(judge(MetricKind::Correctness, Scope::rss(None), &correctness.rss)?);
        results.push(judge(
            MetricKind::PublicationLatency,
            Scope::rss(None),
            &publication.rss,
        )?);

        Ok(results)
    }
}

fn judge(kind: MetricKind, scope: Scope, collated: &Collated) -> Result<MetricResult> {
    let verdict = threshold::evaluate(kind, &scope, collated.value)?;
    Ok(MetricResult {
        metric_kind: kind,
        scope,
        value: collated.value,
        sample_count: collated.sample_count,
        verdict,
        detail: collated.detail,
    })
}
