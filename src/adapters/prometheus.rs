//! Prometheus Textfile Export
//!
//! Renders a report in the Prometheus text exposition format so a
//! node-exporter textfile collector can pick it up. Gauges live in a private
//! registry; nothing is served over HTTP.

use std::path::Path;

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use tracing::debug;

use crate::domain::MetricReport;
use crate::error::Result;

const LABELS: [&str; 4] = ["metric", "scope", "operator", "pair"];

/// Label value for a scope that spans every operator or pair
const ALL: &str = "all";

/// Prometheus gauges for one report
pub struct PrometheusExporter {
    registry: Registry,
    value: GaugeVec,
    samples: GaugeVec,
    pass: GaugeVec,
    measurements: GaugeVec,
}

impl PrometheusExporter {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let value = GaugeVec::new(
            Opts::new("rssac047_metric_value", "Collated metric value"),
            &LABELS,
        )?;
        let samples = GaugeVec::new(
            Opts::new("rssac047_metric_samples", "Observations behind the metric value"),
            &LABELS,
        )?;
        let pass = GaugeVec::new(
            Opts::new("rssac047_metric_pass", "1 if the metric met its threshold, else 0"),
            &LABELS,
        )?;
        let measurements = GaugeVec::new(
            Opts::new(
                "rssac047_window_measurements",
                "Records considered for the reporting window",
            ),
            &["window"],
        )?;

        registry.register(Box::new(value.clone()))?;
        registry.register(Box::new(samples.clone()))?;
        registry.register(Box::new(pass.clone()))?;
        registry.register(Box::new(measurements.clone()))?;

        Ok(Self {
            registry,
            value,
            samples,
            pass,
            measurements,
        })
    }

    /// Replace the gauges with the contents of `report`
    pub fn record(&self, report: &MetricReport) {
        self.value.reset();
        self.samples.reset();
        self.pass.reset();
        self.measurements.reset();

        for result in &report.results {
            let scope = if result.scope.is_system() { "rss" } else { "rsi" };
            let operator = result.scope.operator().map(|o| o.as_str()).unwrap_or(ALL);
            let pair = result.scope.pair().map(|p| p.code()).unwrap_or(ALL);
            let labels = [result.metric_kind.code(), scope, operator, pair];

            self.value.with_label_values(&labels).set(result.value);
            self.samples
                .with_label_values(&labels)
                .set(result.sample_count as f64);
            self.pass
                .with_label_values(&labels)
                .set(if result.verdict.is_pass() { 1.0 } else { 0.0 });
        }

        self.measurements
            .with_label_values(&[report.window.kind.as_str()])
            .set(report.measurement_count as f64);

        debug!(results = report.results.len(), "Recorded report gauges");
    }

    /// Text exposition of the current gauges
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| crate::error::Error::Internal(format!("exposition is not UTF-8: {}", e)))
    }

    /// Record `report` and render it in one step
    pub fn export(&self, report: &MetricReport) -> Result<String> {
        self.record(report);
        self.render()
    }

    /// Write the exposition to `path` via a temporary file, so a collector
    /// never reads a half-written file
    pub fn write_textfile(&self, report: &MetricReport, path: &Path) -> Result<()> {
        let text = self.export(report)?;
        let tmp = path.with_extension("prom.tmp");
        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl std::fmt::Debug for PrometheusExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusExporter").finish_non_exhaustive()
    }
}
