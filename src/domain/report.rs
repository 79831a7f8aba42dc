//! Metric results
//!
//! The immutable result set handed to report formatters. Formatters render
//! these values as-is; nothing numeric is recomputed downstream.

use serde::{Deserialize, Serialize};

use super::record::{Operator, Pair};
use crate::schedule::ReportWindow;

/// Which metric a result belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Availability,
    ResponseLatency,
    Correctness,
    PublicationLatency,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Availability,
        MetricKind::ResponseLatency,
        MetricKind::Correctness,
        MetricKind::PublicationLatency,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            MetricKind::Availability => "availability",
            MetricKind::ResponseLatency => "response_latency",
            MetricKind::Correctness => "correctness",
            MetricKind::PublicationLatency => "publication_latency",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            MetricKind::Availability => "Availability",
            MetricKind::ResponseLatency => "Response Latency",
            MetricKind::Correctness => "Correctness",
            MetricKind::PublicationLatency => "Publication Latency",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// What a result was computed over: one operator (RSI) or the whole system (RSS)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "lowercase")]
pub enum Scope {
    Rsi {
        operator: Operator,
        pair: Option<Pair>,
    },
    Rss {
        pair: Option<Pair>,
    },
}

impl Scope {
    pub fn rsi(operator: &Operator, pair: Option<Pair>) -> Self {
        Scope::Rsi {
            operator: operator.clone(),
            pair,
        }
    }

    pub fn rss(pair: Option<Pair>) -> Self {
        Scope::Rss { pair }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Scope::Rss { .. })
    }

    pub fn operator(&self) -> Option<&Operator> {
        match self {
            Scope::Rsi { operator, .. } => Some(operator),
            Scope::Rss { .. } => None,
        }
    }

    pub fn pair(&self) -> Option<Pair> {
        match self {
            Scope::Rsi { pair, .. } | Scope::Rss { pair } => *pair,
        }
    }

    /// Stable identifier, e.g. `a/v4udp`, `rss/v6tcp`, `k`, `rss`
    pub fn identifier(&self) -> String {
        let base = match self {
            Scope::Rsi { operator, .. } => operator.as_str(),
            Scope::Rss { .. } => "rss",
        };
        match self.pair() {
            Some(pair) => format!("{}/{}", base, pair.code()),
            None => base.to_string(),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

/// Threshold outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn from_pass(passed: bool) -> Self {
        if passed {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }

    pub fn is_pass(&self) -> bool {
        *self == Verdict::Pass
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Pass => write!(f, "Pass"),
            Verdict::Fail => write!(f, "Fail"),
        }
    }
}

/// Figures behind a collated value, shown in debug reports
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricDetail {
    /// Capped numerator and denominator of an RSS availability ratio
    Ratio { numerator: u64, denominator: u64 },
    /// Checks that came back incorrect
    Incorrect { count: u64 },
    /// Mean of the values the median was taken over
    Mean { mean: f64 },
}

/// One evaluated metric
///
/// Ratios are fractions in `[0, 1]`; response latency is in seconds;
/// publication latency is in whole seconds (medians may land on a half second).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    pub metric_kind: MetricKind,
    #[serde(flatten)]
    pub scope: Scope,
    pub value: f64,
    pub sample_count: u64,
    pub verdict: Verdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<MetricDetail>,
}

/// Complete result set for one reporting window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricReport {
    pub window: ReportWindow,
    /// Query-attempt plus correctness records considered
    pub measurement_count: u64,
    /// The `k` used for the RSS order statistics
    pub rss_k: usize,
    pub results: Vec<MetricResult>,
}

impl MetricReport {
    /// Results for one metric, in report order
    pub fn results_for(&self, kind: MetricKind) -> impl Iterator<Item = &MetricResult> {
        self.results.iter().filter(move |r| r.metric_kind == kind)
    }

    /// Look up a single result
    pub fn find(&self, kind: MetricKind, scope: &Scope) -> Option<&MetricResult> {
        self.results
            .iter()
            .find(|r| r.metric_kind == kind && &r.scope == scope)
    }

    pub fn failures(&self) -> impl Iterator<Item = &MetricResult> {
        self.results.iter().filter(|r| !r.verdict.is_pass())
    }

    pub fn all_passed(&self) -> bool {
        self.failures().next().is_none()
    }
}
