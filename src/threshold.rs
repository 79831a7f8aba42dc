//! Threshold Evaluator
//!
//! Fixed pass/fail thresholds for every metric and scope. These are part of
//! the measurement definition and deliberately not configurable.
//!
//! | Metric              | RSI              | RSS              |
//! |---------------------|------------------|------------------|
//! | Availability        | >= 96%           | >= 99.999%       |
//! | Latency (UDP / TCP) | <= 250 / 500 ms  | <= 150 / 300 ms  |
//! | Correctness         | = 100%           | = 100%           |
//! | Publication latency | <= 65 min        | <= 35 min        |

use std::fmt;

use crate::domain::{MetricKind, Scope, Transport, Verdict};
use crate::error::{Error, Result};

pub const RSI_AVAILABILITY_MIN: f64 = 0.96;
pub const RSS_AVAILABILITY_MIN: f64 = 0.99999;

/// Seconds
pub const RSI_UDP_LATENCY_MAX: f64 = 0.250;
pub const RSI_TCP_LATENCY_MAX: f64 = 0.500;
pub const RSS_UDP_LATENCY_MAX: f64 = 0.150;
pub const RSS_TCP_LATENCY_MAX: f64 = 0.300;

pub const CORRECTNESS_MIN: f64 = 1.0;

/// Seconds
pub const RSI_PUBLICATION_LATENCY_MAX: f64 = 65.0 * 60.0;
pub const RSS_PUBLICATION_LATENCY_MAX: f64 = 35.0 * 60.0;

/// Which side of the limit passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    AtLeast,
    AtMost,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub bound: Bound,
    pub limit: f64,
}

impl Threshold {
    const fn at_least(limit: f64) -> Self {
        Self {
            bound: Bound::AtLeast,
            limit,
        }
    }

    const fn at_most(limit: f64) -> Self {
        Self {
            bound: Bound::AtMost,
            limit,
        }
    }

    /// Both bounds are inclusive
    pub fn passes(&self, value: f64) -> bool {
        match self.bound {
            Bound::AtLeast => value >= self.limit,
            Bound::AtMost => value <= self.limit,
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bound {
            Bound::AtLeast => write!(f, ">= {}", self.limit),
            Bound::AtMost => write!(f, "<= {}", self.limit),
        }
    }
}

/// Threshold for a metric in a scope.
///
/// Latency thresholds depend on the transport, so latency scopes must name
/// a pair.
pub fn threshold_for(kind: MetricKind, scope: &Scope) -> Result<Threshold> {
    let system = scope.is_system();

    let threshold = match kind {
        MetricKind::Availability if system => Threshold::at_least(RSS_AVAILABILITY_MIN),
        MetricKind::Availability => Threshold::at_least(RSI_AVAILABILITY_MIN),
        MetricKind::ResponseLatency => {
            let pair = scope.pair().ok_or_else(|| {
                Error::Internal(format!("latency scope {} has no transport", scope))
            })?;
            let limit = match (system, pair.transport()) {
                (false, Transport::Udp) => RSI_UDP_LATENCY_MAX,
                (false, Transport::Tcp) => RSI_TCP_LATENCY_MAX,
                (true, Transport::Udp) => RSS_UDP_LATENCY_MAX,
                (true, Transport::Tcp) => RSS_TCP_LATENCY_MAX,
            };
            Threshold::at_most(limit)
        }
        MetricKind::Correctness => Threshold::at_least(CORRECTNESS_MIN),
        MetricKind::PublicationLatency if system => {
            Threshold::at_most(RSS_PUBLICATION_LATENCY_MAX)
        }
        MetricKind::PublicationLatency => Threshold::at_most(RSI_PUBLICATION_LATENCY_MAX),
    };

    Ok(threshold)
}

/// Pass or fail `value` for a metric in a scope
pub fn evaluate(kind: MetricKind, scope: &Scope, value: f64) -> Result<Verdict> {
    Ok(Verdict::from_pass(threshold_for(kind, scope)?.passes(value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Operator, Pair};

    fn rsi(pair: Option<Pair>) -> Scope {
        Scope::rsi(&Operator::new("a"), pair)
    }

    // =========================================================================
    // Availability
    // =========================================================================

    #[test]
    fn test_rsi_availability_boundary_inclusive() {
        let scope = rsi(Some(Pair::V4Udp));
        assert_eq!(evaluate(MetricKind::Availability, &scope, 0.96).unwrap(), Verdict::Pass);
        assert_eq!(evaluate(MetricKind::Availability, &scope, 0.95).unwrap(), Verdict::Fail);
    }

    #[test]
    fn test_rss_availability() {
        let scope = Scope::rss(Some(Pair::V6Tcp));
        assert_eq!(evaluate(MetricKind::Availability, &scope, 0.99999).unwrap(), Verdict::Pass);
        assert_eq!(evaluate(MetricKind::Availability, &scope, 0.9999).unwrap(), Verdict::Fail);
    }

    // =========================================================================
    // Latency
    // =========================================================================

    #[test]
    fn test_latency_depends_on_transport_and_scope() {
        let cases = [
            (rsi(Some(Pair::V4Udp)), 0.250),
            (rsi(Some(Pair::V6Tcp)), 0.500),
            (Scope::rss(Some(Pair::V6Udp)), 0.150),
            (Scope::rss(Some(Pair::V4Tcp)), 0.300),
        ];
        for (scope, limit) in cases {
            let t = threshold_for(MetricKind::ResponseLatency, &scope).unwrap();
            assert_eq!(t, Threshold::at_most(limit));
            assert!(t.passes(limit));
            assert!(!t.passes(limit + 0.001));
        }
    }

    #[test]
    fn test_latency_without_pair_is_internal_error() {
        assert!(matches!(
            threshold_for(MetricKind::ResponseLatency, &rsi(None)),
            Err(Error::Internal(_))
        ));
    }

    // =========================================================================
    // Correctness and Publication Latency
    // =========================================================================

    #[test]
    fn test_correctness_requires_everything() {
        assert_eq!(evaluate(MetricKind::Correctness, &rsi(None), 1.0).unwrap(), Verdict::Pass);
        assert_eq!(
            evaluate(MetricKind::Correctness, &Scope::rss(None), 0.9999).unwrap(),
            Verdict::Fail
        );
    }

    #[test]
    fn test_publication_latency() {
        let scope = rsi(None);
        assert_eq!(evaluate(MetricKind::PublicationLatency, &scope, 3000.0).unwrap(), Verdict::Pass);
        assert_eq!(evaluate(MetricKind::PublicationLatency, &scope, 3900.0).unwrap(), Verdict::Pass);
        assert_eq!(evaluate(MetricKind::PublicationLatency, &scope, 4200.0).unwrap(), Verdict::Fail);

        let rss = Scope::rss(None);
        assert_eq!(evaluate(MetricKind::PublicationLatency, &rss, 2100.0).unwrap(), Verdict::Pass);
        assert_eq!(evaluate(MetricKind::PublicationLatency, &rss, 2101.0).unwrap(), Verdict::Fail);
    }

    #[test]
    fn test_threshold_display() {
        assert_eq!(Threshold::at_least(0.96).to_string(), ">= 0.96");
        assert_eq!(Threshold::at_most(3900.0).to_string(), "<= 3900");
    }
}
