//! Metrics Collation
//!
//! Turns one window's raw records into collated metric values.
//!
//! # Architecture
//!
//! ```text
//!                        ┌──────────────────┐
//!                        │  Grouping Index  │
//!                        └────────┬─────────┘
//!        ┌───────────────┬────────┴───────┬──────────────────┐
//!        ▼               ▼                ▼                  ▼
//! ┌─────────────┐ ┌─────────────┐ ┌──────────────┐ ┌──────────────────┐
//! │Availability │ │  Latency    │ │ Correctness  │ │   Publication    │
//! │             │ │             │ │              │ │   Latency        │
//! └─────────────┘ └─────────────┘ └──────────────┘ └──────────────────┘
//! ```
//!
//! The collators are independent: each reads the same immutable index and
//! returns its own immutable result. None of them knows about thresholds.

pub mod availability;
pub mod correctness;
pub mod index;
pub mod latency;
pub mod publication;
pub mod stats;

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod testing;

pub use availability::AvailabilityMetrics;
pub use correctness::CorrectnessMetrics;
pub use index::{BucketGranularity, GroupingIndex, TimeBucket};
pub use latency::LatencyMetrics;
pub use publication::{OperatorLatencyTrack, PublicationLatencyMetrics};

use serde::Serialize;

use crate::domain::MetricDetail;

/// A collated metric value and the number of observations behind it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Collated {
    pub value: f64,
    pub sample_count: u64,
    pub detail: Option<MetricDetail>,
}

impl Collated {
    pub fn new(value: f64, sample_count: u64) -> Self {
        Self {
            value,
            sample_count,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: MetricDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    /// `numerator / denominator`; callers guarantee a non-zero denominator
    pub fn ratio(numerator: u64, denominator: u64, sample_count: u64) -> Self {
        Self::new(numerator as f64 / denominator as f64, sample_count)
    }
}
