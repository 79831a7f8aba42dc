//! RSSAC-047 Metrics Engine
//!
//! Computes the RSSAC-047 service metrics for the root server system from
//! raw vantage-point observations: availability, response latency,
//! correctness and publication latency, for each root server operator (RSI)
//! and for the root server system as a whole (RSS), each judged Pass or Fail
//! against fixed thresholds.
//!
//! # Architecture
//!
//! ```text
//! RecordSource → GroupingIndex → Collators → Threshold Evaluator → MetricReport
//!                                                                      │
//!                                          text │ json │ prometheus ◀──┘
//! ```
//!
//! The engine is synchronous and pure: one closed reporting window in, one
//! complete result set (or an error) out.
//!
//! # Modules
//!
//! - [`adapters`] - Record ingestion and report formatters
//! - [`collate`] - Grouping index and the four metric collators
//! - [`config`] - Deployment configuration and vantage-point registry
//! - [`domain`] - Records, results and ports
//! - [`engine`] - Window evaluation
//! - [`error`] - Error types
//! - [`schedule`] - Reporting windows and report placement
//! - [`threshold`] - Fixed pass/fail thresholds

pub mod adapters;
pub mod collate;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod schedule;
pub mod threshold;

// Re-export commonly used types
pub use config::{DeploymentConfig, FirstSeenScope, VantagePointRegistry};
pub use domain::{
    CorrectnessRecord, MetricDetail, MetricKind, MetricReport, MetricResult, Operator, Pair,
    QueryAttemptRecord, RecordSource, Scope, Verdict,
};
pub use engine::Engine;
pub use error::{Error, Result};
pub use schedule::{ReportWindow, WindowKind};
