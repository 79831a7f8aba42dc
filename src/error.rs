//! Error types for the RSSAC-047 metrics engine

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while evaluating a reporting window
///
/// Every variant is fatal for the window being evaluated: the engine either
/// produces a complete report or nothing at all.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    // =========================================================================
    // Core Errors
    // =========================================================================
    /// A record violates the timeout / elapsed-time invariant
    #[error("Malformed record {record_id}: {reason}")]
    MalformedRecord { record_id: String, reason: String },

    /// Query-attempt records were not supplied in ascending timestamp order
    #[error("Record {record_id} at {found} arrived after a record at {previous}")]
    OutOfOrderRecord {
        record_id: String,
        previous: DateTime<Utc>,
        found: DateTime<Utc>,
    },

    /// Publication-latency bookkeeping reached an impossible state
    #[error("Serial {serial} for operator {operator} was first seen but never seen on any pair")]
    IncompleteSerialTracking { operator: String, serial: u32 },

    /// A ratio or median had nothing to work with
    #[error("No measurements for {metric} ({scope})")]
    EmptyWindow { metric: String, scope: String },

    // =========================================================================
    // Deployment Errors
    // =========================================================================
    /// Operator code not in the deployment's operator list
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    /// Vantage point not in the registry
    #[error("Unknown vantage point: {0}")]
    UnknownVantagePoint(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    // =========================================================================
    // Boundary Errors
    // =========================================================================
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML decode error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Prometheus exposition error
    #[error("Prometheus exposition error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a malformed record
    pub fn malformed(record_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            record_id: record_id.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for an empty-window error
    pub fn empty(metric: impl std::fmt::Display, scope: impl std::fmt::Display) -> Self {
        Error::EmptyWindow {
            metric: metric.to_string(),
            scope: scope.to_string(),
        }
    }

    /// True for errors raised by the core engine rather than the I/O boundary
    pub fn is_core(&self) -> bool {
        matches!(
            self,
            Error::MalformedRecord { .. }
                | Error::OutOfOrderRecord { .. }
                | Error::IncompleteSerialTracking { .. }
                | Error::EmptyWindow { .. }
        )
    }
}
