//! Observation records
//!
//! Typed forms of the two observation kinds the engine consumes: query-attempt
//! records (SOA queries to one operator from one vantage point) and correctness
//! records. Records are immutable once built; the engine only reads them.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Format of the date part of a record id (`<YYYYMMDDHHMM>-<vp>-<seq>`)
pub const RECORD_ID_DATE_FORMAT: &str = "%Y%m%d%H%M";

// =============================================================================
// Value Objects
// =============================================================================

/// A root server operator, identified by its letter (the RSI)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Operator(String);

impl Operator {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host name used when reporting on this operator
    pub fn host_name(&self) -> String {
        format!("{}.root-servers.net", self.0)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Operator {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Operator {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.0
    }
}

/// A measurement location contributing observations
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VantagePoint(String);

impl VantagePoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VantagePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for VantagePoint {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Internet protocol family of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkFamily {
    V4,
    V6,
}

impl std::str::FromStr for NetworkFamily {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v4" | "ipv4" => Ok(NetworkFamily::V4),
            "v6" | "ipv6" => Ok(NetworkFamily::V6),
            other => Err(format!("unknown network family '{}'", other)),
        }
    }
}

/// Transport protocol of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Udp,
    Tcp,
}

impl std::str::FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "udp" => Ok(Transport::Udp),
            "tcp" => Ok(Transport::Tcp),
            other => Err(format!("unknown transport '{}'", other)),
        }
    }
}

/// One of the four (network family, transport) combinations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pair {
    V4Udp,
    V4Tcp,
    V6Udp,
    V6Tcp,
}

impl Pair {
    /// All pairs, in reporting order
    pub const ALL: [Pair; 4] = [Pair::V4Udp, Pair::V4Tcp, Pair::V6Udp, Pair::V6Tcp];

    pub fn new(family: NetworkFamily, transport: Transport) -> Self {
        match (family, transport) {
            (NetworkFamily::V4, Transport::Udp) => Pair::V4Udp,
            (NetworkFamily::V4, Transport::Tcp) => Pair::V4Tcp,
            (NetworkFamily::V6, Transport::Udp) => Pair::V6Udp,
            (NetworkFamily::V6, Transport::Tcp) => Pair::V6Tcp,
        }
    }

    pub fn family(&self) -> NetworkFamily {
        match self {
            Pair::V4Udp | Pair::V4Tcp => NetworkFamily::V4,
            Pair::V6Udp | Pair::V6Tcp => NetworkFamily::V6,
        }
    }

    pub fn transport(&self) -> Transport {
        match self {
            Pair::V4Udp | Pair::V6Udp => Transport::Udp,
            Pair::V4Tcp | Pair::V6Tcp => Transport::Tcp,
        }
    }

    /// Position in [`Pair::ALL`]
    pub fn index(&self) -> usize {
        match self {
            Pair::V4Udp => 0,
            Pair::V4Tcp => 1,
            Pair::V6Udp => 2,
            Pair::V6Tcp => 3,
        }
    }

    /// Short code used in identifiers and labels
    pub fn code(&self) -> &'static str {
        match self {
            Pair::V4Udp => "v4udp",
            Pair::V4Tcp => "v4tcp",
            Pair::V6Udp => "v6udp",
            Pair::V6Tcp => "v6tcp",
        }
    }

    /// Human-readable name
    pub fn label(&self) -> &'static str {
        match self {
            Pair::V4Udp => "IPv4 UDP",
            Pair::V4Tcp => "IPv4 TCP",
            Pair::V6Udp => "IPv6 UDP",
            Pair::V6Tcp => "IPv6 TCP",
        }
    }
}

impl std::fmt::Display for Pair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

// =============================================================================
// Record Id
// =============================================================================

/// Parsed form of a record id: `<YYYYMMDDHHMM>-<vantage point>-<sequence>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordId {
    pub taken_at: DateTime<Utc>,
    pub vantage_point: VantagePoint,
    pub sequence: String,
}

impl RecordId {
    pub fn parse(record_id: &str) -> Result<Self> {
        let parts: Vec<&str> = record_id.split('-').collect();
        let [date_part, vp_part, seq_part] = parts.as_slice() else {
            return Err(Error::malformed(
                record_id,
                "record id must have the form <date>-<vantage point>-<sequence>",
            ));
        };

        if vp_part.is_empty() || seq_part.is_empty() {
            return Err(Error::malformed(record_id, "empty record id component"));
        }

        let taken_at = NaiveDateTime::parse_from_str(date_part, RECORD_ID_DATE_FORMAT)
            .map_err(|e| Error::malformed(record_id, format!("bad date '{}': {}", date_part, e)))?
            .and_utc();

        Ok(Self {
            taken_at,
            vantage_point: VantagePoint::new(*vp_part),
            sequence: seq_part.to_string(),
        })
    }
}

// =============================================================================
// Query Attempt Record
// =============================================================================

/// One measurement of one operator at one vantage point at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAttemptRecord {
    pub record_id: String,
    pub operator: Operator,
    pub vantage_point: VantagePoint,
    pub pair: Pair,
    /// Sampling instant; every query of one measurement run shares it
    pub timestamp: DateTime<Utc>,
    /// Response time in seconds; absent on timeouts
    pub elapsed_time: Option<f64>,
    pub timed_out: bool,
    /// SOA serial seen in the response
    pub published_serial: Option<u32>,
}

impl QueryAttemptRecord {
    /// An attempt that got an answer
    pub fn answered(
        record_id: impl Into<String>,
        operator: Operator,
        vantage_point: VantagePoint,
        pair: Pair,
        timestamp: DateTime<Utc>,
        elapsed_time: f64,
        published_serial: Option<u32>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            operator,
            vantage_point,
            pair,
            timestamp,
            elapsed_time: Some(elapsed_time),
            timed_out: false,
            published_serial,
        }
    }

    /// An attempt that timed out
    pub fn timeout(
        record_id: impl Into<String>,
        operator: Operator,
        vantage_point: VantagePoint,
        pair: Pair,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            operator,
            vantage_point,
            pair,
            timestamp,
            elapsed_time: None,
            timed_out: true,
            published_serial: None,
        }
    }

    /// Elapsed time of a non-timeout, enforcing the timeout invariant.
    ///
    /// Returns `Ok(None)` for timeouts.
    pub fn response_time(&self) -> Result<Option<f64>> {
        if self.timed_out {
            if self.elapsed_time.is_some() {
                return Err(Error::malformed(
                    &self.record_id,
                    "timed-out record carries an elapsed time",
                ));
            }
            if self.published_serial.is_some() {
                return Err(Error::malformed(
                    &self.record_id,
                    "timed-out record carries a published serial",
                ));
            }
            return Ok(None);
        }

        match self.elapsed_time {
            Some(elapsed) if elapsed.is_finite() && elapsed >= 0.0 => Ok(Some(elapsed)),
            Some(elapsed) => Err(Error::malformed(
                &self.record_id,
                format!("invalid elapsed time {}", elapsed),
            )),
            None => Err(Error::malformed(
                &self.record_id,
                "non-timed-out record has no elapsed time",
            )),
        }
    }
}

// =============================================================================
// Correctness Record
// =============================================================================

/// Outcome of one correctness check against one operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectnessRecord {
    pub record_id: String,
    pub operator: Operator,
    pub is_correct: bool,
}

impl CorrectnessRecord {
    pub fn new(record_id: impl Into<String>, operator: Operator, is_correct: bool) -> Self {
        Self {
            record_id: record_id.into(),
            operator,
            is_correct,
        }
    }
}
