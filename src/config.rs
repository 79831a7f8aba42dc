//! Deployment Configuration
//!
//! Describes the root server system being measured: which operators exist,
//! how observation instants are grouped into sampling intervals, and how the
//! start of a serial's publication is determined. Metric thresholds are fixed
//! and deliberately not part of this file.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Operator, VantagePoint};
use crate::error::{Error, Result};

/// Letters of the root server operators in the reference deployment
pub const DEFAULT_OPERATORS: [&str; 13] = [
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m",
];

/// Where the "first seen" instant of a serial is taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirstSeenScope {
    /// Earliest observation of the serial on the same operator
    #[default]
    Operator,
    /// Earliest observation of the serial on any operator
    System,
}

/// Configuration for one deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Operators, in reporting order
    pub operators: Vec<Operator>,

    /// Width of a time bucket in seconds; `None` buckets by exact timestamp
    pub bucket_granularity_secs: Option<u32>,

    /// Reference point for publication latency
    pub first_seen_scope: FirstSeenScope,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            operators: DEFAULT_OPERATORS.iter().map(|l| Operator::new(*l)).collect(),
            bucket_granularity_secs: None,
            first_seen_scope: FirstSeenScope::Operator,
        }
    }
}

impl DeploymentConfig {
    /// Load from a YAML file and validate
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&text)?;
        debug!(path = %path.display(), operators = config.operators.len(), "Loaded deployment config");
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.operators.len() < 2 {
            return Err(Error::Config(format!(
                "need at least two operators, found {}",
                self.operators.len()
            )));
        }

        let mut seen = HashSet::new();
        for op in &self.operators {
            if op.as_str().is_empty() {
                return Err(Error::Config("empty operator code".into()));
            }
            if !seen.insert(op) {
                return Err(Error::Config(format!("duplicate operator '{}'", op)));
            }
        }

        if self.bucket_granularity_secs == Some(0) {
            return Err(Error::Config("bucket granularity must be positive".into()));
        }

        Ok(())
    }

    /// Number of operators (`n`)
    pub fn operator_count(&self) -> usize {
        self.operators.len()
    }

    /// `k = ceil((n - 1) * 2 / 3)`, the order statistic used for RSS metrics
    pub fn rss_k(&self) -> usize {
        rss_k(self.operator_count())
    }

    pub fn has_operator(&self, operator: &Operator) -> bool {
        self.operators.contains(operator)
    }
}

/// `ceil((n - 1) * 2 / 3)` in integer arithmetic
pub fn rss_k(operator_count: usize) -> usize {
    let scaled = operator_count.saturating_sub(1) * 2;
    scaled.div_ceil(3)
}

// =============================================================================
// Vantage Point Registry
// =============================================================================

/// Ordered list of the vantage points known to a deployment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VantagePointRegistry {
    vantage_points: Vec<VantagePoint>,
    members: HashSet<VantagePoint>,
}

impl VantagePointRegistry {
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::default();
        for name in names {
            registry.push(VantagePoint::new(name))?;
        }
        Ok(registry)
    }

    /// Load a registry file.
    ///
    /// One vantage point per line; the name is the first dot-separated label,
    /// so `vp01.nrt.example.` registers `vp01`. Blank lines and `#` comments
    /// are skipped.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let registry = Self::parse(&text)?;
        debug!(path = %path.display(), vantage_points = registry.len(), "Loaded vantage point registry");
        Ok(registry)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut registry = Self::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let name = line.split('.').next().unwrap_or_default();
            if name.is_empty() {
                return Err(Error::Config(format!(
                    "registry line '{}' has no vantage point name",
                    line
                )));
            }
            registry.push(VantagePoint::new(name))?;
        }
        Ok(registry)
    }

    fn push(&mut self, vp: VantagePoint) -> Result<()> {
        if !self.members.insert(vp.clone()) {
            return Err(Error::Config(format!("duplicate vantage point '{}'", vp)));
        }
        self.vantage_points.push(vp);
        Ok(())
    }

    pub fn contains(&self, vp: &VantagePoint) -> bool {
        self.members.contains(vp)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VantagePoint> {
        self.vantage_points.iter()
    }

    pub fn len(&self) -> usize {
        self.vantage_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vantage_points.is_empty()
    }
}
