//! Domain Layer
//!
//! Records going in, metric results coming out, and the port through which
//! records are acquired.
//!
//! - **Records** (`record.rs`) - Query-attempt and correctness observations
//! - **Report** (`report.rs`) - Metric results and verdicts
//! - **Ports** (`ports.rs`) - Trait abstraction over record acquisition

pub mod ports;
pub mod record;
pub mod report;

pub use ports::{RecordSource, StaticRecordSource};
pub use record::{
    CorrectnessRecord, NetworkFamily, Operator, Pair, QueryAttemptRecord, RecordId, Transport,
    VantagePoint,
};
pub use report::{MetricDetail, MetricKind, MetricReport, MetricResult, Scope, Verdict};
