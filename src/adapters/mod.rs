//! Boundary Adapters
//!
//! Adapter implementations around the pure engine, following the
//! Port/Adapter (Hexagonal) architecture pattern.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Domain Layer                          │
//! │   RecordSource (port)            MetricReport (result set)   │
//! └──────────────────────────────────────────────────────────────┘
//!           ▲                                     │
//!           │                                     ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   Adapters (This Module)                     │
//! │   JsonLinesSource          render_text │ render_json         │
//! │                            PrometheusExporter                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use rssac047::adapters::{render_text, JsonLinesSource};
//!
//! let source = JsonLinesSource::new("query.jsonl", "correctness.jsonl");
//! let report = engine.evaluate_source(&source, window)?;
//! println!("{}", render_text(&report, false));
//! ```

mod jsonl;
mod prometheus;
mod text;

pub use jsonl::{CorrectnessRow, JsonLinesSource, QueryRow};
pub use prometheus::PrometheusExporter;
pub use text::{render_json, render_text};
