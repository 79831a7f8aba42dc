//! Report Formatters
//!
//! Render a [`MetricReport`] for people (plain text) or programs (JSON).
//! Every number printed comes straight from a `MetricResult`.

use crate::domain::{MetricDetail, MetricKind, MetricReport, MetricResult, Operator};
use crate::error::Result;
use crate::threshold::{
    RSI_AVAILABILITY_MIN, RSI_PUBLICATION_LATENCY_MAX, RSI_TCP_LATENCY_MAX, RSI_UDP_LATENCY_MAX,
    RSS_AVAILABILITY_MIN, RSS_PUBLICATION_LATENCY_MAX, RSS_TCP_LATENCY_MAX, RSS_UDP_LATENCY_MAX,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Plain-text report.
///
/// RSI sections show verdicts and measurement counts; RSS sections also show
/// the collated value. With `debug` every line carries its value and the
/// figures behind it.
pub fn render_text(report: &MetricReport, debug: bool) -> String {
    let mut out = format!(
        "Report for {} to {}\n",
        report.window.start.format(TIMESTAMP_FORMAT),
        report.window.end.format(TIMESTAMP_FORMAT)
    );
    out.push_str(&format!(
        "Number of measurements across all vantage points: {}\n",
        report.measurement_count
    ));

    render_rsi(&mut out, report, debug);
    render_rss(&mut out, report, debug);

    out
}

/// Pretty-printed JSON
pub fn render_json(report: &MetricReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

// =============================================================================
// RSI Sections
// =============================================================================

fn render_rsi(out: &mut String, report: &MetricReport, debug: bool) {
    for kind in MetricKind::ALL {
        out.push_str(&format!("\nRSI {}\n{}\n", kind.title(), rsi_threshold_line(kind)));

        let mut current: Option<&Operator> = None;
        for result in report.results_for(kind).filter(|r| !r.scope.is_system()) {
            let operator = result.scope.operator();
            if operator != current {
                if let Some(op) = operator {
                    out.push_str(&format!("  {}:\n", op.host_name()));
                }
                current = operator;
            }

            let label = result
                .scope
                .pair()
                .map(|p| format!("{}: ", p.label()))
                .unwrap_or_default();
            out.push_str(&format!(
                "    {}{}, {} measurements{}\n",
                label,
                result.verdict,
                result.sample_count,
                if debug { debug_suffix(result) } else { String::new() }
            ));
        }
    }
}

fn rsi_threshold_line(kind: MetricKind) -> String {
    match kind {
        MetricKind::Availability => format!("Threshold is {:.0}%", RSI_AVAILABILITY_MIN * 100.0),
        MetricKind::ResponseLatency => format!(
            "Threshold for UDP is {} seconds, threshold for TCP is {} seconds",
            RSI_UDP_LATENCY_MAX, RSI_TCP_LATENCY_MAX
        ),
        MetricKind::Correctness => "Threshold is 100%".to_string(),
        MetricKind::PublicationLatency => {
            format!("Threshold is {} seconds", RSI_PUBLICATION_LATENCY_MAX)
        }
    }
}

// =============================================================================
// RSS Sections
// =============================================================================

fn render_rss(out: &mut String, report: &MetricReport, debug: bool) {
    for kind in MetricKind::ALL {
        out.push_str(&format!("\nRSS {}\n{}\n", kind.title(), rss_threshold_line(kind)));

        for result in report.results_for(kind).filter(|r| r.scope.is_system()) {
            let label = result
                .scope
                .pair()
                .map(|p| p.label().to_string())
                .unwrap_or_else(|| "Entire RSS".to_string());
            out.push_str(&format!(
                "  {}: {}, {}, {} measurements{}\n",
                label,
                value_text(result),
                result.verdict,
                result.sample_count,
                if debug { debug_suffix(result) } else { String::new() }
            ));
        }
    }
}

fn rss_threshold_line(kind: MetricKind) -> String {
    match kind {
        MetricKind::Availability => format!("Threshold is {:.3}%", RSS_AVAILABILITY_MIN * 100.0),
        MetricKind::ResponseLatency => format!(
            "Threshold for UDP is {} seconds, threshold for TCP is {} seconds",
            RSS_UDP_LATENCY_MAX, RSS_TCP_LATENCY_MAX
        ),
        MetricKind::Correctness => "Threshold is 100%".to_string(),
        MetricKind::PublicationLatency => {
            format!("Threshold is {} seconds", RSS_PUBLICATION_LATENCY_MAX)
        }
    }
}

fn value_text(result: &MetricResult) -> String {
    match result.metric_kind {
        MetricKind::Availability => format!("{:.3}%", result.value * 100.0),
        MetricKind::Correctness => format!("{:.6}%", result.value * 100.0),
        MetricKind::ResponseLatency => format!("{:.3} median", result.value),
        MetricKind::PublicationLatency => format!("{} median", result.value),
    }
}

fn debug_suffix(result: &MetricResult) -> String {
    match (result.metric_kind, result.detail) {
        (_, Some(MetricDetail::Ratio { numerator, denominator })) => {
            format!(" -- {}/{}", numerator, denominator)
        }
        (_, Some(MetricDetail::Mean { mean })) => format!(" -- {:.3} mean", mean),
        (_, Some(MetricDetail::Incorrect { count })) if result.scope.is_system() => {
            format!(" -- {} incorrect", count)
        }
        (_, Some(MetricDetail::Incorrect { count })) => {
            format!(" -- {} incorrect, {:.4}", count, result.value)
        }
        (MetricKind::Availability, None) => format!(" -- {:.3}", result.value),
        (MetricKind::ResponseLatency, None) => format!(" -- {:.3} median", result.value),
        (MetricKind::Correctness, None) => format!(" -- {:.4}", result.value),
        (MetricKind::PublicationLatency, None) => format!(" -- {} median", result.value),
    }
}
