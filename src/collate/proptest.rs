//! Property-Based Tests for the Collators
//!
//! # Test Properties
//!
//! 1. **Bounded Ratios**: availability values always lie in `[0, 1]`
//! 2. **Capped Cells**: no cell ever credits more than `k` to RSS availability
//! 3. **Order Independence**: medians do not depend on input order
//! 4. **Bounded Latency**: RSS latency lies between the fastest and slowest response
//! 5. **Simultaneous Publication**: serials served everywhere at once have zero latency

#![cfg(test)]

use proptest::prelude::*;

use super::testing::*;
use super::{availability, latency, publication, stats};
use crate::config::rss_k;
use crate::domain::{Pair, QueryAttemptRecord};

// =============================================================================
// Property Strategies
// =============================================================================

/// One attempt: (operator index, vantage point, pair index, offset, outcome)
fn attempt_strategy() -> impl Strategy<Value = (usize, usize, usize, i64, Option<f64>)> {
    (
        0usize..13,
        1usize..=20,
        0usize..4,
        1i64..3600,
        prop::option::weighted(0.8, 0.001f64..2.0),
    )
}

/// A window of attempts in timestamp order, preceded by one full round so every
/// operator and pair is measured at least once
fn window_strategy() -> impl Strategy<Value = Vec<QueryAttemptRecord>> {
    prop::collection::vec(attempt_strategy(), 0..400).prop_map(|mut attempts| {
        attempts.sort_by_key(|p| p.3);

        let operators = config().operators;
        let mut records = full_round("vp1", 0, 0.05, None);
        for (op, vp, pair, offset, outcome) in attempts {
            let op = operators[op].as_str();
            let vp = format!("vp{}", vp);
            let pair = Pair::ALL[pair];
            records.push(match outcome {
                Some(elapsed) => answered(op, &vp, pair, offset, elapsed, None),
                None => timeout(op, &vp, pair, offset),
            });
        }
        records
    })
}

fn sample_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..10.0, 1..50)
}

// =============================================================================
// Availability Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: every availability value is a ratio in [0, 1].
    #[test]
    fn prop_availability_bounded(records in window_strategy()) {
        let index = build(&records, &[])?;
        let metrics = availability::collate(&index, &config())?;

        for collated in metrics.per_operator.values().chain(metrics.rss.values()) {
            prop_assert!((0.0..=1.0).contains(&collated.value));
        }
    }

    /// Property: the capped numerator never exceeds k per cell.
    #[test]
    fn prop_cell_credit_capped(records in window_strategy()) {
        let index = build(&records, &[])?;
        let k = rss_k(13);
        let cells = index.cells().count() as u64;

        for pair in Pair::ALL {
            let tally = availability::rss_tally(&index, pair, k);
            prop_assert_eq!(tally.denominator, cells * k as u64);
            prop_assert!(tally.numerator <= tally.denominator);
        }
    }
}

// =============================================================================
// Latency Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: the median ignores input order.
    #[test]
    fn prop_median_order_independent(values in sample_strategy()) {
        let mut reversed = values.clone();
        reversed.reverse();
        let mut sorted = values.clone();
        sorted.sort_by(f64::total_cmp);

        prop_assert_eq!(stats::median(&values), stats::median(&reversed));
        prop_assert_eq!(stats::median(&values), stats::median(&sorted));
    }

    /// Property: the lowest-k median never exceeds the full median.
    #[test]
    fn prop_lowest_k_median_not_above_median(values in sample_strategy(), k in 1usize..20) {
        let trimmed = stats::lowest_k_median(&values, k).unwrap();
        let full = stats::median(&values).unwrap();
        prop_assert!(trimmed <= full);
    }

    /// Property: RSS latency lies within the observed response times.
    #[test]
    fn prop_rss_latency_bounded(records in window_strategy()) {
        let index = build(&records, &[])?;
        let metrics = latency::collate(&index, &config())?;

        for pair in Pair::ALL {
            let observed: Vec<f64> = records
                .iter()
                .filter(|r| r.pair == pair)
                .filter_map(|r| r.elapsed_time)
                .collect();
            let lo = observed.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = observed.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

            let value = metrics.rss[&pair].value;
            prop_assert!(value >= lo && value <= hi);
        }
    }
}

// =============================================================================
// Publication Latency Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: serials that every pair serves at the same instant have zero latency.
    #[test]
    fn prop_simultaneous_publication_is_zero(
        serials in prop::collection::btree_set(1u32..u32::MAX, 1..10),
    ) {
        let mut records = Vec::new();
        for (round, serial) in serials.iter().enumerate() {
            records.extend(full_round("vp1", round as i64 * 60, 0.02, Some(*serial)));
        }

        let index = build(&records, &[])?;
        let metrics = publication::collate(&index, &config())?;

        prop_assert_eq!(metrics.rss.value, 0.0);
        prop_assert_eq!(metrics.rss.sample_count, 13 * serials.len() as u64);
    }
}
