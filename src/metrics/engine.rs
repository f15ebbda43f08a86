use std::time::Duration;

use super::stats::{mean, sample_std_dev};
use super::types::{PublisherMetrics, RunMetrics, RunRecord};
use crate::recorder::{PublisherStream, RunContext};

const PERCENT: f64 = 100.0;

/// Messages a publisher should have sent during the run.
///
/// With no delay there is no closed form, so the highest sequence seen plus
/// one stands in. That under-counts when the last message itself is lost.
#[must_use]
pub fn expected_count(stream: &PublisherStream, delay_ms: u64, run_duration: Duration) -> u64 {
    if delay_ms == 0 {
        return stream
            .receipts()
            .last_key_value()
            .map_or(0, |(max_sequence, _)| max_sequence.saturating_add(1));
    }
    let run_ms = u64::try_from(run_duration.as_millis()).unwrap_or(u64::MAX);
    run_ms.checked_div(delay_ms).unwrap_or(0)
}

/// Computes the metrics of one publisher. Returns `None` for an empty stream,
/// which then contributes nothing to the run averages.
#[must_use]
pub fn compute_publisher_metrics(
    publisher_id: u32,
    stream: &PublisherStream,
    delay_ms: u64,
    run_duration: Duration,
) -> Option<PublisherMetrics> {
    if stream.is_empty() {
        return None;
    }
    let expected = expected_count(stream, delay_ms, run_duration);
    let actual = stream.distinct();
    let received = stream.received();

    let message_loss = if expected > 0 {
        PERCENT * (1.0 - actual as f64 / expected as f64)
    } else {
        0.0
    };

    // Scans keys in ascending order, so this never finds an inversion; the
    // receipt map does not keep arrival order.
    let mut out_of_order_count = 0u64;
    let mut previous: Option<u64> = None;
    for sequence in stream.receipts().keys() {
        if previous.is_some_and(|prev| *sequence < prev) {
            out_of_order_count = out_of_order_count.saturating_add(1);
        }
        previous = Some(*sequence);
    }
    let out_of_order = ratio_percent(out_of_order_count, actual);

    let duplicates = ratio_percent(received.saturating_sub(actual), received);

    let gaps = consecutive_gaps(stream);
    let mean_gap = mean(&gaps);
    let std_dev_gap = sample_std_dev(&gaps);

    Some(PublisherMetrics {
        publisher_id,
        expected_count: expected,
        actual_count: actual,
        received_count: received,
        message_loss,
        out_of_order,
        duplicates,
        mean_gap,
        std_dev_gap,
    })
}

/// Timestamp deltas between sequence pairs `(k, k + 1)` that were both
/// received. Pairs spanning a loss are skipped.
fn consecutive_gaps(stream: &PublisherStream) -> Vec<f64> {
    let receipts = stream.receipts();
    receipts
        .iter()
        .zip(receipts.iter().skip(1))
        .filter(|((prev_seq, _), (seq, _))| prev_seq.checked_add(1) == Some(**seq))
        .map(|((_, prev_ts), (_, ts))| *ts as f64 - *prev_ts as f64)
        .collect()
}

fn ratio_percent(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    PERCENT * numerator as f64 / denominator as f64
}

/// Turns a finished run into its record. `elapsed` is the wall-clock time
/// between the start signal and the end of the listening window.
#[must_use]
pub fn compute_run_record(
    context: RunContext,
    run_duration: Duration,
    elapsed: Duration,
) -> RunRecord {
    let (params, observed, sys_metrics) = context.into_parts();

    let publishers: Vec<PublisherMetrics> = observed
        .iter()
        .filter_map(|(publisher_id, stream)| {
            compute_publisher_metrics(*publisher_id, stream, params.delay_ms, run_duration)
        })
        .collect();

    let elapsed_secs = elapsed.as_secs_f64();
    let message_rate = if elapsed_secs > 0.0 {
        observed.total_distinct() as f64 / elapsed_secs
    } else {
        0.0
    };

    let average = |select: fn(&PublisherMetrics) -> f64| -> f64 {
        let values: Vec<f64> = publishers.iter().map(select).collect();
        mean(&values)
    };
    let metrics = RunMetrics {
        message_rate,
        avg_message_loss: average(|m| m.message_loss),
        avg_out_of_order: average(|m| m.out_of_order),
        avg_duplicates: average(|m| m.duplicates),
        avg_mean_gap: average(|m| m.mean_gap),
        avg_std_dev_gap: average(|m| m.std_dev_gap),
    };

    RunRecord {
        params,
        metrics,
        publishers,
        sys_metrics,
    }
}
