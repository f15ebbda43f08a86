use std::num::NonZeroU32;

use super::{IngestOutcome, ObservedStream, PublisherStream, RunContext};
use crate::domain::{QosLevel, RunParameters};
use crate::protocol::{DataMessage, SysValue};

fn params(delay_ms: u64) -> RunParameters {
    RunParameters {
        publish_qos: QosLevel::AtMostOnce,
        subscribe_qos: QosLevel::AtMostOnce,
        delay_ms,
        payload_size: 0,
        publisher_count: NonZeroU32::MIN,
    }
}

#[test]
fn publisher_stream_counts_raw_and_distinct() -> Result<(), String> {
    let stream = PublisherStream::from([(0, 10), (1, 20), (1, 25), (2, 30)]);
    if stream.received() != 4 || stream.distinct() != 3 {
        return Err(format!(
            "Unexpected counts: received={} distinct={}",
            stream.received(),
            stream.distinct()
        ));
    }
    if stream.receipts().get(&1) != Some(&25) {
        return Err("Duplicate should keep the last timestamp".to_owned());
    }
    Ok(())
}

#[test]
fn observed_stream_separates_publishers() -> Result<(), String> {
    let mut observed = ObservedStream::default();
    observed.record(1, 0, 100);
    observed.record(2, 0, 105);
    observed.record(1, 1, 200);
    if observed.publisher_count() != 2 || observed.total_distinct() != 3 {
        return Err("Unexpected totals".to_owned());
    }
    let first = observed.publisher(1).ok_or("missing publisher 1")?;
    if first.distinct() != 2 {
        return Err("Unexpected publisher 1 count".to_owned());
    }
    Ok(())
}

#[test]
fn context_records_only_current_filter() -> Result<(), String> {
    let mut context = RunContext::new(params(0));
    let payload = DataMessage::new(0, 1_000).encode(0);
    let outcome = context.ingest("counter/3/0/0/0", &payload);
    if outcome != IngestOutcome::Recorded {
        return Err(format!("Unexpected outcome: {:?}", outcome));
    }
    let stale = context.ingest("counter/3/0/100/0", &payload);
    if stale != IngestOutcome::OutOfScope {
        return Err(format!("Stale topic should be out of scope: {:?}", stale));
    }
    let stream = context.observed().publisher(3).ok_or("missing publisher")?;
    if stream.received() != 1 {
        return Err("Stale message was recorded".to_owned());
    }
    Ok(())
}

#[test]
fn context_discards_malformed_payloads() -> Result<(), String> {
    let mut context = RunContext::new(params(0));
    if context.ingest("counter/1/0/0/0", b"garbage") != IngestOutcome::Malformed {
        return Err("Expected malformed".to_owned());
    }
    if context.ingest("counter/x/0/0/0", b"0:1:") != IngestOutcome::Malformed {
        return Err("Expected malformed publisher id".to_owned());
    }
    if context.malformed() != 2 || context.observed().publisher_count() != 0 {
        return Err("Malformed payloads must not be recorded".to_owned());
    }
    Ok(())
}

#[test]
fn context_collects_sys_metrics() -> Result<(), String> {
    let mut context = RunContext::new(params(100));
    context.ingest("$SYS/broker/clients/connected", b"11");
    context.ingest("$SYS/broker/version", b"mosquitto 2.0");
    let (_, observed, sys) = context.into_parts();
    if observed.publisher_count() != 0 {
        return Err("Sys traffic must not be recorded as data".to_owned());
    }
    match sys.get("$SYS/broker/clients/connected") {
        Some(SysValue::Number(value)) if (*value - 11.0).abs() < f64::EPSILON => {}
        other => return Err(format!("Unexpected clients value: {:?}", other)),
    }
    match sys.get("$SYS/broker/version") {
        Some(SysValue::Text(text)) if text == "mosquitto 2.0" => {}
        other => return Err(format!("Unexpected version value: {:?}", other)),
    }
    Ok(())
}
