use std::time::Duration;

use tokio::sync::watch;

use super::*;
use crate::domain::QosLevel;
use crate::protocol::{ControlMessage, DataMessage, TOPIC_GO};
use crate::shutdown_handlers::shutdown_channel;
use crate::transport::{Connector, InboundEvent, InboundReceiver, MemoryBroker, Transport};

const RUN: Duration = Duration::from_millis(60);
const WAIT: Duration = Duration::from_secs(2);

fn machine(instance_id: u32) -> AgentStateMachine {
    AgentStateMachine::new(instance_id, RUN)
}

#[test]
fn fresh_agent_uses_default_settings() -> Result<(), String> {
    let agent = machine(1);
    if agent.state() != AgentState::Idle {
        return Err(format!("Unexpected state: {:?}", agent.state()));
    }
    let expected = AgentSettings {
        qos: QosLevel::AtMostOnce,
        delay_ms: 100,
        payload_size: 0,
        instance_count: 1,
    };
    if *agent.settings() != expected {
        return Err(format!("Unexpected defaults: {:?}", agent.settings()));
    }
    Ok(())
}

#[test]
fn parameters_configure_and_go_starts_selected_agent() -> Result<(), String> {
    let mut agent = machine(3);
    for message in [
        ControlMessage::Qos(QosLevel::ExactlyOnce),
        ControlMessage::Delay(0),
        ControlMessage::MessageSize(1000),
        ControlMessage::InstanceCount(5),
    ] {
        if agent.on_control(message) != AgentAction::None {
            return Err(format!("Parameter {:?} should not act", message));
        }
    }
    if agent.state() != AgentState::Configured {
        return Err(format!("Expected Configured, got {:?}", agent.state()));
    }
    let expected = PublishPlan {
        instance_id: 3,
        qos: QosLevel::ExactlyOnce,
        delay_ms: 0,
        payload_size: 1000,
        duration: RUN,
    };
    match agent.on_control(ControlMessage::Go) {
        AgentAction::Start(plan) if plan == expected => {}
        other => return Err(format!("Unexpected action: {:?}", other)),
    }
    if agent.state() != AgentState::Publishing {
        return Err(format!("Expected Publishing, got {:?}", agent.state()));
    }
    if expected.topic() != "counter/3/2/0/1000" {
        return Err(format!("Unexpected topic: {}", expected.topic()));
    }
    Ok(())
}

#[test]
fn unselected_go_is_ignored_when_idle() -> Result<(), String> {
    let mut agent = machine(2);
    agent.on_control(ControlMessage::InstanceCount(1));
    if agent.on_control(ControlMessage::Go) != AgentAction::None {
        return Err("Unselected agent should not act".to_owned());
    }
    if agent.state() != AgentState::Idle {
        return Err(format!("Expected Idle, got {:?}", agent.state()));
    }
    Ok(())
}

#[test]
fn unselected_go_stops_running_stream() -> Result<(), String> {
    let mut agent = machine(4);
    agent.on_control(ControlMessage::InstanceCount(5));
    if !matches!(agent.on_control(ControlMessage::Go), AgentAction::Start(_)) {
        return Err("Agent 4 of 5 should start".to_owned());
    }
    agent.on_control(ControlMessage::InstanceCount(1));
    if agent.state() != AgentState::Publishing {
        return Err("Parameters must not interrupt a running stream".to_owned());
    }
    if agent.on_control(ControlMessage::Go) != AgentAction::Stop {
        return Err("Agent 4 of 1 should stop".to_owned());
    }
    if agent.state() != AgentState::Idle {
        return Err(format!("Expected Idle, got {:?}", agent.state()));
    }
    Ok(())
}

#[test]
fn go_while_publishing_restarts_with_new_snapshot() -> Result<(), String> {
    let mut agent = machine(1);
    agent.on_control(ControlMessage::Delay(100));
    agent.on_control(ControlMessage::Go);
    agent.on_control(ControlMessage::Delay(0));
    match agent.on_control(ControlMessage::Go) {
        AgentAction::Start(plan) if plan.delay_ms == 0 => Ok(()),
        other => Err(format!("Unexpected action: {:?}", other)),
    }
}

#[test]
fn stream_finish_returns_to_idle() -> Result<(), String> {
    let mut agent = machine(1);
    agent.on_control(ControlMessage::Go);
    agent.on_stream_finished();
    if agent.state() != AgentState::Idle {
        return Err(format!("Expected Idle, got {:?}", agent.state()));
    }
    Ok(())
}

#[test]
fn publisher_ids_cover_requested_range() -> Result<(), String> {
    let ids = publisher_ids(1, 10).map_err(|err| err.to_string())?;
    if ids != (1..=10).collect::<Vec<u32>>() {
        return Err(format!("Unexpected ids: {:?}", ids));
    }
    if publisher_ids(0, 3).is_ok() {
        return Err("Id 0 must be rejected".to_owned());
    }
    if publisher_ids(u32::MAX, 2).is_ok() {
        return Err("Overflowing range must be rejected".to_owned());
    }
    if publisher_client_id(7) != "publisher-7" {
        return Err(format!("Unexpected client id: {}", publisher_client_id(7)));
    }
    Ok(())
}

async fn listener(broker: &MemoryBroker, filter: &str) -> Result<InboundReceiver, String> {
    let conn = broker
        .connect("listener")
        .await
        .map_err(|err| format!("connect failed: {}", err))?;
    conn.client
        .subscribe(filter, QosLevel::AtMostOnce)
        .await
        .map_err(|err| format!("subscribe failed: {}", err))?;
    Ok(conn.inbound)
}

fn drain_sequences(inbound: &mut InboundReceiver) -> Result<Vec<(String, u64)>, String> {
    let mut out = Vec::new();
    while let Ok(event) = inbound.try_recv() {
        if let InboundEvent::Message { topic, payload } = event {
            let message = DataMessage::parse(&payload).map_err(|err| err.to_string())?;
            out.push((topic, message.sequence));
        }
    }
    Ok(out)
}

#[tokio::test]
async fn publish_loop_emits_contiguous_sequences() -> Result<(), String> {
    let broker = MemoryBroker::new();
    let mut inbound = listener(&broker, "counter/#").await?;
    let publisher = broker
        .connect("publisher-1")
        .await
        .map_err(|err| format!("connect failed: {}", err))?;
    let plan = PublishPlan {
        instance_id: 1,
        qos: QosLevel::AtLeastOnce,
        delay_ms: 5,
        payload_size: 16,
        duration: Duration::from_millis(40),
    };
    let (_stop_tx, stop_rx) = watch::channel(false);

    let published = run_publish_loop(&publisher.client, &plan, stop_rx).await;
    let seen = drain_sequences(&mut inbound)?;
    if published == 0 || u64::try_from(seen.len()).map_err(|err| err.to_string())? != published {
        return Err(format!("Published {} but saw {}", published, seen.len()));
    }
    for (expected, (topic, sequence)) in (0u64..).zip(&seen) {
        if *sequence != expected || topic != "counter/1/1/5/16" {
            return Err(format!("Unexpected message {} on {}", sequence, topic));
        }
    }
    Ok(())
}

#[tokio::test]
async fn publish_loop_honours_stop_signal() -> Result<(), String> {
    let broker = MemoryBroker::new();
    let publisher = broker
        .connect("publisher-1")
        .await
        .map_err(|err| format!("connect failed: {}", err))?;
    let plan = PublishPlan {
        instance_id: 1,
        qos: QosLevel::AtMostOnce,
        delay_ms: 10,
        payload_size: 0,
        duration: Duration::from_secs(60),
    };
    let (stop_tx, stop_rx) = watch::channel(false);
    let stopper = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        stop_tx.send(true).is_ok()
    });

    let published = tokio::time::timeout(WAIT, run_publish_loop(&publisher.client, &plan, stop_rx))
        .await
        .map_err(|err| format!("Loop ignored stop: {}", err))?;
    if !stopper.await.map_err(|err| err.to_string())? {
        return Err("Stop signal was not delivered".to_owned());
    }
    if published == 0 {
        return Err("Expected at least one message before stop".to_owned());
    }
    Ok(())
}

#[tokio::test]
async fn publish_failure_ends_stream() -> Result<(), String> {
    let broker = MemoryBroker::new();
    let publisher = broker
        .connect("publisher-1")
        .await
        .map_err(|err| format!("connect failed: {}", err))?;
    broker.kick("publisher-1", "test");
    let plan = PublishPlan {
        instance_id: 1,
        qos: QosLevel::AtMostOnce,
        delay_ms: 0,
        payload_size: 0,
        duration: Duration::from_secs(60),
    };
    let (_stop_tx, stop_rx) = watch::channel(false);
    let published = tokio::time::timeout(WAIT, run_publish_loop(&publisher.client, &plan, stop_rx))
        .await
        .map_err(|err| format!("Loop kept retrying: {}", err))?;
    if published != 0 {
        return Err(format!("Expected 0 messages, got {}", published));
    }
    Ok(())
}

async fn broadcast(
    client: &impl Transport,
    messages: &[ControlMessage],
) -> Result<(), String> {
    for message in messages {
        client
            .publish(message.topic(), message.encode(), QosLevel::AtMostOnce)
            .await
            .map_err(|err| format!("publish failed: {}", err))?;
    }
    Ok(())
}

#[tokio::test]
async fn fleet_publishes_only_selected_instances() -> Result<(), String> {
    let broker = MemoryBroker::new();
    let mut inbound = listener(&broker, "counter/#").await?;
    let coordinator = broker
        .connect("analyzer")
        .await
        .map_err(|err| format!("connect failed: {}", err))?;
    let (shutdown_tx, _) = shutdown_channel();

    let fleet_broker = broker.clone();
    let fleet_shutdown = shutdown_tx.clone();
    let fleet = tokio::spawn(async move {
        let ids = [1, 2, 3];
        run_fleet(&fleet_broker, &ids, RUN, &fleet_shutdown).await
    });
    for _ in 0..100 {
        let ready = ["publisher-1", "publisher-2", "publisher-3"]
            .iter()
            .all(|client_id| broker.subscriptions(client_id).len() == 5);
        if ready {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    broadcast(
        &coordinator.client,
        &[
            ControlMessage::Qos(QosLevel::AtMostOnce),
            ControlMessage::Delay(10),
            ControlMessage::MessageSize(4),
            ControlMessage::InstanceCount(2),
            ControlMessage::Go,
        ],
    )
    .await?;
    tokio::time::sleep(RUN.saturating_add(Duration::from_millis(60))).await;

    let seen = drain_sequences(&mut inbound)?;
    if seen.is_empty() {
        return Err("No data was published".to_owned());
    }
    if let Some((topic, _)) = seen
        .iter()
        .find(|(topic, _)| !topic.starts_with("counter/1/") && !topic.starts_with("counter/2/"))
    {
        return Err(format!("Unselected publisher sent on {}", topic));
    }
    if !seen.iter().any(|(topic, _)| topic.starts_with("counter/2/")) {
        return Err("Publisher 2 never published".to_owned());
    }

    if shutdown_tx.send(()).is_err() {
        return Err("Failed to send shutdown".to_owned());
    }
    tokio::time::timeout(WAIT, fleet)
        .await
        .map_err(|err| format!("Fleet ignored shutdown: {}", err))?
        .map_err(|err| format!("Fleet task failed: {}", err))?
        .map_err(|err| format!("Fleet failed: {}", err))?;
    if broker.session_count() != 2 {
        return Err(format!("Agents left {} sessions", broker.session_count()));
    }
    Ok(())
}

#[tokio::test]
async fn agent_reports_connection_loss() -> Result<(), String> {
    let broker = MemoryBroker::new();
    let connection = broker
        .connect("publisher-1")
        .await
        .map_err(|err| format!("connect failed: {}", err))?;
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let agent = tokio::spawn(PublisherAgent::new(1, RUN).run(connection, shutdown_rx));
    for _ in 0..100 {
        if broker.subscriptions("publisher-1").iter().any(|filter| filter == TOPIC_GO) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    broker.kick("publisher-1", "gone");
    let result = tokio::time::timeout(WAIT, agent)
        .await
        .map_err(|err| format!("Agent ignored disconnect: {}", err))?
        .map_err(|err| format!("Agent task failed: {}", err))?;
    drop(shutdown_tx);
    match result {
        Err(err) if err.is_transport() => Ok(()),
        other => Err(format!("Expected transport error, got {:?}", other.err())),
    }
}
