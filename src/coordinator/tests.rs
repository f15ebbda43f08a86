use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use super::{ANALYZER_CLIENT_ID, Coordinator, RunExecutor};
use crate::domain::{QosLevel, RunParameters, RunTimings, StreamShape};
use crate::error::TransportError;
use crate::protocol::{DataMessage, TOPIC_GO, data_topic};
use crate::transport::{Connection, Connector, InboundEvent, MemoryBroker, MemoryClient, Transport};

fn fast_timings() -> RunTimings {
    RunTimings {
        settle: Duration::from_millis(20),
        run_duration: Duration::from_millis(100),
        buffer: Duration::from_millis(50),
        cooldown: Duration::from_millis(10),
    }
}

fn params(delay_ms: u64) -> RunParameters {
    RunParameters {
        publish_qos: QosLevel::AtMostOnce,
        subscribe_qos: QosLevel::AtLeastOnce,
        delay_ms,
        payload_size: 8,
        publisher_count: NonZeroU32::MIN,
    }
}

/// Waits for the start trigger, then sends `sequences` for publisher 1 plus
/// one message under a foreign shape.
async fn scripted_publisher(
    broker: &MemoryBroker,
    shape: StreamShape,
    sequences: Vec<u64>,
) -> Result<JoinHandle<Result<(), String>>, String> {
    let mut conn = broker
        .connect("publisher-1")
        .await
        .map_err(|err| format!("connect failed: {}", err))?;
    conn.client
        .subscribe(TOPIC_GO, QosLevel::AtMostOnce)
        .await
        .map_err(|err| format!("subscribe failed: {}", err))?;
    Ok(tokio::spawn(async move {
        match conn.inbound.recv().await {
            Some(InboundEvent::Message { .. }) => {}
            other => return Err(format!("Unexpected event: {:?}", other)),
        }
        let topic = data_topic(1, &shape);
        for (offset, sequence) in sequences.into_iter().enumerate() {
            let ts = 1_000 + 10 * u64::try_from(offset).map_err(|err| err.to_string())?;
            conn.client
                .publish(
                    &topic,
                    DataMessage::new(sequence, ts).encode(shape.payload_size),
                    shape.qos,
                )
                .await
                .map_err(|err| format!("publish failed: {}", err))?;
        }
        let foreign = StreamShape {
            delay_ms: shape.delay_ms.saturating_add(1),
            ..shape
        };
        conn.client
            .publish(
                &data_topic(1, &foreign),
                DataMessage::new(99, 5).encode(0),
                shape.qos,
            )
            .await
            .map_err(|err| format!("publish failed: {}", err))?;
        Ok(())
    }))
}

async fn connect_coordinator(
    broker: &MemoryBroker,
) -> Result<Coordinator<MemoryClient>, String> {
    Coordinator::connect(broker, fast_timings())
        .await
        .map_err(|err| format!("coordinator connect failed: {}", err))
}

#[tokio::test]
async fn run_once_records_scoped_traffic() -> Result<(), String> {
    let broker = MemoryBroker::new();
    let mut coordinator = connect_coordinator(&broker).await?;
    let run = params(0);
    let publisher = scripted_publisher(&broker, run.shape(), vec![0, 1, 1, 2, 4]).await?;

    let sys = broker
        .connect("sys-feed")
        .await
        .map_err(|err| format!("connect failed: {}", err))?;
    sys.client
        .publish("$SYS/broker/clients/connected", b"3".to_vec(), QosLevel::AtMostOnce)
        .await
        .map_err(|err| format!("publish failed: {}", err))?;

    let record = coordinator
        .run_once(run)
        .await
        .map_err(|err| format!("run failed: {}", err))?;
    publisher
        .await
        .map_err(|err| format!("publisher task failed: {}", err))??;

    let publisher_metrics = record.publishers.first().ok_or("missing publisher metrics")?;
    if record.publishers.len() != 1 || publisher_metrics.publisher_id != 1 {
        return Err(format!("Unexpected publishers: {:?}", record.publishers));
    }
    if publisher_metrics.received_count != 5 || publisher_metrics.actual_count != 4 {
        return Err(format!("Foreign traffic leaked in: {:?}", publisher_metrics));
    }
    if (record.metrics.avg_duplicates - 20.0).abs() > 1e-9 {
        return Err(format!("Unexpected duplicates: {}", record.metrics.avg_duplicates));
    }
    if (record.metrics.avg_message_loss - 20.0).abs() > 1e-9 {
        return Err(format!("Unexpected loss: {}", record.metrics.avg_message_loss));
    }
    if record.metrics.message_rate <= 0.0 {
        return Err("Expected a positive message rate".to_owned());
    }
    if !record.sys_metrics.contains_key("$SYS/broker/clients/connected") {
        return Err("Sys metrics missing".to_owned());
    }
    Ok(())
}

#[tokio::test]
async fn consecutive_runs_replace_the_data_subscription() -> Result<(), String> {
    let broker = MemoryBroker::new();
    let mut coordinator = connect_coordinator(&broker).await?;
    coordinator
        .run_once(params(0))
        .await
        .map_err(|err| format!("first run failed: {}", err))?;
    coordinator
        .run_once(params(100))
        .await
        .map_err(|err| format!("second run failed: {}", err))?;

    let mut filters = broker.subscriptions(ANALYZER_CLIENT_ID);
    filters.sort();
    let expected = vec!["$SYS/#".to_owned(), "counter/+/0/100/8".to_owned()];
    if filters != expected {
        return Err(format!("Unexpected subscriptions: {:?}", filters));
    }
    Ok(())
}

#[tokio::test]
async fn connection_loss_aborts_the_run() -> Result<(), String> {
    let broker = MemoryBroker::new();
    let mut coordinator = connect_coordinator(&broker).await?;
    let kicker = broker.clone();
    let kick = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(40)).await;
        kicker.kick(ANALYZER_CLIENT_ID, "broker went away")
    });
    let result = coordinator.run_once(params(0)).await;
    kick.await.map_err(|err| format!("kick task failed: {}", err))?;
    match result {
        Err(err) if err.is_transport() => Ok(()),
        Err(err) => Err(format!("Unexpected error kind: {}", err)),
        Ok(_) => Err("Run should fail after the connection is lost".to_owned()),
    }
}

#[tokio::test]
async fn broadcasts_parameters_before_go() -> Result<(), String> {
    let broker = MemoryBroker::new();
    let mut coordinator = connect_coordinator(&broker).await?;
    let mut listener = broker
        .connect("listener")
        .await
        .map_err(|err| format!("connect failed: {}", err))?;
    listener
        .client
        .subscribe("request/#", QosLevel::AtMostOnce)
        .await
        .map_err(|err| format!("subscribe failed: {}", err))?;

    coordinator
        .run_once(params(100))
        .await
        .map_err(|err| format!("run failed: {}", err))?;

    let mut seen = Vec::new();
    while let Ok(InboundEvent::Message { topic, payload }) = listener.inbound.try_recv() {
        seen.push(format!("{}={}", topic, String::from_utf8_lossy(&payload)));
    }
    let expected = vec![
        "request/qos=0",
        "request/delay=100",
        "request/messagesize=8",
        "request/instancecount=1",
        "request/go=1",
    ];
    if seen != expected {
        return Err(format!("Unexpected broadcast order: {:?}", seen));
    }
    Ok(())
}

/// Memory client whose start trigger takes `go_delay` to be handed over.
struct SlowGoClient {
    inner: MemoryClient,
    go_delay: Duration,
}

#[async_trait]
impl Transport for SlowGoClient {
    async fn subscribe(&self, filter: &str, qos: QosLevel) -> Result<(), TransportError> {
        self.inner.subscribe(filter, qos).await
    }

    async fn unsubscribe(&self, filter: &str) -> Result<(), TransportError> {
        self.inner.unsubscribe(filter).await
    }

    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: QosLevel,
    ) -> Result<(), TransportError> {
        if topic == TOPIC_GO {
            tokio::time::sleep(self.go_delay).await;
        }
        self.inner.publish(topic, payload, qos).await
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.inner.disconnect().await
    }
}

#[tokio::test]
async fn run_window_is_timed_from_the_start_broadcast() -> Result<(), String> {
    let broker = MemoryBroker::new();
    let timings = RunTimings {
        settle: Duration::from_millis(10),
        run_duration: Duration::from_millis(100),
        buffer: Duration::from_millis(50),
        cooldown: Duration::from_millis(10),
    };
    let connection = broker
        .connect(ANALYZER_CLIENT_ID)
        .await
        .map_err(|err| format!("connect failed: {}", err))?;
    let Connection { client, inbound } = connection;
    let slow = Connection {
        client: SlowGoClient {
            inner: client,
            go_delay: Duration::from_millis(300),
        },
        inbound,
    };
    let mut coordinator = Coordinator::new(slow, timings);
    let run = params(0);
    let publisher = scripted_publisher(&broker, run.shape(), vec![0, 1, 2, 3]).await?;

    let record = coordinator
        .run_once(run)
        .await
        .map_err(|err| format!("run failed: {}", err))?;
    publisher
        .await
        .map_err(|err| format!("publisher task failed: {}", err))??;

    // 4 messages in a 150ms window, measured after the 300ms start broadcast.
    if record.metrics.message_rate <= 4.0 / 0.3 {
        return Err(format!(
            "Elapsed time included the start broadcast: rate {}",
            record.metrics.message_rate
        ));
    }
    Ok(())
}
