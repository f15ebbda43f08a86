use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::debug;

use super::{Connection, Connector, InboundEvent, InboundSender, Transport};
use crate::domain::QosLevel;
use crate::error::TransportError;

const MQTT_KEEPALIVE: Duration = Duration::from_secs(60);
/// Pending requests buffered between the client handle and the event loop.
const REQUEST_CHANNEL_CAPACITY: usize = 1024;
/// Time the event loop gets to flush the DISCONNECT packet.
const DISCONNECT_GRACE: Duration = Duration::from_millis(500);

impl From<QosLevel> for QoS {
    fn from(value: QosLevel) -> Self {
        match value {
            QosLevel::AtMostOnce => QoS::AtMostOnce,
            QosLevel::AtLeastOnce => QoS::AtLeastOnce,
            QosLevel::ExactlyOnce => QoS::ExactlyOnce,
        }
    }
}

/// Opens MQTT 3.1.1 sessions against one broker.
#[derive(Debug, Clone)]
pub struct MqttConnector {
    host: String,
    port: u16,
    connect_timeout: Duration,
}

impl MqttConnector {
    #[must_use]
    pub const fn new(host: String, port: u16, connect_timeout: Duration) -> Self {
        Self {
            host,
            port,
            connect_timeout,
        }
    }

    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[async_trait]
impl Connector for MqttConnector {
    type Client = MqttTransport;

    async fn connect(&self, client_id: &str) -> Result<Connection<MqttTransport>, TransportError> {
        let mut options = MqttOptions::new(client_id, self.host.clone(), self.port);
        options.set_keep_alive(MQTT_KEEPALIVE);
        options.set_clean_session(true);
        let (client, mut event_loop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);

        match timeout(self.connect_timeout, wait_for_connack(&mut event_loop)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                return Err(TransportError::Connect {
                    addr: self.addr(),
                    reason: err.to_string(),
                });
            }
            Err(_) => {
                return Err(TransportError::ConnectTimeout {
                    addr: self.addr(),
                    timeout_ms: u64::try_from(self.connect_timeout.as_millis())
                        .unwrap_or(u64::MAX),
                });
            }
        }
        debug!("Client {} connected to {}", client_id, self.addr());

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let driver = tokio::spawn(drive_event_loop(
            event_loop,
            inbound_tx,
            client_id.to_owned(),
        ));
        Ok(Connection {
            client: MqttTransport {
                client,
                driver: Mutex::new(Some(driver)),
            },
            inbound: inbound_rx,
        })
    }
}

async fn wait_for_connack(event_loop: &mut EventLoop) -> Result<(), rumqttc::ConnectionError> {
    loop {
        if let Event::Incoming(Packet::ConnAck(_)) = event_loop.poll().await? {
            return Ok(());
        }
    }
}

async fn drive_event_loop(mut event_loop: EventLoop, inbound_tx: InboundSender, client_id: String) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let event = InboundEvent::Message {
                    topic: publish.topic,
                    payload: publish.payload,
                };
                if inbound_tx.send(event).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(err) => {
                debug!("Client {} event loop ended: {}", client_id, err);
                if inbound_tx
                    .send(InboundEvent::Disconnected {
                        reason: err.to_string(),
                    })
                    .is_err()
                {
                    // Receiver already gone.
                }
                break;
            }
        }
    }
}

/// Client half of an MQTT session. The event loop runs on its own task.
pub struct MqttTransport {
    client: AsyncClient,
    driver: Mutex<Option<JoinHandle<()>>>,
}

#[async_trait]
impl Transport for MqttTransport {
    async fn subscribe(&self, filter: &str, qos: QosLevel) -> Result<(), TransportError> {
        self.client
            .subscribe(filter, qos.into())
            .await
            .map_err(|err| TransportError::Subscribe {
                filter: filter.to_owned(),
                reason: err.to_string(),
            })
    }

    async fn unsubscribe(&self, filter: &str) -> Result<(), TransportError> {
        self.client
            .unsubscribe(filter)
            .await
            .map_err(|err| TransportError::Unsubscribe {
                filter: filter.to_owned(),
                reason: err.to_string(),
            })
    }

    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: QosLevel,
    ) -> Result<(), TransportError> {
        self.client
            .publish(topic, qos.into(), false, payload)
            .await
            .map_err(|err| TransportError::Publish {
                topic: topic.to_owned(),
                reason: err.to_string(),
            })
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let result = self
            .client
            .disconnect()
            .await
            .map_err(|err| TransportError::Disconnect {
                reason: err.to_string(),
            });
        let driver = self
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut driver) = driver
            && timeout(DISCONNECT_GRACE, &mut driver).await.is_err()
        {
            driver.abort();
        }
        result
    }
}

impl Drop for MqttTransport {
    fn drop(&mut self) {
        if let Some(driver) = self
            .driver
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            driver.abort();
        }
    }
}
