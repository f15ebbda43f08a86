//! Publish/subscribe transport seam.
//!
//! The coordinator and the publisher agents only talk to the broker through
//! [`Transport`] and [`Connector`]. Inbound traffic arrives as
//! [`InboundEvent`]s on an unbounded channel owned by whoever connected.
mod endpoint;
mod memory;
mod mqtt;
mod topic;


use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::domain::QosLevel;
use crate::error::TransportError;

pub use endpoint::{BrokerEndpoint, DEFAULT_MQTT_PORT};
pub use memory::{MemoryBroker, MemoryClient};
pub use mqtt::{MqttConnector, MqttTransport};
pub use topic::topic_matches;

/// Message or connection state change delivered by the transport.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    Message { topic: String, payload: Bytes },
    Disconnected { reason: String },
}

pub type InboundReceiver = mpsc::UnboundedReceiver<InboundEvent>;
pub type InboundSender = mpsc::UnboundedSender<InboundEvent>;

/// A connected client plus its inbound stream.
pub struct Connection<T> {
    pub client: T,
    pub inbound: InboundReceiver,
}

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Subscribes to a topic filter.
    ///
    /// # Errors
    ///
    /// Returns an error when the request cannot be handed to the broker.
    async fn subscribe(&self, filter: &str, qos: QosLevel) -> Result<(), TransportError>;

    /// Removes a previous subscription.
    ///
    /// # Errors
    ///
    /// Returns an error when the request cannot be handed to the broker.
    async fn unsubscribe(&self, filter: &str) -> Result<(), TransportError>;

    /// Publishes one message. Delivery beyond what `qos` promises is not
    /// awaited.
    ///
    /// # Errors
    ///
    /// Returns an error when the request cannot be handed to the broker.
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: QosLevel,
    ) -> Result<(), TransportError>;

    /// Closes the session.
    ///
    /// # Errors
    ///
    /// Returns an error when the disconnect request cannot be sent.
    async fn disconnect(&self) -> Result<(), TransportError>;
}

#[async_trait]
pub trait Connector: Send + Sync {
    type Client: Transport;

    /// Opens a new broker session for `client_id`.
    ///
    /// # Errors
    ///
    /// Returns an error when the broker cannot be reached or refuses the
    /// session.
    async fn connect(&self, client_id: &str) -> Result<Connection<Self::Client>, TransportError>;
}
