use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::debug;

use super::{Connection, Connector, InboundEvent, InboundSender, Transport, topic_matches};
use crate::domain::QosLevel;
use crate::error::TransportError;

struct Session {
    client_id: String,
    subscriptions: BTreeMap<String, QosLevel>,
    inbound_tx: InboundSender,
}

#[derive(Default)]
struct BrokerState {
    sessions: BTreeMap<u64, Session>,
    next_session: u64,
}

/// In-process broker with MQTT topic-filter fan-out.
///
/// Delivery is reliable and ordered per publisher, so every QoS level behaves
/// like exactly-once. Used by the `local` command and by tests.
#[derive(Clone, Default)]
pub struct MemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl MemoryBroker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BrokerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of attached sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }

    /// Filters currently held by the sessions of `client_id`.
    #[must_use]
    pub fn subscriptions(&self, client_id: &str) -> Vec<String> {
        self.lock()
            .sessions
            .values()
            .filter(|session| session.client_id == client_id)
            .flat_map(|session| session.subscriptions.keys().cloned())
            .collect()
    }

    /// Drops every session of `client_id`, telling it the connection was
    /// lost. Returns how many sessions were dropped.
    pub fn kick(&self, client_id: &str, reason: &str) -> usize {
        let mut state = self.lock();
        let ids: Vec<u64> = state
            .sessions
            .iter()
            .filter(|(_, session)| session.client_id == client_id)
            .map(|(id, _)| *id)
            .collect();
        for id in &ids {
            if let Some(session) = state.sessions.remove(id)
                && session
                    .inbound_tx
                    .send(InboundEvent::Disconnected {
                        reason: reason.to_owned(),
                    })
                    .is_err()
            {
                // Session owner already gone.
            }
        }
        ids.len()
    }

    fn route(&self, topic: &str, payload: &Bytes) {
        let state = self.lock();
        for session in state.sessions.values() {
            let subscribed = session
                .subscriptions
                .keys()
                .any(|filter| topic_matches(filter, topic));
            if subscribed
                && session
                    .inbound_tx
                    .send(InboundEvent::Message {
                        topic: topic.to_owned(),
                        payload: payload.clone(),
                    })
                    .is_err()
            {
                debug!("Dropping message for detached client {}", session.client_id);
            }
        }
    }
}

#[async_trait]
impl Connector for MemoryBroker {
    type Client = MemoryClient;

    async fn connect(&self, client_id: &str) -> Result<Connection<MemoryClient>, TransportError> {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let session_id = {
            let mut state = self.lock();
            let session_id = state.next_session;
            state.next_session = state.next_session.saturating_add(1);
            state.sessions.insert(
                session_id,
                Session {
                    client_id: client_id.to_owned(),
                    subscriptions: BTreeMap::new(),
                    inbound_tx,
                },
            );
            session_id
        };
        Ok(Connection {
            client: MemoryClient {
                broker: self.clone(),
                client_id: client_id.to_owned(),
                session_id,
            },
            inbound: inbound_rx,
        })
    }
}

/// Client handle for a [`MemoryBroker`] session.
pub struct MemoryClient {
    broker: MemoryBroker,
    client_id: String,
    session_id: u64,
}

impl MemoryClient {
    fn with_session<F>(&self, apply: F) -> Result<(), TransportError>
    where
        F: FnOnce(&mut Session),
    {
        let mut state = self.broker.lock();
        let session = state.sessions.get_mut(&self.session_id).ok_or_else(|| {
            TransportError::SessionClosed {
                client_id: self.client_id.clone(),
            }
        })?;
        apply(session);
        Ok(())
    }
}

#[async_trait]
impl Transport for MemoryClient {
    async fn subscribe(&self, filter: &str, qos: QosLevel) -> Result<(), TransportError> {
        self.with_session(|session| {
            session.subscriptions.insert(filter.to_owned(), qos);
        })
    }

    async fn unsubscribe(&self, filter: &str) -> Result<(), TransportError> {
        self.with_session(|session| {
            session.subscriptions.remove(filter);
        })
    }

    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        _qos: QosLevel,
    ) -> Result<(), TransportError> {
        self.with_session(|_| {})?;
        self.broker.route(topic, &Bytes::from(payload));
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.broker.lock().sessions.remove(&self.session_id);
        Ok(())
    }
}
