//! Live broadcast hub
//!
//! Fan-out of alert events to connected dashboard observers. The hub owns
//! the only registry of open connections; websocket handlers register a
//! channel sender and forward whatever arrives on it to their socket.

use std::collections::HashMap;
use std::sync::Mutex;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::AppState;

pub type ObserverId = Uuid;

pub struct Hub {
    connections: Mutex<HashMap<ObserverId, mpsc::UnboundedSender<String>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }

    pub fn register(&self, sender: mpsc::UnboundedSender<String>) -> ObserverId {
        let id = Uuid::new_v4();
        let mut connections = self.connections.lock().unwrap();
        connections.insert(id, sender);
        tracing::info!(
            "Observer {} connected. Total connections: {}",
            id,
            connections.len()
        );
        id
    }

    pub fn unregister(&self, id: ObserverId) {
        let mut connections = self.connections.lock().unwrap();
        if connections.remove(&id).is_some() {
            tracing::info!(
                "Observer {} disconnected. Total connections: {}",
                id,
                connections.len()
            );
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().unwrap().len()
    }

    /// Best-effort fan-out to every registered observer.
    ///
    /// A failed delivery prunes that connection and never interrupts
    /// delivery to the rest, nor reaches the caller.
    pub fn publish(&self, event: &serde_json::Value) {
        let payload = event.to_string();
        let mut connections = self.connections.lock().unwrap();

        let mut dead: Vec<ObserverId> = Vec::new();
        for (id, sender) in connections.iter() {
            if sender.send(payload.clone()).is_err() {
                tracing::warn!("Failed to deliver event to observer {}; pruning", id);
                dead.push(*id);
            }
        }

        for id in dead {
            connections.remove(&id);
        }
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

/// Websocket endpoint for the live dashboard.
pub async fn websocket_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| observe(socket, state))
}

/// Register the socket with the hub and pump events to it until either
/// side goes away.
async fn observe(mut socket: WebSocket, state: AppState) {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let id = state.hub.register(tx);

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Some(payload) => {
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    // Hub pruned this connection.
                    None => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    // Observers only listen; inbound frames keep the
                    // connection alive and are otherwise ignored.
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                }
            }
        }
    }

    state.hub.unregister(id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_all_observers() {
        let hub = Hub::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        hub.register(tx_a);
        hub.register(tx_b);

        hub.publish(&serde_json::json!({"type": "new_alert", "payload": {"risk_score": 99}}));

        let got_a = rx_a.recv().await.unwrap();
        let got_b = rx_b.recv().await.unwrap();
        assert!(got_a.contains("new_alert"));
        assert_eq!(got_a, got_b);
    }

    #[tokio::test]
    async fn test_failed_delivery_prunes_only_the_dead_connection() {
        let hub = Hub::new();
        let (tx_live, mut rx_live) = mpsc::unbounded_channel();
        let (tx_dead, rx_dead) = mpsc::unbounded_channel();
        hub.register(tx_live);
        hub.register(tx_dead);
        drop(rx_dead);

        hub.publish(&serde_json::json!({"type": "new_alert"}));

        // Live observer still receives, dead one is pruned.
        assert!(rx_live.recv().await.is_some());
        assert_eq!(hub.connection_count(), 1);

        // Subsequent publishes keep working.
        hub.publish(&serde_json::json!({"type": "new_alert"}));
        assert!(rx_live.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_unregister_removes_connection() {
        let hub = Hub::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register(tx);
        assert_eq!(hub.connection_count(), 1);

        hub.unregister(id);
        assert_eq!(hub.connection_count(), 0);

        hub.publish(&serde_json::json!({"type": "new_alert"}));
        // Sender was dropped on unregister, so the channel is closed.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_publish_with_no_observers_is_a_noop() {
        let hub = Hub::new();
        hub.publish(&serde_json::json!({"type": "new_alert"}));
        assert_eq!(hub.connection_count(), 0);
    }
}
