use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

#[async_trait]
pub trait ConnectionManager: Send + Sync {
    async fn add_connection(&self, session_id: String, sender: mpsc::UnboundedSender<String>);

    async fn remove_connection(&self, session_id: &str);

    async fn send_to_session(&self, session_id: &str, message: &str);

    async fn send_to_sessions(&self, session_ids: &[String], message: &str);
}

pub struct InMemoryConnectionManager {
    // session_id -> sender
    connections: Arc<RwLock<HashMap<String, mpsc::UnboundedSender<String>>>>,
}

impl Default for InMemoryConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl ConnectionManager for InMemoryConnectionManager {
    async fn add_connection(&self, session_id: String, sender: mpsc::UnboundedSender<String>) {
        let mut connections = self.connections.write().await;
        connections.insert(session_id, sender);
    }

    async fn remove_connection(&self, session_id: &str) {
        let mut connections = self.connections.write().await;
        connections.remove(session_id);
    }

    async fn send_to_session(&self, session_id: &str, message: &str) {
        let connections = self.connections.read().await;
        if let Some(sender) = connections.get(session_id) {
            if sender.send(message.to_string()).is_err() {
                // Receiver is gone; the disconnect path will clean up
                debug!(session_id = %session_id, "Send to closed session dropped");
            }
        }
    }

    async fn send_to_sessions(&self, session_ids: &[String], message: &str) {
        let connections = self.connections.read().await;
        for session_id in session_ids {
            if let Some(sender) = connections.get(session_id) {
                if sender.send(message.to_string()).is_err() {
                    debug!(session_id = %session_id, "Send to closed session dropped");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_to_registered_session() {
        let manager = InMemoryConnectionManager::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        manager.add_connection("s1".to_string(), tx).await;
        manager.send_to_session("s1", "hello").await;

        assert_eq!(rx.recv().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_send_to_unknown_session_is_silent() {
        let manager = InMemoryConnectionManager::new();
        // Must not panic or error
        manager.send_to_session("ghost", "hello").await;
    }

    #[tokio::test]
    async fn test_send_to_sessions_skips_removed() {
        let manager = InMemoryConnectionManager::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        manager.add_connection("s1".to_string(), tx1).await;
        manager.add_connection("s2".to_string(), tx2).await;
        manager.remove_connection("s2").await;

        manager
            .send_to_sessions(&["s1".to_string(), "s2".to_string()], "ping")
            .await;

        assert_eq!(rx1.recv().await.unwrap(), "ping");
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_to_dropped_receiver_is_silent() {
        let manager = InMemoryConnectionManager::new();
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        manager.add_connection("s1".to_string(), tx).await;
        // In-flight delivery racing a disconnect is dropped, not an error
        manager.send_to_session("s1", "late").await;
    }
}
