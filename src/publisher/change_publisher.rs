use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::store::models::EventModel;

type TopicMap = HashMap<String, broadcast::Sender<EventModel>>;

/// Fans out event snapshots to all listeners of an event-id topic
///
/// Stateless relay: it retains no snapshot history. `publish` is
/// fire-and-forget and never blocks on slow listeners; a subscriber that
/// arrives after a publish simply misses it and is expected to fetch the
/// current state when it starts watching.
///
/// The topic map lock is never held across an await point, so a plain
/// `std::sync::RwLock` suffices and lets `Subscription::drop` prune
/// synchronously.
#[derive(Debug, Clone)]
pub struct ChangePublisher {
    /// Per-event topic channels: event_id -> sender
    topics: Arc<RwLock<TopicMap>>,
    capacity: usize,
}

impl ChangePublisher {
    /// Creates a publisher whose topics buffer up to `capacity` snapshots
    /// per listener before lagging listeners start losing the oldest ones.
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Delivers `snapshot` to every current listener of the event's topic
    ///
    /// A topic with no listeners is a no-op. Subscriptions prune their topic
    /// entry when the last listener drops; the send-failure path below covers
    /// a listener that vanished while this publish held the map.
    pub async fn publish(&self, event_id: &str, snapshot: EventModel) {
        let send_result = {
            let topics = self.topics.read().unwrap();
            let Some(sender) = topics.get(event_id) else {
                debug!(event_id = %event_id, "No topic for event - nothing to deliver");
                return;
            };
            sender.send(snapshot)
        };

        match send_result {
            Ok(receiver_count) => {
                debug!(
                    event_id = %event_id,
                    receivers = receiver_count,
                    "Snapshot published"
                );
            }
            Err(_) => {
                // All receivers dropped since the topic was created
                debug!(event_id = %event_id, "Topic has no listeners - pruning");
                let mut topics = self.topics.write().unwrap();
                if let Some(sender) = topics.get(event_id) {
                    if sender.receiver_count() == 0 {
                        topics.remove(event_id);
                    }
                }
            }
        }
    }

    /// Opens a fresh, independent listener on the event's topic
    ///
    /// The returned subscription yields snapshots published after this call;
    /// there is no backfill. Dropping it releases the listener immediately
    /// and removes the topic entry if it was the last one, so watching an
    /// event id that is never published cannot grow the map.
    pub async fn subscribe(&self, event_id: &str) -> Subscription {
        let mut topics = self.topics.write().unwrap();
        let receiver = match topics.get(event_id) {
            Some(sender) => sender.subscribe(),
            None => {
                let (sender, receiver) = broadcast::channel(self.capacity);
                topics.insert(event_id.to_string(), sender);
                receiver
            }
        };
        drop(topics);

        Subscription {
            event_id: event_id.to_string(),
            receiver: Some(receiver),
            topics: Arc::clone(&self.topics),
        }
    }

    /// Number of live listeners on an event's topic (zero if no topic)
    pub async fn listener_count(&self, event_id: &str) -> usize {
        let topics = self.topics.read().unwrap();
        topics
            .get(event_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

/// A live listener on one event's topic
///
/// Infinite sequence of snapshots; ends only when the subscription is
/// dropped. If the listener falls behind the channel capacity it skips the
/// lost (older) snapshots and resumes at the newest available one, so a
/// listener never observes an older snapshot after a newer one.
pub struct Subscription {
    event_id: String,
    /// Present until drop; taken there so the count check excludes it
    receiver: Option<broadcast::Receiver<EventModel>>,
    topics: Arc<RwLock<TopicMap>>,
}

impl Subscription {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    /// Waits for the next snapshot; `None` means the topic was torn down
    pub async fn recv(&mut self) -> Option<EventModel> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(snapshot) => return Some(snapshot),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        event_id = %self.event_id,
                        skipped = skipped,
                        "Subscription lagged - resuming at newest snapshot"
                    );
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Release our receiver first so the count below no longer sees it
        self.receiver = None;

        let Ok(mut topics) = self.topics.write() else {
            return;
        };
        if let Some(sender) = topics.get(&self.event_id) {
            if sender.receiver_count() == 0 {
                debug!(event_id = %self.event_id, "Last listener gone - pruning topic");
                topics.remove(&self.event_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn snapshot(name: &str) -> EventModel {
        EventModel::new(name.to_string(), "here".to_string(), Utc::now())
    }

    fn topic_exists(publisher: &ChangePublisher, event_id: &str) -> bool {
        publisher.topics.read().unwrap().contains_key(event_id)
    }

    #[tokio::test]
    async fn test_subscriber_receives_published_snapshot() {
        let publisher = ChangePublisher::new(8);
        let mut subscription = publisher.subscribe("e1").await;

        let event = snapshot("Tech Meetup");
        publisher.publish("e1", event.clone()).await;

        let received = subscription.recv().await.unwrap();
        assert_eq!(received, event);
    }

    #[tokio::test]
    async fn test_no_backfill_for_late_subscriber() {
        let publisher = ChangePublisher::new(8);
        let mut early = publisher.subscribe("e1").await;

        publisher.publish("e1", snapshot("first")).await;

        let mut late = publisher.subscribe("e1").await;
        publisher.publish("e1", snapshot("second")).await;

        // Early listener sees both; late listener only the second
        assert_eq!(early.recv().await.unwrap().name, "first");
        assert_eq!(early.recv().await.unwrap().name, "second");
        assert_eq!(late.recv().await.unwrap().name, "second");
    }

    #[tokio::test]
    async fn test_topics_are_independent() {
        let publisher = ChangePublisher::new(8);
        let mut sub_a = publisher.subscribe("a").await;
        let _sub_b = publisher.subscribe("b").await;

        publisher.publish("a", snapshot("only-a")).await;

        assert_eq!(sub_a.recv().await.unwrap().name, "only-a");
        assert_eq!(publisher.listener_count("b").await, 1);
    }

    #[tokio::test]
    async fn test_drop_releases_listener_and_prunes_topic() {
        let publisher = ChangePublisher::new(8);

        let subscription = publisher.subscribe("e1").await;
        assert_eq!(publisher.listener_count("e1").await, 1);

        drop(subscription);
        assert_eq!(publisher.listener_count("e1").await, 0);
        assert!(!topic_exists(&publisher, "e1"));

        // Publishing after the prune must remain a silent no-op
        publisher.publish("e1", snapshot("nobody home")).await;
        assert!(!topic_exists(&publisher, "e1"));
    }

    #[tokio::test]
    async fn test_dropped_listener_prunes_topic_without_publish() {
        let publisher = ChangePublisher::new(8);

        // An id nothing ever publishes to, e.g. a watch of a garbage event id
        let subscription = publisher.subscribe("no-such-event").await;
        assert!(topic_exists(&publisher, "no-such-event"));

        drop(subscription);
        assert!(!topic_exists(&publisher, "no-such-event"));
    }

    #[tokio::test]
    async fn test_repeated_unpublished_subscribes_leave_empty_map() {
        let publisher = ChangePublisher::new(8);

        for i in 0..50 {
            let subscription = publisher.subscribe(&format!("garbage-{}", i)).await;
            drop(subscription);
        }

        assert!(publisher.topics.read().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_topic_survives_while_other_listeners_remain() {
        let publisher = ChangePublisher::new(8);
        let first = publisher.subscribe("e1").await;
        let mut second = publisher.subscribe("e1").await;

        drop(first);
        assert!(topic_exists(&publisher, "e1"));

        publisher.publish("e1", snapshot("still delivered")).await;
        assert_eq!(second.recv().await.unwrap().name, "still delivered");
    }

    #[tokio::test]
    async fn test_publish_without_topic_is_noop() {
        let publisher = ChangePublisher::new(8);
        publisher.publish("never-subscribed", snapshot("x")).await;
        assert_eq!(publisher.listener_count("never-subscribed").await, 0);
    }

    #[tokio::test]
    async fn test_lagged_listener_skips_to_newer_snapshots() {
        let publisher = ChangePublisher::new(2);
        let mut subscription = publisher.subscribe("e1").await;

        for i in 0..5 {
            publisher.publish("e1", snapshot(&format!("v{}", i))).await;
        }

        // Capacity 2: v0..v2 were dropped; the listener resumes at v3
        assert_eq!(subscription.recv().await.unwrap().name, "v3");
        assert_eq!(subscription.recv().await.unwrap().name, "v4");
    }

    #[tokio::test]
    async fn test_each_subscription_is_independent() {
        let publisher = ChangePublisher::new(8);
        let mut first = publisher.subscribe("e1").await;
        let mut second = publisher.subscribe("e1").await;

        publisher.publish("e1", snapshot("shared")).await;

        assert_eq!(first.recv().await.unwrap().name, "shared");
        assert_eq!(second.recv().await.unwrap().name, "shared");
    }
}
