//! Progress channel
//!
//! In-process pub/sub for live import progress. The registry is dependency
//! injected through [`crate::server::AppState`] rather than living in a
//! global, and it is the only shared mutable state in the service.
//!
//! Each session has at most one subscriber and one publisher; publishing to
//! a session nobody watches returns `false` and drops the event. A
//! subscription removes its registry entry on drop, so a disconnecting SSE
//! consumer deterministically releases the session.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use chrono::{DateTime, Utc};
use futures::Stream;
use serde::Serialize;
use tokio::sync::mpsc;
use utoipa::ToSchema;
use uuid::Uuid;

/// One progress message, ordered by emission, never persisted.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProgressEvent {
    /// Event discriminator: connected, info, user_started, user_completed,
    /// event_skipped, error, completed
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable status line
    pub message: String,
    /// Pipeline stage the orchestrator was in when it emitted the event
    pub stage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shifts_imported: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signups_imported: Option<u32>,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn new(kind: &str, stage: &str, message: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            message: message.into(),
            stage: stage.to_string(),
            shifts_imported: None,
            signups_imported: None,
            timestamp: Utc::now(),
        }
    }

    /// Acknowledgement sent to a subscriber the moment it attaches.
    pub fn connected() -> Self {
        Self::new("connected", "connected", "Progress stream connected")
    }

    pub fn info(stage: &str, message: impl Into<String>) -> Self {
        Self::new("info", stage, message)
    }

    pub fn error(stage: &str, message: impl Into<String>) -> Self {
        Self::new("error", stage, message)
    }

    pub fn with_counts(mut self, shifts: u32, signups: u32) -> Self {
        self.shifts_imported = Some(shifts);
        self.signups_imported = Some(signups);
        self
    }
}

struct SessionSlot {
    token: Uuid,
    sender: mpsc::UnboundedSender<ProgressEvent>,
}

/// Registry of active progress sessions.
#[derive(Default)]
pub struct ProgressRegistry {
    sessions: Mutex<HashMap<String, SessionSlot>>,
}

impl ProgressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a subscriber to `session_id`, replacing any previous one (at
    /// most one active subscriber per session). The returned subscription
    /// yields every event published after this call.
    pub fn subscribe(self: &Arc<Self>, session_id: &str) -> ProgressSubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let token = Uuid::new_v4();

        let mut sessions = self.sessions.lock().expect("progress registry poisoned");
        sessions.insert(
            session_id.to_string(),
            SessionSlot { token, sender },
        );

        ProgressSubscription {
            session_id: session_id.to_string(),
            token,
            registry: Arc::clone(self),
            receiver,
        }
    }

    /// Publish an event to the session's subscriber. Returns `false` when
    /// the session has no live subscriber, which is a signal, not an error.
    pub fn publish(&self, session_id: &str, event: ProgressEvent) -> bool {
        let mut sessions = self.sessions.lock().expect("progress registry poisoned");

        match sessions.get(session_id) {
            Some(slot) => {
                if slot.sender.send(event).is_ok() {
                    true
                } else {
                    // Receiver dropped without the Drop cleanup having run
                    // yet; reap the dead slot now.
                    sessions.remove(session_id);
                    false
                }
            }
            None => false,
        }
    }

    /// Number of sessions with a registered subscriber.
    pub fn active_sessions(&self) -> usize {
        self.sessions.lock().expect("progress registry poisoned").len()
    }

    fn remove(&self, session_id: &str, token: Uuid) {
        let mut sessions = self.sessions.lock().expect("progress registry poisoned");
        // Only remove our own registration: a replacement subscriber may
        // have taken the session over since.
        if sessions.get(session_id).is_some_and(|slot| slot.token == token) {
            sessions.remove(session_id);
        }
    }
}

/// Live subscription to one session's progress events.
///
/// Dropping the subscription (the SSE connection closing) unregisters the
/// session; in-flight orchestrator work is unaffected and later publishes
/// simply return `false`.
pub struct ProgressSubscription {
    session_id: String,
    token: Uuid,
    registry: Arc<ProgressRegistry>,
    receiver: mpsc::UnboundedReceiver<ProgressEvent>,
}

impl Stream for ProgressSubscription {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for ProgressSubscription {
    fn drop(&mut self) {
        self.registry.remove(&self.session_id, self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn publish_without_subscriber_reports_absence() {
        let registry = Arc::new(ProgressRegistry::new());
        assert!(!registry.publish("nobody", ProgressEvent::info("setup", "hello")));
    }

    #[tokio::test]
    async fn events_arrive_in_publish_order() {
        let registry = Arc::new(ProgressRegistry::new());
        let mut subscription = registry.subscribe("session-1");

        for i in 0..3 {
            assert!(registry.publish("session-1", ProgressEvent::info("importing", format!("step {}", i))));
        }

        for i in 0..3 {
            let event = subscription.next().await.unwrap();
            assert_eq!(event.message, format!("step {}", i));
        }
    }

    #[tokio::test]
    async fn distinct_sessions_do_not_interfere() {
        let registry = Arc::new(ProgressRegistry::new());
        let mut first = registry.subscribe("session-1");
        let mut second = registry.subscribe("session-2");

        registry.publish("session-1", ProgressEvent::info("importing", "for first"));
        registry.publish("session-2", ProgressEvent::info("importing", "for second"));

        assert_eq!(first.next().await.unwrap().message, "for first");
        assert_eq!(second.next().await.unwrap().message, "for second");
    }

    #[tokio::test]
    async fn drop_unregisters_the_session() {
        let registry = Arc::new(ProgressRegistry::new());
        let subscription = registry.subscribe("session-1");
        assert_eq!(registry.active_sessions(), 1);

        drop(subscription);
        assert_eq!(registry.active_sessions(), 0);
        assert!(!registry.publish("session-1", ProgressEvent::info("importing", "late")));
    }

    #[tokio::test]
    async fn resubscribe_replaces_previous_subscriber() {
        let registry = Arc::new(ProgressRegistry::new());
        let stale = registry.subscribe("session-1");
        let mut fresh = registry.subscribe("session-1");
        assert_eq!(registry.active_sessions(), 1);

        // Dropping the stale subscription must not evict the fresh one.
        drop(stale);
        assert_eq!(registry.active_sessions(), 1);

        assert!(registry.publish("session-1", ProgressEvent::info("importing", "hello")));
        assert_eq!(fresh.next().await.unwrap().message, "hello");
    }

    #[test]
    fn serialized_event_uses_type_discriminator() {
        let event = ProgressEvent::info("importing", "Imported shift").with_counts(2, 3);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "info");
        assert_eq!(json["stage"], "importing");
        assert_eq!(json["shifts_imported"], 2);
        assert_eq!(json["signups_imported"], 3);
        assert!(json["timestamp"].is_string());
    }
}
