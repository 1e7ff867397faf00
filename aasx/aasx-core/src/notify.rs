//! Structural change notifications.
//!
//! Edits publish a [`ChangeEvent`] per affected referable on a
//! `tokio::sync::broadcast` channel. Subscribers (tree views, undo logs)
//! keep their own history; the notifier retains none.
//!
//! # Example
//!
//! ```no_run
//! use aasx_core::model::IdentifiableHandle;
//! use aasx_core::notify::{ChangeEvent, ChangeKind, ChangeNotifier};
//!
//! # async fn example() {
//! let notifier = ChangeNotifier::new(64);
//! let mut receiver = notifier.subscribe();
//!
//! notifier.emit(ChangeEvent::identifiable(
//!     IdentifiableHandle::submodel("sm-1"),
//!     ChangeKind::Create,
//! ));
//!
//! while let Ok(event) = receiver.recv().await {
//!     println!("{:?} {}", event.kind, event.target.owner);
//! }
//! # }
//! ```

use crate::model::IdentifiableHandle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, trace};
use uuid::Uuid;

/// Default capacity of the broadcast buffer
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// What happened to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Create,
    UpdateValue,
    StructChange,
    Delete,
}

/// The referable a change applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeTarget {
    pub owner: IdentifiableHandle,
    /// idShort path below the owner; empty for the identifiable itself
    pub path: Vec<String>,
}

/// A single change record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub target: ChangeTarget,
    pub kind: ChangeKind,
    /// Whether every descendant of the target is affected
    pub all_descendants: bool,
}

impl ChangeEvent {
    pub fn new(target: ChangeTarget, kind: ChangeKind, all_descendants: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            target,
            kind,
            all_descendants,
        }
    }

    /// Event on an identifiable as a whole.
    pub fn identifiable(owner: IdentifiableHandle, kind: ChangeKind) -> Self {
        let all_descendants = matches!(kind, ChangeKind::Create | ChangeKind::Delete);
        Self::new(
            ChangeTarget {
                owner,
                path: Vec::new(),
            },
            kind,
            all_descendants,
        )
    }

    /// Event on an element below an identifiable.
    pub fn element(owner: IdentifiableHandle, path: Vec<String>, kind: ChangeKind) -> Self {
        let all_descendants = matches!(kind, ChangeKind::Create | ChangeKind::Delete);
        Self::new(ChangeTarget { owner, path }, kind, all_descendants)
    }
}

/// Fan-out of change events to any number of subscribers.
#[derive(Clone)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<ChangeEvent>,
    sent: Arc<AtomicU64>,
}

impl ChangeNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            sent: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        debug!(
            "New change subscriber ({} active)",
            self.sender.receiver_count() + 1
        );
        self.sender.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn emit(&self, event: ChangeEvent) {
        trace!("{:?} on {} {:?}", event.kind, event.target.owner, event.target.path);
        self.sent.fetch_add(1, Ordering::Relaxed);
        if self.sender.send(event).is_err() {
            trace!("Change event dropped: no subscribers");
        }
    }

    pub fn emit_all(&self, events: impl IntoIterator<Item = ChangeEvent>) {
        for event in events {
            self.emit(event);
        }
    }

    /// Number of events emitted so far.
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.sender.receiver_count())
            .field("sent", &self.sent_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let notifier = ChangeNotifier::new(8);
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();

        notifier.emit(ChangeEvent::identifiable(
            IdentifiableHandle::submodel("sm-1"),
            ChangeKind::StructChange,
        ));

        let a = first.recv().await.unwrap();
        let b = second.recv().await.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.kind, ChangeKind::StructChange);
        assert!(!a.all_descendants);
    }

    #[test]
    fn test_emit_without_subscribers() {
        let notifier = ChangeNotifier::default();
        notifier.emit(ChangeEvent::identifiable(
            IdentifiableHandle::shell("aas-1"),
            ChangeKind::Delete,
        ));
        assert_eq!(notifier.sent_count(), 1);
    }
}
