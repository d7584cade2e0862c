//! Client events.
//!
//! Every change to observable state is announced on a broadcast channel so a
//! UI can re-read the parts it renders instead of polling.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::state::SendState;

/// A change to client state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// The cached conversation list changed.
    ConversationsChanged {
        conversations: Vec<String>,
    },
    /// The turns of a conversation changed.
    TurnsChanged { conversation_id: String },
    /// A conversation moved between `Idle` and `Pending`.
    SendStateChanged {
        conversation_id: String,
        state: SendState,
    },
    /// The cached pre-prompt of a conversation changed.
    PrePromptChanged { conversation_id: String },
    /// A pre-prompt update finished, whether or not the server accepted it.
    PrePromptUpdated {
        conversation_id: String,
        acknowledged: bool,
    },
}

/// Sending half of the event channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: broadcast::Sender<ClientEvent>,
}

impl EventSender {
    /// Create a channel holding at most `capacity` undelivered events per receiver.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.sender.subscribe()
    }

    /// Emit an event. Having no subscribers is not an error.
    pub fn emit(&self, event: ClientEvent) {
        let _ = self.sender.send(event);
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
