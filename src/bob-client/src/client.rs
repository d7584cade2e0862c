//! Conversation session client.
//!
//! [`ConversationClient`] owns the local view of every conversation the UI has
//! touched and keeps it consistent with what the server confirmed. Reads that
//! only hydrate state (listing, fetching, pre-prompt lookup) degrade to
//! defaults; writes the user initiated (create, send, delete) report their
//! failures.

use std::collections::HashMap;

use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

use crate::api::ConversationApi;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::events::{ClientEvent, EventSender};
use crate::state::{Conversation, SendState, Turn};
use crate::transcript::{format_prompt, normalize_messages};

/// Client for a remote conversation service.
pub struct ConversationClient {
    /// HTTP endpoints.
    api: ConversationApi,
    /// Conversation identifiers as last listed by the server.
    conversations: RwLock<Vec<String>>,
    /// Per-conversation state, keyed by identifier.
    sessions: RwLock<HashMap<String, Conversation>>,
    /// Change notifications.
    events: EventSender,
    /// Bot text stored for a failed send.
    error_placeholder: String,
    /// Re-read the pre-prompt from the server before each send.
    refresh_pre_prompt: bool,
}

impl ConversationClient {
    /// Create a client for the backend described by `config`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let api = ConversationApi::new(&config)?;
        info!("Conversation client targeting {}", api.base_url());

        Ok(Self {
            api,
            conversations: RwLock::new(Vec::new()),
            sessions: RwLock::new(HashMap::new()),
            events: EventSender::new(config.event_capacity),
            error_placeholder: config.error_placeholder,
            refresh_pre_prompt: config.refresh_pre_prompt_before_send,
        })
    }

    /// Create a client for `base_url` with default settings.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::new(ClientConfig::new(base_url))
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.api.base_url()
    }

    /// Subscribe to state change events.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    // ------------------------------------------------------------------
    // Remote operations
    // ------------------------------------------------------------------

    /// Refresh and return the list of conversation identifiers.
    ///
    /// A transport failure is returned and leaves the cached list untouched.
    /// Any other failure is treated as the server having no conversations.
    pub async fn list_conversations(&self) -> Result<Vec<String>> {
        let conversations = match self.api.list_conversations().await {
            Ok(list) => list,
            Err(e) if e.is_transport() => return Err(e),
            Err(e) => {
                warn!("Listing conversations failed, treating as empty: {}", e);
                Vec::new()
            }
        };

        *self.conversations.write().await = conversations.clone();
        debug!("Listed {} conversations", conversations.len());
        self.events.emit(ClientEvent::ConversationsChanged {
            conversations: conversations.clone(),
        });
        Ok(conversations)
    }

    /// Create a conversation and return its identifier.
    ///
    /// The identifier is not added to the cached list; call
    /// [`track_conversation`](Self::track_conversation) or refresh the list.
    pub async fn create_conversation(&self, pre_prompt: &str) -> Result<String> {
        let id = self.api.new_conversation(pre_prompt).await?;

        self.sessions
            .write()
            .await
            .entry(id.clone())
            .or_insert_with(|| Conversation::new(id.clone()).with_pre_prompt(pre_prompt));

        info!("Created conversation {}", id);
        Ok(id)
    }

    /// Fetch a conversation's pre-prompt and turns from the server.
    ///
    /// The synthetic pre-prompt record is dropped and role labels are
    /// stripped. A malformed payload clears the local turns and is returned as
    /// `Decode`. Transport and remote failures leave local state as it was and
    /// yield the cached pre-prompt and turns.
    pub async fn fetch_conversation(&self, conversation_id: &str) -> Result<(String, Vec<Turn>)> {
        let payload = match self.api.get_conversation(conversation_id).await {
            Ok(payload) => payload,
            Err(e @ ClientError::Decode(_)) => {
                warn!(
                    "Malformed conversation {}, clearing local turns: {}",
                    conversation_id, e
                );
                self.clear_turns(conversation_id).await;
                return Err(e);
            }
            Err(e) => {
                warn!(
                    "Fetching conversation {} failed, keeping local state: {}",
                    conversation_id, e
                );
                return Ok(self.cached_view(conversation_id).await);
            }
        };

        let turns = normalize_messages(payload.messages, &self.error_placeholder);
        let pre_prompt = self.get_pre_prompt(conversation_id).await;

        let mut sessions = self.sessions.write().await;
        let conversation = sessions
            .entry(conversation_id.to_string())
            .or_insert_with(|| Conversation::new(conversation_id));
        conversation.replace_turns(turns.clone());
        drop(sessions);

        debug!(
            "Fetched conversation {} with {} turns",
            conversation_id,
            turns.len()
        );
        self.events.emit(ClientEvent::TurnsChanged {
            conversation_id: conversation_id.to_string(),
        });
        Ok((pre_prompt, turns))
    }

    /// Send a message and wait for the reply.
    ///
    /// Only accepted while the conversation is `Idle`. A pending turn is
    /// appended immediately; when the request finishes it is filled with the
    /// reply, or with the error placeholder if the request failed, and the
    /// conversation returns to `Idle` either way.
    pub async fn send_message(&self, conversation_id: &str, prompt: &str) -> Result<String> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ClientError::EmptyPrompt);
        }

        let cached_pre_prompt = {
            let mut sessions = self.sessions.write().await;
            let conversation = sessions
                .entry(conversation_id.to_string())
                .or_insert_with(|| Conversation::new(conversation_id));
            conversation.begin_send(prompt)?;
            conversation.pre_prompt.clone()
        };
        self.emit_send_state(conversation_id, SendState::Pending);
        self.emit_turns_changed(conversation_id);

        let pre_prompt = if self.refresh_pre_prompt {
            self.get_pre_prompt(conversation_id).await
        } else {
            cached_pre_prompt
        };

        let outcome = self
            .api
            .generate(conversation_id, &format_prompt(&pre_prompt, prompt))
            .await
            .and_then(|reply| {
                let reply = reply.trim().to_string();
                if reply.is_empty() {
                    Err(ClientError::Remote("Empty response".to_string()))
                } else {
                    Ok(reply)
                }
            });

        let bot = match &outcome {
            Ok(reply) => reply.clone(),
            Err(e) => {
                warn!("Send to {} failed: {}", conversation_id, e);
                self.error_placeholder.clone()
            }
        };

        let filled = match self.sessions.write().await.get_mut(conversation_id) {
            Some(conversation) => conversation.complete_send(prompt, bot),
            None => false,
        };
        if !filled {
            warn!(
                "Pending turn for {} disappeared before its reply arrived",
                conversation_id
            );
        }

        self.emit_send_state(conversation_id, SendState::Idle);
        self.emit_turns_changed(conversation_id);
        outcome
    }

    /// Delete a conversation.
    ///
    /// Local state is only dropped once the server acknowledges the delete.
    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<()> {
        self.api.delete_conversation(conversation_id).await?;

        let conversations = {
            let mut conversations = self.conversations.write().await;
            conversations.retain(|id| id != conversation_id);
            conversations.clone()
        };
        self.sessions.write().await.remove(conversation_id);

        info!("Deleted conversation {}", conversation_id);
        self.events
            .emit(ClientEvent::ConversationsChanged { conversations });
        Ok(())
    }

    /// Fetch a conversation's pre-prompt.
    ///
    /// Never fails: any error yields an empty string. A successful fetch is
    /// cached on the conversation.
    pub async fn get_pre_prompt(&self, conversation_id: &str) -> String {
        match self.api.get_pre_prompt(conversation_id).await {
            Ok(pre_prompt) => {
                self.cache_pre_prompt(conversation_id, &pre_prompt).await;
                pre_prompt
            }
            Err(e) => {
                warn!("Fetching pre-prompt for {} failed: {}", conversation_id, e);
                String::new()
            }
        }
    }

    /// Replace a conversation's pre-prompt.
    ///
    /// Always completes; the return value and the `PrePromptUpdated` event say
    /// whether the server acknowledged the change. The cached pre-prompt only
    /// changes on acknowledgement.
    pub async fn update_pre_prompt(&self, conversation_id: &str, pre_prompt: &str) -> bool {
        let acknowledged = match self.api.update_pre_prompt(conversation_id, pre_prompt).await {
            Ok(()) => {
                info!("Pre-prompt updated for {}", conversation_id);
                self.cache_pre_prompt(conversation_id, pre_prompt).await;
                true
            }
            Err(e) => {
                warn!("Pre-prompt update for {} failed: {}", conversation_id, e);
                false
            }
        };

        self.events.emit(ClientEvent::PrePromptUpdated {
            conversation_id: conversation_id.to_string(),
            acknowledged,
        });
        acknowledged
    }

    // ------------------------------------------------------------------
    // Local state
    // ------------------------------------------------------------------

    /// Add an identifier to the cached conversation list if it is missing.
    pub async fn track_conversation(&self, conversation_id: &str) {
        let conversations = {
            let mut conversations = self.conversations.write().await;
            if conversations.iter().any(|id| id == conversation_id) {
                return;
            }
            conversations.push(conversation_id.to_string());
            conversations.clone()
        };
        self.events
            .emit(ClientEvent::ConversationsChanged { conversations });
    }

    /// Drop the local turns of a conversation.
    pub async fn clear_turns(&self, conversation_id: &str) {
        if let Some(conversation) = self.sessions.write().await.get_mut(conversation_id) {
            conversation.clear_turns();
        }
        self.emit_turns_changed(conversation_id);
    }

    /// Cached conversation identifiers.
    pub async fn conversations(&self) -> Vec<String> {
        self.conversations.read().await.clone()
    }

    /// Snapshot of a conversation's local state.
    pub async fn conversation(&self, conversation_id: &str) -> Option<Conversation> {
        self.sessions.read().await.get(conversation_id).cloned()
    }

    /// Local turns of a conversation, empty if it has never been loaded.
    pub async fn turns(&self, conversation_id: &str) -> Vec<Turn> {
        self.sessions
            .read()
            .await
            .get(conversation_id)
            .map(|c| c.turns.clone())
            .unwrap_or_default()
    }

    /// Send state of a conversation.
    pub async fn send_state(&self, conversation_id: &str) -> SendState {
        self.sessions
            .read()
            .await
            .get(conversation_id)
            .map(|c| c.send_state)
            .unwrap_or_default()
    }

    /// Cached pre-prompt of a conversation.
    pub async fn pre_prompt(&self, conversation_id: &str) -> String {
        self.sessions
            .read()
            .await
            .get(conversation_id)
            .map(|c| c.pre_prompt.clone())
            .unwrap_or_default()
    }

    async fn cached_view(&self, conversation_id: &str) -> (String, Vec<Turn>) {
        self.sessions
            .read()
            .await
            .get(conversation_id)
            .map(|c| (c.pre_prompt.clone(), c.turns.clone()))
            .unwrap_or_default()
    }

    async fn cache_pre_prompt(&self, conversation_id: &str, pre_prompt: &str) {
        let changed = {
            let mut sessions = self.sessions.write().await;
            let conversation = sessions
                .entry(conversation_id.to_string())
                .or_insert_with(|| Conversation::new(conversation_id));
            if conversation.pre_prompt == pre_prompt {
                false
            } else {
                conversation.pre_prompt = pre_prompt.to_string();
                true
            }
        };

        if changed {
            self.events.emit(ClientEvent::PrePromptChanged {
                conversation_id: conversation_id.to_string(),
            });
        }
    }

    fn emit_send_state(&self, conversation_id: &str, state: SendState) {
        self.events.emit(ClientEvent::SendStateChanged {
            conversation_id: conversation_id.to_string(),
            state,
        });
    }

    fn emit_turns_changed(&self, conversation_id: &str) {
        self.events.emit(ClientEvent::TurnsChanged {
            conversation_id: conversation_id.to_string(),
        });
    }
}
