//! Wire types for the conversation backend API

use serde::{Deserialize, Serialize};

/// A raw message pair as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePair {
    /// User text, possibly prefixed with a role label
    pub user: String,
    /// Bot text, possibly prefixed with a role label
    pub bot: String,
}

impl MessagePair {
    pub fn new(user: impl Into<String>, bot: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            bot: bot.into(),
        }
    }
}

/// Response of `GET /list_conversations`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListConversationsResponse {
    /// Conversation identifiers, absent when the server has none
    #[serde(default)]
    pub conversations: Vec<String>,
}

/// Response of `GET /get_conversation/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationResponse {
    /// Conversation identifier
    pub conversation_id: String,
    /// Raw message pairs in chronological order
    pub messages: Vec<MessagePair>,
}

/// Body of `POST /new_conversation` and `POST /update_pre_prompt/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrePromptBody {
    pub pre_prompt: String,
}

/// Response of `POST /new_conversation`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewConversationResponse {
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Response of `GET /get_pre_prompt/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrePromptResponse {
    #[serde(default)]
    pub pre_prompt: Option<String>,
}

/// Body of `POST /generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Conversation the prompt belongs to
    pub conversation_id: String,
    /// Full prompt: pre-prompt followed by the transcript line
    pub prompt: String,
}

impl GenerateRequest {
    pub fn new(conversation_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            prompt: prompt.into(),
        }
    }
}

/// Response of `POST /generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: Option<String>,
}
