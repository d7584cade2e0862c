//! Conversation client for the Bob chat backend.
//!
//! This crate talks to a remote language-model backend over a small REST API
//! and keeps the session state a chat UI renders:
//! - the list of conversations
//! - each conversation's pre-prompt and turns
//! - whether a reply is pending
//!
//! # Example
//!
//! ```rust,ignore
//! use bob_client::{ClientConfig, ConversationClient};
//!
//! let client = ConversationClient::new(ClientConfig::from_env())?;
//! let id = client.create_conversation("You are terse.").await?;
//! client.track_conversation(&id).await;
//! let reply = client.send_message(&id, "Hi").await?;
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod http_client;
pub mod models;
pub mod state;
pub mod transcript;

pub use api::ConversationApi;
pub use client::ConversationClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use events::ClientEvent;
pub use models::MessagePair;
pub use state::{Conversation, SendState, Turn};

/// Default backend URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Bot text stored in place of a reply when a send fails
pub const DEFAULT_ERROR_PLACEHOLDER: &str = "Error unwrapping response";
