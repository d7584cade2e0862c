//! HTTP calls to the conversation backend.
//!
//! One method per endpoint. Methods return the raw server outcome classified
//! into [`ClientError`] kinds; deciding which failures degrade to defaults is
//! left to [`ConversationClient`](crate::ConversationClient).

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::http_client::create_client;
use crate::models::{
    ConversationResponse, GenerateRequest, GenerateResponse, ListConversationsResponse,
    NewConversationResponse, PrePromptBody, PrePromptResponse,
};

/// Client for the conversation backend's REST endpoints
#[derive(Clone)]
pub struct ConversationApi {
    client: reqwest::Client,
    base_url: String,
}

impl ConversationApi {
    /// Create a new API client from `config`.
    ///
    /// Fails if the configuration does not validate. No request is made.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client: create_client(config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn conversation_url(&self, endpoint: &str, conversation_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            endpoint,
            urlencoding::encode(conversation_id)
        )
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        Ok(request.send().await?)
    }

    /// Fail with `Remote` unless the response has a success status.
    fn check_status(response: &Response, what: &str) -> Result<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ClientError::Remote(format!(
                "{} failed: {}",
                what,
                response.status()
            )))
        }
    }

    /// Read the body as text and decode it, so shape mismatches surface as `Decode`.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// List conversation identifiers
    pub async fn list_conversations(&self) -> Result<Vec<String>> {
        let url = self.url("list_conversations");
        debug!("GET {}", url);

        let response = self.send(self.client.get(&url)).await?;
        Self::check_status(&response, "Listing conversations")?;
        let list: ListConversationsResponse = Self::decode(response).await?;
        Ok(list.conversations)
    }

    /// Fetch the raw message pairs of a conversation
    pub async fn get_conversation(&self, conversation_id: &str) -> Result<ConversationResponse> {
        let url = self.conversation_url("get_conversation", conversation_id);
        debug!("GET {}", url);

        let response = self.send(self.client.get(&url)).await?;
        Self::check_status(&response, "Fetching conversation")?;
        Self::decode(response).await
    }

    /// Create a conversation and return its server-assigned identifier
    pub async fn new_conversation(&self, pre_prompt: &str) -> Result<String> {
        let url = self.url("new_conversation");
        debug!("POST {}", url);

        let body = PrePromptBody {
            pre_prompt: pre_prompt.to_string(),
        };
        let response = self.send(self.client.post(&url).json(&body)).await?;

        if response.status() != StatusCode::OK {
            return Err(ClientError::Remote(format!(
                "Creating conversation failed: {}",
                response.status()
            )));
        }

        let created: NewConversationResponse = Self::decode(response)
            .await
            .map_err(|e| ClientError::Remote(format!("Invalid creation response: {}", e)))?;

        created
            .conversation_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ClientError::Remote("Missing conversation_id in response".to_string()))
    }

    /// Delete a conversation
    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<()> {
        let url = self.conversation_url("delete_conversation", conversation_id);
        debug!("DELETE {}", url);

        let response = self.send(self.client.delete(&url)).await?;
        Self::check_status(&response, "Deleting conversation")
    }

    /// Request a completion for `prompt` and return the reply text
    pub async fn generate(&self, conversation_id: &str, prompt: &str) -> Result<String> {
        let url = self.url("generate");
        debug!("POST {} (conversation {})", url, conversation_id);

        let request = GenerateRequest::new(conversation_id, prompt);
        let response = self.send(self.client.post(&url).json(&request)).await?;
        Self::check_status(&response, "Generating reply")?;

        let generated: GenerateResponse = Self::decode(response).await?;
        generated
            .response
            .ok_or_else(|| ClientError::Remote("Missing response in reply".to_string()))
    }

    /// Fetch the pre-prompt of a conversation
    pub async fn get_pre_prompt(&self, conversation_id: &str) -> Result<String> {
        let url = self.conversation_url("get_pre_prompt", conversation_id);
        debug!("GET {}", url);

        let response = self.send(self.client.get(&url)).await?;
        Self::check_status(&response, "Fetching pre-prompt")?;

        let body: PrePromptResponse = Self::decode(response).await?;
        body.pre_prompt
            .ok_or_else(|| ClientError::Remote("Missing pre_prompt in response".to_string()))
    }

    /// Replace the pre-prompt of a conversation
    pub async fn update_pre_prompt(&self, conversation_id: &str, pre_prompt: &str) -> Result<()> {
        let url = self.conversation_url("update_pre_prompt", conversation_id);
        debug!("POST {}", url);

        let body = PrePromptBody {
            pre_prompt: pre_prompt.to_string(),
        };
        let response = self.send(self.client.post(&url).json(&body)).await?;

        if response.status() != StatusCode::OK {
            return Err(ClientError::Remote(format!(
                "Updating pre-prompt failed: {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_for(server: &MockServer) -> ConversationApi {
        ConversationApi::new(&ClientConfig::new(server.uri())).expect("api client")
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let api = ConversationApi::new(&ClientConfig::new("http://localhost:5000/")).unwrap();
        assert_eq!(api.base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        let result = ConversationApi::new(&ClientConfig::new("localhost"));
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn test_conversation_url_encodes_id() {
        let api = ConversationApi::new(&ClientConfig::new("http://localhost:5000")).unwrap();
        assert_eq!(
            api.conversation_url("get_conversation", "a b/c"),
            "http://localhost:5000/get_conversation/a%20b%2Fc"
        );
    }

    #[tokio::test]
    async fn test_list_conversations_happy_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list_conversations"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "conversations": ["a", "b"] })),
            )
            .mount(&server)
            .await;

        let api = api_for(&server);
        let list = api.list_conversations().await.expect("list");
        assert_eq!(list, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_list_conversations_missing_field_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list_conversations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let api = api_for(&server);
        assert!(api.list_conversations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_conversation_malformed_is_decode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get_conversation/abc"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "messages": "nope" })),
            )
            .mount(&server)
            .await;

        let api = api_for(&server);
        let result = api.get_conversation("abc").await;
        assert!(matches!(result, Err(ClientError::Decode(_))));
    }

    #[tokio::test]
    async fn test_new_conversation_sends_pre_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/new_conversation"))
            .and(body_json(serde_json::json!({ "pre_prompt": "Be nice." })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "conversation_id": "abc123" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server);
        assert_eq!(api.new_conversation("Be nice.").await.unwrap(), "abc123");
    }

    #[tokio::test]
    async fn test_new_conversation_requires_200() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/new_conversation"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({ "conversation_id": "abc123" })),
            )
            .mount(&server)
            .await;

        let api = api_for(&server);
        let result = api.new_conversation("").await;
        assert!(matches!(result, Err(ClientError::Remote(_))));
    }

    #[tokio::test]
    async fn test_new_conversation_missing_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/new_conversation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let api = api_for(&server);
        let result = api.new_conversation("").await;
        assert!(matches!(result, Err(ClientError::Remote(_))));
    }

    #[tokio::test]
    async fn test_generate_missing_response_is_remote() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "error": "boom" })),
            )
            .mount(&server)
            .await;

        let api = api_for(&server);
        let result = api.generate("abc", "hi").await;
        assert!(matches!(result, Err(ClientError::Remote(_))));
    }

    #[tokio::test]
    async fn test_delete_conversation_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/delete_conversation/abc"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let api = api_for(&server);
        let result = api.delete_conversation("abc").await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Deleting conversation failed")
        );
    }

    #[tokio::test]
    async fn test_update_pre_prompt_requires_200() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/update_pre_prompt/abc"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let api = api_for(&server);
        let result = api.update_pre_prompt("abc", "Be brief.").await;
        assert!(matches!(result, Err(ClientError::Remote(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport() {
        // Nothing listens on port 1
        let api = ConversationApi::new(&ClientConfig::new("http://127.0.0.1:1")).unwrap();
        let result = api.list_conversations().await;
        assert!(matches!(result, Err(ClientError::Transport(_))));
    }
}
