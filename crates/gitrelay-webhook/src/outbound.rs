//! Outbound message delivery
//!
//! The [`ChatClient`] trait is everything the relay needs from a chat
//! transport. [`TelegramClient`] implements it over the Telegram Bot API.

use async_trait::async_trait;
use gitrelay_core::{RenderedMessage, TelegramConfig};
use parking_lot::Mutex;
use reqwest::{multipart, Client};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised by a chat transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Could not find destination {0}")]
    DestinationNotFound(String),

    #[error("Chat API error {code}: {description}")]
    Api { code: u16, description: String },

    #[error("Transport error: {0}")]
    Transport(String),
}

pub type DeliveryResult<T> = std::result::Result<T, DeliveryError>;

/// Chat transport used to deliver rendered messages
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Confirms the destination exists and is reachable.
    ///
    /// Returns [`DeliveryError::DestinationNotFound`] when it is not.
    async fn resolve_destination(&self, destination: &str) -> DeliveryResult<()>;

    /// Sends one message, with its actions as link buttons.
    async fn send_message(&self, destination: &str, message: &RenderedMessage) -> DeliveryResult<()>;

    /// Uploads a file to the destination.
    async fn send_document(
        &self,
        destination: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> DeliveryResult<()>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error_code: Option<u16>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct GetChat<'a> {
    chat_id: &'a str,
}

#[derive(Debug, Serialize)]
struct InlineKeyboardButton<'a> {
    text: &'a str,
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct InlineKeyboardMarkup<'a> {
    inline_keyboard: Vec<Vec<InlineKeyboardButton<'a>>>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup<'a>>,
}

impl<'a> SendMessage<'a> {
    fn new(chat_id: &'a str, message: &'a RenderedMessage) -> Self {
        let reply_markup = if message.actions.is_empty() {
            None
        } else {
            // All actions share one row
            Some(InlineKeyboardMarkup {
                inline_keyboard: vec![message
                    .actions
                    .iter()
                    .map(|a| InlineKeyboardButton {
                        text: &a.label,
                        url: &a.url,
                    })
                    .collect()],
            })
        };

        Self {
            chat_id,
            text: &message.text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
            reply_markup,
        }
    }
}

/// Telegram Bot API client
pub struct TelegramClient {
    client: Client,
    /// `{api_url}/bot{token}`
    base_url: String,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> DeliveryResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DeliveryError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: format!(
                "{}/bot{}",
                config.api_url.trim_end_matches('/'),
                config.bot_token
            ),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn read_response(response: reqwest::Response) -> DeliveryResult<()> {
        let status = response.status();
        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| DeliveryError::Transport(format!("Failed to parse response: {}", e)))?;

        if body.ok {
            Ok(())
        } else {
            Err(DeliveryError::Api {
                code: body.error_code.unwrap_or(status.as_u16()),
                description: body
                    .description
                    .unwrap_or_else(|| "Unknown error".to_string()),
            })
        }
    }

    async fn call<T: Serialize + ?Sized>(&self, method: &str, body: &T) -> DeliveryResult<()> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(format!("{} request failed: {}", method, e)))?;

        Self::read_response(response).await
    }
}

#[async_trait]
impl ChatClient for TelegramClient {
    async fn resolve_destination(&self, destination: &str) -> DeliveryResult<()> {
        match self.call("getChat", &GetChat { chat_id: destination }).await {
            Ok(()) => Ok(()),
            Err(DeliveryError::Api { code: 400 | 403, description }) => {
                debug!(destination = %destination, reason = %description, "Destination not resolvable");
                Err(DeliveryError::DestinationNotFound(destination.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    async fn send_message(&self, destination: &str, message: &RenderedMessage) -> DeliveryResult<()> {
        let result = self
            .call("sendMessage", &SendMessage::new(destination, message))
            .await;
        if let Err(ref e) = result {
            warn!(destination = %destination, error = %e, "sendMessage failed");
        }
        result
    }

    async fn send_document(
        &self,
        destination: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> DeliveryResult<()> {
        let part = multipart::Part::bytes(content)
            .file_name(file_name.to_string())
            .mime_str("application/json")
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        let form = multipart::Form::new()
            .text("chat_id", destination.to_string())
            .part("document", part);

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(format!("sendDocument request failed: {}", e)))?;

        Self::read_response(response).await
    }
}

/// Something an [`InMemoryChatClient`] was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Resolved(String),
    Message(String, RenderedMessage),
    Document(String, String, Vec<u8>),
}

/// In-memory chat client that records every call
pub struct InMemoryChatClient {
    destinations: HashSet<String>,
    fail_sends: bool,
    log: Mutex<Vec<Recorded>>,
}

impl InMemoryChatClient {
    pub fn new<I, S>(destinations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            destinations: destinations.into_iter().map(Into::into).collect(),
            fail_sends: false,
            log: Mutex::new(Vec::new()),
        }
    }

    /// Makes every send fail with an HTTP error.
    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.log.lock().clone()
    }

    pub fn messages(&self) -> Vec<RenderedMessage> {
        self.log
            .lock()
            .iter()
            .filter_map(|r| match r {
                Recorded::Message(_, m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ChatClient for InMemoryChatClient {
    async fn resolve_destination(&self, destination: &str) -> DeliveryResult<()> {
        self.log.lock().push(Recorded::Resolved(destination.to_string()));
        if self.destinations.contains(destination) {
            Ok(())
        } else {
            Err(DeliveryError::DestinationNotFound(destination.to_string()))
        }
    }

    async fn send_message(&self, destination: &str, message: &RenderedMessage) -> DeliveryResult<()> {
        if self.fail_sends {
            return Err(DeliveryError::Transport("connection refused".to_string()));
        }
        self.log
            .lock()
            .push(Recorded::Message(destination.to_string(), message.clone()));
        Ok(())
    }

    async fn send_document(
        &self,
        destination: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> DeliveryResult<()> {
        if self.fail_sends {
            return Err(DeliveryError::Transport("connection refused".to_string()));
        }
        self.log.lock().push(Recorded::Document(
            destination.to_string(),
            file_name.to_string(),
            content,
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitrelay_core::Action;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> TelegramClient {
        let config = TelegramConfig::new("123:abc".to_string()).with_api_url(server.uri());
        TelegramClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_destination_ok() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/getChat"))
            .and(body_json(json!({ "chat_id": "-1001" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": { "id": -1001 } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        client(&server).await.resolve_destination("-1001").await.unwrap();
    }

    #[tokio::test]
    async fn test_resolve_destination_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/getChat"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let err = client(&server).await.resolve_destination("42").await.unwrap_err();
        assert_eq!(err, DeliveryError::DestinationNotFound("42".to_string()));
    }

    #[tokio::test]
    async fn test_send_message_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_json(json!({
                "chat_id": "42",
                "text": "<b>hi</b>",
                "parse_mode": "HTML",
                "disable_web_page_preview": true,
                "reply_markup": {
                    "inline_keyboard": [[
                        { "text": "octo/hello", "url": "https://github.com/octo/hello" },
                        { "text": "Pipeline #1", "url": "https://github.com/octo/hello/runs/1" }
                    ]]
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": {} })))
            .expect(1)
            .mount(&server)
            .await;

        let message = RenderedMessage::new("<b>hi</b>").with_actions(vec![
            Action::new("octo/hello", "https://github.com/octo/hello"),
            Action::new("Pipeline #1", "https://github.com/octo/hello/runs/1"),
        ]);
        client(&server).await.send_message("42", &message).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_message_without_actions_omits_markup() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_json(json!({
                "chat_id": "42",
                "text": "plain",
                "parse_mode": "HTML",
                "disable_web_page_preview": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": {} })))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .await
            .send_message("42", &RenderedMessage::new("plain"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_message_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: can't parse entities"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .send_message("42", &RenderedMessage::new("<b>"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Api { code: 400, .. }));
    }

    #[tokio::test]
    async fn test_send_document() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendDocument"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": {} })))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .await
            .send_document("42", "gh-push-1.json", b"{}".to_vec())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_in_memory_client_records_calls() {
        let client = InMemoryChatClient::new(["42"]);

        assert!(client.resolve_destination("42").await.is_ok());
        assert!(client.resolve_destination("7").await.is_err());
        client.send_message("42", &RenderedMessage::new("hi")).await.unwrap();

        assert_eq!(client.recorded().len(), 3);
        assert_eq!(client.messages(), vec![RenderedMessage::new("hi")]);
    }
}
