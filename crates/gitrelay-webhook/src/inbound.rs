//! Inbound webhook handling
//!
//! Receives GitHub and GitLab webhooks, renders them and hands the messages
//! to the configured [`ChatClient`].

use crate::{ChatClient, RelayError, Result};
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use gitrelay_core::{
    dispatch::{self, GITHUB_EVENT_HEADER, GITLAB_EVENT_HEADER},
    normalize, render, PushStyle, RenderOptions, Route,
};
use serde::{de, Deserialize, Deserializer};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared state for relay routes
pub struct RelayState {
    client: Arc<dyn ChatClient>,
    debug: bool,
}

impl RelayState {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self {
            client,
            debug: false,
        }
    }

    /// Exposes the raw payload capture route.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Create Axum router for relay webhooks
pub fn create_relay_router(state: Arc<RelayState>) -> Router {
    let mut router = Router::new().route("/trigger/:chat_id", post(handle_trigger));
    if state.debug {
        router = router.route("/debug/:chat_id", post(handle_debug));
    }
    router.with_state(state)
}

/// Display options accepted on the trigger URL
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerQuery {
    #[serde(default)]
    pub push_message_style: PushStyle,
    #[serde(default = "default_true", deserialize_with = "lenient_bool")]
    pub show_author_name: bool,
    #[serde(default = "default_true", deserialize_with = "lenient_bool")]
    pub multiline_commit: bool,
    #[serde(default)]
    pub max_commits: Option<u32>,
}

fn default_true() -> bool {
    true
}

/// Accepts `true`/`false`, `1`/`0`, `yes`/`no` and `on`/`off`, in any case.
fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(de::Error::custom(format!("invalid boolean `{other}`"))),
    }
}

impl Default for TriggerQuery {
    fn default() -> Self {
        Self {
            push_message_style: PushStyle::default(),
            show_author_name: true,
            multiline_commit: true,
            max_commits: None,
        }
    }
}

impl From<TriggerQuery> for RenderOptions {
    fn from(query: TriggerQuery) -> Self {
        Self {
            push_style: query.push_message_style,
            show_author_name: query.show_author_name,
            multiline_commit: query.multiline_commit,
            max_commits: query.max_commits,
        }
    }
}

/// Header value, treating an empty value as absent.
fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// Handle a webhook addressed to a chat
async fn handle_trigger(
    State(state): State<Arc<RelayState>>,
    Path(chat_id): Path<String>,
    query: std::result::Result<Query<TriggerQuery>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    let announcement = dispatch::identify(
        header(&headers, GITHUB_EVENT_HEADER),
        header(&headers, GITLAB_EVENT_HEADER),
    )
    .map_err(|rejection| {
        warn!(chat_id = %chat_id, reason = %rejection.detail(), "Rejected webhook");
        RelayError::from(rejection)
    })?;

    let Query(query) = query.map_err(|e| RelayError::InvalidQuery(e.body_text()))?;

    state.client.resolve_destination(&chat_id).await.map_err(|e| {
        warn!(chat_id = %chat_id, error = %e, "Destination not resolvable");
        RelayError::from(e)
    })?;

    let kind = match dispatch::route(&announcement)? {
        Route::Ping => {
            info!(provider = %announcement.provider, chat_id = %chat_id, "Ping received");
            return Ok(StatusCode::NO_CONTENT);
        }
        Route::Relay(kind) => kind,
    };

    let payload: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        warn!(chat_id = %chat_id, error = %e, "Failed to parse webhook payload");
        RelayError::InvalidPayload(e.to_string())
    })?;

    let event = normalize(announcement.provider, kind, &payload).map_err(|e| {
        warn!(
            provider = %announcement.provider,
            kind = kind.as_str(),
            error = %e,
            "Failed to normalize webhook"
        );
        RelayError::from(e)
    })?;

    let messages = render(&event, &RenderOptions::from(query));
    info!(
        provider = %announcement.provider,
        kind = kind.as_str(),
        repo = %event.repo().name,
        chat_id = %chat_id,
        messages = messages.len(),
        "Relaying webhook"
    );

    for message in &messages {
        state.client.send_message(&chat_id, message).await?;
    }

    debug!(chat_id = %chat_id, "Webhook relayed");
    Ok(StatusCode::NO_CONTENT)
}

/// File name of a captured payload: `{gh|gl|rq}[-{event}]-{unix}.json`
fn capture_file_name(headers: &HeaderMap, timestamp: i64) -> String {
    if let Some(event) = header(headers, GITLAB_EVENT_HEADER) {
        format!("gl-{event}-{timestamp}.json")
    } else if let Some(event) = header(headers, GITHUB_EVENT_HEADER) {
        format!("gh-{event}-{timestamp}.json")
    } else {
        format!("rq-{timestamp}.json")
    }
}

/// Upload the raw payload to the chat as a file
async fn handle_debug(
    State(state): State<Arc<RelayState>>,
    Path(chat_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<&'static str>> {
    let file_name = capture_file_name(&headers, Utc::now().timestamp());
    info!(chat_id = %chat_id, file_name = %file_name, "Capturing webhook payload");

    state
        .client
        .send_document(&chat_id, &file_name, body.to_vec())
        .await?;

    Ok(Json("OK"))
}
