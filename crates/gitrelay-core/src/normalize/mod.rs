//! Provider normalizers
//!
//! Each git hosting provider gets a [`Normalizer`] implementation that maps its
//! webhook schema onto the canonical model in [`crate::model`]. Adding a
//! provider means adding a [`Provider`] variant and its normalizer; callers
//! only ever go through [`Provider::normalizer`].

mod github;
mod gitlab;

pub use github::{reconcile_check_status, GitHubNormalizer};
pub use gitlab::GitLabNormalizer;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::model::{Event, JobEvent, PipelineEvent, PushEvent};

/// Git hosting services gitrelay understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    /// GitHub (`X-GitHub-Event` header)
    #[serde(rename = "gh")]
    GitHub,
    /// GitLab (`X-Gitlab-Event` header)
    #[serde(rename = "gl")]
    GitLab,
}

impl Provider {
    /// Short tag used in file names and logs.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::GitHub => "gh",
            Self::GitLab => "gl",
        }
    }

    pub fn normalizer(&self) -> &'static dyn Normalizer {
        match self {
            Self::GitHub => &GitHubNormalizer,
            Self::GitLab => &GitLabNormalizer,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GitHub => f.write_str("GitHub"),
            Self::GitLab => f.write_str("GitLab"),
        }
    }
}

/// Capability set every provider must implement.
///
/// A provider that never emits some kind of event returns
/// [`crate::NormalizeError::Unsupported`] for it.
pub trait Normalizer: Send + Sync {
    fn provider(&self) -> Provider;

    fn push(&self, payload: &Value) -> Result<PushEvent>;

    fn pipeline(&self, payload: &Value) -> Result<PipelineEvent>;

    fn job(&self, payload: &Value) -> Result<JobEvent>;
}

pub fn normalize_push(provider: Provider, payload: &Value) -> Result<PushEvent> {
    provider.normalizer().push(payload)
}

pub fn normalize_pipeline(provider: Provider, payload: &Value) -> Result<PipelineEvent> {
    provider.normalizer().pipeline(payload)
}

pub fn normalize_job(provider: Provider, payload: &Value) -> Result<JobEvent> {
    provider.normalizer().job(payload)
}

/// Normalizes a payload for an already classified event kind.
pub fn normalize(provider: Provider, kind: EventKind, payload: &Value) -> Result<Event> {
    let normalizer = provider.normalizer();
    let event = match kind {
        EventKind::Push => Event::Push(normalizer.push(payload)?),
        EventKind::Pipeline => Event::Pipeline(normalizer.pipeline(payload)?),
        EventKind::Job => Event::Job(normalizer.job(payload)?),
    };
    tracing::debug!(provider = %provider, kind = event.kind(), "Normalized webhook payload");
    Ok(event)
}

/// Kinds of canonical events a payload can be normalized into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Push,
    Pipeline,
    Job,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Pipeline => "pipeline",
            Self::Job => "job",
        }
    }
}

/// Deserializes a provider payload, reporting the failing field path.
pub(crate) fn parse<T: DeserializeOwned>(payload: &Value) -> Result<T> {
    Ok(serde_path_to_error::deserialize(payload)?)
}

/// Removes trailing newlines (and carriage returns) from a commit message.
pub(crate) fn trim_message(message: &str) -> String {
    message.trim_end_matches(['\n', '\r']).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_tags() {
        assert_eq!(Provider::GitHub.tag(), "gh");
        assert_eq!(Provider::GitLab.tag(), "gl");
        assert_eq!(Provider::GitHub.normalizer().provider(), Provider::GitHub);
        assert_eq!(Provider::GitLab.normalizer().provider(), Provider::GitLab);
    }

    #[test]
    fn test_trim_message() {
        assert_eq!(trim_message("Fix bug\n\n"), "Fix bug");
        assert_eq!(trim_message("Fix bug\r\n"), "Fix bug");
        assert_eq!(trim_message("Title\n\nBody\n"), "Title\n\nBody");
    }

    #[test]
    fn test_normalize_dispatches_by_kind() {
        let payload = json!({
            "object_attributes": { "id": 7, "status": "running" },
            "project": {
                "web_url": "https://gitlab.com/group/app",
                "path_with_namespace": "group/app"
            }
        });

        let event = normalize(Provider::GitLab, EventKind::Pipeline, &payload).unwrap();
        assert_eq!(event.kind(), "pipeline");
        assert_eq!(event.repo().name, "group/app");
    }
}
