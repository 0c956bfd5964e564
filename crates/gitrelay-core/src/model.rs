//! Canonical event model.
//!
//! Provider-agnostic representations of the events gitrelay relays. Every
//! value here is built complete by a normalizer and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Number of hex characters shown for an abbreviated commit hash.
pub const SHORT_SHA_LEN: usize = 7;

/// A single commit carried by a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Full commit hash
    pub id: String,
    /// Commit message with trailing newlines removed
    pub message: String,
    /// Commit author display name
    pub author: String,
    /// Web URL of the commit
    pub url: String,
}

impl Commit {
    pub fn short_id(&self) -> &str {
        short_sha(&self.id)
    }

    /// First line of the commit message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

/// Repository an event originates from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Web URL of the repository
    pub url: String,
    /// Provider-qualified path, e.g. `owner/repo` or `group/subgroup/project`
    pub name: String,
}

impl Repository {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
        }
    }
}

/// Handle to a repository shared between an event and the events it embeds.
pub type RepositoryRef = Arc<Repository>;

/// Canonical CI status shared by every provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Unknown,
    Running,
    Failed,
    Success,
    Cancelled,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Running => "running",
            Self::Failed => "failed",
            Self::Success => "success",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One or more commits pushed to a reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEvent {
    /// Whether the push rewrote history
    pub forced: bool,
    /// Full reference name, e.g. `refs/heads/main`
    pub git_ref: String,
    /// Web URL of the tree at the pushed reference
    pub ref_url: String,
    /// Hash the reference points to after the push
    pub head_sha: String,
    /// Web URL of the head commit
    pub head_url: String,
    /// Name of the user who pushed
    pub author: String,
    /// Pushed commits in chronological order (may be empty)
    pub commits: Vec<Commit>,
    pub repo: RepositoryRef,
}

impl PushEvent {
    pub fn short_head_sha(&self) -> &str {
        short_sha(&self.head_sha)
    }

    /// Last path segment of the reference, e.g. `login` for `refs/heads/feature/login`.
    pub fn ref_name(&self) -> &str {
        ref_name(&self.git_ref)
    }

    /// `<repo>:<ref name>` label used as the push target in messages.
    pub fn target(&self) -> String {
        format!("{}:{}", self.repo.name, self.ref_name())
    }
}

/// A CI pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineEvent {
    pub id: u64,
    /// Web URL of the pipeline; some providers do not expose one
    pub url: Option<String>,
    pub status: Status,
    pub repo: RepositoryRef,
}

/// A single job inside a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobEvent {
    pub id: u64,
    pub name: String,
    pub url: String,
    pub status: Status,
    /// Parent pipeline; its `repo` is the same handle as `self.repo`
    pub pipeline: PipelineEvent,
    pub repo: RepositoryRef,
}

/// Any canonical event produced by a normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Push(PushEvent),
    Pipeline(PipelineEvent),
    Job(JobEvent),
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Push(_) => "push",
            Self::Pipeline(_) => "pipeline",
            Self::Job(_) => "job",
        }
    }

    pub fn repo(&self) -> &Repository {
        match self {
            Self::Push(e) => &e.repo,
            Self::Pipeline(e) => &e.repo,
            Self::Job(e) => &e.repo,
        }
    }
}

/// Abbreviates a commit hash to [`SHORT_SHA_LEN`] characters.
pub fn short_sha(sha: &str) -> &str {
    match sha.char_indices().nth(SHORT_SHA_LEN) {
        Some((idx, _)) => &sha[..idx],
        None => sha,
    }
}

/// Last path segment of a reference name.
pub fn ref_name(git_ref: &str) -> &str {
    git_ref.rsplit('/').next().unwrap_or(git_ref)
}

/// Strips `refs/heads/` or `refs/tags/` from a reference name.
///
/// Other references fall back to their last path segment.
pub fn short_ref(git_ref: &str) -> &str {
    git_ref
        .strip_prefix("refs/heads/")
        .or_else(|| git_ref.strip_prefix("refs/tags/"))
        .unwrap_or_else(|| ref_name(git_ref))
}
