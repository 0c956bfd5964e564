use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::{parse, trim_message, Normalizer, Provider};
use crate::error::{NormalizeError, Result};
use crate::model::{Commit, JobEvent, PipelineEvent, PushEvent, Repository, Status};

/// Query suffix that opens a check run with its whole suite expanded.
const CHECK_SUITE_FOCUS: &str = "?check_suite_focus=true";

#[derive(Debug, Deserialize)]
struct RawRepository {
    html_url: String,
    full_name: String,
}

impl RawRepository {
    fn into_repository(self) -> Arc<Repository> {
        Arc::new(Repository::new(self.html_url, self.full_name))
    }
}

#[derive(Debug, Deserialize)]
struct RawUser {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawCommit {
    id: String,
    message: String,
    author: RawUser,
    url: String,
}

#[derive(Debug, Deserialize)]
struct RawPush {
    #[serde(rename = "ref")]
    git_ref: String,
    after: String,
    forced: bool,
    pusher: RawUser,
    commits: Vec<RawCommit>,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawCheckSuite {
    id: u64,
    status: String,
    conclusion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCheckRun {
    id: u64,
    name: String,
    html_url: String,
    status: String,
    conclusion: Option<String>,
    check_suite: RawCheckSuite,
}

#[derive(Debug, Deserialize)]
struct RawCheckRunEvent {
    check_run: RawCheckRun,
    repository: RawRepository,
}

/// Maps a GitHub `(status, conclusion)` pair onto the canonical [`Status`].
///
/// Used for both check runs and check suites. Unlisted combinations resolve to
/// [`Status::Unknown`] instead of failing.
pub fn reconcile_check_status(status: &str, conclusion: Option<&str>) -> Status {
    match (status, conclusion) {
        ("queued" | "in_progress", _) => Status::Running,
        ("completed", Some("success")) => Status::Success,
        ("completed", Some("failure" | "timed_out")) => Status::Failed,
        ("completed", Some("cancelled")) => Status::Cancelled,
        _ => Status::Unknown,
    }
}

/// Normalizer for GitHub webhooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitHubNormalizer;

impl Normalizer for GitHubNormalizer {
    fn provider(&self) -> Provider {
        Provider::GitHub
    }

    fn push(&self, payload: &Value) -> Result<PushEvent> {
        let raw: RawPush = parse(payload)?;
        let repo = raw.repository.into_repository();

        let ref_url = format!("{}/tree/{}", repo.url, crate::model::short_ref(&raw.git_ref));
        let head_url = format!("{}/commit/{}", repo.url, raw.after);
        let commits = raw
            .commits
            .into_iter()
            .map(|c| Commit {
                id: c.id,
                message: trim_message(&c.message),
                author: c.author.name,
                url: c.url,
            })
            .collect();

        Ok(PushEvent {
            forced: raw.forced,
            git_ref: raw.git_ref,
            ref_url,
            head_sha: raw.after,
            head_url,
            author: raw.pusher.name,
            commits,
            repo,
        })
    }

    fn pipeline(&self, _payload: &Value) -> Result<PipelineEvent> {
        // Check suites only reach us embedded in check_run payloads.
        Err(NormalizeError::Unsupported {
            provider: Provider::GitHub,
            kind: "pipeline",
        })
    }

    fn job(&self, payload: &Value) -> Result<JobEvent> {
        let raw: RawCheckRunEvent = parse(payload)?;
        let repo = raw.repository.into_repository();
        let run = raw.check_run;
        let suite = run.check_suite;

        let pipeline = PipelineEvent {
            id: suite.id,
            url: None,
            status: reconcile_check_status(&suite.status, suite.conclusion.as_deref()),
            repo: Arc::clone(&repo),
        };

        Ok(JobEvent {
            id: run.id,
            name: run.name,
            url: format!("{}{}", run.html_url, CHECK_SUITE_FOCUS),
            status: reconcile_check_status(&run.status, run.conclusion.as_deref()),
            pipeline,
            repo,
        })
    }
}
