use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::{parse, trim_message, Normalizer, Provider};
use crate::error::{NormalizeError, Result};
use crate::model::{short_ref, Commit, JobEvent, PipelineEvent, PushEvent, Repository, Status};

#[derive(Debug, Deserialize)]
struct RawProject {
    web_url: String,
    path_with_namespace: String,
}

impl RawProject {
    fn into_repository(self) -> Arc<Repository> {
        Arc::new(Repository::new(self.web_url, self.path_with_namespace))
    }
}

#[derive(Debug, Deserialize)]
struct RawAuthor {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawCommit {
    id: String,
    message: String,
    author: RawAuthor,
    url: String,
}

#[derive(Debug, Deserialize)]
struct RawPush {
    #[serde(rename = "ref")]
    git_ref: String,
    after: String,
    user_name: String,
    commits: Vec<RawCommit>,
    project: RawProject,
}

#[derive(Debug, Deserialize)]
struct RawPipelineAttributes {
    id: u64,
    /// Looked up by exact canonical name; anything else is a schema violation.
    status: Status,
}

#[derive(Debug, Deserialize)]
struct RawPipeline {
    object_attributes: RawPipelineAttributes,
    project: RawProject,
}

/// Normalizer for GitLab webhooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitLabNormalizer;

impl Normalizer for GitLabNormalizer {
    fn provider(&self) -> Provider {
        Provider::GitLab
    }

    fn push(&self, payload: &Value) -> Result<PushEvent> {
        let raw: RawPush = parse(payload)?;
        let repo = raw.project.into_repository();

        let ref_url = format!("{}/-/tree/{}", repo.url, short_ref(&raw.git_ref));
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
            // GitLab push hooks carry no force-push signal
            forced: false,
            git_ref: raw.git_ref,
            ref_url,
            head_sha: raw.after,
            head_url,
            author: raw.user_name,
            commits,
            repo,
        })
    }

    fn pipeline(&self, payload: &Value) -> Result<PipelineEvent> {
        let raw: RawPipeline = parse(payload)?;
        let repo = raw.project.into_repository();
        let id = raw.object_attributes.id;

        Ok(PipelineEvent {
            id,
            url: Some(format!("{}/-/pipelines/{}", repo.url, id)),
            status: raw.object_attributes.status,
            repo,
        })
    }

    fn job(&self, _payload: &Value) -> Result<JobEvent> {
        Err(NormalizeError::Unsupported {
            provider: Provider::GitLab,
            kind: "job",
        })
    }
}
