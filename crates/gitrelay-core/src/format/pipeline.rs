use super::{escape_html, Action, RenderedMessage};
use crate::model::{JobEvent, PipelineEvent, Repository, Status};

fn pipeline_headline(status: Status) -> &'static str {
    match status {
        Status::Running => "<b>🚀 Pipeline started</b>",
        Status::Failed => "<b>😔 Pipeline failed</b>",
        Status::Success => "<b>🥳 Pipeline succeeded</b>",
        Status::Cancelled => "<b>✋ Pipeline cancelled</b>",
        Status::Unknown => "<b>Unknown pipeline status</b>",
    }
}

fn job_headline(status: Status, name: &str) -> String {
    let name = escape_html(name);
    match status {
        Status::Running => format!("<b>🚀 Job \"{name}\" started</b>"),
        Status::Failed => format!("<b>😔 Job \"{name}\" failed</b>"),
        Status::Success => format!("<b>🥳 Job \"{name}\" succeeded</b>"),
        Status::Cancelled => format!("<b>✋ Job \"{name}\" cancelled</b>"),
        Status::Unknown => format!("<b>Job \"{name}\" has unknown status</b>"),
    }
}

fn pipeline_label(id: u64) -> String {
    format!("Pipeline #{id}")
}

fn repo_action(repo: &Repository) -> Action {
    Action::new(&repo.name, &repo.url)
}

pub fn render_pipeline(event: &PipelineEvent) -> RenderedMessage {
    let mut actions = vec![repo_action(&event.repo)];
    if let Some(url) = &event.url {
        actions.push(Action::new(pipeline_label(event.id), url));
    }
    RenderedMessage::new(pipeline_headline(event.status)).with_actions(actions)
}

pub fn render_job(event: &JobEvent) -> RenderedMessage {
    let text = format!(
        "{}\n{}",
        job_headline(event.status, &event.name),
        pipeline_label(event.pipeline.id)
    );
    let actions = vec![
        repo_action(&event.repo),
        Action::new(pipeline_label(event.pipeline.id), &event.url),
    ];
    RenderedMessage::new(text).with_actions(actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn repo() -> Arc<Repository> {
        Arc::new(Repository::new("https://gitlab.com/group/app", "group/app"))
    }

    fn pipeline(status: Status, url: Option<&str>) -> PipelineEvent {
        PipelineEvent {
            id: 42,
            url: url.map(String::from),
            status,
            repo: repo(),
        }
    }

    #[test]
    fn test_pipeline_templates() {
        let cases = [
            (Status::Running, "<b>🚀 Pipeline started</b>"),
            (Status::Failed, "<b>😔 Pipeline failed</b>"),
            (Status::Success, "<b>🥳 Pipeline succeeded</b>"),
            (Status::Cancelled, "<b>✋ Pipeline cancelled</b>"),
            (Status::Unknown, "<b>Unknown pipeline status</b>"),
        ];

        for (status, expected) in cases {
            assert_eq!(render_pipeline(&pipeline(status, None)).text, expected);
        }
    }

    #[test]
    fn test_pipeline_actions() {
        let url = "https://gitlab.com/group/app/-/pipelines/42";
        let message = render_pipeline(&pipeline(Status::Success, Some(url)));

        assert_eq!(
            message.actions,
            vec![
                Action::new("group/app", "https://gitlab.com/group/app"),
                Action::new("Pipeline #42", url),
            ]
        );

        let without_url = render_pipeline(&pipeline(Status::Success, None));
        assert_eq!(without_url.actions.len(), 1);
    }

    #[test]
    fn test_job_message() {
        let repo = repo();
        let job = JobEvent {
            id: 7,
            name: "lint <fast>".to_string(),
            url: "https://github.com/o/r/runs/7?check_suite_focus=true".to_string(),
            status: Status::Failed,
            pipeline: PipelineEvent {
                id: 99,
                url: None,
                status: Status::Running,
                repo: Arc::clone(&repo),
            },
            repo,
        };

        let message = render_job(&job);
        assert_eq!(
            message.text,
            "<b>😔 Job \"lint &lt;fast&gt;\" failed</b>\nPipeline #99"
        );
        assert_eq!(message.actions[1].label, "Pipeline #99");
        assert_eq!(message.actions[1].url, job.url);
    }

    #[test]
    fn test_job_unknown_status() {
        assert_eq!(
            job_headline(Status::Unknown, "deploy"),
            "<b>Job \"deploy\" has unknown status</b>"
        );
        assert_eq!(job_headline(Status::Running, "deploy"), "<b>🚀 Job \"deploy\" started</b>");
    }
}
