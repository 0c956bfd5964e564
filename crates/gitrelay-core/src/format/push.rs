use super::{escape_html, escape_shared, escape_truncated, Action, PushStyle, RenderOptions, RenderedMessage, MAX_MESSAGE_LEN};
use crate::model::{Commit, PushEvent};

/// Upper bound (and default) on per-commit messages in compact style.
pub const COMPACT_MAX_COMMITS: u32 = 5;

/// Default commit count above which narrative style drops the commit list.
pub const NARRATIVE_MAX_COMMITS: u32 = 6;

/// Renders a push in the requested style.
///
/// Compact style may yield no message at all (a non-forced push without
/// commits, e.g. a branch deletion); narrative style always yields one.
pub fn render_push(event: &PushEvent, options: &RenderOptions) -> Vec<RenderedMessage> {
    match options.push_style {
        PushStyle::Compact => render_compact(event, options),
        PushStyle::Narrative => vec![render_narrative(event, options)],
    }
}

/// Commit cap for compact style: out-of-range values collapse to the maximum.
fn compact_limit(max_commits: Option<u32>) -> usize {
    match max_commits {
        Some(n) if (1..=COMPACT_MAX_COMMITS).contains(&n) => n as usize,
        _ => COMPACT_MAX_COMMITS as usize,
    }
}

/// Commit cap for narrative style; `None` means unlimited.
fn narrative_limit(max_commits: Option<u32>) -> Option<usize> {
    match max_commits.unwrap_or(NARRATIVE_MAX_COMMITS) {
        0 => None,
        n => Some(n as usize),
    }
}

fn push_actions(event: &PushEvent) -> Vec<Action> {
    vec![
        Action::new(event.target(), &event.ref_url),
        Action::new(event.short_head_sha(), &event.head_url),
    ]
}

/// Characters left for payload text once the `fixed` markup is in place.
fn room(fixed: &[&str]) -> usize {
    MAX_MESSAGE_LEN.saturating_sub(fixed.iter().map(|s| s.chars().count()).sum())
}

fn render_compact(event: &PushEvent, options: &RenderOptions) -> Vec<RenderedMessage> {
    if event.forced {
        let author = escape_truncated(&event.author, room(&["🔨 <b>", " force pushed</b>"]));
        let text = format!("🔨 <b>{author} force pushed</b>");
        return vec![RenderedMessage::new(text).with_actions(push_actions(event))];
    }

    let tail = "</pre>";
    // Author takes at most half the room
    let author = escape_truncated(
        &event.author,
        room(&["📝 <b>New commit by ", "</b>\n<pre>", tail]) / 2,
    );
    let head = format!("📝 <b>New commit by {author}</b>\n<pre>");
    let budget = room(&[head.as_str(), tail]);

    event
        .commits
        .iter()
        .take(compact_limit(options.max_commits))
        .map(|commit| {
            let body = escape_truncated(&commit.message, budget);
            RenderedMessage::new(format!("{head}{body}{tail}")).with_actions(push_actions(event))
        })
        .collect()
}

fn commit_line(commit: &Commit, options: &RenderOptions) -> String {
    let message = if options.multiline_commit {
        commit.message.as_str()
    } else {
        commit.summary()
    };

    let mut line = format!(
        "<a href=\"{}\">{}</a>: {}",
        escape_html(&commit.url),
        escape_html(commit.short_id()),
        escape_html(message)
    );
    if options.show_author_name {
        line.push_str(&format!(" by <i>{}</i>", escape_html(&commit.author)));
    }
    line
}

fn render_narrative(event: &PushEvent, options: &RenderOptions) -> RenderedMessage {
    let target = event.target();

    if event.forced {
        let fields = escape_shared(
            &[event.author.as_str(), target.as_str()],
            room(&["🔨 <b>", "</b> force pushed to <b>", "</b>"]),
        );
        return RenderedMessage::new(format!(
            "🔨 <b>{}</b> force pushed to <b>{}</b>",
            fields[0], fields[1]
        ));
    }

    let count = event.commits.len();
    let noun = if count == 1 { "commit" } else { "commits" };
    let lead = format!("🔨 {count} new {noun} to <b>");
    let target = escape_truncated(&target, room(&[lead.as_str(), "</b>"]));
    let header = format!("{lead}{target}</b>");

    let over_limit = narrative_limit(options.max_commits).is_some_and(|limit| count > limit);
    if count == 0 || over_limit {
        return RenderedMessage::new(header);
    }

    let lines: Vec<String> = event
        .commits
        .iter()
        .map(|commit| commit_line(commit, options))
        .collect();
    let text = format!("{header}:\n\n{}", lines.join("\n"));

    if text.chars().count() <= MAX_MESSAGE_LEN {
        RenderedMessage::new(text)
    } else {
        tracing::debug!(
            commits = count,
            "Commit list exceeds message limit, sending header only"
        );
        RenderedMessage::new(header)
    }
}
