//! Message formatters
//!
//! Pure functions turning canonical events into Telegram-flavoured HTML
//! messages. Every string taken from a payload is escaped here and every
//! message is kept within [`MAX_MESSAGE_LEN`] characters.

mod pipeline;
mod push;

pub use pipeline::{render_job, render_pipeline};
pub use push::{render_push, COMPACT_MAX_COMMITS, NARRATIVE_MAX_COMMITS};

use serde::{Deserialize, Serialize};

use crate::model::Event;

/// Hard limit of the chat transport on a single message text.
pub const MAX_MESSAGE_LEN: usize = 4096;

const ELLIPSIS: char = '…';

/// Link attached to a message, rendered as a button by the chat client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Plain-text button label
    pub label: String,
    pub url: String,
}

impl Action {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// A formatted message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedMessage {
    /// HTML text
    pub text: String,
    /// Buttons, in display order
    pub actions: Vec<Action>,
}

impl RenderedMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            actions: Vec::new(),
        }
    }

    pub fn with_actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = actions;
        self
    }

    /// Length of the text in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// How push events are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PushStyle {
    /// One message per commit, each with ref and head buttons.
    #[default]
    #[serde(rename = "new", alias = "compact")]
    Compact,
    /// A single summary message listing the commits.
    #[serde(rename = "old", alias = "narrative")]
    Narrative,
}

/// Per-request display options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub push_style: PushStyle,
    /// Append the author to each listed commit (narrative style only)
    pub show_author_name: bool,
    /// Keep full commit messages instead of their first line (narrative style only)
    pub multiline_commit: bool,
    /// Commit cap; `None` picks the style's default
    pub max_commits: Option<u32>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            push_style: PushStyle::Compact,
            show_author_name: true,
            multiline_commit: true,
            max_commits: None,
        }
    }
}

impl RenderOptions {
    pub fn with_style(mut self, style: PushStyle) -> Self {
        self.push_style = style;
        self
    }

    pub fn with_max_commits(mut self, max_commits: u32) -> Self {
        self.max_commits = Some(max_commits);
        self
    }
}

/// Renders any canonical event into the messages to deliver, in send order.
pub fn render(event: &Event, options: &RenderOptions) -> Vec<RenderedMessage> {
    match event {
        Event::Push(push) => render_push(push, options),
        Event::Pipeline(pipeline) => vec![render_pipeline(pipeline)],
        Event::Job(job) => vec![render_job(job)],
    }
}

fn escape_char(ch: char, out: &mut String) {
    match ch {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        _ => out.push(ch),
    }
}

/// Escapes text for interpolation into HTML markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        escape_char(ch, &mut out);
    }
    out
}

/// Escapes `text` and cuts it so the result is at most `budget` characters.
///
/// Cuts never split an entity; a cut result ends with an ellipsis.
pub fn escape_truncated(text: &str, budget: usize) -> String {
    let escaped = escape_html(text);
    if escaped.chars().count() <= budget {
        return escaped;
    }
    if budget == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    let mut piece = String::new();
    for ch in text.chars() {
        piece.clear();
        escape_char(ch, &mut piece);
        let len = piece.chars().count();
        if used + len > budget - 1 {
            break;
        }
        out.push_str(&piece);
        used += len;
    }
    out.push(ELLIPSIS);
    out
}

/// Escapes several fields that share one character budget.
///
/// Fields no longer than an even share are kept whole; the others split
/// whatever budget remains.
pub(crate) fn escape_shared(fields: &[&str], budget: usize) -> Vec<String> {
    let escaped: Vec<String> = fields.iter().map(|f| escape_html(f)).collect();
    let lengths: Vec<usize> = escaped.iter().map(|e| e.chars().count()).collect();
    if lengths.iter().sum::<usize>() <= budget {
        return escaped;
    }

    let share = budget / fields.len();
    let kept: usize = lengths.iter().filter(|&&len| len <= share).sum();
    let oversized = lengths.iter().filter(|&&len| len > share).count();
    let each = (budget - kept) / oversized;

    fields
        .iter()
        .zip(escaped)
        .zip(lengths)
        .map(|((field, escaped), len)| {
            if len <= share {
                escaped
            } else {
                escape_truncated(field, each)
            }
        })
        .collect()
}
