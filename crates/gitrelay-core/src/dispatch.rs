//! Dispatch policy
//!
//! Decides what to do with an inbound webhook from its provider headers,
//! before any payload is looked at.

use crate::normalize::{EventKind, Provider};

/// Header GitHub uses to announce the event kind.
pub const GITHUB_EVENT_HEADER: &str = "x-github-event";
/// Header GitLab uses to announce the event kind.
pub const GITLAB_EVENT_HEADER: &str = "x-gitlab-event";

/// Provider and raw event kind announced by an inbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub provider: Provider,
    pub event: String,
}

/// Why a request was turned away before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Neither provider header was present.
    UnknownService,
    /// Both provider headers were present.
    AmbiguousService,
    /// The provider is known but the event kind is not relayed.
    UnknownEvent { provider: Provider, event: String },
}

impl Rejection {
    /// Short reason returned to the caller.
    pub fn detail(&self) -> String {
        match self {
            Self::UnknownService => "Unknown git service".to_string(),
            Self::AmbiguousService => "Ambiguous git service".to_string(),
            Self::UnknownEvent { .. } => "Unknown event".to_string(),
        }
    }
}

/// What to do with an announced event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Acknowledge without sending anything (webhook registration handshake).
    Ping,
    /// Normalize into the given kind, render and deliver.
    Relay(EventKind),
}

/// Works out which provider sent a request from its two event headers.
pub fn identify(github_event: Option<&str>, gitlab_event: Option<&str>) -> Result<Announcement, Rejection> {
    match (github_event, gitlab_event) {
        (Some(_), Some(_)) => Err(Rejection::AmbiguousService),
        (Some(event), None) => Ok(Announcement {
            provider: Provider::GitHub,
            event: event.to_string(),
        }),
        (None, Some(event)) => Ok(Announcement {
            provider: Provider::GitLab,
            event: event.to_string(),
        }),
        (None, None) => Err(Rejection::UnknownService),
    }
}

/// Picks a route for an announced event kind.
pub fn route(announcement: &Announcement) -> Result<Route, Rejection> {
    let route = match (announcement.provider, announcement.event.as_str()) {
        (Provider::GitHub, "ping") => Route::Ping,
        (Provider::GitHub, "push") | (Provider::GitLab, "Push Hook") => Route::Relay(EventKind::Push),
        (Provider::GitLab, "Pipeline Hook") => Route::Relay(EventKind::Pipeline),
        (Provider::GitHub, "check_run") => Route::Relay(EventKind::Job),
        (provider, event) => {
            return Err(Rejection::UnknownEvent {
                provider,
                event: event.to_string(),
            })
        }
    };
    Ok(route)
}
