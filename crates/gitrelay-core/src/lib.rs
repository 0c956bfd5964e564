//! Core of gitrelay
//!
//! Turns git hosting webhooks into chat messages without doing any I/O:
//!
//! ```text
//! headers ──> dispatch::route ──> normalize (per provider) ──> model::Event ──> format::render
//! ```
//!
//! - [`dispatch`] decides from the provider headers whether a request is relayed
//! - [`normalize`] maps GitHub and GitLab payloads onto the canonical [`model`]
//! - [`format`] renders canonical events into escaped, length-bounded HTML
//! - [`config`] holds the service configuration

pub mod config;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod model;
pub mod normalize;

pub use config::{AppConfig, ServerConfig, TelegramConfig};
pub use dispatch::{Announcement, Rejection, Route};
pub use error::{NormalizeError, Result};
pub use format::{render, Action, PushStyle, RenderOptions, RenderedMessage, MAX_MESSAGE_LEN};
pub use model::{Commit, Event, JobEvent, PipelineEvent, PushEvent, Repository, Status};
pub use normalize::{
    normalize, normalize_job, normalize_pipeline, normalize_push, EventKind, Normalizer, Provider,
};
