//! Workflow event payloads.
//!
//! Only the fields the labeler reads are modeled; everything else in the
//! webhook body is ignored.

use serde::Deserialize;
use std::path::Path;

use crate::error::{LabelerError, Result};
use crate::github::IssueLabel;

/// One workflow trigger, parsed from `GITHUB_EVENT_NAME` and its payload.
#[derive(Debug, Clone)]
pub enum RepoEvent {
    PullRequest(PullRequestEvent),
    Push(PushEvent),
    PullRequestReview(PullRequestReviewEvent),
    /// Any other event name; handled as a no-op
    Unsupported(String),
}

impl RepoEvent {
    /// Parse a payload for the named event.
    pub fn from_payload(event_name: &str, payload: &[u8]) -> Result<Self> {
        let parse_err = |source: serde_json::Error| LabelerError::Event {
            event: event_name.to_string(),
            source,
        };

        match event_name {
            "pull_request" | "pull_request_target" => serde_json::from_slice(payload)
                .map(Self::PullRequest)
                .map_err(parse_err),
            "push" => serde_json::from_slice(payload)
                .map(Self::Push)
                .map_err(parse_err),
            "pull_request_review" => serde_json::from_slice(payload)
                .map(Self::PullRequestReview)
                .map_err(parse_err),
            other => Ok(Self::Unsupported(other.to_string())),
        }
    }

    /// Read and parse the payload file GitHub Actions points at.
    pub fn from_file(event_name: &str, path: &Path) -> Result<Self> {
        let payload = std::fs::read(path)?;
        Self::from_payload(event_name, &payload)
    }

    pub fn name(&self) -> &str {
        match self {
            Self::PullRequest(_) => "pull_request",
            Self::Push(_) => "push",
            Self::PullRequestReview(_) => "pull_request_review",
            Self::Unsupported(name) => name,
        }
    }
}

/// `pull_request` payload
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    /// Action type (opened, synchronize, ...)
    #[serde(default)]
    pub action: Option<String>,
    /// Pull request details
    pub pull_request: PullRequest,
}

/// Pull request as carried by `pull_request` events
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// PR title
    #[serde(default)]
    pub title: String,
    /// Labels at the time the event fired
    #[serde(default)]
    pub labels: Vec<IssueLabel>,
    /// Lines added across all files
    #[serde(default)]
    pub additions: u64,
    /// Lines removed across all files
    #[serde(default)]
    pub deletions: u64,
}

impl PullRequest {
    pub fn total_changed_lines(&self) -> u64 {
        self.additions.saturating_add(self.deletions)
    }
}

/// `push` payload
#[derive(Debug, Clone, Deserialize)]
pub struct PushEvent {
    /// Commit before the push
    pub before: String,
    /// Commit after the push
    pub after: String,
    /// Pushed ref, e.g. `refs/heads/main`
    #[serde(rename = "ref", default)]
    pub git_ref: String,
}

/// `pull_request_review` payload
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestReviewEvent {
    /// Action type (submitted, edited, dismissed)
    #[serde(default)]
    pub action: Option<String>,
    /// Reviewed pull request
    pub pull_request: ReviewedPullRequest,
    /// The submitted review
    pub review: Review,
}

/// Pull request as carried by review events (no line counts)
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewedPullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub labels: Vec<IssueLabel>,
}

/// A single submitted review
#[derive(Debug, Clone, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub id: u64,
    pub state: ReviewState,
    #[serde(default)]
    pub user: Option<ReviewUser>,
}

/// Review author
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewUser {
    pub login: String,
}

/// State of one review. Webhooks send lowercase values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    Approved,
    Commented,
    ChangesRequested,
    Dismissed,
    #[serde(other)]
    Unknown,
}
