//! # GitHub collaborator
//!
//! Everything the labeler needs from the hosting service goes through the
//! [`RepoService`] capability trait. [`GitHubClient`] implements it against the
//! REST and GraphQL APIs; tests substitute mocks or in-memory fakes.

pub mod client;
pub mod graphql;
pub mod types;

use async_trait::async_trait;

use crate::error::{LabelerError, Result};

pub use client::GitHubClient;
pub use graphql::ReviewDecisionQuery;
pub use types::{label_names, ChangedFile, IssueLabel, ReviewDecision};

/// Repository coordinates, parsed from `owner/repo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse the `owner/repo` form used by `GITHUB_REPOSITORY`.
    pub fn parse(full_name: &str) -> Result<Self> {
        match full_name.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(LabelerError::Config(format!(
                "Invalid repository '{full_name}' (expected owner/repo)"
            ))),
        }
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Remote operations on one repository.
///
/// Every call is fallible; a missing resource is reported as
/// [`LabelerError::NotFound`] so callers can treat it as a non-fatal outcome.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepoService: Send + Sync {
    /// Files changed by a pull request.
    async fn list_changed_files(&self, number: u64) -> Result<Vec<ChangedFile>>;

    /// Labels currently attached to an issue or pull request.
    async fn list_labels(&self, number: u64) -> Result<Vec<IssueLabel>>;

    /// Attach labels in one call. Re-adding an attached label is not an error.
    async fn add_labels(&self, number: u64, names: &[String]) -> Result<()>;

    /// Detach a single label.
    async fn remove_label(&self, number: u64, name: &str) -> Result<()>;

    /// Look up a label in the repository catalog.
    async fn get_label(&self, name: &str) -> Result<IssueLabel>;

    /// Create a label in the repository catalog.
    async fn create_label(&self, name: &str, color: &str) -> Result<IssueLabel>;

    /// Files that differ between two commits.
    async fn compare_commits(&self, base: &str, head: &str) -> Result<Vec<ChangedFile>>;

    /// Decoded text of a file on the default branch.
    async fn get_file_content(&self, path: &str) -> Result<String>;

    /// Aggregate review decision; `None` when the repository has no review rules.
    async fn review_decision(&self, number: u64) -> Result<Option<ReviewDecision>>;
}
