//! GitHub resource shapes consumed by the labeler.

use serde::{Deserialize, Serialize};

/// A file touched by a pull request or a commit range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Repository-relative path
    #[serde(rename = "filename")]
    pub path: String,
    /// Change status (added, modified, removed, renamed)
    #[serde(default)]
    pub status: String,
    /// Lines added
    #[serde(rename = "additions", default)]
    pub lines_added: u64,
    /// Lines removed
    #[serde(rename = "deletions", default)]
    pub lines_removed: u64,
}

impl ChangedFile {
    pub fn new(path: impl Into<String>, lines_added: u64, lines_removed: u64) -> Self {
        Self {
            path: path.into(),
            status: "modified".to_string(),
            lines_added,
            lines_removed,
        }
    }

    /// Additions plus deletions.
    pub fn changed_lines(&self) -> u64 {
        self.lines_added.saturating_add(self.lines_removed)
    }
}

/// A label as attached to an issue or defined in the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLabel {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

impl IssueLabel {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
        }
    }
}

/// Label names in their original order.
pub fn label_names(labels: &[IssueLabel]) -> Vec<String> {
    labels.iter().map(|label| label.name.clone()).collect()
}

/// Aggregate review state GitHub computes across all reviewers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewDecision {
    Approved,
    ChangesRequested,
    ReviewRequired,
    #[serde(other)]
    Unknown,
}
