//! In-memory repository used by the end-to-end tests.

#![allow(dead_code)]

use async_trait::async_trait;
use pr_labeler::github::{ChangedFile, IssueLabel, RepoService, ReviewDecision};
use pr_labeler::{LabelerError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A single repository with one pull request.
#[derive(Default)]
pub struct FakeRepo {
    pub files: Vec<ChangedFile>,
    pub pushed_files: Vec<ChangedFile>,
    pub contents: HashMap<String, String>,
    pub decision: Option<ReviewDecision>,
    pub issue_labels: Mutex<Vec<IssueLabel>>,
    pub repo_labels: Mutex<Vec<IssueLabel>>,
    /// Calls that changed remote state
    pub mutations: AtomicUsize,
}

impl FakeRepo {
    pub fn with_files(files: Vec<ChangedFile>) -> Self {
        Self {
            files,
            ..Self::default()
        }
    }

    pub fn with_issue_labels(self, names: &[&str]) -> Self {
        *self.issue_labels.lock().unwrap() = names.iter().map(|n| IssueLabel::named(*n)).collect();
        self
    }

    pub fn with_content(mut self, path: &str, text: &str) -> Self {
        self.contents.insert(path.to_string(), text.to_string());
        self
    }

    pub fn label_names(&self) -> Vec<String> {
        self.issue_labels
            .lock()
            .unwrap()
            .iter()
            .map(|l| l.name.clone())
            .collect()
    }

    pub fn repo_label(&self, name: &str) -> Option<IssueLabel> {
        self.repo_labels
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.name == name)
            .cloned()
    }

    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    pub fn reset_mutations(&self) {
        self.mutations.store(0, Ordering::SeqCst);
    }

    fn mutated(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RepoService for FakeRepo {
    async fn list_changed_files(&self, _number: u64) -> Result<Vec<ChangedFile>> {
        Ok(self.files.clone())
    }

    async fn list_labels(&self, _number: u64) -> Result<Vec<IssueLabel>> {
        Ok(self.issue_labels.lock().unwrap().clone())
    }

    async fn add_labels(&self, _number: u64, names: &[String]) -> Result<()> {
        self.mutated();
        let mut labels = self.issue_labels.lock().unwrap();
        for name in names {
            if !labels.iter().any(|l| &l.name == name) {
                labels.push(IssueLabel::named(name.clone()));
            }
        }
        Ok(())
    }

    async fn remove_label(&self, _number: u64, name: &str) -> Result<()> {
        let mut labels = self.issue_labels.lock().unwrap();
        let before = labels.len();
        labels.retain(|l| l.name != name);
        if labels.len() == before {
            return Err(LabelerError::NotFound(format!("label '{name}'")));
        }
        self.mutated();
        Ok(())
    }

    async fn get_label(&self, name: &str) -> Result<IssueLabel> {
        self.repo_label(name)
            .ok_or_else(|| LabelerError::NotFound(format!("label '{name}'")))
    }

    async fn create_label(&self, name: &str, color: &str) -> Result<IssueLabel> {
        self.mutated();
        let label = IssueLabel {
            name: name.to_string(),
            color: Some(color.to_string()),
        };
        self.repo_labels.lock().unwrap().push(label.clone());
        Ok(label)
    }

    async fn compare_commits(&self, _base: &str, _head: &str) -> Result<Vec<ChangedFile>> {
        Ok(self.pushed_files.clone())
    }

    async fn get_file_content(&self, path: &str) -> Result<String> {
        self.contents
            .get(path)
            .cloned()
            .ok_or_else(|| LabelerError::NotFound(format!("file '{path}'")))
    }

    async fn review_decision(&self, _number: u64) -> Result<Option<ReviewDecision>> {
        Ok(self.decision)
    }
}
