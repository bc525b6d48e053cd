//! # Event dispatch
//!
//! Routes a [`RepoEvent`] to its handler and collects the workflow outputs the
//! handler produced.

use tracing::{debug, info, instrument};

use crate::config::Policy;
use crate::error::Result;
use crate::events::{PullRequestEvent, PushEvent, RepoEvent};
use crate::github::{label_names, ChangedFile, RepoService};
use crate::policy::{self, LabelDelta};
use crate::reconcile::reconcile;
use crate::review::handle_review;
use crate::size::{load_exclusions, measure};

/// Workflow outputs produced by one event. `None` means "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventOutcome {
    /// Label names on the pull request after the run
    pub labels: Option<Vec<String>>,
    /// Whether the pushed commits can skip deployment
    pub skip_deploy: Option<bool>,
    /// Whether the pushed commits can skip visual regression tests
    pub skip_chromatic: Option<bool>,
}

/// Deploy and visual-test decision for a pushed commit range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushClassification {
    pub skip_deploy: bool,
    pub skip_chromatic: bool,
}

/// Classify pushed files. A push with no files skips both.
pub fn classify_push(files: &[ChangedFile], policy: &Policy) -> PushClassification {
    let mut skip_deploy = true;
    let mut skip_chromatic = true;

    for file in files {
        if !policy.non_deployment.matches(&file.path) {
            info!("Deployable file: {}", file.path);
            skip_deploy = false;
        }
        if !policy.chromatic_skip.matches(&file.path) {
            info!("Chromatic-relevant file: {}", file.path);
            skip_chromatic = false;
        }
    }

    PushClassification {
        skip_deploy,
        skip_chromatic,
    }
}

/// Run the handler for `event`.
pub async fn dispatch(
    service: &dyn RepoService,
    policy: &Policy,
    event: &RepoEvent,
) -> Result<EventOutcome> {
    match event {
        RepoEvent::PullRequest(event) => handle_pull_request(service, policy, event).await,
        RepoEvent::Push(event) => handle_push(service, policy, event).await,
        RepoEvent::PullRequestReview(event) => Ok(handle_review(service, policy, event).await),
        RepoEvent::Unsupported(name) => {
            info!("Event {} is not supported, nothing to do", name);
            Ok(EventOutcome::default())
        }
    }
}

/// Size, server-only and skip-chromatic labels for an opened or updated PR.
#[instrument(skip_all, fields(pr = event.pull_request.number))]
pub async fn handle_pull_request(
    service: &dyn RepoService,
    policy: &Policy,
    event: &PullRequestEvent,
) -> Result<EventOutcome> {
    let pr = &event.pull_request;
    info!("Labeling pull request #{} '{}'", pr.number, pr.title);
    debug!(labels = ?label_names(&pr.labels), "Labels in event payload");

    let files = service.list_changed_files(pr.number).await?;
    info!(files = files.len(), "Retrieved changed files");

    let exclusions = load_exclusions(service, policy).await;
    let size = measure(pr.total_changed_lines(), &files, &exclusions, &policy.size);

    // The payload snapshot can be stale when runs overlap.
    let existing = service.list_labels(pr.number).await?;

    let mut delta = LabelDelta::default();
    delta.merge(policy::size_delta(&size, &existing, &policy.size));
    delta.merge(policy::server_only_delta(
        &files,
        &existing,
        &policy.server_paths,
        &policy.server_only,
    ));
    delta.merge(policy::skip_chromatic_delta(
        &files,
        &existing,
        &policy.chromatic_skip,
        &policy.skip_chromatic,
    ));

    let report = reconcile(service, pr.number, &delta).await?;
    if !report.mutated() {
        info!("Labels already up to date");
    }
    if !report.failed_removals.is_empty() {
        info!(labels = ?report.failed_removals, "Some labels could not be removed");
    }

    Ok(EventOutcome {
        labels: Some(report.labels),
        ..EventOutcome::default()
    })
}

/// Deploy and chromatic decisions for a push.
#[instrument(skip_all, fields(git_ref = %event.git_ref))]
pub async fn handle_push(
    service: &dyn RepoService,
    policy: &Policy,
    event: &PushEvent,
) -> Result<EventOutcome> {
    info!("Comparing {}...{}", event.before, event.after);
    let files = service.compare_commits(&event.before, &event.after).await?;
    info!(files = files.len(), "Retrieved pushed files");
    for file in &files {
        debug!("Pushed file: {}", file.path);
    }
    info!("Non-deployment patterns: {}", policy.non_deployment);
    info!("Chromatic skip patterns: {}", policy.chromatic_skip);

    let classification = classify_push(&files, policy);
    info!(
        skip_deploy = classification.skip_deploy,
        skip_chromatic = classification.skip_chromatic,
        "Push classified"
    );

    Ok(EventOutcome {
        labels: None,
        skip_deploy: Some(classification.skip_deploy),
        skip_chromatic: Some(classification.skip_chromatic),
    })
}
