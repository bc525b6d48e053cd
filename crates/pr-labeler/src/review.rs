//! # Review gate
//!
//! An approval that still leaves the pull request short of the required
//! reviews gets the `needs-one-more` label; once GitHub reports the pull
//! request as `APPROVED` the label comes off. Nothing in this path can fail
//! the run.

use tracing::{error, info, warn};

use crate::catalog::PolicyLabel;
use crate::config::Policy;
use crate::dispatch::EventOutcome;
use crate::error::Result;
use crate::events::{PullRequestReviewEvent, ReviewState};
use crate::github::{label_names, IssueLabel, RepoService, ReviewDecision};
use crate::policy::LabelDelta;
use crate::reconcile::reconcile;

/// Label change for an approving review given the aggregate decision.
pub fn gate_delta(
    decision: Option<ReviewDecision>,
    existing: &[IssueLabel],
    label: &PolicyLabel,
) -> LabelDelta {
    let present = existing.iter().any(|l| l.name == label.name);
    match (decision, present) {
        (Some(ReviewDecision::Approved), true) => LabelDelta::remove(label.name.clone()),
        (Some(ReviewDecision::Approved), false) => LabelDelta::default(),
        (_, false) => LabelDelta::add(label.clone()),
        (_, true) => LabelDelta::default(),
    }
}

async fn apply_gate(service: &dyn RepoService, policy: &Policy, number: u64) -> Result<Vec<String>> {
    let decision = service.review_decision(number).await?;
    info!(pr = number, ?decision, "Review decision");

    let existing = service.list_labels(number).await?;
    let delta = gate_delta(decision, &existing, &policy.needs_one_more);
    if delta.is_empty() {
        return Ok(label_names(&existing));
    }

    let report = reconcile(service, number, &delta).await?;
    Ok(report.labels)
}

async fn current_labels(service: &dyn RepoService, number: u64) -> Option<Vec<String>> {
    match service.list_labels(number).await {
        Ok(labels) => Some(label_names(&labels)),
        Err(e) => {
            warn!(pr = number, error = %e, "Could not read labels");
            None
        }
    }
}

/// Handle a `pull_request_review` event. Errors are logged, never returned.
pub async fn handle_review(
    service: &dyn RepoService,
    policy: &Policy,
    event: &PullRequestReviewEvent,
) -> EventOutcome {
    let number = event.pull_request.number;
    let reviewer = event.review.user.as_ref().map_or("unknown", |u| u.login.as_str());
    info!(
        pr = number,
        review = event.review.id,
        reviewer,
        state = ?event.review.state,
        "Review submitted on '{}'",
        event.pull_request.title
    );

    let labels = if event.review.state == ReviewState::Approved {
        match apply_gate(service, policy, number).await {
            Ok(labels) => Some(labels),
            Err(e) => {
                error!(pr = number, error = %e, "Review gate failed");
                current_labels(service, number).await
            }
        }
    } else {
        info!(pr = number, "Review is not an approval, nothing to do");
        current_labels(service, number).await
    };

    EventOutcome {
        labels,
        ..EventOutcome::default()
    }
}
