//! Applies a [`LabelDelta`] to one issue.
//!
//! Removals go first, one call per label, and a failed removal only warns.
//! Labels to add are created in the repository when missing and then
//! attached in a single batch. The issue's label set is re-read at the end.

use tracing::{debug, info, warn};

use crate::catalog::PolicyLabel;
use crate::error::{LabelerError, Result};
use crate::github::{label_names, RepoService};
use crate::policy::LabelDelta;

/// What a reconciliation did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub removed: Vec<String>,
    pub added: Vec<String>,
    pub failed_removals: Vec<String>,
    /// Labels on the issue after reconciliation
    pub labels: Vec<String>,
}

impl ReconcileReport {
    /// Whether any label was attached or detached.
    pub fn mutated(&self) -> bool {
        !self.removed.is_empty() || !self.added.is_empty()
    }
}

/// Make sure `label` is defined in the repository, creating it if needed.
pub async fn ensure_label_exists(service: &dyn RepoService, label: &PolicyLabel) -> Result<()> {
    match service.get_label(&label.name).await {
        Ok(_) => {
            debug!(label = %label.name, "Label already exists");
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            info!(label = %label.name, color = %label.color, "Creating missing label");
            match service.create_label(&label.name, &label.color).await {
                Ok(_) => Ok(()),
                // Created concurrently by another run.
                Err(LabelerError::Api { status: 422, message }) => {
                    debug!(label = %label.name, %message, "Label was created meanwhile");
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }
        Err(e) => Err(e),
    }
}

/// Apply `delta` to issue `number` and report the resulting label set.
pub async fn reconcile(
    service: &dyn RepoService,
    number: u64,
    delta: &LabelDelta,
) -> Result<ReconcileReport> {
    let mut report = ReconcileReport::default();

    for name in &delta.to_remove {
        match service.remove_label(number, name).await {
            Ok(()) => {
                info!(pr = number, label = %name, "Removed label");
                report.removed.push(name.clone());
            }
            Err(e) if e.is_not_found() => {
                debug!(pr = number, label = %name, "Label was not attached");
            }
            Err(e) => {
                warn!(pr = number, label = %name, error = %e, "Failed to remove label");
                report.failed_removals.push(name.clone());
            }
        }
    }

    if !delta.to_add.is_empty() {
        for label in &delta.to_add {
            ensure_label_exists(service, label).await?;
        }
        let names = delta.add_names();
        service.add_labels(number, &names).await?;
        info!(pr = number, labels = %names.join(", "), "Added labels");
        report.added = names;
    }

    report.labels = label_names(&service.list_labels(number).await?);
    info!(pr = number, labels = %report.labels.join(","), "Current labels");
    Ok(report)
}
