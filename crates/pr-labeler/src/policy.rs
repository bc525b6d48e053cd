//! # Label Policy Evaluator
//!
//! Each predicate compares the labels an issue should carry against the labels
//! it has and returns the [`LabelDelta`] that closes the gap.
//!
//! Server-only and skip-chromatic require *every* changed file to match: one
//! UI-affecting file anywhere in the change keeps visual tests running.

use tracing::{debug, info};

use crate::catalog::{PolicyLabel, SizeCatalog};
use crate::classify::PatternSet;
use crate::github::{ChangedFile, IssueLabel};
use crate::size::SizeReport;

/// Labels to attach and labels to detach.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelDelta {
    pub to_add: Vec<PolicyLabel>,
    pub to_remove: Vec<String>,
}

impl LabelDelta {
    pub fn add(label: PolicyLabel) -> Self {
        Self {
            to_add: vec![label],
            to_remove: Vec::new(),
        }
    }

    pub fn remove(name: impl Into<String>) -> Self {
        Self {
            to_add: Vec::new(),
            to_remove: vec![name.into()],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Fold `other` in, keeping the first occurrence of each name.
    pub fn merge(&mut self, other: LabelDelta) {
        for label in other.to_add {
            if !self.to_add.iter().any(|l| l.name == label.name) {
                self.to_add.push(label);
            }
        }
        for name in other.to_remove {
            if !self.to_remove.contains(&name) {
                self.to_remove.push(name);
            }
        }
    }

    pub fn add_names(&self) -> Vec<String> {
        self.to_add.iter().map(|label| label.name.clone()).collect()
    }
}

fn has_label(existing: &[IssueLabel], name: &str) -> bool {
    existing.iter().any(|label| label.name == name)
}

/// Add `label` when `wanted` and absent, remove it when unwanted and present.
fn toggle(wanted: bool, label: &PolicyLabel, existing: &[IssueLabel]) -> LabelDelta {
    match (wanted, has_label(existing, &label.name)) {
        (true, false) => LabelDelta::add(label.clone()),
        (false, true) => LabelDelta::remove(label.name.clone()),
        _ => LabelDelta::default(),
    }
}

/// Attach the measured tier and detach every other tier present.
pub fn size_delta(report: &SizeReport, existing: &[IssueLabel], catalog: &SizeCatalog) -> LabelDelta {
    let wanted = &report.tier.label;

    let mut delta = LabelDelta::default();
    if !has_label(existing, &wanted.name) {
        delta.to_add.push(wanted.clone());
    }
    delta.to_remove = existing
        .iter()
        .filter(|label| label.name != wanted.name && catalog.contains(&label.name))
        .map(|label| label.name.clone())
        .collect();

    debug!(
        add = ?delta.add_names(),
        remove = ?delta.to_remove,
        "Size label changes"
    );
    delta
}

/// Whether every changed file is server code.
pub fn is_server_only(files: &[ChangedFile], server_paths: &PatternSet) -> bool {
    for file in files {
        debug!("processing file for server-only: {}", file.path);
    }
    server_paths.matches_every(files.iter().map(|file| file.path.as_str()))
}

pub fn server_only_delta(
    files: &[ChangedFile],
    existing: &[IssueLabel],
    server_paths: &PatternSet,
    label: &PolicyLabel,
) -> LabelDelta {
    let server_only = is_server_only(files, server_paths);
    if server_only {
        info!("This PR is server only and has no UI changes");
    } else {
        info!("This PR is not server only");
    }

    let delta = toggle(server_only, label, existing);
    debug!(add = ?delta.add_names(), remove = ?delta.to_remove, "Server-only label changes");
    delta
}

/// Whether no changed file can affect visual regression tests.
pub fn can_skip_chromatic(files: &[ChangedFile], chromatic_skip: &PatternSet) -> bool {
    for file in files {
        debug!("processing file for skip-chromatic: {}", file.path);
    }
    chromatic_skip.matches_every(files.iter().map(|file| file.path.as_str()))
}

pub fn skip_chromatic_delta(
    files: &[ChangedFile],
    existing: &[IssueLabel],
    chromatic_skip: &PatternSet,
    label: &PolicyLabel,
) -> LabelDelta {
    let skip = can_skip_chromatic(files, chromatic_skip);
    if skip {
        info!("This PR can skip chromatic");
    } else {
        info!("This PR needs to run chromatic");
    }

    let delta = toggle(skip, label, existing);
    debug!(add = ?delta.add_names(), remove = ?delta.to_remove, "Skip-chromatic label changes");
    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{SizeTier, CHROMATIC_SKIP_GLOB_PATTERNS, SERVER_ONLY_GLOB_PATTERNS};

    fn labels(names: &[&str]) -> Vec<IssueLabel> {
        names.iter().map(|name| IssueLabel::named(*name)).collect()
    }

    fn files(paths: &[&str]) -> Vec<ChangedFile> {
        paths.iter().map(|path| ChangedFile::new(*path, 1, 1)).collect()
    }

    fn report_for(tier: &str, catalog: &SizeCatalog) -> SizeReport {
        let tier: SizeTier = catalog.tiers().find(|t| t.name() == tier).unwrap().clone();
        SizeReport {
            tier,
            counted_lines: 0,
            excluded_lines: 0,
            excluded_files: Vec::new(),
        }
    }

    #[test]
    fn test_size_moves_between_tiers() {
        let catalog = SizeCatalog::default();
        let delta = size_delta(&report_for("size/M", &catalog), &labels(&["size/S"]), &catalog);
        assert_eq!(delta.add_names(), vec!["size/M"]);
        assert_eq!(delta.to_remove, vec!["size/S"]);
    }

    #[test]
    fn test_size_already_correct() {
        let catalog = SizeCatalog::default();
        let delta = size_delta(
            &report_for("size/L", &catalog),
            &labels(&["bug", "size/L"]),
            &catalog,
        );
        assert!(delta.is_empty());
    }

    #[test]
    fn test_size_clears_every_stale_tier() {
        let catalog = SizeCatalog::default();
        let delta = size_delta(
            &report_for("size/XS", &catalog),
            &labels(&["size/XS", "size/XL", "enhancement", "size/XXL"]),
            &catalog,
        );
        assert!(delta.to_add.is_empty());
        assert_eq!(delta.to_remove, vec!["size/XL", "size/XXL"]);
    }

    #[test]
    fn test_server_only() {
        let server = PatternSet::new(SERVER_ONLY_GLOB_PATTERNS).unwrap();
        let label = PolicyLabel::server_only();

        let delta = server_only_delta(
            &files(&["src/server/db.ts", "apps/api/src/server/routes.ts"]),
            &[],
            &server,
            &label,
        );
        assert_eq!(delta, LabelDelta::add(label.clone()));

        let delta = server_only_delta(
            &files(&["src/server/db.ts", "src/client/App.tsx"]),
            &labels(&["server-only"]),
            &server,
            &label,
        );
        assert_eq!(delta, LabelDelta::remove("server-only"));

        assert!(!is_server_only(&[], &server));
        let delta = server_only_delta(&[], &labels(&["server-only"]), &server, &label);
        assert_eq!(delta.to_remove, vec!["server-only"]);
    }

    #[test]
    fn test_skip_chromatic() {
        let skip = PatternSet::new(CHROMATIC_SKIP_GLOB_PATTERNS).unwrap();
        let label = PolicyLabel::skip_chromatic();

        let delta = skip_chromatic_delta(
            &files(&["README.md", ".github/workflows/ci.yml", "src/server/db.ts"]),
            &[],
            &skip,
            &label,
        );
        assert_eq!(delta.add_names(), vec!["skip-chromatic"]);

        let delta = skip_chromatic_delta(
            &files(&["README.md", ".github/workflows/ci.yml", "src/server/db.ts"]),
            &labels(&["skip-chromatic"]),
            &skip,
            &label,
        );
        assert!(delta.is_empty());

        let delta = skip_chromatic_delta(
            &files(&["README.md", "src/components/Button.tsx"]),
            &labels(&["skip-chromatic"]),
            &skip,
            &label,
        );
        assert_eq!(delta.to_remove, vec!["skip-chromatic"]);

        assert!(!can_skip_chromatic(&[], &skip));
    }

    #[test]
    fn test_merge_deduplicates() {
        let mut delta = LabelDelta::add(PolicyLabel::server_only());
        delta.merge(LabelDelta::add(PolicyLabel::server_only()));
        delta.merge(LabelDelta::remove("size/S"));
        delta.merge(LabelDelta::remove("size/S"));
        assert_eq!(delta.to_add.len(), 1);
        assert_eq!(delta.to_remove, vec!["size/S"]);
    }
}
