//! Size-of-change calculation.
//!
//! The event reports total additions and deletions. Files matched by the
//! repository's ignore file (generated code, lockfiles, ...) are subtracted
//! before the total is mapped onto a size tier.

use tracing::{debug, info};

use crate::catalog::{SizeCatalog, SizeTier};
use crate::classify::PatternSet;
use crate::config::Policy;
use crate::github::{ChangedFile, RepoService};

/// Outcome of measuring one change set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeReport {
    pub tier: SizeTier,
    /// Lines that count towards the size
    pub counted_lines: u64,
    /// Lines in excluded files
    pub excluded_lines: u64,
    pub excluded_files: Vec<String>,
}

/// Glob tokens from ignore-file lines that carry one of `markers`.
pub fn parse_exclusions<S: AsRef<str>>(text: &str, markers: &[S]) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|line| markers.iter().any(|marker| line.contains(marker.as_ref())))
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Fetch and parse the ignore file. Any failure yields an empty set.
pub async fn load_exclusions(service: &dyn RepoService, policy: &Policy) -> PatternSet {
    let text = match service.get_file_content(&policy.ignore_file).await {
        Ok(text) => text,
        Err(e) if e.is_not_found() => {
            info!("No {} found, counting every file", policy.ignore_file);
            return PatternSet::default();
        }
        Err(e) => {
            info!(error = %e, "Could not read {}, counting every file", policy.ignore_file);
            return PatternSet::default();
        }
    };

    let globs = parse_exclusions(&text, policy.ignore_markers.as_slice());
    if globs.is_empty() {
        info!("No custom file exclusions found");
    } else {
        info!("Custom file exclusions found: {}", globs.join(", "));
    }
    let exclusions = PatternSet::lenient(globs);
    debug!(patterns = exclusions.len(), "Compiled exclusion patterns");
    exclusions
}

/// Subtract excluded files from `total_lines` and pick the tier.
pub fn measure(
    total_lines: u64,
    files: &[ChangedFile],
    exclusions: &PatternSet,
    catalog: &SizeCatalog,
) -> SizeReport {
    let mut counted_lines = total_lines;
    let mut excluded_lines = 0u64;
    let mut excluded_files = Vec::new();

    if !exclusions.is_empty() {
        for file in files.iter().filter(|file| exclusions.matches(&file.path)) {
            info!("Excluding file: {}", file.path);
            counted_lines = counted_lines.saturating_sub(file.changed_lines());
            excluded_lines = excluded_lines.saturating_add(file.changed_lines());
            excluded_files.push(file.path.clone());
        }
    }

    info!(
        "Total number of additions and deletions in excluded files: {}",
        excluded_lines
    );
    info!(
        "Total number of additions and deletions that will count towards PR size: {}",
        counted_lines
    );

    let tier = catalog.tier_for(counted_lines).clone();
    debug!(tier = %tier.name(), "Selected size tier");

    SizeReport {
        tier,
        counted_lines,
        excluded_lines,
        excluded_files,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::IGNORE_MARKERS;
    use crate::error::LabelerError;
    use crate::github::MockRepoService;
    use mockall::predicate::eq;

    const GITATTRIBUTES: &str = "\
# generated sources
*.lock linguist-generated=true
src/graphql/generated/** linguist-generated=true -diff
fixtures/** pr-size-ignore=true
*.png binary
";

    #[test]
    fn test_parse_exclusions() {
        assert_eq!(
            parse_exclusions(GITATTRIBUTES, IGNORE_MARKERS),
            vec!["*.lock", "src/graphql/generated/**", "fixtures/**"]
        );
        assert!(parse_exclusions("", IGNORE_MARKERS).is_empty());
        assert!(parse_exclusions("# x linguist-generated=true", IGNORE_MARKERS).is_empty());
    }

    #[test]
    fn test_measure_without_exclusions() {
        let files = vec![ChangedFile::new("src/app.ts", 20, 5)];
        let report = measure(25, &files, &PatternSet::default(), &SizeCatalog::default());
        assert_eq!(report.tier.name(), "size/S");
        assert_eq!(report.counted_lines, 25);
        assert_eq!(report.excluded_lines, 0);
        assert!(report.excluded_files.is_empty());
    }

    #[test]
    fn test_measure_subtracts_excluded_files() {
        let files = vec![
            ChangedFile::new("src/app.ts", 8, 0),
            ChangedFile::new("yarn.lock", 900, 300),
            ChangedFile::new("src/graphql/generated/types.ts", 40, 40),
        ];
        let exclusions = PatternSet::new(["*.lock", "src/graphql/generated/**"]).unwrap();
        let report = measure(1288, &files, &exclusions, &SizeCatalog::default());

        assert_eq!(report.counted_lines, 8);
        assert_eq!(report.excluded_lines, 1280);
        assert_eq!(report.tier.name(), "size/XS");
        assert_eq!(
            report.excluded_files,
            vec!["yarn.lock", "src/graphql/generated/types.ts"]
        );
    }

    #[test]
    fn test_excluding_never_increases_count() {
        let files = vec![
            ChangedFile::new("a.lock", 0, 0),
            ChangedFile::new("b.lock", 7, 1),
        ];
        let exclusions = PatternSet::new(["*.lock"]).unwrap();
        let with = measure(50, &files, &exclusions, &SizeCatalog::default());
        let without = measure(50, &files, &PatternSet::default(), &SizeCatalog::default());
        assert_eq!(without.counted_lines - with.counted_lines, 8);
    }

    #[test]
    fn test_measure_empty_change_is_lowest_tier() {
        let report = measure(0, &[], &PatternSet::default(), &SizeCatalog::default());
        assert_eq!(report.tier.name(), "size/XS");
    }

    #[test]
    fn test_measure_saturates_on_inconsistent_totals() {
        let files = vec![ChangedFile::new("big.lock", 100, 0)];
        let exclusions = PatternSet::new(["*.lock"]).unwrap();
        let report = measure(10, &files, &exclusions, &SizeCatalog::default());
        assert_eq!(report.counted_lines, 0);
    }

    #[tokio::test]
    async fn test_load_exclusions_from_ignore_file() {
        let policy = Policy::builtin().unwrap();
        let mut service = MockRepoService::new();
        service
            .expect_get_file_content()
            .with(eq(".gitattributes"))
            .returning(|_| Ok(GITATTRIBUTES.to_string()));

        let exclusions = load_exclusions(&service, &policy).await;
        assert_eq!(exclusions.len(), 3);
        assert!(exclusions.matches("yarn.lock"));
        assert!(!exclusions.matches("logo.png"));
    }

    #[tokio::test]
    async fn test_forbidden_ignore_file_counts_everything() {
        let policy = Policy::builtin().unwrap();
        let mut service = MockRepoService::new();
        service.expect_get_file_content().times(1).returning(|_| {
            Err(LabelerError::Api {
                status: 403,
                message: "Resource not accessible by integration".into(),
            })
        });

        let exclusions = load_exclusions(&service, &policy).await;
        assert!(exclusions.is_empty());
    }

    #[tokio::test]
    async fn test_missing_ignore_file_counts_everything() {
        let policy = Policy::builtin().unwrap();
        let mut service = MockRepoService::new();
        service
            .expect_get_file_content()
            .returning(|path| Err(LabelerError::NotFound(format!("file '{path}'"))));

        assert!(load_exclusions(&service, &policy).await.is_empty());
    }
}
