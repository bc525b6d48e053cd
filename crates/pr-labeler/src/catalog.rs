//! # Label Catalog
//!
//! The static policy labels the bot manages and the default pattern sets used to
//! classify changed files.
//!
//! ## Size tiers
//!
//! | label      | max lines | color    |
//! |------------|-----------|----------|
//! | `size/XS`  | 10        | `3CBF00` |
//! | `size/S`   | 30        | `5D9801` |
//! | `size/M`   | 100       | `7F7203` |
//! | `size/L`   | 500       | `A14C05` |
//! | `size/XL`  | 800       | `C32607` |
//! | `size/XXL` | -         | `E50009` |
//!
//! Tiers are kept sorted by `max_lines`; the single unbounded tier is the
//! catch-all, so every line count maps to exactly one tier.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{LabelerError, Result};

pub const MOCK_GLOB_PATTERN: &str = "**/*.+(mocks|mock-data).ts";
pub const STORY_GLOB_PATTERN: &str = "**/*.story.ts?(x)";
pub const GITHUB_GLOB_PATTERN: &str = ".github/**";
pub const HUSKY_GLOB_PATTERN: &str = ".husky/**";
pub const OUTFILE_GLOB_PATTERN: &str = ".out/**";
pub const STORYBOOK_GLOB_PATTERN: &str = ".storybook/**";
pub const VSCODE_GLOB_PATTERN: &str = ".vscode/**";
pub const FERGY_TEMPLATES_GLOB_PATTERN: &str = "fergy-templates/**";
pub const DOCS_GLOB_PATTERN: &str = "**/*.md";
pub const DOCS_MISC_GLOB_PATTERN: &str = "doc*/**";
pub const TESTS_GLOB_PATTERN: &str = "**/*.test.ts?(x)";
pub const YAML_GLOB_PATTERN: &str = "**/*.y?(a)ml";
pub const SERVER_ONLY_GLOB_PATTERN: &str = "**/src/server/**";

/// Paths whose changes never require a deployment.
pub const NON_DEPLOYMENT_GLOB_PATTERNS: &[&str] = &[
    MOCK_GLOB_PATTERN,
    STORY_GLOB_PATTERN,
    GITHUB_GLOB_PATTERN,
    HUSKY_GLOB_PATTERN,
    OUTFILE_GLOB_PATTERN,
    STORYBOOK_GLOB_PATTERN,
    VSCODE_GLOB_PATTERN,
    FERGY_TEMPLATES_GLOB_PATTERN,
    DOCS_GLOB_PATTERN,
    DOCS_MISC_GLOB_PATTERN,
    TESTS_GLOB_PATTERN,
];

/// Paths whose changes cannot affect the visual regression suite.
pub const CHROMATIC_SKIP_GLOB_PATTERNS: &[&str] = &[
    GITHUB_GLOB_PATTERN,
    HUSKY_GLOB_PATTERN,
    OUTFILE_GLOB_PATTERN,
    VSCODE_GLOB_PATTERN,
    FERGY_TEMPLATES_GLOB_PATTERN,
    DOCS_GLOB_PATTERN,
    DOCS_MISC_GLOB_PATTERN,
    TESTS_GLOB_PATTERN,
    YAML_GLOB_PATTERN,
    SERVER_ONLY_GLOB_PATTERN,
];

pub const SERVER_ONLY_GLOB_PATTERNS: &[&str] = &[SERVER_ONLY_GLOB_PATTERN];

/// Repository file listing generated or ignored paths.
pub const IGNORE_FILE: &str = ".gitattributes";

/// Attribute markers that exclude a path from the size count.
pub const IGNORE_MARKERS: &[&str] = &["linguist-generated=true", "pr-size-ignore=true"];

pub const SERVER_ONLY_LABEL: &str = "server-only";
pub const SKIP_CHROMATIC_LABEL: &str = "skip-chromatic";
pub const NEEDS_ONE_MORE_LABEL: &str = "needs-one-more";

/// A label owned by the labeling policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyLabel {
    pub name: String,
    /// Six hex digits, no leading `#`
    pub color: String,
}

impl PolicyLabel {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }

    pub fn server_only() -> Self {
        Self::new(SERVER_ONLY_LABEL, "66E5A2")
    }

    pub fn skip_chromatic() -> Self {
        Self::new(SKIP_CHROMATIC_LABEL, "FC521F")
    }

    pub fn needs_one_more() -> Self {
        Self::new(NEEDS_ONE_MORE_LABEL, "FBCA04")
    }

    /// Check the color is a bare six-digit hex string as the labels API expects.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LabelerError::Config("label name must not be empty".into()));
        }
        if self.color.len() != 6 || !self.color.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(LabelerError::Config(format!(
                "label '{}' has invalid color '{}' (expected six hex digits)",
                self.name, self.color
            )));
        }
        Ok(())
    }
}

/// A size bucket. `max_lines: None` marks the catch-all tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeTier {
    #[serde(flatten)]
    pub label: PolicyLabel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_lines: Option<u64>,
}

impl SizeTier {
    pub fn bounded(name: &str, max_lines: u64, color: &str) -> Self {
        Self {
            label: PolicyLabel::new(name, color),
            max_lines: Some(max_lines),
        }
    }

    pub fn unbounded(name: &str, color: &str) -> Self {
        Self {
            label: PolicyLabel::new(name, color),
            max_lines: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.label.name
    }
}

/// The built-in size tiers.
pub fn default_size_tiers() -> Vec<SizeTier> {
    vec![
        SizeTier::bounded("size/XS", 10, "3CBF00"),
        SizeTier::bounded("size/S", 30, "5D9801"),
        SizeTier::bounded("size/M", 100, "7F7203"),
        SizeTier::bounded("size/L", 500, "A14C05"),
        SizeTier::bounded("size/XL", 800, "C32607"),
        SizeTier::unbounded("size/XXL", "E50009"),
    ]
}

/// Ordered size tiers with a guaranteed catch-all.
#[derive(Debug, Clone)]
pub struct SizeCatalog {
    /// Bounded tiers, strictly ascending by `max_lines`
    bounded: Vec<SizeTier>,
    catch_all: SizeTier,
}

impl SizeCatalog {
    /// Sort and validate a tier list.
    ///
    /// Requires exactly one unbounded tier, distinct thresholds and distinct names.
    pub fn new(tiers: Vec<SizeTier>) -> Result<Self> {
        let mut names = HashSet::new();
        for tier in &tiers {
            tier.label.validate()?;
            if !names.insert(tier.name().to_string()) {
                return Err(LabelerError::Config(format!(
                    "duplicate size tier '{}'",
                    tier.name()
                )));
            }
        }

        let (mut bounded, unbounded): (Vec<_>, Vec<_>) =
            tiers.into_iter().partition(|tier| tier.max_lines.is_some());

        let mut unbounded = unbounded.into_iter();
        let catch_all = match (unbounded.next(), unbounded.next()) {
            (Some(tier), None) => tier,
            (None, _) => {
                return Err(LabelerError::Config(
                    "size tiers need one tier without max_lines".into(),
                ))
            }
            (Some(_), Some(extra)) => {
                return Err(LabelerError::Config(format!(
                    "only one size tier may omit max_lines, '{}' is a second one",
                    extra.name()
                )))
            }
        };

        bounded.sort_by_key(|tier| tier.max_lines);
        if let Some(pair) = bounded
            .windows(2)
            .find(|pair| pair[0].max_lines == pair[1].max_lines)
        {
            return Err(LabelerError::Config(format!(
                "size tiers '{}' and '{}' share the same max_lines",
                pair[0].name(),
                pair[1].name()
            )));
        }

        Ok(Self { bounded, catch_all })
    }

    /// The first tier whose bound covers `lines`, else the catch-all.
    pub fn tier_for(&self, lines: u64) -> &SizeTier {
        self.bounded
            .iter()
            .find(|tier| tier.max_lines.is_some_and(|max| lines <= max))
            .unwrap_or(&self.catch_all)
    }

    /// Position of a tier in ascending order.
    pub fn rank_of(&self, name: &str) -> Option<usize> {
        self.tiers().position(|tier| tier.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rank_of(name).is_some()
    }

    /// All tiers, smallest first, catch-all last.
    pub fn tiers(&self) -> impl Iterator<Item = &SizeTier> {
        self.bounded.iter().chain(std::iter::once(&self.catch_all))
    }
}

impl Default for SizeCatalog {
    fn default() -> Self {
        let mut bounded = default_size_tiers();
        let catch_all = bounded.pop().unwrap_or_else(|| SizeTier::unbounded("size/XXL", "E50009"));
        Self { bounded, catch_all }
    }
}
