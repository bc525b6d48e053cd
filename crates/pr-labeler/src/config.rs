//! Labeling policy configuration.
//!
//! The built-in policy matches the catalog in [`crate::catalog`]. A YAML file
//! can override any field; omitted fields keep their defaults:
//!
//! ```yaml
//! size_tiers:
//!   - { name: size/S, color: 5D9801, max_lines: 50 }
//!   - { name: size/L, color: A14C05 }
//! server_only_patterns:
//!   - "services/**"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::catalog::{
    default_size_tiers, PolicyLabel, SizeCatalog, SizeTier, CHROMATIC_SKIP_GLOB_PATTERNS,
    IGNORE_FILE, IGNORE_MARKERS, NON_DEPLOYMENT_GLOB_PATTERNS, SERVER_ONLY_GLOB_PATTERNS,
};
use crate::classify::PatternSet;
use crate::error::{LabelerError, Result};

/// Policy as written in a policy file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    pub size_tiers: Vec<SizeTier>,
    pub server_only_label: PolicyLabel,
    pub skip_chromatic_label: PolicyLabel,
    pub needs_one_more_label: PolicyLabel,
    pub non_deployment_patterns: Vec<String>,
    pub chromatic_skip_patterns: Vec<String>,
    pub server_only_patterns: Vec<String>,
    /// Repository file listing paths excluded from the size count
    pub ignore_file: String,
    /// A line of the ignore file containing any of these excludes its first token
    pub ignore_markers: Vec<String>,
}

fn owned(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| (*p).to_string()).collect()
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            size_tiers: default_size_tiers(),
            server_only_label: PolicyLabel::server_only(),
            skip_chromatic_label: PolicyLabel::skip_chromatic(),
            needs_one_more_label: PolicyLabel::needs_one_more(),
            non_deployment_patterns: owned(NON_DEPLOYMENT_GLOB_PATTERNS),
            chromatic_skip_patterns: owned(CHROMATIC_SKIP_GLOB_PATTERNS),
            server_only_patterns: owned(SERVER_ONLY_GLOB_PATTERNS),
            ignore_file: IGNORE_FILE.to_string(),
            ignore_markers: owned(IGNORE_MARKERS),
        }
    }
}

impl PolicyConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| LabelerError::Config(format!("invalid policy file: {e}")))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            LabelerError::Config(format!("cannot read policy file {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Validate the configuration and compile its pattern sets.
    pub fn compile(self) -> Result<Policy> {
        let size = SizeCatalog::new(self.size_tiers)?;

        let mut names: HashSet<String> = size.tiers().map(|t| t.name().to_string()).collect();
        for label in [
            &self.server_only_label,
            &self.skip_chromatic_label,
            &self.needs_one_more_label,
        ] {
            label.validate()?;
            if !names.insert(label.name.clone()) {
                return Err(LabelerError::Config(format!(
                    "label '{}' is used for more than one purpose",
                    label.name
                )));
            }
        }

        if self.ignore_markers.iter().any(|marker| marker.trim().is_empty()) {
            return Err(LabelerError::Config("ignore markers must not be empty".into()));
        }

        Ok(Policy {
            size,
            server_only: self.server_only_label,
            skip_chromatic: self.skip_chromatic_label,
            needs_one_more: self.needs_one_more_label,
            non_deployment: PatternSet::new(&self.non_deployment_patterns)?,
            chromatic_skip: PatternSet::new(&self.chromatic_skip_patterns)?,
            server_paths: PatternSet::new(&self.server_only_patterns)?,
            ignore_file: self.ignore_file,
            ignore_markers: self.ignore_markers,
        })
    }
}

/// Validated, compiled policy handed to every evaluator.
#[derive(Debug, Clone)]
pub struct Policy {
    pub size: SizeCatalog,
    pub server_only: PolicyLabel,
    pub skip_chromatic: PolicyLabel,
    pub needs_one_more: PolicyLabel,
    pub non_deployment: PatternSet,
    pub chromatic_skip: PatternSet,
    pub server_paths: PatternSet,
    pub ignore_file: String,
    pub ignore_markers: Vec<String>,
}

impl Policy {
    /// The built-in policy.
    pub fn builtin() -> Result<Self> {
        PolicyConfig::default().compile()
    }
}
