//! Pull request labeling bot.
//!
//! Reacts to one GitHub Actions event per run:
//!
//! - `pull_request`: size tier, `server-only` and `skip-chromatic` labels
//! - `push`: `skip-deploy` and `skip-chromatic` step outputs
//! - `pull_request_review`: the `needs-one-more` review gate label
//!
//! All remote access goes through [`github::RepoService`].

pub mod catalog;
pub mod classify;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod github;
pub mod output;
pub mod policy;
pub mod reconcile;
pub mod review;
pub mod size;

pub use catalog::{PolicyLabel, SizeCatalog, SizeTier};
pub use classify::PatternSet;
pub use config::{Policy, PolicyConfig};
pub use dispatch::{dispatch, EventOutcome};
pub use error::{LabelerError, Result};
pub use events::RepoEvent;
pub use github::{GitHubClient, RepoRef, RepoService};
pub use output::{write_outcome, WorkflowOutputs};
pub use policy::LabelDelta;
pub use reconcile::{reconcile, ReconcileReport};
