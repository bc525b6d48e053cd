//! Step outputs for GitHub Actions.
//!
//! Outputs are appended to the file named by `GITHUB_OUTPUT`. Single-line
//! values use `name=value`; multi-line values use the heredoc form.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::dispatch::EventOutcome;
use crate::error::Result;

const DELIMITER: &str = "PR_LABELER_EOF";

/// Destination for step outputs.
#[derive(Debug, Clone, Default)]
pub struct WorkflowOutputs {
    path: Option<PathBuf>,
}

impl WorkflowOutputs {
    /// Write to `path`, or only log outputs when there is none.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn set(&self, name: &str, value: &str) -> Result<()> {
        info!("Output {}={}", name, value);
        let Some(path) = &self.path else {
            debug!("No output file configured");
            return Ok(());
        };

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(format_output(name, value).as_bytes())?;
        Ok(())
    }
}

fn format_output(name: &str, value: &str) -> String {
    if !value.contains('\n') {
        return format!("{name}={value}\n");
    }

    let mut delimiter = DELIMITER.to_string();
    while value.contains(&delimiter) {
        delimiter.push('_');
    }
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}

/// Write every output the outcome carries.
pub fn write_outcome(outputs: &WorkflowOutputs, outcome: &EventOutcome) -> Result<()> {
    if let Some(labels) = &outcome.labels {
        outputs.set("labels", &labels.join(","))?;
    }
    if let Some(skip_deploy) = outcome.skip_deploy {
        outputs.set("skip-deploy", &skip_deploy.to_string())?;
    }
    if let Some(skip_chromatic) = outcome.skip_chromatic {
        outputs.set("skip-chromatic", &skip_chromatic.to_string())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_output() {
        assert_eq!(format_output("labels", "a,b"), "labels=a,b\n");
        assert_eq!(format_output("labels", ""), "labels=\n");
        assert_eq!(
            format_output("notes", "one\ntwo"),
            "notes<<PR_LABELER_EOF\none\ntwo\nPR_LABELER_EOF\n"
        );
        assert_eq!(
            format_output("notes", "x\nPR_LABELER_EOF"),
            "notes<<PR_LABELER_EOF_\nx\nPR_LABELER_EOF\nPR_LABELER_EOF_\n"
        );
    }

    #[test]
    fn test_write_outcome_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output");
        std::fs::write(&path, "earlier=1\n").unwrap();

        let outputs = WorkflowOutputs::new(Some(path.clone()));
        write_outcome(
            &outputs,
            &EventOutcome {
                labels: Some(vec!["size/M".into(), "server-only".into()]),
                ..EventOutcome::default()
            },
        )
        .unwrap();
        write_outcome(
            &outputs,
            &EventOutcome {
                labels: None,
                skip_deploy: Some(true),
                skip_chromatic: Some(false),
            },
        )
        .unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "earlier=1\nlabels=size/M,server-only\nskip-deploy=true\nskip-chromatic=false\n"
        );
    }

    #[test]
    fn test_without_output_file() {
        let outputs = WorkflowOutputs::default();
        outputs.set("labels", "size/XS").unwrap();
    }
}
