//! Ticket stapling client
//!
//! Attaches a completed notarization ticket to the local artifact via
//! `xcrun stapler staple`. Following local tool conventions the stapler
//! runs with the artifact's containing directory as its working
//! directory and references the file by name only.

use std::path::Path;

use crate::runner::{ToolError, ToolRunner};

/// Stapling errors
#[derive(Debug, thiserror::Error)]
pub enum StapleError {
    #[error("stapler failed for {file} (exit {exit_code:?}): {diagnostic}")]
    Tool {
        file: String,
        exit_code: Option<i32>,
        diagnostic: String,
    },

    #[error("artifact path {0} has no file name")]
    InvalidPath(String),

    #[error(transparent)]
    Launch(#[from] ToolError),
}

/// Staple the notarization ticket to the package at `pkg`.
pub fn staple_pkg(runner: &dyn ToolRunner, pkg: &Path) -> Result<(), StapleError> {
    let file_name = pkg
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StapleError::InvalidPath(pkg.display().to_string()))?;
    let dir = pkg.parent().filter(|p| !p.as_os_str().is_empty());

    let args = vec![
        "stapler".to_string(),
        "staple".to_string(),
        "-v".to_string(),
        file_name.to_string(),
    ];

    let output = runner.run("xcrun", &args, dir)?;

    if !output.success {
        return Err(StapleError::Tool {
            file: file_name.to_string(),
            exit_code: output.exit_code,
            diagnostic: output.diagnostic(),
        });
    }

    Ok(())
}
