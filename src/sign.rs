//! Package signing client
//!
//! Invokes `productsign` to produce a signed copy of an installer
//! package at a distinct destination path. Signing failures are
//! certificate or configuration problems, not transient, so there is no
//! retry here.

use std::path::Path;

use crate::runner::{ToolError, ToolRunner};

/// Signing errors
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error("productsign failed (exit {exit_code:?}): {diagnostic}")]
    Tool {
        exit_code: Option<i32>,
        diagnostic: String,
    },

    #[error(transparent)]
    Launch(#[from] ToolError),
}

/// Sign `src` with the given certificate identity, writing the signed
/// package to `dst`. The source file is left in place.
pub fn sign_pkg(
    runner: &dyn ToolRunner,
    identity: &str,
    src: &Path,
    dst: &Path,
) -> Result<(), SignError> {
    let args = vec![
        "--sign".to_string(),
        identity.to_string(),
        src.display().to_string(),
        dst.display().to_string(),
    ];

    let output = runner.run("productsign", &args, None)?;

    if !output.success {
        return Err(SignError::Tool {
            exit_code: output.exit_code,
            diagnostic: output.diagnostic(),
        });
    }

    Ok(())
}
