//! Hook orchestration
//!
//! Sequences the full pipeline for one build invocation: locate the
//! `.pkg` artifact, optionally product-sign it, submit it for
//! notarization, wait for the authority's verdict, and staple the
//! ticket. Stages run strictly in order; the first failure aborts the
//! rest. A set of guard conditions turns the whole hook into a logged
//! no-op instead of a build failure.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;

use crate::config::{HookConfig, HookContext};
use crate::notarize::{submit_package, wait_for_completion, PollError, PollerConfig, SubmitError};
use crate::runner::ToolRunner;
use crate::sign::{sign_pkg, SignError};
use crate::staple::{staple_pkg, StapleError};

/// Platform identifier for which the signed-package pipeline runs
const MACOS_PLATFORM: &str = "darwin";

/// Why a run ended without touching the artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No `.pkg` artifact among the build outputs
    NoPackageArtifact,
    /// The build targets a platform other than macOS
    NotMacPlatform(String),
    /// Credentials absent or invalid; notarization is not configured
    NotarizationNotConfigured,
    /// Untrusted pull-request build without explicit opt-in
    PullRequestBuild,
    /// Non-release branch without explicit opt-in
    NonReleaseBranch(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoPackageArtifact => write!(f, "no .pkg artifact in this build"),
            Self::NotMacPlatform(p) => write!(f, "build platform is {p}, not {MACOS_PLATFORM}"),
            Self::NotarizationNotConfigured => write!(f, "notarization credentials not configured"),
            Self::PullRequestBuild => write!(f, "pull-request build without explicit opt-in"),
            Self::NonReleaseBranch(b) => {
                write!(f, "branch {b} is not a release branch and opt-in is not set")
            }
        }
    }
}

/// Result of a hook run that did not error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// A guard condition held; nothing was done
    Skipped(SkipReason),
    /// The artifact was notarized and stapled
    Notarized {
        artifact: PathBuf,
        request_uuid: String,
    },
}

/// Aggregate pipeline error. Guard conditions and transient query
/// failures never appear here; everything else propagates unchanged.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("signing error: {0}")]
    Sign(#[from] SignError),

    #[error("submission error: {0}")]
    Submit(#[from] SubmitError),

    #[error("notarization error: {0}")]
    Notarization(#[from] PollError),

    #[error("stapling error: {0}")]
    Staple(#[from] StapleError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Sibling path with `suffix` appended to the file stem, same extension.
fn path_with_stem_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    path.with_file_name(name)
}

/// Run the sign/notarize/staple pipeline for one build invocation.
///
/// Returns `Ok(HookOutcome::Skipped)` for every guard condition; those
/// are configuration states, not failures. All stage errors propagate to
/// the caller, which surfaces them as a failed build step.
pub fn run_hook(
    ctx: &HookContext,
    config: &HookConfig,
    runner: &dyn ToolRunner,
    poller: &PollerConfig,
    verbose: bool,
) -> Result<HookOutcome, HookError> {
    let Some(pkg) = ctx.pkg_artifact() else {
        return Ok(skip(SkipReason::NoPackageArtifact));
    };
    let pkg = pkg.to_path_buf();

    if let Some(platform) = &ctx.electron_platform_name {
        if platform != MACOS_PLATFORM {
            return Ok(skip(SkipReason::NotMacPlatform(platform.clone())));
        }
    }

    let Some(creds) = &config.credentials else {
        if let Some(problem) = &config.credential_problem {
            eprintln!("Notarization credentials invalid: {problem}");
        }
        return Ok(skip(SkipReason::NotarizationNotConfigured));
    };

    if config.is_pull_request && !config.force_enabled {
        return Ok(skip(SkipReason::PullRequestBuild));
    }

    if !config.on_release_branch() && !config.force_enabled {
        let branch = config.ci_branch.clone().unwrap_or_default();
        return Ok(skip(SkipReason::NonReleaseBranch(branch)));
    }

    if let Some(identity) = &config.signing_identity {
        println!("Signing {}", pkg.display());

        let signed = path_with_stem_suffix(&pkg, "-signed");
        sign_pkg(runner, identity, &pkg, &signed)?;

        // Swap the signed file into the original path, keeping the
        // unsigned original under a -unsigned suffix. The two renames
        // are not atomic together; a crash between them leaves both
        // files present under distinct names.
        let unsigned = path_with_stem_suffix(&pkg, "-unsigned");
        fs::rename(&pkg, &unsigned)?;
        fs::rename(&signed, &pkg)?;
    }

    println!("Notarizing {}", pkg.display());
    let request = submit_package(runner, &pkg, &ctx.app_id, creds)?;
    println!(
        "Notarization request {} submitted, waiting for result",
        request.request_uuid
    );

    thread::sleep(poller.settle_delay);
    wait_for_completion(runner, &request.request_uuid, creds, poller, verbose)?;

    staple_pkg(runner, &pkg)?;
    println!("Notarized and stapled {}", pkg.display());

    Ok(HookOutcome::Notarized {
        artifact: pkg,
        request_uuid: request.request_uuid,
    })
}

fn skip(reason: SkipReason) -> HookOutcome {
    eprintln!("Skipping notarization: {reason}");
    HookOutcome::Skipped(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_with_stem_suffix() {
        assert_eq!(
            path_with_stem_suffix(Path::new("dist/App.pkg"), "-signed"),
            PathBuf::from("dist/App-signed.pkg")
        );
        assert_eq!(
            path_with_stem_suffix(Path::new("App.pkg"), "-unsigned"),
            PathBuf::from("App-unsigned.pkg")
        );
        assert_eq!(
            path_with_stem_suffix(Path::new("dist/noext"), "-signed"),
            PathBuf::from("dist/noext-signed")
        );
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(
            SkipReason::NotMacPlatform("win32".to_string()).to_string(),
            "build platform is win32, not darwin"
        );
    }
}
