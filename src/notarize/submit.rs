//! Submission client
//!
//! Uploads a package to the notarization authority via
//! `xcrun altool --notarize-app` and extracts the request identifier the
//! authority assigns. Upload failures surface immediately; there is no
//! retry at this layer.

use std::path::Path;

use crate::config::{AuthCredentials, Credentials};
use crate::notarize::parse::parse_notarization_info;
use crate::runner::{ToolError, ToolRunner};

/// A submission accepted by the authority
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotarizationRequest {
    /// Authority-assigned opaque identifier, reused for every status
    /// query until a terminal status is reached
    pub request_uuid: String,
}

/// Submission errors
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The upload operation reported failure
    #[error("notarization upload failed (exit {exit_code:?}): {diagnostic}")]
    Upload {
        exit_code: Option<i32>,
        diagnostic: String,
    },

    /// The upload succeeded but the expected identifier line was absent,
    /// which is a protocol violation by the authority
    #[error("notarization upload output contained no RequestUUID line")]
    MissingRequestUuid,

    #[error(transparent)]
    Launch(#[from] ToolError),
}

/// Authorization arguments for altool, selected by credential variant.
///
/// A team short name, when present, appends the same provider flag pair
/// regardless of variant.
pub fn authorization_args(creds: &Credentials) -> Vec<String> {
    let mut args = match &creds.auth {
        AuthCredentials::AppleId {
            username,
            password,
            provider,
        } => {
            let mut args = vec![
                "-u".to_string(),
                username.clone(),
                "-p".to_string(),
                password.clone(),
            ];
            if let Some(provider) = provider {
                args.push("--asc-provider".to_string());
                args.push(provider.clone());
            }
            args
        }
        AuthCredentials::ApiKey { key_id, issuer_id } => vec![
            "--apiKey".to_string(),
            key_id.clone(),
            "--apiIssuer".to_string(),
            issuer_id.clone(),
        ],
    };

    if let Some(team) = &creds.team_short_name {
        args.push("--asc-provider".to_string());
        args.push(team.clone());
    }

    args
}

/// Upload a package for notarization and return the assigned request.
pub fn submit_package(
    runner: &dyn ToolRunner,
    pkg: &Path,
    app_id: &str,
    creds: &Credentials,
) -> Result<NotarizationRequest, SubmitError> {
    let mut args = vec![
        "altool".to_string(),
        "--notarize-app".to_string(),
        "--primary-bundle-id".to_string(),
        app_id.to_string(),
        "--file".to_string(),
        pkg.display().to_string(),
    ];
    args.extend(authorization_args(creds));

    let output = runner.run("xcrun", &args, None)?;

    if !output.success {
        return Err(SubmitError::Upload {
            exit_code: output.exit_code,
            diagnostic: output.diagnostic(),
        });
    }

    let request_uuid = parse_notarization_info(&output.stdout)
        .request_uuid
        .ok_or(SubmitError::MissingRequestUuid)?;

    Ok(NotarizationRequest { request_uuid })
}
