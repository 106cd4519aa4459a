//! Hook configuration
//!
//! All configuration is resolved once at process start from an explicit
//! environment snapshot and from the build hook's context file. Components
//! never read ambient environment state directly; they receive the
//! resolved structs by reference.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variables recognized for credentials
pub const ENV_APPLE_ID: &str = "APPLE_ID";
pub const ENV_APPLE_ID_PASSWORD: &str = "APPLE_ID_PASSWORD";
pub const ENV_ASC_PROVIDER: &str = "ASC_PROVIDER";
pub const ENV_API_KEY_ID: &str = "API_KEY_ID";
pub const ENV_API_KEY_ISSUER_ID: &str = "API_KEY_ISSUER_ID";
pub const ENV_TEAM_SHORT_NAME: &str = "TEAM_SHORT_NAME";
pub const ENV_SIGNING_IDENTITY: &str = "PKG_SIGNING_IDENTITY";

/// Environment variables recognized for build context
pub const ENV_FORCE_NOTARIZE: &str = "FORCE_NOTARIZE";
const ENV_TRAVIS_BRANCH: &str = "TRAVIS_BRANCH";
const ENV_APPVEYOR_BRANCH: &str = "APPVEYOR_REPO_BRANCH";
const ENV_TRAVIS_PULL_REQUEST: &str = "TRAVIS_PULL_REQUEST";
const ENV_APPVEYOR_PULL_REQUEST: &str = "APPVEYOR_PULL_REQUEST_NUMBER";
const ENV_CIRCLE_PULL_REQUEST: &str = "CIRCLE_PULL_REQUEST";

/// Branch names considered release branches by the legacy CI guard
const RELEASE_BRANCHES: &[&str] = &["master", "main"];

/// Immutable snapshot of the process environment, captured once in main
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment
    pub fn capture() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build a snapshot from explicit pairs (used by tests)
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Raw value of a variable, if set (empty strings are returned as-is)
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Value of a variable, treating unset and empty as absent
    fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }
}

/// Authorization material for the notarization authority.
///
/// Exactly one variant is populated per run; the enum makes that a
/// structural invariant rather than a runtime check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthCredentials {
    /// Interactive-account mode: Apple ID username/password, with an
    /// optional authorization provider
    AppleId {
        username: String,
        password: String,
        provider: Option<String>,
    },
    /// Service-account mode: App Store Connect API key
    ApiKey { key_id: String, issuer_id: String },
}

/// Credentials threaded by reference into the submission, polling, and
/// signing clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub auth: AuthCredentials,
    /// Provider short name appended to authorization args in both modes
    pub team_short_name: Option<String>,
}

/// Credential resolution errors. These are recovered by skipping the hook,
/// never surfaced as a build failure.
#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("both Apple ID and API key credentials are set; provide exactly one")]
    Conflicting,

    #[error("{present} is set but {missing} is not")]
    Incomplete {
        present: &'static str,
        missing: &'static str,
    },
}

impl Credentials {
    /// Resolve credentials from the environment snapshot.
    ///
    /// Returns Ok(None) when no credential variables are set at all, which
    /// means notarization is simply not configured for this build.
    pub fn from_env(env: &EnvSnapshot) -> Result<Option<Self>, CredentialsError> {
        let apple_id = env.get_non_empty(ENV_APPLE_ID);
        let apple_password = env.get_non_empty(ENV_APPLE_ID_PASSWORD);
        let api_key = env.get_non_empty(ENV_API_KEY_ID);
        let api_issuer = env.get_non_empty(ENV_API_KEY_ISSUER_ID);

        let interactive = apple_id.is_some() || apple_password.is_some();
        let service = api_key.is_some() || api_issuer.is_some();

        if interactive && service {
            return Err(CredentialsError::Conflicting);
        }

        let auth = if interactive {
            let username = apple_id.ok_or(CredentialsError::Incomplete {
                present: ENV_APPLE_ID_PASSWORD,
                missing: ENV_APPLE_ID,
            })?;
            let password = apple_password.ok_or(CredentialsError::Incomplete {
                present: ENV_APPLE_ID,
                missing: ENV_APPLE_ID_PASSWORD,
            })?;
            AuthCredentials::AppleId {
                username: username.to_string(),
                password: password.to_string(),
                provider: env.get_non_empty(ENV_ASC_PROVIDER).map(String::from),
            }
        } else if service {
            let key_id = api_key.ok_or(CredentialsError::Incomplete {
                present: ENV_API_KEY_ISSUER_ID,
                missing: ENV_API_KEY_ID,
            })?;
            let issuer_id = api_issuer.ok_or(CredentialsError::Incomplete {
                present: ENV_API_KEY_ID,
                missing: ENV_API_KEY_ISSUER_ID,
            })?;
            AuthCredentials::ApiKey {
                key_id: key_id.to_string(),
                issuer_id: issuer_id.to_string(),
            }
        } else {
            return Ok(None);
        };

        Ok(Some(Self {
            auth,
            team_short_name: env.get_non_empty(ENV_TEAM_SHORT_NAME).map(String::from),
        }))
    }
}

/// Opt-in flag semantics: true for the trimmed values "true", "", "1".
///
/// Case-sensitive; any other value (or unset) is false.
pub fn is_env_true(env: &EnvSnapshot, name: &str) -> bool {
    match env.get(name) {
        Some(value) => matches!(value.trim(), "true" | "" | "1"),
        None => false,
    }
}

/// Resolved hook configuration, constructed once at process start
#[derive(Debug, Clone)]
pub struct HookConfig {
    /// Authority credentials; None when notarization is not configured
    pub credentials: Option<Credentials>,
    /// Why credentials resolved to None, when resolution failed rather
    /// than being absent. Logged at guard time, never raised.
    pub credential_problem: Option<String>,
    /// Certificate identity for the signed-package variant
    pub signing_identity: Option<String>,
    /// Whether this build was triggered by an untrusted pull request
    pub is_pull_request: bool,
    /// Branch name from the legacy CI variables, when either is set
    pub ci_branch: Option<String>,
    /// Explicit opt-in: notarize even on PR/non-release builds
    pub force_enabled: bool,
}

impl HookConfig {
    /// Resolve the full hook configuration from an environment snapshot
    pub fn from_env(env: &EnvSnapshot) -> Self {
        let (credentials, credential_problem) = match Credentials::from_env(env) {
            Ok(creds) => (creds, None),
            Err(e) => (None, Some(e.to_string())),
        };

        Self {
            credentials,
            credential_problem,
            signing_identity: env.get_non_empty(ENV_SIGNING_IDENTITY).map(String::from),
            is_pull_request: detect_pull_request(env),
            ci_branch: detect_ci_branch(env),
            force_enabled: is_env_true(env, ENV_FORCE_NOTARIZE),
        }
    }

    /// Whether the CI branch, if known, is a release branch
    pub fn on_release_branch(&self) -> bool {
        match &self.ci_branch {
            Some(branch) => RELEASE_BRANCHES.contains(&branch.as_str()),
            // No legacy CI branch signal at all: the guard does not apply
            None => true,
        }
    }
}

fn detect_pull_request(env: &EnvSnapshot) -> bool {
    if let Some(value) = env.get_non_empty(ENV_TRAVIS_PULL_REQUEST) {
        if value != "false" {
            return true;
        }
    }
    env.get_non_empty(ENV_APPVEYOR_PULL_REQUEST).is_some()
        || env.get_non_empty(ENV_CIRCLE_PULL_REQUEST).is_some()
}

fn detect_ci_branch(env: &EnvSnapshot) -> Option<String> {
    env.get_non_empty(ENV_TRAVIS_BRANCH)
        .or_else(|| env.get_non_empty(ENV_APPVEYOR_BRANCH))
        .map(String::from)
}

/// Build hook context: what the packaging tool produced this run.
///
/// Deserialized from the JSON context file the packaging pipeline writes
/// next to its artifacts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookContext {
    /// All artifact paths produced by the build, in production order
    pub artifact_paths: Vec<PathBuf>,
    /// Bundle identifier of the packaged application
    pub app_id: String,
    /// Target platform name, when the packaging tool reports one
    #[serde(default)]
    pub electron_platform_name: Option<String>,
}

/// Context file load errors
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("cannot read context file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid context file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl HookContext {
    /// Load the hook context from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ContextError> {
        let text = fs::read_to_string(path).map_err(|source| ContextError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ContextError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// The first `.pkg` artifact in the list, if any
    pub fn pkg_artifact(&self) -> Option<&Path> {
        self.artifact_paths
            .iter()
            .find(|p| p.extension().and_then(|e| e.to_str()) == Some("pkg"))
            .map(PathBuf::as_path)
    }
}
