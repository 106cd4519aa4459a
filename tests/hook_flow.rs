//! End-to-end hook flows against faked external tools
//!
//! These tests drive `run_hook` with a ToolRunner that simulates
//! productsign, altool, and stapler, including the filesystem side
//! effect of signing, so the full sign/swap/notarize/staple sequence can
//! be verified on real temporary files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use pkg_notary::config::{AuthCredentials, Credentials, HookConfig, HookContext};
use pkg_notary::hook::{run_hook, HookError, HookOutcome, SkipReason};
use pkg_notary::notarize::PollerConfig;
use pkg_notary::runner::{ScriptedRunner, ToolError, ToolOutput, ToolRunner};

/// Simulated macOS tool set.
///
/// productsign writes a recognizable signed copy; altool answers the
/// upload with a fixed RequestUUID and replays a queue of status
/// responses; stapler succeeds and records its working directory.
struct FakeTools {
    status_responses: Mutex<Vec<String>>,
    calls: Mutex<Vec<(String, Vec<String>, Option<PathBuf>)>>,
}

impl FakeTools {
    fn new(status_responses: Vec<&str>) -> Self {
        let mut responses: Vec<String> = status_responses.iter().map(|s| s.to_string()).collect();
        responses.reverse();
        Self {
            status_responses: Mutex::new(responses),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn call_log(&self) -> Vec<(String, Vec<String>, Option<PathBuf>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ToolRunner for FakeTools {
    fn run(&self, tool: &str, args: &[String], cwd: Option<&Path>) -> Result<ToolOutput, ToolError> {
        self.calls.lock().unwrap().push((
            tool.to_string(),
            args.to_vec(),
            cwd.map(Path::to_path_buf),
        ));

        match (tool, args.first().map(String::as_str)) {
            ("productsign", _) => {
                let src = PathBuf::from(&args[2]);
                let dst = PathBuf::from(&args[3]);
                let original = fs::read(&src).expect("source package exists");
                let mut signed = b"SIGNED:".to_vec();
                signed.extend_from_slice(&original);
                fs::write(&dst, signed).expect("write signed package");
                Ok(ToolOutput::ok(""))
            }
            ("xcrun", Some("altool")) if args[1] == "--notarize-app" => Ok(ToolOutput::ok(
                "No errors uploading package.\nRequestUUID = FAKE-UUID-1\n",
            )),
            ("xcrun", Some("altool")) if args[1] == "--notarization-info" => {
                let response = self
                    .status_responses
                    .lock()
                    .unwrap()
                    .pop()
                    .expect("status response scripted");
                Ok(ToolOutput::ok(&response))
            }
            ("xcrun", Some("stapler")) => Ok(ToolOutput::ok("The staple and validate action worked!\n")),
            other => panic!("unexpected tool invocation: {other:?} {args:?}"),
        }
    }
}

fn api_key_credentials() -> Credentials {
    Credentials {
        auth: AuthCredentials::ApiKey {
            key_id: "KEY123".to_string(),
            issuer_id: "ISSUER456".to_string(),
        },
        team_short_name: None,
    }
}

fn base_config() -> HookConfig {
    HookConfig {
        credentials: Some(api_key_credentials()),
        credential_problem: None,
        signing_identity: None,
        is_pull_request: false,
        ci_branch: None,
        force_enabled: false,
    }
}

fn fast_poller() -> PollerConfig {
    PollerConfig {
        interval: Duration::from_millis(1),
        settle_delay: Duration::ZERO,
    }
}

fn context_for(paths: Vec<PathBuf>) -> HookContext {
    HookContext {
        artifact_paths: paths,
        app_id: "com.example.app".to_string(),
        electron_platform_name: Some("darwin".to_string()),
    }
}

#[test]
fn no_pkg_artifact_skips_without_tool_invocations() {
    let ctx = context_for(vec![PathBuf::from("dist/App.dmg"), PathBuf::from("dist/App.zip")]);
    // Empty script: any invocation would panic
    let runner = ScriptedRunner::new(vec![]);

    let outcome = run_hook(&ctx, &base_config(), &runner, &fast_poller(), false).unwrap();

    assert_eq!(outcome, HookOutcome::Skipped(SkipReason::NoPackageArtifact));
    assert_eq!(runner.call_count(), 0);
}

#[test]
fn non_darwin_platform_skips() {
    let mut ctx = context_for(vec![PathBuf::from("dist/App.pkg")]);
    ctx.electron_platform_name = Some("win32".to_string());
    let runner = ScriptedRunner::new(vec![]);

    let outcome = run_hook(&ctx, &base_config(), &runner, &fast_poller(), false).unwrap();

    assert_eq!(
        outcome,
        HookOutcome::Skipped(SkipReason::NotMacPlatform("win32".to_string()))
    );
    assert_eq!(runner.call_count(), 0);
}

#[test]
fn missing_credentials_skip_silently() {
    let ctx = context_for(vec![PathBuf::from("dist/App.pkg")]);
    let mut config = base_config();
    config.credentials = None;
    let runner = ScriptedRunner::new(vec![]);

    let outcome = run_hook(&ctx, &config, &runner, &fast_poller(), false).unwrap();

    assert_eq!(
        outcome,
        HookOutcome::Skipped(SkipReason::NotarizationNotConfigured)
    );
}

#[test]
fn pull_request_build_skips_unless_forced() {
    let ctx = context_for(vec![PathBuf::from("dist/App.pkg")]);
    let mut config = base_config();
    config.is_pull_request = true;
    let runner = ScriptedRunner::new(vec![]);

    let outcome = run_hook(&ctx, &config, &runner, &fast_poller(), false).unwrap();
    assert_eq!(outcome, HookOutcome::Skipped(SkipReason::PullRequestBuild));
}

#[test]
fn non_release_branch_skips_unless_forced() {
    let ctx = context_for(vec![PathBuf::from("dist/App.pkg")]);
    let mut config = base_config();
    config.ci_branch = Some("feature/x".to_string());
    let runner = ScriptedRunner::new(vec![]);

    let outcome = run_hook(&ctx, &config, &runner, &fast_poller(), false).unwrap();
    assert_eq!(
        outcome,
        HookOutcome::Skipped(SkipReason::NonReleaseBranch("feature/x".to_string()))
    );
}

#[test]
fn forced_build_proceeds_on_pr_and_branch() {
    let dir = tempfile::tempdir().unwrap();
    let pkg = dir.path().join("App.pkg");
    fs::write(&pkg, b"package bytes").unwrap();

    let ctx = context_for(vec![pkg.clone()]);
    let mut config = base_config();
    config.is_pull_request = true;
    config.ci_branch = Some("feature/x".to_string());
    config.force_enabled = true;

    let tools = FakeTools::new(vec!["Status = success\n"]);
    let outcome = run_hook(&ctx, &config, &tools, &fast_poller(), false).unwrap();

    assert!(matches!(outcome, HookOutcome::Notarized { .. }));
}

#[test]
fn unsigned_variant_runs_submit_poll_staple_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let pkg = dir.path().join("App.pkg");
    fs::write(&pkg, b"package bytes").unwrap();

    let ctx = context_for(vec![pkg.clone()]);
    let tools = FakeTools::new(vec![
        "Status = in progress\n",
        "Status = success\nLogFileURL = (null)\n",
    ]);

    let outcome = run_hook(&ctx, &base_config(), &tools, &fast_poller(), false).unwrap();

    assert_eq!(
        outcome,
        HookOutcome::Notarized {
            artifact: pkg.clone(),
            request_uuid: "FAKE-UUID-1".to_string(),
        }
    );

    let calls = tools.call_log();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0].1[1], "--notarize-app");
    assert_eq!(calls[1].1[1], "--notarization-info");
    assert_eq!(calls[1].1[2], "FAKE-UUID-1");
    assert_eq!(calls[2].1[1], "--notarization-info");
    assert_eq!(calls[3].1[..2], ["stapler".to_string(), "staple".to_string()]);
    // Stapler runs from the artifact's directory, file by name only
    assert_eq!(calls[3].2.as_deref(), Some(dir.path()));
    assert_eq!(calls[3].1[3], "App.pkg");

    // Unsigned variant: the artifact is untouched
    assert_eq!(fs::read(&pkg).unwrap(), b"package bytes");
    assert!(!dir.path().join("App-unsigned.pkg").exists());
}

#[test]
fn signed_variant_swaps_signed_file_into_place() {
    let dir = tempfile::tempdir().unwrap();
    let pkg = dir.path().join("App.pkg");
    fs::write(&pkg, b"original bytes").unwrap();

    let ctx = context_for(vec![pkg.clone()]);
    let mut config = base_config();
    config.signing_identity = Some("Developer ID Installer: Example Corp".to_string());

    let tools = FakeTools::new(vec!["Status = success\n"]);
    let outcome = run_hook(&ctx, &config, &tools, &fast_poller(), false).unwrap();

    assert!(matches!(outcome, HookOutcome::Notarized { .. }));

    // Original path now holds exactly what the signing tool produced
    assert_eq!(fs::read(&pkg).unwrap(), b"SIGNED:original bytes");

    // Pre-signing bytes preserved under the -unsigned suffix
    let unsigned = dir.path().join("App-unsigned.pkg");
    assert_eq!(fs::read(&unsigned).unwrap(), b"original bytes");

    // The intermediate -signed file was consumed by the swap
    assert!(!dir.path().join("App-signed.pkg").exists());

    // productsign ran before the upload
    let calls = tools.call_log();
    assert_eq!(calls[0].0, "productsign");
    assert_eq!(calls[1].1[1], "--notarize-app");
}

#[test]
fn rejected_notarization_fails_before_stapling() {
    let dir = tempfile::tempdir().unwrap();
    let pkg = dir.path().join("App.pkg");
    fs::write(&pkg, b"package bytes").unwrap();

    let ctx = context_for(vec![pkg.clone()]);
    let tools = FakeTools::new(vec![
        "Status = invalid\nStatus Code = 2\nStatus Message = Package Invalid\n",
    ]);

    let err = run_hook(&ctx, &base_config(), &tools, &fast_poller(), false).unwrap_err();

    assert!(matches!(err, HookError::Notarization(_)));

    // No stapler invocation after the rejection
    let calls = tools.call_log();
    assert!(calls.iter().all(|(_, args, _)| args.first().map(String::as_str) != Some("stapler")));
}

#[test]
fn submission_failure_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let pkg = dir.path().join("App.pkg");
    fs::write(&pkg, b"package bytes").unwrap();

    let ctx = context_for(vec![pkg.clone()]);
    let runner = ScriptedRunner::new(vec![Ok(ToolOutput::failed(
        176,
        "Unable to upload your app for notarization",
    ))]);

    let err = run_hook(&ctx, &base_config(), &runner, &fast_poller(), false).unwrap_err();

    assert!(matches!(err, HookError::Submit(_)));
    assert_eq!(runner.call_count(), 1);
}
