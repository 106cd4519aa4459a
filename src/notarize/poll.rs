//! Status poller
//!
//! Queries `xcrun altool --notarization-info` for a submitted request
//! until the authority reports a terminal status. The wait between
//! queries is a fixed interval; a failed query (launch error or non-zero
//! exit) is treated as transient and retried without bound, matching the
//! authority client's observed contract. The loop is explicit, never
//! recursive: notarization waits can span tens of minutes.

use std::thread;
use std::time::Duration;

use crate::config::Credentials;
use crate::notarize::parse::{parse_notarization_info, NotarizationInfo, NotarizationStatus};
use crate::notarize::submit::authorization_args;
use crate::runner::ToolRunner;

/// Poller timing configuration
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Wait between status queries, and before retrying a failed query
    pub interval: Duration,
    /// One-time wait between submission and the first status query,
    /// giving the authority time to register the request
    pub settle_delay: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            settle_delay: Duration::from_secs(10),
        }
    }
}

/// Terminal polling failures. Transient query errors never surface here;
/// they are retried inside the loop.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("notarization rejected (status code {status_code:?}): {status_message:?}, log: {log_file_url:?}")]
    Rejected {
        status_code: Option<i64>,
        status_message: Option<String>,
        log_file_url: Option<String>,
    },

    #[error("unrecognized notarization status: {0:?}")]
    UnrecognizedStatus(String),
}

/// Poll the authority until the request reaches a terminal status.
///
/// Returns the final parsed record on success. The request identifier is
/// immutable for the lifetime of the wait and is reused verbatim on every
/// query.
pub fn wait_for_completion(
    runner: &dyn ToolRunner,
    request_uuid: &str,
    creds: &Credentials,
    config: &PollerConfig,
    verbose: bool,
) -> Result<NotarizationInfo, PollError> {
    let mut args = vec![
        "altool".to_string(),
        "--notarization-info".to_string(),
        request_uuid.to_string(),
    ];
    args.extend(authorization_args(creds));

    loop {
        let output = match runner.run("xcrun", &args, None) {
            Ok(output) if output.success => output,
            Ok(output) => {
                eprintln!(
                    "Notarization status query failed ({}); retrying in {}s",
                    output.diagnostic().lines().next().unwrap_or("no output"),
                    config.interval.as_secs()
                );
                thread::sleep(config.interval);
                continue;
            }
            Err(e) => {
                eprintln!(
                    "Notarization status query failed ({}); retrying in {}s",
                    e,
                    config.interval.as_secs()
                );
                thread::sleep(config.interval);
                continue;
            }
        };

        let info = parse_notarization_info(&output.stdout);

        match info.status.clone() {
            Some(NotarizationStatus::InProgress) => {
                if verbose {
                    eprintln!(
                        "Notarization of {} still in progress; next check in {}s",
                        request_uuid,
                        config.interval.as_secs()
                    );
                }
                thread::sleep(config.interval);
            }
            Some(NotarizationStatus::Success) => return Ok(info),
            Some(NotarizationStatus::Invalid) => {
                return Err(PollError::Rejected {
                    status_code: info.status_code,
                    status_message: info.status_message,
                    log_file_url: info.log_file_url,
                })
            }
            Some(NotarizationStatus::Other(raw)) => {
                return Err(PollError::UnrecognizedStatus(raw))
            }
            None => return Err(PollError::UnrecognizedStatus(String::new())),
        }
    }
}
