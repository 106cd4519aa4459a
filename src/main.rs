//! pkg-notary CLI
//!
//! Entry point for the `pkg-notary` command-line tool.

use clap::{Parser, Subcommand};
use pkg_notary::config::{Credentials, EnvSnapshot, HookConfig, HookContext};
use pkg_notary::notarize::{authorization_args, parse_notarization_info, PollerConfig};
use pkg_notary::runner::{SystemRunner, ToolRunner};
use pkg_notary::staple::staple_pkg;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "pkg-notary")]
#[command(about = "Sign, notarize, and staple macOS installer packages", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full sign/notarize/staple hook for a build
    Run {
        /// Path to the build context JSON file (artifact paths, app id, platform)
        #[arg(long, short = 'c')]
        context: PathBuf,

        /// Seconds between notarization status queries
        #[arg(long, default_value_t = 30)]
        interval_secs: u64,

        /// Seconds to wait between submission and the first status query
        #[arg(long, default_value_t = 10)]
        settle_secs: u64,

        /// Verbose progress output
        #[arg(long, short = 'v')]
        verbose: bool,
    },

    /// Query the status of an existing notarization request
    Status {
        /// Authority-assigned request identifier
        request_uuid: String,
    },

    /// Staple a notarization ticket to a package
    Staple {
        /// Path to the package file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            context,
            interval_secs,
            settle_secs,
            verbose,
        } => run_hook_command(context, interval_secs, settle_secs, verbose),
        Commands::Status { request_uuid } => run_status(&request_uuid),
        Commands::Staple { file } => run_staple(&file),
    }
}

fn run_hook_command(context_path: PathBuf, interval_secs: u64, settle_secs: u64, verbose: bool) {
    let ctx = match HookContext::from_file(&context_path) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let env = EnvSnapshot::capture();
    let config = HookConfig::from_env(&env);
    let poller = PollerConfig {
        interval: Duration::from_secs(interval_secs),
        settle_delay: Duration::from_secs(settle_secs),
    };

    match pkg_notary::run_hook(&ctx, &config, &SystemRunner, &poller, verbose) {
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run_status(request_uuid: &str) {
    let env = EnvSnapshot::capture();
    let creds = match Credentials::from_env(&env) {
        Ok(Some(creds)) => creds,
        Ok(None) => {
            eprintln!("Error: no notarization credentials in the environment");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let mut args = vec![
        "altool".to_string(),
        "--notarization-info".to_string(),
        request_uuid.to_string(),
    ];
    args.extend(authorization_args(&creds));

    let output = match SystemRunner.run("xcrun", &args, None) {
        Ok(output) if output.success => output,
        Ok(output) => {
            eprintln!("Error: status query failed: {}", output.diagnostic());
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let info = parse_notarization_info(&output.stdout);
    if let Some(status) = &info.status {
        println!("Status: {status}");
    }
    if let Some(date) = &info.date {
        println!("Date: {date}");
    }
    if let Some(code) = info.status_code {
        println!("Status Code: {code}");
    }
    if let Some(message) = &info.status_message {
        println!("Status Message: {message}");
    }
    if let Some(url) = &info.log_file_url {
        println!("Log: {url}");
    }
}

fn run_staple(file: &PathBuf) {
    if let Err(e) = staple_pkg(&SystemRunner, file) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
    println!("Stapled {}", file.display());
}
