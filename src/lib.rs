//! pkg-notary - macOS installer notarization hook
//!
//! This crate implements a build-pipeline hook that signs and notarizes
//! a macOS installer package (`.pkg`), then staples the notarization
//! ticket to it so the installer verifies offline. It runs once per
//! build, after all installer artifacts exist, against exactly one
//! artifact.

pub mod config;
pub mod hook;
pub mod notarize;
pub mod runner;
pub mod sign;
pub mod staple;

pub use config::{Credentials, EnvSnapshot, HookConfig, HookContext};
pub use hook::{run_hook, HookError, HookOutcome, SkipReason};
pub use notarize::{NotarizationInfo, NotarizationStatus, PollerConfig};
pub use runner::{SystemRunner, ToolRunner};
