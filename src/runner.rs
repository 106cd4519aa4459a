//! External tool invocation layer
//!
//! Abstracts subprocess execution for testability. Provides:
//! - ToolRunner trait: interface for invoking external command-line tools
//! - SystemRunner: real subprocess execution for production
//! - ScriptedRunner: canned-output runner for unit tests

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

/// Captured output of a completed tool invocation
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Whether the tool exited with status zero
    pub success: bool,
    /// Exit code, if the process exited normally
    pub exit_code: Option<i32>,
    /// Decoded standard output
    pub stdout: String,
    /// Decoded standard error
    pub stderr: String,
}

impl ToolOutput {
    /// Construct a successful output with the given stdout
    pub fn ok(stdout: &str) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    /// Construct a failed output with the given exit code and stderr
    pub fn failed(exit_code: i32, stderr: &str) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    /// Combined diagnostic text (stderr first, then stdout) for error wrapping
    pub fn diagnostic(&self) -> String {
        let mut text = self.stderr.trim().to_string();
        let out = self.stdout.trim();
        if !out.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(out);
        }
        text
    }
}

/// Tool invocation errors (the process could not be run at all)
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

/// Trait for invoking external command-line tools
pub trait ToolRunner: Send + Sync {
    /// Run a tool to completion and capture its output.
    ///
    /// `cwd`, when given, sets the working directory for the child process.
    fn run(&self, tool: &str, args: &[String], cwd: Option<&Path>) -> Result<ToolOutput, ToolError>;
}

/// Real subprocess runner used in production
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, tool: &str, args: &[String], cwd: Option<&Path>) -> Result<ToolOutput, ToolError> {
        let mut command = Command::new(tool);
        command.args(args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = command.output().map_err(|source| ToolError::Launch {
            tool: tool.to_string(),
            source,
        })?;

        Ok(ToolOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Record of a single invocation observed by a ScriptedRunner
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub tool: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

/// Scripted runner for tests: replays a queue of canned results in order
/// and records every invocation it receives.
pub struct ScriptedRunner {
    script: Mutex<Vec<Result<ToolOutput, ToolError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedRunner {
    /// Create a runner that will replay `script` front to back
    pub fn new(script: Vec<Result<ToolOutput, ToolError>>) -> Self {
        let mut script = script;
        script.reverse();
        Self {
            script: Mutex::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// All invocations observed so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of invocations observed so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ToolRunner for ScriptedRunner {
    fn run(&self, tool: &str, args: &[String], cwd: Option<&Path>) -> Result<ToolOutput, ToolError> {
        self.calls.lock().unwrap().push(RecordedCall {
            tool: tool.to_string(),
            args: args.to_vec(),
            cwd: cwd.map(Path::to_path_buf),
        });

        match self.script.lock().unwrap().pop() {
            Some(result) => result,
            None => panic!("ScriptedRunner: unexpected call to {} {:?}", tool, args),
        }
    }
}
