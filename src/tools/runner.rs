//! External tool execution
//!
//! Runs the unpack/diff executables with a controlled working directory
//! and environment overlay, capturing diagnostic output instead of
//! discarding it. Whether a non-zero exit is fatal is the caller's call.

use crate::error::{DeltagenError, DeltagenResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// One external tool invocation: program, arguments, cwd, environment
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    program: PathBuf,
    args: Vec<String>,
    current_dir: PathBuf,
    env: HashMap<String, String>,
}

impl ToolInvocation {
    /// Describe an invocation of `program` run from `current_dir`
    pub fn new(
        program: impl Into<PathBuf>,
        current_dir: impl Into<PathBuf>,
        env: HashMap<String, String>,
    ) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: current_dir.into(),
            env,
        }
    }

    /// Append an argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a path argument
    pub fn arg_path(self, path: &Path) -> Self {
        self.arg(path.display().to_string())
    }

    /// Short tool name for diagnostics
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    /// The resolved command line, for logging
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Executes tool invocations
#[derive(Debug, Default)]
pub struct ToolRunner;

impl ToolRunner {
    /// Create a runner
    pub fn new() -> Self {
        Self
    }

    /// Run an invocation to completion
    ///
    /// Non-zero exit maps to `ToolExecution` carrying the exit code and
    /// captured stderr; the caller decides whether that is fatal.
    pub async fn run(&self, invocation: &ToolInvocation) -> DeltagenResult<()> {
        let tool = invocation.tool_name();
        debug!(
            "Running {} (cwd: {}, env overrides: {:?})",
            invocation.command_line(),
            invocation.current_dir.display(),
            invocation.env,
        );

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.current_dir)
            .envs(&invocation.env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| DeltagenError::ToolSpawn {
                tool: tool.clone(),
                source: e,
            })?;

        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if !stdout.trim().is_empty() {
                debug!("{} stdout: {}", tool, stdout.trim());
            }
            return Ok(());
        }

        match output.status.code() {
            Some(code) => Err(DeltagenError::ToolExecution {
                tool,
                code,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
            None => Err(DeltagenError::ToolSignaled { tool }),
        }
    }
}
