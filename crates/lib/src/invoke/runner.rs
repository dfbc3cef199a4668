//! The process seam between the orchestrator and the evaluator.

use std::fmt;
use std::path::Path;
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::BazelPaths;
use crate::consts::{AQUERY_EXPRESSION, CQUERY_EXPRESSION};

/// The evaluator call could not be completed.
#[derive(Debug, Error)]
pub enum RunnerError {
  #[error("failed to spawn {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("{command} failed with exit code {code:?}: {stderr}")]
  Failed {
    command: String,
    code: Option<i32>,
    stderr: String,
  },
}

/// Evaluation mode of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
  /// Configured query, answered in the line protocol.
  Cquery,
  /// Action graph query, answered as protobuf.
  Aquery,
}

impl CommandKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Cquery => "cquery",
      Self::Aquery => "aquery",
    }
  }
}

impl fmt::Display for CommandKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// A call kind together with its query expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EvaluatorCommand {
  pub kind: CommandKind,
  pub expression: String,
}

impl EvaluatorCommand {
  pub fn new(kind: CommandKind, expression: impl Into<String>) -> Self {
    Self {
      kind,
      expression: expression.into(),
    }
  }

  /// The round's line-protocol call.
  pub fn cquery() -> Self {
    Self::new(CommandKind::Cquery, CQUERY_EXPRESSION)
  }

  /// The round's action-graph call.
  pub fn aquery() -> Self {
    Self::new(CommandKind::Aquery, AQUERY_EXPRESSION)
  }
}

impl fmt::Display for EvaluatorCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} '{}'", self.kind, self.expression)
  }
}

/// Runs evaluator calls and returns their stdout.
///
/// Implementations block until the call finishes. Timeouts and cancellation
/// are theirs to handle.
pub trait EvaluatorRunner: Send + Sync {
  fn run(&self, command: &EvaluatorCommand, extra_flags: &[String]) -> Result<Vec<u8>, RunnerError>;
}

/// Runs the real evaluator binary as a subprocess.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
  paths: BazelPaths,
}

impl ProcessRunner {
  pub fn new(paths: BazelPaths) -> Self {
    Self { paths }
  }

  fn command_line(&self, program: &Path, command: &EvaluatorCommand, extra_flags: &[String]) -> Vec<String> {
    let mut args = vec![program.to_string_lossy().to_string()];
    if !self.paths.output_base.as_os_str().is_empty() {
      args.push(format!("--output_base={}", self.paths.output_base.display()));
    }
    args.push(command.kind.as_str().to_string());
    args.extend(extra_flags.iter().cloned());
    args.push(command.expression.clone());
    args
  }
}

impl EvaluatorRunner for ProcessRunner {
  fn run(&self, command: &EvaluatorCommand, extra_flags: &[String]) -> Result<Vec<u8>, RunnerError> {
    let program = self.paths.bazel_binary();
    let argv = self.command_line(&program, command, extra_flags);
    info!(command = %command, flags = extra_flags.len(), "running evaluator");

    let mut process = Command::new(&program);
    process.args(&argv[1..]);
    if !self.paths.workspace_dir.as_os_str().is_empty() {
      process.current_dir(&self.paths.workspace_dir);
    }

    debug!(argv = ?argv, "spawning evaluator");
    let output = process.output().map_err(|source| RunnerError::Spawn {
      program: program.display().to_string(),
      source,
    })?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
      if !stderr.is_empty() {
        debug!(stderr = %stderr, "evaluator stderr");
      }
      return Err(RunnerError::Failed {
        command: argv.join(" "),
        code: output.status.code(),
        stderr,
      });
    }

    debug!(bytes = output.stdout.len(), "evaluator output");
    Ok(output.stdout)
  }
}
