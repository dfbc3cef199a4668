//! Test utilities for mixbuild-lib.
//!
//! [`MockRunner`] stands in for the evaluator so rounds can run without a
//! real binary. Action graph fixtures are written as JSON and encoded with
//! [`graph_bytes`].

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use prost::Message;

use crate::aquery::ActionGraphContainer;
use crate::invoke::{CommandKind, EvaluatorCommand, EvaluatorRunner, RunnerError};

/// Canned evaluator. Commands without a canned answer return empty stdout.
#[derive(Debug, Default)]
pub struct MockRunner {
  outputs: HashMap<EvaluatorCommand, Vec<u8>>,
  failures: HashSet<CommandKind>,
  calls: Mutex<Vec<(EvaluatorCommand, Vec<String>)>>,
}

impl MockRunner {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_cquery(mut self, stdout: impl Into<Vec<u8>>) -> Self {
    self.outputs.insert(EvaluatorCommand::cquery(), stdout.into());
    self
  }

  pub fn with_aquery(mut self, stdout: impl Into<Vec<u8>>) -> Self {
    self.outputs.insert(EvaluatorCommand::aquery(), stdout.into());
    self
  }

  /// Make every call of `kind` exit non-zero.
  pub fn with_failure(mut self, kind: CommandKind) -> Self {
    self.failures.insert(kind);
    self
  }

  /// Calls made so far, with their extra flags.
  pub fn calls(&self) -> Vec<(EvaluatorCommand, Vec<String>)> {
    self.calls.lock().unwrap().clone()
  }
}

impl EvaluatorRunner for MockRunner {
  fn run(&self, command: &EvaluatorCommand, extra_flags: &[String]) -> Result<Vec<u8>, RunnerError> {
    self
      .calls
      .lock()
      .unwrap()
      .push((command.clone(), extra_flags.to_vec()));

    if self.failures.contains(&command.kind) {
      return Err(RunnerError::Failed {
        command: command.to_string(),
        code: Some(1),
        stderr: "mock failure".to_string(),
      });
    }
    Ok(self.outputs.get(command).cloned().unwrap_or_default())
  }
}

/// Encode a JSON action graph fixture as aquery protobuf output.
pub fn graph_bytes(json: &str) -> Vec<u8> {
  let graph: ActionGraphContainer = serde_json::from_str(json).unwrap();
  graph.encode_to_vec()
}
