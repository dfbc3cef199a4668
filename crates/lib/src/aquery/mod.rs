//! Action graph decoding and resolution.
//!
//! The aquery call returns a protobuf [`ActionGraphContainer`]. Artifacts point
//! into a forest of [`PathFragment`]s and actions name their inputs through
//! nested dep sets; [`build_statements`] resolves all of it into
//! [`BuildStatement`]s.

pub mod proto;
mod resolver;

pub use proto::{Action, ActionGraphContainer, Artifact, DepSetOfFiles, KeyValuePair, PathFragment};
pub use resolver::{ActionGraphResolver, GraphError, ResolvedAction};

use prost::Message;
use tracing::debug;

use crate::consts::{DEPFILE_SUFFIX, MIDDLEMAN_MNEMONIC};
use crate::statement::{BuildStatement, EnvVar};

/// Decode the raw aquery output.
pub fn decode(bytes: &[u8]) -> Result<ActionGraphContainer, prost::DecodeError> {
  ActionGraphContainer::decode(bytes)
}

/// Resolve every action of a graph into a build statement, in graph order.
///
/// Middleman actions only group inputs and are left out.
pub fn build_statements(graph: &ActionGraphContainer) -> Result<Vec<BuildStatement>, GraphError> {
  let resolver = ActionGraphResolver::new(graph)?;
  let mut statements = Vec::with_capacity(graph.actions.len());

  for action in &graph.actions {
    if action.mnemonic == MIDDLEMAN_MNEMONIC {
      debug!(action_key = %action.action_key, "skipping middleman action");
      continue;
    }

    let resolved = resolver.resolve(action)?;
    debug!(
      mnemonic = %action.mnemonic,
      primary_output = %resolved.primary_output,
      inputs = resolved.inputs.len(),
      "resolved action"
    );
    statements.push(to_statement(resolved));
  }

  Ok(statements)
}

fn to_statement(resolved: ResolvedAction<'_>) -> BuildStatement {
  let action = resolved.action;
  let depfile = resolved
    .outputs
    .iter()
    .find(|path| **path != resolved.primary_output && path.ends_with(DEPFILE_SUFFIX))
    .cloned();

  BuildStatement {
    command: action.arguments.join(" "),
    mnemonic: action.mnemonic.clone(),
    outputs: resolved.outputs,
    inputs: resolved.inputs,
    primary_output: resolved.primary_output,
    depfile,
    env: action
      .environment_variables
      .iter()
      .map(|pair| EnvVar {
        key: pair.key.clone(),
        value: pair.value.clone(),
      })
      .collect(),
  }
}
