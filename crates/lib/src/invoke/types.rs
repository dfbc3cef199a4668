//! Error and state types of an invocation round.

use std::string::FromUtf8Error;

use thiserror::Error;

use super::injection::InjectionError;
use super::runner::RunnerError;
use crate::aquery::GraphError;
use crate::cquery::{CqueryParseError, CqueryResults};
use crate::request::CqueryRequest;
use crate::statement::BuildStatement;

/// A round-fatal failure. Nothing from the failed round is kept.
#[derive(Debug, Error)]
pub enum InvokeError {
  #[error("injection files: {0}")]
  Injection(#[from] InjectionError),

  #[error("evaluator invocation failed: {0}")]
  Invocation(#[from] RunnerError),

  #[error("cquery output is not valid utf-8: {0}")]
  CqueryEncoding(#[from] FromUtf8Error),

  #[error("cquery parse error: {0}")]
  Cquery(#[from] CqueryParseError),

  #[error("failed to decode action graph: {0}")]
  Decode(#[from] prost::DecodeError),

  #[error("action graph integrity error: {0}")]
  Graph(#[from] GraphError),
}

/// Everything one successful round produced. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundResults {
  /// The request snapshot the round answered, in canonical order.
  pub requests: Vec<CqueryRequest>,
  pub cquery: CqueryResults,
  pub build_statements: Vec<BuildStatement>,
}

/// Where the orchestrator is in its round.
#[derive(Debug, Default)]
pub enum RoundState {
  /// No completed round; also the state after a failed one.
  #[default]
  Idle,
  /// The last round completed and its results are readable.
  Ready(RoundResults),
}

impl RoundState {
  pub fn results(&self) -> Option<&RoundResults> {
    match self {
      RoundState::Idle => None,
      RoundState::Ready(results) => Some(results),
    }
  }
}
