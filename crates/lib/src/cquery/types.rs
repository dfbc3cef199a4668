use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::request::{ConfigKeyError, QueryKind};

/// A cquery record that could not be decoded or matched to a request.
///
/// Any of these aborts the invocation round.
#[derive(Debug, Error)]
pub enum CqueryParseError {
  #[error("line {line}: missing '>>' separator in {record:?}")]
  MissingSeparator { line: usize, record: String },

  #[error("line {line}: empty label in {record:?}")]
  EmptyLabel { line: usize, record: String },

  #[error("line {line}: bad configuration in {record:?}: {source}")]
  Config {
    line: usize,
    record: String,
    #[source]
    source: ConfigKeyError,
  },

  #[error("line {line}: no queued request for {key:?}")]
  UnknownKey { line: usize, key: String },

  #[error("line {line}: {key:?} is queued under more than one query kind")]
  AmbiguousKind { line: usize, key: String },
}

/// A consumer asked for something the current round cannot answer.
///
/// Local to the asking caller; the round itself stays valid.
#[derive(Debug, Error)]
pub enum LookupError {
  #[error("no invocation round has completed")]
  NotInvoked,

  #[error("{kind} for {label} ({config}) was never queued")]
  NotQueued {
    label: String,
    kind: QueryKind,
    config: String,
  },

  #[error("no cquery result for {label} ({config})")]
  NoResult { label: String, config: String },

  #[error("malformed {kind} payload for {label}: {source}")]
  Payload {
    label: String,
    kind: QueryKind,
    #[source]
    source: serde_json::Error,
  },
}

/// APEX packaging metadata, as reported by a `getApexInfo` query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApexInfo {
  pub signing_key: String,
  pub container_key_info: Vec<String>,
  pub package_name: String,
  pub provides_native_libs: Vec<String>,
  pub requires_native_libs: Vec<String>,
  pub unsigned_output: String,
  pub signed_output: String,
}
