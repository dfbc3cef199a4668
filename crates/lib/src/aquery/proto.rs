//! Wire schema of the evaluator's `--output=proto` action graph.
//!
//! Only the fields the resolver reads are declared; protobuf decoding skips
//! the rest. Field tags follow the evaluator's `analysis_v2.proto`.
//!
//! The messages also deserialize from the JSON form of the graph, where the
//! evaluator's tooling spells some names in mixed case (`target_Id`,
//! `action_Key`, `output_Ids`). Both spellings are accepted.

use serde::Deserialize;

/// Top-level container of one action graph.
#[derive(Clone, PartialEq, prost::Message, Deserialize)]
#[serde(default)]
pub struct ActionGraphContainer {
  #[prost(message, repeated, tag = "1")]
  pub artifacts: Vec<Artifact>,
  #[prost(message, repeated, tag = "2")]
  pub actions: Vec<Action>,
  #[prost(message, repeated, tag = "4")]
  pub dep_set_of_files: Vec<DepSetOfFiles>,
  #[prost(message, repeated, tag = "8")]
  pub path_fragments: Vec<PathFragment>,
}

/// A file consumed or produced by an action.
#[derive(Clone, PartialEq, prost::Message, Deserialize)]
#[serde(default)]
pub struct Artifact {
  #[prost(uint32, tag = "1")]
  pub id: u32,
  #[prost(uint32, tag = "2")]
  pub path_fragment_id: u32,
}

/// One unit of work in the graph.
#[derive(Clone, PartialEq, prost::Message, Deserialize)]
#[serde(default)]
pub struct Action {
  #[prost(uint32, tag = "1")]
  #[serde(rename = "target_Id", alias = "target_id")]
  pub target_id: u32,
  #[prost(string, tag = "3")]
  #[serde(rename = "action_Key", alias = "action_key")]
  pub action_key: String,
  #[prost(string, tag = "4")]
  pub mnemonic: String,
  #[prost(string, repeated, tag = "6")]
  pub arguments: Vec<String>,
  #[prost(message, repeated, tag = "7")]
  pub environment_variables: Vec<KeyValuePair>,
  #[prost(uint32, repeated, tag = "8")]
  pub input_dep_set_ids: Vec<u32>,
  #[prost(uint32, repeated, tag = "9")]
  #[serde(rename = "output_Ids", alias = "output_ids")]
  pub output_ids: Vec<u32>,
  #[prost(uint32, tag = "13")]
  pub primary_output_id: u32,
}

#[derive(Clone, PartialEq, prost::Message, Deserialize)]
#[serde(default)]
pub struct KeyValuePair {
  #[prost(string, tag = "1")]
  pub key: String,
  #[prost(string, tag = "2")]
  pub value: String,
}

/// A nested set of artifacts.
#[derive(Clone, PartialEq, prost::Message, Deserialize)]
#[serde(default)]
pub struct DepSetOfFiles {
  #[prost(uint32, tag = "1")]
  pub id: u32,
  #[prost(uint32, repeated, tag = "2")]
  pub transitive_dep_set_ids: Vec<u32>,
  #[prost(uint32, repeated, tag = "3")]
  pub direct_artifact_ids: Vec<u32>,
}

/// One path segment. `parent_id` 0 marks a root segment.
#[derive(Clone, PartialEq, prost::Message, Deserialize)]
#[serde(default)]
pub struct PathFragment {
  #[prost(uint32, tag = "1")]
  pub id: u32,
  #[prost(string, tag = "2")]
  pub label: String,
  #[prost(uint32, tag = "3")]
  pub parent_id: u32,
}
