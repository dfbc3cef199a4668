use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;

use super::proto::{Action, ActionGraphContainer, DepSetOfFiles, PathFragment};

/// The action graph is internally inconsistent.
///
/// The evaluator is trusted to emit a DAG with closed references; these guard
/// the resolver against looping or indexing nothing when it does not.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
  #[error("path fragment {0} is part of a parent cycle")]
  FragmentCycle(u32),

  #[error("dep set {0} is part of a cycle")]
  DepSetCycle(u32),

  #[error("unknown path fragment id {0}")]
  MissingFragment(u32),

  #[error("unknown artifact id {0}")]
  MissingArtifact(u32),

  #[error("unknown dep set id {0}")]
  MissingDepSet(u32),
}

/// Paths an action reads and writes, resolved from the fragment forest.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAction<'g> {
  pub action: &'g Action,
  pub primary_output: String,
  pub outputs: Vec<String>,
  pub inputs: Vec<String>,
}

/// Lookup tables over one decoded action graph.
///
/// Artifact paths and dep-set expansions are resolved up front, so many
/// actions sharing the same input sets cost one expansion each.
pub struct ActionGraphResolver {
  artifact_paths: HashMap<u32, String>,
  expanded: HashMap<u32, Vec<u32>>,
}

impl ActionGraphResolver {
  pub fn new(graph: &ActionGraphContainer) -> Result<Self, GraphError> {
    let fragments: HashMap<u32, &PathFragment> = graph.path_fragments.iter().map(|f| (f.id, f)).collect();

    let mut artifact_paths = HashMap::with_capacity(graph.artifacts.len());
    for artifact in &graph.artifacts {
      let path = fragment_path(&fragments, artifact.path_fragment_id)?;
      artifact_paths.insert(artifact.id, path);
    }

    Ok(Self {
      artifact_paths,
      expanded: expand_dep_sets(&graph.dep_set_of_files)?,
    })
  }

  /// Resolved path of an artifact.
  pub fn artifact_path(&self, id: u32) -> Result<&str, GraphError> {
    self
      .artifact_paths
      .get(&id)
      .map(String::as_str)
      .ok_or(GraphError::MissingArtifact(id))
  }

  /// Every artifact reachable from a dep set, first occurrence first.
  pub fn dep_set_artifacts(&self, id: u32) -> Result<&[u32], GraphError> {
    self
      .expanded
      .get(&id)
      .map(Vec::as_slice)
      .ok_or(GraphError::MissingDepSet(id))
  }

  /// Resolve the primary output, outputs and transitive inputs of an action.
  pub fn resolve<'g>(&self, action: &'g Action) -> Result<ResolvedAction<'g>, GraphError> {
    let primary_output = self.artifact_path(action.primary_output_id)?.to_string();

    let outputs = action
      .output_ids
      .iter()
      .map(|id| self.artifact_path(*id).map(str::to_string))
      .collect::<Result<Vec<_>, _>>()?;

    let mut seen = HashSet::new();
    let mut inputs = Vec::new();
    for dep_set_id in &action.input_dep_set_ids {
      for artifact_id in self.dep_set_artifacts(*dep_set_id)? {
        if seen.insert(*artifact_id) {
          inputs.push(self.artifact_path(*artifact_id)?.to_string());
        }
      }
    }

    Ok(ResolvedAction {
      action,
      primary_output,
      outputs,
      inputs,
    })
  }
}

/// Flatten every dep set into its ordered, duplicate-free artifact list.
///
/// Edges run from a nested set to the sets that include it, so the
/// topological order visits children before their parents.
fn expand_dep_sets(dep_sets: &[DepSetOfFiles]) -> Result<HashMap<u32, Vec<u32>>, GraphError> {
  let mut graph: DiGraph<u32, ()> = DiGraph::new();
  let mut nodes: HashMap<u32, NodeIndex> = HashMap::with_capacity(dep_sets.len());
  let mut by_id: HashMap<u32, &DepSetOfFiles> = HashMap::with_capacity(dep_sets.len());

  for dep_set in dep_sets {
    nodes.entry(dep_set.id).or_insert_with(|| graph.add_node(dep_set.id));
    by_id.insert(dep_set.id, dep_set);
  }

  for dep_set in dep_sets {
    let parent = nodes[&dep_set.id];
    for child in &dep_set.transitive_dep_set_ids {
      let child_idx = *nodes.get(child).ok_or(GraphError::MissingDepSet(*child))?;
      graph.add_edge(child_idx, parent, ());
    }
  }

  let sorted = toposort(&graph, None).map_err(|cycle| GraphError::DepSetCycle(graph[cycle.node_id()]))?;

  let mut expanded: HashMap<u32, Vec<u32>> = HashMap::with_capacity(sorted.len());
  for idx in sorted {
    let dep_set = by_id[&graph[idx]];
    let mut seen = HashSet::new();
    let mut artifacts = Vec::new();
    let nested = dep_set
      .transitive_dep_set_ids
      .iter()
      .flat_map(|child| expanded.get(child).into_iter().flatten());
    for artifact_id in dep_set.direct_artifact_ids.iter().chain(nested) {
      if seen.insert(*artifact_id) {
        artifacts.push(*artifact_id);
      }
    }
    expanded.insert(dep_set.id, artifacts);
  }

  Ok(expanded)
}

/// Join the segments from the root fragment down to `id`.
fn fragment_path(fragments: &HashMap<u32, &PathFragment>, id: u32) -> Result<String, GraphError> {
  let mut segments = Vec::new();
  let mut visited = HashSet::new();
  let mut current = id;

  loop {
    if !visited.insert(current) {
      return Err(GraphError::FragmentCycle(current));
    }
    let fragment = fragments.get(&current).ok_or(GraphError::MissingFragment(current))?;
    segments.push(fragment.label.as_str());
    if fragment.parent_id == 0 {
      break;
    }
    current = fragment.parent_id;
  }

  segments.reverse();
  Ok(segments.join("/"))
}
