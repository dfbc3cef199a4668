//! Bridge configuration.
//!
//! Loaded from a JSON file; every section may be omitted. The evaluator binary
//! can also be overridden from the environment, which wins over the file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{BAZEL_ENV_VAR, DEFAULT_BAZEL, INJECTION_REPO, MIXED_BUILDS_DIR};
use crate::coverage::CoverageConfig;
use crate::gate::ModuleGate;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to parse config {}: {source}", path.display())]
  Parse { path: PathBuf, source: serde_json::Error },
}

/// Directories the bridge and the evaluator share.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BazelPaths {
  /// Host build output directory; the injection repository lives below it.
  pub out_dir: PathBuf,
  /// Evaluator output base.
  pub output_base: PathBuf,
  /// Directory the evaluator runs in.
  pub workspace_dir: PathBuf,
  /// Evaluator binary, when not found on `PATH` as `bazel`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bazel: Option<PathBuf>,
}

impl BazelPaths {
  /// Root of the injected repository.
  pub fn injection_dir(&self) -> PathBuf {
    self.out_dir.join(INJECTION_REPO)
  }

  /// Directory holding the buildroot package.
  pub fn mixed_builds_dir(&self) -> PathBuf {
    self.injection_dir().join(MIXED_BUILDS_DIR)
  }

  /// Directory actions run in.
  pub fn execution_root(&self) -> PathBuf {
    self.output_base.join("execroot").join("__main__")
  }

  /// Real location of the evaluator's `bazel-out` tree.
  pub fn bazel_out_dir(&self) -> PathBuf {
    self.execution_root().join("bazel-out")
  }

  /// Evaluator binary: `MIXBUILD_BAZEL`, then the config, then `bazel`.
  pub fn bazel_binary(&self) -> PathBuf {
    if let Ok(bin) = std::env::var(BAZEL_ENV_VAR)
      && !bin.is_empty()
    {
      return PathBuf::from(bin);
    }
    self.bazel.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_BAZEL))
  }
}

/// Complete configuration of one bridge instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
  pub paths: BazelPaths,
  pub coverage: CoverageConfig,
  pub modules: ModuleGate,
}

impl BridgeConfig {
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }
}
