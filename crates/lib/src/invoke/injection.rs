//! Boilerplate files of the injected repository.
//!
//! The evaluator resolves `@soong_injection//mixed_builds:buildroot` through
//! these files, so they are written before every round. `BUILD.bazel` is
//! generated from the ordered request snapshot; the other two are fixed.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::consts::{BUILD_FILE, MAIN_BZL_FILE, MIXED_BUILDS_DIR, WORKSPACE_FILE};
use crate::request::CqueryRequest;

const WORKSPACE_TEMPLATE: &str = "# Generated by mixbuild. Do not edit.\nworkspace(name = \"soong_injection\")\n";

const MAIN_BZL_TEMPLATE: &str = r#"# Generated by mixbuild. Do not edit.

def _mixed_build_root_impl(ctx):
    files = [dep[DefaultInfo].files for dep in ctx.attr.deps]
    return [DefaultInfo(files = depset(transitive = files))]

mixed_build_root = rule(
    implementation = _mixed_build_root_impl,
    attrs = {
        "deps": attr.label_list(),
        "config_labels": attr.string_list_dict(),
    },
)

def _config_key(target):
    opts = build_options(target)
    key = opts["//command_line_option:cpu"] + "|" + opts["//command_line_option:platforms"][0].name
    apex = opts.get("@//build/bazel/rules/apex:within_apex")
    if apex != None:
        marker = "within_apex" if apex else ""
        key += "|" + marker + "|" + opts["@//build/bazel/rules/apex:min_sdk_version"]
    return key

def format(target):
    key = str(target.label) + "|" + _config_key(target)
    return key + ">>" + ", ".join([f.path for f in target.files.to_list()])
"#;

#[derive(Debug, Error)]
pub enum InjectionError {
  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to write file {}: {source}", path.display())]
  WriteFile { path: PathBuf, source: std::io::Error },
}

/// Paths of the written boilerplate files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionFiles {
  pub workspace: PathBuf,
  pub build: PathBuf,
  pub main_bzl: PathBuf,
}

/// Write the three boilerplate files below `injection_dir`.
pub fn write_injection_files(injection_dir: &Path, requests: &[CqueryRequest]) -> Result<InjectionFiles, InjectionError> {
  let mixed_builds = injection_dir.join(MIXED_BUILDS_DIR);
  fs::create_dir_all(&mixed_builds).map_err(|source| InjectionError::CreateDir {
    path: mixed_builds.clone(),
    source,
  })?;

  let files = InjectionFiles {
    workspace: injection_dir.join(WORKSPACE_FILE),
    build: mixed_builds.join(BUILD_FILE),
    main_bzl: mixed_builds.join(MAIN_BZL_FILE),
  };

  write_file(&files.workspace, WORKSPACE_TEMPLATE)?;
  write_file(&files.main_bzl, MAIN_BZL_TEMPLATE)?;
  write_file(&files.build, &build_file_contents(requests))?;

  debug!(dir = %injection_dir.display(), requests = requests.len(), "wrote injection files");
  Ok(files)
}

fn write_file(path: &Path, contents: &str) -> Result<(), InjectionError> {
  fs::write(path, contents).map_err(|source| InjectionError::WriteFile {
    path: path.to_path_buf(),
    source,
  })
}

/// The buildroot target, listing every queued label grouped by configuration.
fn build_file_contents(requests: &[CqueryRequest]) -> String {
  let mut by_config: BTreeMap<String, Vec<&str>> = BTreeMap::new();
  for request in requests {
    let labels = by_config.entry(request.config.to_string()).or_default();
    if !labels.contains(&request.label.as_str()) {
      labels.push(&request.label);
    }
  }

  let mut deps: Vec<&str> = by_config.values().flatten().copied().collect();
  deps.sort_unstable();
  deps.dedup();

  let mut out = String::from("# Generated by mixbuild. Do not edit.\n");
  out.push_str("load(\":main.bzl\", \"mixed_build_root\")\n\n");
  out.push_str("mixed_build_root(\n    name = \"buildroot\",\n    deps = [\n");
  for label in deps {
    out.push_str(&format!("        \"{}\",\n", label));
  }
  out.push_str("    ],\n    config_labels = {\n");
  for (config, labels) in &by_config {
    out.push_str(&format!("        \"{}\": [\n", config));
    for label in labels {
      out.push_str(&format!("            \"{}\",\n", label));
    }
    out.push_str("        ],\n");
  }
  out.push_str("    },\n)\n");
  out
}
