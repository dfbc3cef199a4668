//! Coverage flags for evaluator invocations.

use serde::{Deserialize, Serialize};

/// Flag turning on coverage collection.
pub const COLLECT_COVERAGE_FLAG: &str = "--collect_code_coverage";

/// Prefix of the flag selecting instrumented paths.
pub const INSTRUMENTATION_FILTER_FLAG: &str = "--instrumentation_filter=";

/// Native coverage settings of the host build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageConfig {
  pub enabled: bool,
  /// Paths to instrument, in order.
  pub include_paths: Vec<String>,
  /// Paths excluded from instrumentation, in order.
  pub exclude_paths: Vec<String>,
}

impl CoverageConfig {
  /// Extra evaluator flags for this configuration.
  ///
  /// Nothing when coverage is off. Otherwise the enable flag, followed by an
  /// instrumentation filter unless both path lists are empty.
  pub fn flags(&self) -> Vec<String> {
    if !self.enabled {
      return Vec::new();
    }

    let mut flags = vec![COLLECT_COVERAGE_FLAG.to_string()];

    let filters: Vec<String> = self
      .include_paths
      .iter()
      .map(|path| format!("+{}", filter_pattern(path)))
      .chain(self.exclude_paths.iter().map(|path| format!("-{}", filter_pattern(path))))
      .collect();

    if !filters.is_empty() {
      flags.push(format!("{}{}", INSTRUMENTATION_FILTER_FLAG, filters.join(",")));
    }

    flags
  }
}

// The filter value is a regex, so the glob-style wildcard becomes `.*`.
fn filter_pattern(path: &str) -> &str {
  if path == "*" { ".*" } else { path }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn coverage(include: &[&str], exclude: &[&str]) -> CoverageConfig {
    CoverageConfig {
      enabled: true,
      include_paths: include.iter().map(|s| s.to_string()).collect(),
      exclude_paths: exclude.iter().map(|s| s.to_string()).collect(),
    }
  }

  #[test]
  fn include_then_exclude_in_order() {
    assert_eq!(
      coverage(&["foo1", "foo2"], &["bar1", "bar2"]).flags(),
      vec![
        "--collect_code_coverage".to_string(),
        "--instrumentation_filter=+foo1,+foo2,-bar1,-bar2".to_string(),
      ]
    );
  }

  #[test]
  fn single_entries() {
    assert_eq!(
      coverage(&["foo1"], &["bar1"]).flags()[1],
      "--instrumentation_filter=+foo1,-bar1"
    );
    assert_eq!(coverage(&["foo1"], &[]).flags()[1], "--instrumentation_filter=+foo1");
    assert_eq!(coverage(&[], &["bar1"]).flags()[1], "--instrumentation_filter=-bar1");
  }

  #[test]
  fn wildcard_becomes_regex() {
    assert_eq!(coverage(&["*"], &[]).flags()[1], "--instrumentation_filter=+.*");
  }

  #[test]
  fn empty_lists_keep_only_enable_flag() {
    assert_eq!(coverage(&[], &[]).flags(), vec!["--collect_code_coverage".to_string()]);
  }

  #[test]
  fn disabled_emits_nothing() {
    let mut config = coverage(&["foo1"], &["bar1"]);
    config.enabled = false;
    assert!(config.flags().is_empty());
  }
}
