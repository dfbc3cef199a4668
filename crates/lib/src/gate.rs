//! Module eligibility gate.
//!
//! Decides whether a named unit may be delegated to the evaluator. The lists
//! are consulted in a fixed precedence: disabled, enabled, enabled only within
//! an APEX (DCLA), then the global default.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Allow/deny registry for mixed build delegation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleGate {
  /// Whether units on no list are delegated.
  pub default_to_bazel: bool,
  /// Units always delegated.
  pub enabled: HashSet<String>,
  /// Units never delegated.
  pub disabled: HashSet<String>,
  /// Units delegated only when built within an APEX.
  pub dcla_enabled: HashSet<String>,
}

impl ModuleGate {
  pub fn new(default_to_bazel: bool) -> Self {
    Self {
      default_to_bazel,
      ..Self::default()
    }
  }

  pub fn with_enabled<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.enabled.extend(names.into_iter().map(Into::into));
    self
  }

  pub fn with_disabled<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.disabled.extend(names.into_iter().map(Into::into));
    self
  }

  pub fn with_dcla_enabled<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.dcla_enabled.extend(names.into_iter().map(Into::into));
    self
  }

  /// Whether `name` may be delegated in the given context.
  pub fn is_allowed(&self, name: &str, within_apex: bool) -> bool {
    if self.disabled.contains(name) {
      return false;
    }
    if self.enabled.contains(name) {
      return true;
    }
    if self.dcla_enabled.contains(name) {
      return within_apex;
    }
    self.default_to_bazel
  }
}
