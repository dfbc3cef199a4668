//! Build statements and their shell commands.
//!
//! A [`BuildStatement`] is the host-facing description of one evaluator
//! action. [`create_command`] turns it into a single shell line that runs the
//! action from the execution root, after clearing its stale primary output.

use serde::{Deserialize, Serialize};

use crate::consts::{BAZEL_OUT_TOKEN, DEPFILE_SUFFIX};

/// An environment variable set for one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
  pub key: String,
  pub value: String,
}

/// One action of the evaluated graph, with all paths resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStatement {
  /// The action arguments joined by single spaces.
  pub command: String,
  pub mnemonic: String,
  /// Output paths in declaration order, including the primary output.
  pub outputs: Vec<String>,
  /// Transitive input paths, each listed once.
  pub inputs: Vec<String>,
  pub primary_output: String,
  /// The first non-primary output that is a dependency file.
  ///
  /// Informational only. An action may declare several; the rewrite steps of
  /// [`create_command`] cover all of them, as listed by
  /// [`depfiles`](Self::depfiles).
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub depfile: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub env: Vec<EnvVar>,
}

impl BuildStatement {
  /// Non-primary outputs whose contents need `bazel-out/` rewritten.
  pub fn depfiles(&self) -> impl Iterator<Item = &str> {
    self
      .outputs
      .iter()
      .filter(|path| **path != self.primary_output && path.ends_with(DEPFILE_SUFFIX))
      .map(String::as_str)
  }
}

/// Render a statement as one shell line.
///
/// `execution_root` is where the action runs; `bazel_out_dir` replaces the
/// evaluator's `bazel-out/` prefix inside generated depfiles.
pub fn create_command(statement: &BuildStatement, execution_root: &str, bazel_out_dir: &str) -> String {
  let mut words = vec![
    format!("cd {} &&", quote(execution_root)),
    format!("rm -rf {} &&", quote(&statement.primary_output)),
  ];

  for var in &statement.env {
    words.push(format!("{}={}", var.key, var.value));
  }

  if statement.command.is_empty() {
    words.push("true".to_string());
  } else {
    words.push(statement.command.clone());
  }

  let script = format!(r#"s@(^|\s|"){}@\1{}/@g"#, BAZEL_OUT_TOKEN, sed_escape(bazel_out_dir));
  for depfile in statement.depfiles() {
    words.push(format!("&& sed -i'' -E {} {}", quote(&script), quote(depfile)));
  }

  words.join(" ")
}

// Single-quoted shell word; an embedded quote closes, escapes and reopens.
fn quote(word: &str) -> String {
  format!("'{}'", word.replace('\'', r"'\''"))
}

// Characters with a meaning in a sed replacement using `@` as delimiter.
fn sed_escape(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len());
  for c in text.chars() {
    if matches!(c, '\\' | '&' | '@') {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped
}

#[cfg(test)]
mod tests {
  use super::*;

  fn statement(command: &str, primary: &str, outputs: &[&str]) -> BuildStatement {
    BuildStatement {
      command: command.to_string(),
      mnemonic: "x".to_string(),
      outputs: outputs.iter().map(|s| s.to_string()).collect(),
      inputs: Vec::new(),
      primary_output: primary.to_string(),
      depfile: None,
      env: Vec::new(),
    }
  }

  #[test]
  fn simple_command() {
    let stmt = statement("touch foo", "one", &["one"]);
    assert_eq!(
      create_command(&stmt, "test/exec_root", "test/bazel_out"),
      "cd 'test/exec_root' && rm -rf 'one' && touch foo"
    );
  }

  #[test]
  fn depfile_outputs_are_rewritten() {
    let stmt = statement("bogus command", "parent/one", &["parent/one", "parent/one.d"]);
    assert_eq!(
      create_command(&stmt, "test/exec_root", "test/bazel_out"),
      r#"cd 'test/exec_root' && rm -rf 'parent/one' && bogus command && sed -i'' -E 's@(^|\s|")bazel-out/@\1test/bazel_out/@g' 'parent/one.d'"#
    );
  }

  #[test]
  fn primary_depfile_is_not_rewritten() {
    let stmt = statement("gen", "out/deps.d", &["out/deps.d"]);
    assert_eq!(
      create_command(&stmt, "root", "bazel_out"),
      "cd 'root' && rm -rf 'out/deps.d' && gen"
    );
  }

  #[test]
  fn every_depfile_gets_a_rewrite_step() {
    let stmt = statement("cc", "a.o", &["a.o", "a.d", "b.d", "a.dwo"]);
    let cmd = create_command(&stmt, "root", "out");
    assert_eq!(cmd.matches("sed -i''").count(), 2);
    assert!(cmd.ends_with("'b.d'"));
    assert!(!cmd.contains("'a.dwo'"));
  }

  #[test]
  fn env_vars_precede_command() {
    let mut stmt = statement("clang -c a.c", "a.o", &["a.o"]);
    stmt.env = vec![
      EnvVar {
        key: "PWD".to_string(),
        value: "/proc/self/cwd".to_string(),
      },
      EnvVar {
        key: "LANG".to_string(),
        value: "C".to_string(),
      },
    ];
    assert_eq!(
      create_command(&stmt, "root", "out"),
      "cd 'root' && rm -rf 'a.o' && PWD=/proc/self/cwd LANG=C clang -c a.c"
    );
  }

  #[test]
  fn paths_with_spaces_stay_single_words() {
    let stmt = statement("touch 'my file'", "dir with space/my file", &["dir with space/my file"]);
    assert_eq!(
      create_command(&stmt, "exec root", "out"),
      "cd 'exec root' && rm -rf 'dir with space/my file' && touch 'my file'"
    );
  }

  #[test]
  fn quotes_in_paths_cannot_break_out() {
    let stmt = statement("touch x", "a' '..", &["a' '.."]);
    assert_eq!(
      create_command(&stmt, "it's/root", "out"),
      r#"cd 'it'\''s/root' && rm -rf 'a'\'' '\''..' && touch x"#
    );
  }

  #[test]
  fn sed_specials_in_bazel_out_dir_are_escaped() {
    let stmt = statement("cc", "a.o", &["a.o", "a.d"]);
    assert_eq!(
      create_command(&stmt, "root", r"/ob/x@y&z\w"),
      r#"cd 'root' && rm -rf 'a.o' && cc && sed -i'' -E 's@(^|\s|")bazel-out/@\1/ob/x\@y\&z\\w/@g' 'a.d'"#
    );
  }
}
