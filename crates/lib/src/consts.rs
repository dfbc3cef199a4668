//! Fixed names shared between the injection files, the evaluator calls and
//! the result parsers.

/// Name of the injected external repository the evaluator sees.
pub const INJECTION_REPO: &str = "soong_injection";

/// Subdirectory of the injection repository holding the mixed build root.
pub const MIXED_BUILDS_DIR: &str = "mixed_builds";

/// Workspace file at the root of the injection directory.
pub const WORKSPACE_FILE: &str = "WORKSPACE.bazel";

/// Build file declaring the buildroot target.
pub const BUILD_FILE: &str = "BUILD.bazel";

/// Starlark file holding the buildroot rule and the cquery format function.
pub const MAIN_BZL_FILE: &str = "main.bzl";

/// Expression for the line-protocol (cquery) call.
pub const CQUERY_EXPRESSION: &str = "deps(@soong_injection//mixed_builds:buildroot, 2)";

/// Expression for the action-graph (aquery) call.
pub const AQUERY_EXPRESSION: &str = "deps(@soong_injection//mixed_builds:buildroot)";

/// Separates the request key from the payload in a cquery record.
pub const CQUERY_PAYLOAD_SEPARATOR: &str = ">>";

/// Separates the fields of a request key.
pub const KEY_FIELD_SEPARATOR: char = '|';

/// Separates several output files inside a single payload.
pub const OUTPUT_FILES_SEPARATOR: &str = ", ";

/// Marker for configurations built inside an APEX.
pub const WITHIN_APEX_MARKER: &str = "within_apex";

/// Suffix identifying generated dependency files.
pub const DEPFILE_SUFFIX: &str = ".d";

/// Directory token the evaluator writes into depfiles.
pub const BAZEL_OUT_TOKEN: &str = "bazel-out/";

/// Actions with this mnemonic only group inputs and carry no command.
pub const MIDDLEMAN_MNEMONIC: &str = "Middleman";

/// Environment variable overriding the evaluator binary.
pub const BAZEL_ENV_VAR: &str = "MIXBUILD_BAZEL";

/// Evaluator binary used when nothing overrides it.
pub const DEFAULT_BAZEL: &str = "bazel";
