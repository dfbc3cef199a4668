//! Prints what the next round would pass to the evaluator.

use anyhow::Result;
use mixbuild_lib::config::BridgeConfig;

use crate::output::{OutputFormat, print_json, print_stat};

pub fn cmd_flags(config: &BridgeConfig, output: OutputFormat) -> Result<()> {
  let flags = config.coverage.flags();
  let paths = &config.paths;

  if output.is_json() {
    print_json(&serde_json::json!({
      "coverage_flags": flags,
      "bazel": paths.bazel_binary(),
      "injection_dir": paths.injection_dir(),
      "execution_root": paths.execution_root(),
      "bazel_out_dir": paths.bazel_out_dir(),
    }))?;
    return Ok(());
  }

  if flags.is_empty() {
    println!("Coverage: disabled");
  } else {
    println!("Coverage flags:");
    for flag in &flags {
      println!("  {}", flag);
    }
  }
  println!();
  println!("Paths:");
  print_stat("Evaluator", &paths.bazel_binary().display().to_string());
  print_stat("Injection dir", &paths.injection_dir().display().to_string());
  print_stat("Execution root", &paths.execution_root().display().to_string());
  print_stat("Bazel out", &paths.bazel_out_dir().display().to_string());

  Ok(())
}
