use anyhow::Result;
use mixbuild_lib::config::BridgeConfig;

use crate::output::{OutputFormat, print_info, print_json, print_success};

pub fn cmd_allowed(config: &BridgeConfig, name: &str, within_apex: bool, output: OutputFormat) -> Result<()> {
  let allowed = config.modules.is_allowed(name, within_apex);

  if output.is_json() {
    print_json(&serde_json::json!({
      "name": name,
      "within_apex": within_apex,
      "allowed": allowed,
    }))?;
  } else if allowed {
    print_success(&format!("{} may be built by the evaluator", name));
  } else {
    print_info(&format!("{} stays with the legacy build", name));
  }

  Ok(())
}
