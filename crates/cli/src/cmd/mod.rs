mod allowed;
mod flags;
mod invoke;

use std::path::Path;

use anyhow::{Context, Result};
use mixbuild_lib::config::BridgeConfig;

pub use allowed::cmd_allowed;
pub use flags::cmd_flags;
pub use invoke::cmd_invoke;

/// Load the bridge configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<BridgeConfig> {
  match path {
    Some(path) => {
      BridgeConfig::load(path).with_context(|| format!("Failed to load config: {}", path.display()))
    }
    None => Ok(BridgeConfig::default()),
  }
}
