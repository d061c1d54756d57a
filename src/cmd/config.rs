//! Configuration view command, `taskboard config`.

use std::path::Path;

use anyhow::{Context, Result};
use taskboard::config::{ClientConfig, config_path};

use super::super::ConfigCommands;

pub fn cmd_config(
    project_dir: &Path,
    config: &ClientConfig,
    command: Option<ConfigCommands>,
) -> Result<()> {
    let path = config_path(project_dir);
    match command {
        None | Some(ConfigCommands::Show) => {
            if path.exists() {
                println!("# Config file: {}", path.display());
            } else {
                println!("# No config file at {}; using defaults", path.display());
            }
            println!("# Effective values (with env/CLI overrides)");
            println!();
            let rendered = config
                .to_toml()
                .context("Failed to render configuration")?;
            print!("{}", rendered);
        }
        Some(ConfigCommands::Path) => println!("{}", path.display()),
    }
    Ok(())
}
