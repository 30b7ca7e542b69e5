use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Defaults loaded from an optional TOML file; command-line flags take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    pub max_steps: Option<u64>,

    #[serde(default = "default_persist_cartridge_ram")]
    pub persist_cartridge_ram: bool,

    #[serde(default)]
    pub save_state_on_exit: bool,

    #[serde(default = "default_print_registers")]
    pub print_registers: bool,
}

fn default_persist_cartridge_ram() -> bool {
    true
}

fn default_print_registers() -> bool {
    true
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            max_steps: Option::default(),
            persist_cartridge_ram: default_persist_cartridge_ram(),
            save_state_on_exit: bool::default(),
            print_registers: default_print_registers(),
        }
    }
}

impl CliConfig {
    pub fn from_toml_file<P>(path: P) -> Result<Self, anyhow::Error>
    where
        P: AsRef<Path> + std::fmt::Debug,
    {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("error reading TOML config file from '{path:?}'"))?;
        let config: Self = toml::from_str(&config_str)
            .with_context(|| format!("error parsing CLI config from TOML file at '{path:?}'"))?;

        Ok(config)
    }
}
