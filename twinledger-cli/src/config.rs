use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub data_dir: PathBuf,
    pub default_network: String,
    pub verbose: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("twinledger"),
            default_network: "devnet".to_string(),
            verbose: false,
        }
    }
}

impl CliConfig {
    pub fn resolve(data_dir: Option<PathBuf>, network: Option<String>, verbose: bool) -> Self {
        let defaults = Self::default();
        Self {
            data_dir: data_dir.unwrap_or(defaults.data_dir),
            default_network: network.unwrap_or(defaults.default_network),
            verbose,
        }
    }
}
