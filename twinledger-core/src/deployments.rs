//! Per-network contract address artifacts.
//!
//! Deployed addresses are written to `deployments/<network>.json` under the
//! data directory so other tools can look contracts up by network name,
//! the same shape the original frontend loaded per network.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::{Address, Network};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Deployments {
    pub contracts: BTreeMap<String, Address>,
}

impl Deployments {
    pub fn artifact_path(data_dir: &Path, network: &Network) -> PathBuf {
        data_dir
            .join("deployments")
            .join(format!("{}.json", network.as_str()))
    }

    /// Missing artifacts read as empty; nothing has been deployed yet.
    pub async fn load(data_dir: &Path, network: &Network) -> Result<Self> {
        let path = Self::artifact_path(data_dir, network);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    pub async fn save(&self, data_dir: &Path, network: &Network) -> Result<()> {
        let path = Self::artifact_path(data_dir, network);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, content).await?;

        tracing::debug!("Wrote deployment artifact {}", path.display());
        Ok(())
    }

    pub fn set(&mut self, name: impl Into<String>, address: Address) {
        self.contracts.insert(name.into(), address);
    }

    pub fn get(&self, name: &str) -> Option<Address> {
        self.contracts.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}
