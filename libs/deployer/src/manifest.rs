use std::{collections::BTreeMap, fs, path::Path};

use ethers::types::Address;
use eyre::Context;
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub address: Address,
}

/// Human-readable address book: `{ name: { chainId: { "address": "0x…" } } }`.
///
/// Entries for other chains are left alone when a run writes its own.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest(BTreeMap<String, BTreeMap<String, ManifestEntry>>);

impl Manifest {
    /// A missing file is an empty manifest.
    pub fn load(path: &Path) -> eyre::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse manifest {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> eyre::Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text + "\n")
            .with_context(|| format!("Failed to write manifest {}", path.display()))
    }

    pub fn get(&self, name: &str, chain_id: u64) -> Option<Address> {
        self.0
            .get(name)
            .and_then(|chains| chains.get(&chain_id.to_string()))
            .map(|entry| entry.address)
    }

    pub fn address(&self, name: &str, chain_id: u64) -> Result<Address, Error> {
        self.get(name, chain_id)
            .ok_or_else(|| Error::MissingManifestEntry {
                name: name.to_owned(),
                chain_id,
            })
    }

    pub fn set(&mut self, name: &str, chain_id: u64, address: Address) {
        self.0
            .entry(name.to_owned())
            .or_default()
            .insert(chain_id.to_string(), ManifestEntry { address });
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}
