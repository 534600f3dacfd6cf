use std::{collections::HashMap, fs, path::Path};

use ethers::{
    abi::{encode, Token},
    types::Bytes,
};
use eyre::Context;
use serde::Deserialize;

use crate::error::Error;

/// Creation bytecode of every contract the deployer may create, by name.
///
/// Read from `{dir}/{ContractName}.json`, where `bytecode` is either the hex
/// string itself or an object with an `object` field.
#[derive(Clone, Debug, Default)]
pub struct Artifacts {
    bytecode: HashMap<String, Bytes>,
}

#[derive(Deserialize)]
struct ArtifactFile {
    #[serde(default)]
    bytecode: Option<BytecodeField>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BytecodeField {
    Hex(Bytes),
    Object { object: Bytes },
}

impl Artifacts {
    pub fn from_dir(dir: &Path) -> eyre::Result<Self> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read artifacts directory {}", dir.display()))?;

        let mut bytecode = HashMap::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read artifact {}", path.display()))?;
            let file: ArtifactFile = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse artifact {}", path.display()))?;
            let code = match file.bytecode {
                Some(BytecodeField::Hex(code))
                | Some(BytecodeField::Object { object: code }) => code,
                None => continue,
            };
            // interfaces and abstract contracts have no bytecode
            if !code.is_empty() {
                bytecode.insert(name.to_owned(), code);
            }
        }
        Ok(Self { bytecode })
    }

    pub fn from_map<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Bytes)>,
        S: Into<String>,
    {
        Self {
            bytecode: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn bytecode(&self, name: &str) -> Result<&Bytes, Error> {
        self.bytecode
            .get(name)
            .ok_or_else(|| Error::MissingArtifact(name.to_owned()))
    }

    /// Creation bytecode followed by the ABI-encoded constructor arguments.
    pub fn initcode(&self, name: &str, args: &[Token]) -> Result<Bytes, Error> {
        let mut code = self.bytecode(name)?.to_vec();
        code.extend(encode(args));
        Ok(code.into())
    }
}
