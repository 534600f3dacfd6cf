/// Failures the deployer tells apart.
///
/// Configuration errors are raised before anything is sent to the chain.
/// Reverts surface as [`common_ethers::RevertError`] and gas oracle failures as
/// [`common_ethers::gas::GasPriceError`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unsupported network: chain id {0}")]
    UnsupportedNetwork(u64),

    #[error("RPC endpoint is on chain {actual}, expected chain {expected}")]
    ChainIdMismatch { expected: u64, actual: u64 },

    #[error("Missing secret: {0} is not set")]
    MissingSecret(&'static str),

    #[error("Release policy forbids {0}")]
    ReleasePolicy(String),

    #[error("No {name} address for chain {chain_id} in the address manifest")]
    MissingManifestEntry { name: String, chain_id: u64 },

    #[error("No artifact for contract {0}")]
    MissingArtifact(String),

    #[error("Multisig transaction submission to {endpoint} failed: {message}")]
    Relay {
        endpoint: String,
        status: Option<u16>,
        payload: String,
        message: String,
    },
}

impl Error {
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Error::Relay { .. })
    }
}
