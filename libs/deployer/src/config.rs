use std::{env, path::PathBuf};

use common::network::NetworkDescriptor;
use ethers::{signers::LocalWallet, types::Address};
use eyre::Context;

use crate::{
    dispatcher::routes_via_multisig, error::Error, proxy::ModuleId, signature::derive_wallet,
};

pub const MNEMONIC_VAR: &str = "MNEMONIC";
pub const DEPLOYER_PRIVATE_KEY_VAR: &str = "DEPLOYER_PRIVATE_KEY";
pub const ETHERSCAN_API_KEY_VAR: &str = "ETHERSCAN_API_KEY";

/// Run configuration, as given on the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployConfig {
    pub chain_id: u64,
    /// Overrides the network's default endpoint.
    pub rpc_url: Option<String>,
    pub fresh: bool,
    pub multisig: Option<Address>,
    /// Mnemonic index of the key signing multisig transactions.
    pub signer_index: u32,
    /// Sender reported to the Safe service, the signer's address when unset.
    pub safe_sender: Option<Address>,
    /// Overrides the network's Safe service endpoint.
    pub safe_service_url: Option<String>,
    /// Modules to ensure, all of them when empty.
    pub modules: Vec<ModuleId>,
    pub artifacts_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub extract_manifest: bool,
    pub allow_live_fresh_deploy: bool,
}

impl DeployConfig {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            rpc_url: None,
            fresh: false,
            multisig: None,
            signer_index: 0,
            safe_sender: None,
            safe_service_url: None,
            modules: Vec::new(),
            artifacts_dir: PathBuf::from("artifacts"),
            manifest_path: PathBuf::from("deployedAddresses.json"),
            extract_manifest: false,
            allow_live_fresh_deploy: false,
        }
    }

    pub fn network(&self) -> Result<NetworkDescriptor, Error> {
        NetworkDescriptor::from_chain_id(self.chain_id)
            .ok_or(Error::UnsupportedNetwork(self.chain_id))
    }

    pub fn rpc_url(&self, network: &NetworkDescriptor) -> String {
        self.rpc_url
            .clone()
            .unwrap_or_else(|| network.rpc_url.to_owned())
    }

    /// A fresh deployment creates a new registry and therefore a whole new
    /// system. Live networks only get one when explicitly allowed.
    pub fn check_release_policy(&self, network: &NetworkDescriptor) -> Result<(), Error> {
        if self.fresh && !network.is_local && !self.allow_live_fresh_deploy {
            return Err(Error::ReleasePolicy(format!(
                "a fresh deployment to {} (chain {})",
                network.name, network.chain_id
            )));
        }
        Ok(())
    }

    pub fn modules(&self) -> Vec<ModuleId> {
        if self.modules.is_empty() {
            ModuleId::ALL.to_vec()
        } else {
            self.modules.clone()
        }
    }

    pub fn uses_multisig_relay(&self) -> bool {
        routes_via_multisig(self.multisig, self.fresh)
    }
}

/// Secrets taken from the environment, never from the command line.
#[derive(Clone, Default)]
pub struct Secrets {
    pub mnemonic: Option<String>,
    pub deployer_private_key: Option<String>,
    pub etherscan_api_key: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        let var = |name: &str| env::var(name).ok().filter(|v: &String| !v.trim().is_empty());
        Self {
            mnemonic: var(MNEMONIC_VAR),
            deployer_private_key: var(DEPLOYER_PRIVATE_KEY_VAR),
            etherscan_api_key: var(ETHERSCAN_API_KEY_VAR),
        }
    }

    pub fn mnemonic(&self) -> Result<&str, Error> {
        self.mnemonic
            .as_deref()
            .ok_or(Error::MissingSecret(MNEMONIC_VAR))
    }

    pub fn etherscan_api_key(&self) -> Result<&str, Error> {
        self.etherscan_api_key
            .as_deref()
            .ok_or(Error::MissingSecret(ETHERSCAN_API_KEY_VAR))
    }

    /// Deployer key, or the first mnemonic account without one.
    pub fn deployer_wallet(&self) -> eyre::Result<LocalWallet> {
        if let Some(key) = &self.deployer_private_key {
            return key
                .parse::<LocalWallet>()
                .context("Invalid deployer private key");
        }
        match &self.mnemonic {
            Some(mnemonic) => derive_wallet(mnemonic, 0),
            None => Err(Error::MissingSecret(DEPLOYER_PRIVATE_KEY_VAR))?,
        }
    }

    /// Wallet signing multisig transactions.
    pub fn signer_wallet(&self, index: u32) -> eyre::Result<LocalWallet> {
        derive_wallet(self.mnemonic()?, index)
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let set = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Secrets")
            .field("mnemonic", &set(&self.mnemonic))
            .field("deployer_private_key", &set(&self.deployer_private_key))
            .field("etherscan_api_key", &set(&self.etherscan_api_key))
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use common::network::{HARDHAT, MAINNET};
    use crate::test_utils::TEST_MNEMONIC;
    use ethers::signers::Signer;

    #[test]
    fn test_unknown_chain_is_rejected() {
        assert!(matches!(
            DeployConfig::new(4).network(),
            Err(Error::UnsupportedNetwork(4))
        ));
        assert_eq!(DeployConfig::new(31337).network().unwrap(), HARDHAT);
    }

    #[test]
    fn test_release_policy() {
        let mut config = DeployConfig::new(1);
        config.fresh = true;
        assert!(matches!(
            config.check_release_policy(&MAINNET),
            Err(Error::ReleasePolicy(_))
        ));
        assert!(config.check_release_policy(&HARDHAT).is_ok());

        config.allow_live_fresh_deploy = true;
        assert!(config.check_release_policy(&MAINNET).is_ok());

        config.fresh = false;
        config.allow_live_fresh_deploy = false;
        assert!(config.check_release_policy(&MAINNET).is_ok());
    }

    #[test]
    fn test_empty_selection_means_all_modules() {
        let mut config = DeployConfig::new(31337);
        assert_eq!(config.modules(), ModuleId::ALL.to_vec());
        config.modules = vec![ModuleId::FeeBank];
        assert_eq!(config.modules(), vec![ModuleId::FeeBank]);
    }

    #[test]
    fn test_relay_only_for_upgrades_with_multisig() {
        let mut config = DeployConfig::new(1);
        assert!(!config.uses_multisig_relay());
        config.multisig = Some(Address::repeat_byte(5));
        assert!(config.uses_multisig_relay());
        config.fresh = true;
        assert!(!config.uses_multisig_relay());
    }

    #[test]
    fn test_deployer_wallet_sources() {
        let secrets = Secrets::default();
        let err = secrets.deployer_wallet().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::MissingSecret(DEPLOYER_PRIVATE_KEY_VAR))
        ));

        let secrets = Secrets {
            mnemonic: Some(TEST_MNEMONIC.to_owned()),
            ..Default::default()
        };
        assert_eq!(
            secrets.deployer_wallet().unwrap().address(),
            derive_wallet(TEST_MNEMONIC, 0).unwrap().address()
        );

        let secrets = Secrets {
            mnemonic: Some(TEST_MNEMONIC.to_owned()),
            deployer_private_key: Some(
                "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d".to_owned(),
            ),
            ..Default::default()
        };
        assert_eq!(
            secrets.deployer_wallet().unwrap().address(),
            derive_wallet(TEST_MNEMONIC, 1).unwrap().address()
        );
    }

    #[test]
    fn test_debug_hides_secrets() {
        let secrets = Secrets {
            mnemonic: Some(TEST_MNEMONIC.to_owned()),
            ..Default::default()
        };
        let printed = format!("{:?}", secrets);
        assert!(!printed.contains("junk"));
        assert!(printed.contains("<set>"));
    }
}
