use std::{collections::BTreeMap, sync::Arc};

use common::{log::Logger, log_msg, network::NetworkDescriptor};
use common_ethers::{
    gas::{EtherscanGasFeed, GasPriceFeed},
    tx_sender::TxParamsSupplier,
    ChainClient,
};
use ethers::{
    signers::{LocalWallet, Signer},
    types::Address,
};

use crate::{
    artifacts::Artifacts,
    config::{DeployConfig, Secrets},
    dispatcher::Dispatcher,
    error::Error,
    manifest::Manifest,
    proxy::{ModuleId, ProxyRecord},
    registry::RegistryClient,
    safe::{service_endpoint, SafeRelay},
};

pub const ACL_NAME: &str = "ACL";
pub const REGISTRY_NAME: &str = "Settings";

/// Everything one run works with.
///
/// The `ensure_*` steps fill in `acl`, `registry` and `modules` as they go.
pub struct DeploymentContext {
    pub network: NetworkDescriptor,
    /// Deployer first, then the multisig signer when there is one.
    pub accounts: Vec<Address>,
    pub client: Arc<dyn ChainClient>,
    pub dispatcher: Arc<Dispatcher>,
    pub logger: Logger,
    pub multisig: Option<Address>,
    pub signer: Option<LocalWallet>,
    pub fresh: bool,
    pub artifacts: Artifacts,
    pub manifest: Manifest,
    pub acl: Option<Address>,
    pub registry: Option<RegistryClient>,
    pub modules: BTreeMap<ModuleId, ProxyRecord>,
}

impl DeploymentContext {
    /// Validate the configuration and wire up the dispatcher.
    ///
    /// Every configuration error is raised here, before anything is sent.
    pub async fn new(
        config: &DeployConfig,
        client: Arc<dyn ChainClient>,
        artifacts: Artifacts,
        manifest: Manifest,
        secrets: &Secrets,
    ) -> eyre::Result<Self> {
        let network = config.network()?;
        config.check_release_policy(&network)?;

        let relaying = config.uses_multisig_relay();
        let signer = if relaying {
            Some(secrets.signer_wallet(config.signer_index)?)
        } else {
            None
        };

        let live_price = network.live_gas_price && !network.is_local;
        let gas_feed: Option<Arc<dyn GasPriceFeed>> = if live_price {
            let api_key = secrets.etherscan_api_key()?.to_owned();
            Some(Arc::new(EtherscanGasFeed::new(api_key)?))
        } else {
            None
        };

        let actual = client.chain_id().await?;
        if actual != network.chain_id {
            Err(Error::ChainIdMismatch {
                expected: network.chain_id,
                actual,
            })?;
        }

        let relay = match (config.multisig, &signer) {
            (Some(safe), Some(signer)) => {
                let endpoint = match &config.safe_service_url {
                    Some(url) => url.clone(),
                    None => service_endpoint(&network)?.to_owned(),
                };
                log_msg!(
                    "Relaying calls to multisig {:?} via {} as signer {:?}",
                    safe,
                    endpoint,
                    signer.address()
                );
                Some(SafeRelay::new(
                    client.clone(),
                    endpoint,
                    safe,
                    signer.clone(),
                    config.safe_sender,
                ))
            }
            _ => None,
        };

        let params = TxParamsSupplier::new(client.clone(), network, gas_feed);
        let dispatcher = Arc::new(Dispatcher::new(client.clone(), params, relay));

        let mut accounts = vec![client.address()];
        accounts.extend(signer.as_ref().map(|s| s.address()));

        log_msg!(
            "Deploying to {} (chain {}) from {:?}, {}",
            network.name,
            network.chain_id,
            client.address(),
            if config.fresh { "fresh" } else { "upgrade" }
        );

        Ok(Self {
            network,
            accounts,
            client,
            dispatcher,
            logger: Logger::new(),
            multisig: config.multisig,
            signer,
            fresh: config.fresh,
            artifacts,
            manifest,
            acl: None,
            registry: None,
            modules: BTreeMap::new(),
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.network.chain_id
    }

    /// Record the ACL, the registry and every ensured module proxy.
    pub fn extract_manifest(&mut self) {
        let chain_id = self.chain_id();
        if let Some(acl) = self.acl {
            self.manifest.set(ACL_NAME, chain_id, acl);
        }
        if let Some(registry) = &self.registry {
            self.manifest.set(REGISTRY_NAME, chain_id, registry.address());
        }
        for record in self.modules.values() {
            self.manifest
                .set(record.module.spec().name, chain_id, record.proxy);
        }
    }
}
