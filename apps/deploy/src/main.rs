use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use common::log_msg;
use common_ethers::tx_sender::TxClient;
use deployer::{
    artifacts::Artifacts,
    config::{DeployConfig, Secrets},
    context::DeploymentContext,
    deploy,
    manifest::Manifest,
    proxy::ModuleId,
};
use ethers::types::Address;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, env = "CHAIN_ID", default_value_t = 31337)]
    chain_id: u64,

    #[arg(short, long, env = "RPC_URL")]
    rpc_url: Option<String>,

    /// Deploy a new ACL and registry instead of upgrading the ones in the manifest
    #[arg(long)]
    fresh: bool,

    /// Safe to route upgrade calls through
    #[arg(long, env = "MULTISIG_ADDRESS")]
    multisig: Option<Address>,

    /// Mnemonic index of the multisig signer
    #[arg(long, default_value_t = 0)]
    signer_index: u32,

    /// Sender reported to the Safe service, defaults to the signer
    #[arg(long)]
    safe_sender: Option<Address>,

    #[arg(long, env = "SAFE_SERVICE_URL")]
    safe_service_url: Option<String>,

    #[arg(short, long, value_delimiter = ',')]
    module: Vec<ModuleId>,

    #[arg(long, default_value = "artifacts")]
    artifacts_dir: PathBuf,

    #[arg(long, default_value = "deployedAddresses.json")]
    manifest: PathBuf,

    /// Write deployed addresses back to the manifest
    #[arg(long)]
    extract_manifest: bool,

    #[arg(long)]
    allow_live_fresh_deploy: bool,
}

impl Cli {
    fn into_config(self) -> DeployConfig {
        DeployConfig {
            chain_id: self.chain_id,
            rpc_url: self.rpc_url,
            fresh: self.fresh,
            multisig: self.multisig,
            signer_index: self.signer_index,
            safe_sender: self.safe_sender,
            safe_service_url: self.safe_service_url,
            modules: self.module,
            artifacts_dir: self.artifacts_dir,
            manifest_path: self.manifest,
            extract_manifest: self.extract_manifest,
            allow_live_fresh_deploy: self.allow_live_fresh_deploy,
        }
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Cli::parse().into_config();
    let secrets = Secrets::from_env();

    let network = config.network()?;
    config.check_release_policy(&network)?;

    let rpc_url = config.rpc_url(&network);
    let client = TxClient::try_new_from_url(&rpc_url, secrets.deployer_wallet()?).await?;

    let artifacts = Artifacts::from_dir(&config.artifacts_dir)?;
    let manifest = Manifest::load(&config.manifest_path)?;

    let mut ctx =
        DeploymentContext::new(&config, Arc::new(client), artifacts, manifest, &secrets).await?;
    deploy::run(&mut ctx, &config.modules()).await?;

    if config.extract_manifest {
        ctx.extract_manifest();
        ctx.manifest.save(&config.manifest_path)?;
        log_msg!("Addresses written to {}", config.manifest_path.display());
    }

    log_msg!("Done.");
    Ok(())
}
