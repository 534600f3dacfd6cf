use std::sync::Arc;

use async_trait::async_trait;
use common::{log_msg, network::NetworkDescriptor};
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, MiddlewareError, Provider, DEFAULT_LOCAL_POLL_INTERVAL},
    signers::{LocalWallet, Signer},
    types::{
        transaction::eip2718::TypedTransaction, Address, BlockId, Bytes, TransactionReceipt,
        TransactionRequest, U256, U64,
    },
};
use eyre::{eyre, Context, OptionExt};
use tokio::sync::OnceCell;

use crate::{gas::GasPriceFeed, nonce::NonceCounter, ChainClient, RevertError};

pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// JSON-RPC backed [`ChainClient`], signing with a local wallet.
pub struct TxClient {
    client: Arc<SignerClient>,
}

impl TxClient {
    pub async fn try_new_from_url(rpc_url: &str, wallet: LocalWallet) -> eyre::Result<Self> {
        let mut provider = Provider::<Http>::try_from(rpc_url)
            .with_context(|| format!("Invalid RPC URL {}", rpc_url))?;
        let chain_id = provider
            .get_chainid()
            .await
            .with_context(|| format!("Failed to fetch chain id from {}", rpc_url))?
            .as_u64();
        if NetworkDescriptor::from_chain_id(chain_id).is_some_and(|network| network.is_local) {
            provider.set_interval(DEFAULT_LOCAL_POLL_INTERVAL);
        }
        Ok(Self {
            client: Arc::new(SignerMiddleware::new(
                provider,
                wallet.with_chain_id(chain_id),
            )),
        })
    }

    pub fn client(&self) -> Arc<SignerClient> {
        self.client.clone()
    }

    async fn revert_reason_of(&self, tx: &TypedTransaction, block: Option<U64>) -> RevertError {
        match self.client.call(tx, block.map(BlockId::from)).await {
            Err(err) => match into_revert(&err) {
                Some(revert) => revert,
                None => RevertError {
                    reason: format!("unknown ({})", err),
                },
            },
            Ok(_) => RevertError {
                reason: "no reason given".to_owned(),
            },
        }
    }
}

/// Pick the revert out of a node error, if that is what it is.
fn into_revert<E: MiddlewareError>(err: &E) -> Option<RevertError> {
    let response = err.as_error_response()?;
    let data = response.as_revert_data()?;
    if !data.is_empty() {
        return Some(RevertError::from_data(&data));
    }
    // No revert data, the reason can only be in the message.
    let reason = response
        .message
        .strip_prefix("execution reverted")
        .unwrap_or(&response.message);
    Some(match reason.trim_start_matches(':').trim() {
        "" => RevertError::from_data(&[]),
        reason => RevertError {
            reason: reason.to_owned(),
        },
    })
}

fn to_report<E: MiddlewareError + 'static>(err: E, what: &str) -> eyre::Report {
    match into_revert(&err) {
        Some(revert) => eyre::Report::new(revert),
        None => eyre::Report::new(err).wrap_err(what.to_owned()),
    }
}

#[async_trait]
impl ChainClient for TxClient {
    fn address(&self) -> Address {
        self.client.address()
    }

    async fn chain_id(&self) -> eyre::Result<u64> {
        Ok(self
            .client
            .get_chainid()
            .await
            .context("Failed to fetch chain id")?
            .as_u64())
    }

    async fn transaction_count(&self, account: Address) -> eyre::Result<U256> {
        self.client
            .get_transaction_count(account, None)
            .await
            .context("Failed to fetch the current nonce from the Ethereum client")
    }

    async fn call(&self, to: Address, data: Bytes) -> eyre::Result<Bytes> {
        let tx: TypedTransaction = TransactionRequest::new().to(to).data(data).into();
        self.client
            .call(&tx, None)
            .await
            .map_err(|err| to_report(err, "Failed to call contract"))
    }

    async fn estimate_gas(&self, from: Address, to: Address, data: Bytes) -> eyre::Result<U256> {
        let tx: TypedTransaction = TransactionRequest::new()
            .from(from)
            .to(to)
            .data(data)
            .into();
        self.client
            .estimate_gas(&tx, None)
            .await
            .map_err(|err| to_report(err, "Failed to estimate gas"))
    }

    async fn send(&self, tx: TransactionRequest) -> eyre::Result<TransactionReceipt> {
        log_msg!("\tnonce {:?}", tx.nonce);
        log_msg!("\tgas price {:?}", tx.gas_price);
        let typed: TypedTransaction = tx.into();
        let pending = self
            .client
            .send_transaction(typed.clone(), None)
            .await
            .map_err(|err| to_report(err, "Failed to send tx"))?;

        let receipt = pending
            .await
            .context("Failed to obtain receipt")?
            .ok_or_eyre("Transaction dropped from mempool")?;

        if receipt.status == Some(U64::zero()) {
            tracing::error!("Transaction {:?} reverted", receipt.transaction_hash);
            let mut replay = typed;
            replay.set_from(self.address());
            Err(self.revert_reason_of(&replay, receipt.block_number).await)?;
        }
        Ok(receipt)
    }
}

/// Parameters for a directly executed transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxParams {
    pub nonce: U256,
    pub gas_price: U256,
}

impl TxParams {
    pub fn apply(&self, tx: TransactionRequest) -> TransactionRequest {
        tx.nonce(self.nonce).gas_price(self.gas_price)
    }
}

pub fn gwei(amount: u64) -> U256 {
    U256::from(amount) * U256::exp10(9)
}

/// Gas price on local nodes.
pub fn local_gas_price() -> U256 {
    gwei(1)
}

/// Gas price on live networks without a gas oracle.
pub fn default_gas_price() -> U256 {
    gwei(2)
}

/// Headroom on top of the oracle's fast price.
pub fn gas_price_headroom() -> U256 {
    gwei(1)
}

/// Supplies nonce and gas price for every directly executed transaction.
///
/// The nonce is read from the chain once and then counted locally, so that
/// concurrent and rapid sequential submissions never depend on the node's
/// view of pending transactions. The gas price is settled on first use and
/// kept for the rest of the run.
pub struct TxParamsSupplier {
    client: Arc<dyn ChainClient>,
    network: NetworkDescriptor,
    gas_feed: Option<Arc<dyn GasPriceFeed>>,
    gas_price: OnceCell<U256>,
    nonce: NonceCounter,
}

impl TxParamsSupplier {
    pub fn new(
        client: Arc<dyn ChainClient>,
        network: NetworkDescriptor,
        gas_feed: Option<Arc<dyn GasPriceFeed>>,
    ) -> Self {
        Self {
            client,
            network,
            gas_feed,
            gas_price: OnceCell::new(),
            nonce: NonceCounter::new(),
        }
    }

    pub async fn next(&self) -> eyre::Result<TxParams> {
        let gas_price = self.gas_price().await?;
        let nonce = self.next_nonce().await?;
        Ok(TxParams { nonce, gas_price })
    }

    async fn gas_price(&self) -> eyre::Result<U256> {
        self.gas_price
            .get_or_try_init(|| self.fetch_gas_price())
            .await
            .copied()
    }

    async fn fetch_gas_price(&self) -> eyre::Result<U256> {
        if self.network.is_local {
            return Ok(local_gas_price());
        }
        if !self.network.live_gas_price {
            return Ok(default_gas_price());
        }
        let feed = self
            .gas_feed
            .as_ref()
            .ok_or_else(|| eyre!("Network {} requires a gas price feed", self.network.name))?;
        let fast = feed.fast_gas_price().await?;
        log_msg!(
            "Fast gas price {} gwei",
            ethers::utils::format_units(fast, "gwei").unwrap_or_default()
        );
        Ok(fast + gas_price_headroom())
    }

    async fn next_nonce(&self) -> eyre::Result<U256> {
        self.nonce
            .next(|| self.client.transaction_count(self.client.address()))
            .await
    }
}
