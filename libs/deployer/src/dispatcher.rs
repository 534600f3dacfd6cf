use std::sync::Arc;

use common::log_msg;
use common_ethers::{tx_sender::TxParamsSupplier, ChainClient};
use ethers::{
    abi::AbiEncode,
    contract::EthCall,
    types::{Address, Bytes, TransactionReceipt, TransactionRequest},
};
use eyre::{Context, OptionExt};

use crate::safe::{SafeRelay, SafeTransaction};

/// A state-changing contract call, encoded and ready to dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractCall {
    pub to: Address,
    pub method: String,
    pub data: Bytes,
}

impl ContractCall {
    pub fn new<C: EthCall>(to: Address, call: C) -> Self {
        Self {
            to,
            method: C::function_name().into_owned(),
            data: call.encode().into(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Dispatched {
    /// Mined, with the receipt.
    Executed(TransactionReceipt),
    /// Proposed to the multisig, waiting for co-signers.
    Queued(SafeTransaction),
}

impl Dispatched {
    pub fn is_queued(&self) -> bool {
        matches!(self, Dispatched::Queued(_))
    }
}

/// Whether calls go to the multisig rather than to the chain.
///
/// Only runs that upgrade an existing deployment are relayed. A fresh
/// deployment is always executed by the deployer account itself.
pub fn routes_via_multisig(multisig: Option<Address>, fresh: bool) -> bool {
    multisig.is_some() && !fresh
}

/// Single entry point for everything the deployer sends.
pub struct Dispatcher {
    client: Arc<dyn ChainClient>,
    params: TxParamsSupplier,
    relay: Option<SafeRelay>,
}

impl Dispatcher {
    pub fn new(
        client: Arc<dyn ChainClient>,
        params: TxParamsSupplier,
        relay: Option<SafeRelay>,
    ) -> Self {
        Self {
            client,
            params,
            relay,
        }
    }

    pub fn client(&self) -> &dyn ChainClient {
        self.client.as_ref()
    }

    pub fn relay(&self) -> Option<&SafeRelay> {
        self.relay.as_ref()
    }

    /// Execute `call`, or queue it with the multisig when relaying.
    pub async fn execute(&self, call: ContractCall) -> eyre::Result<Dispatched> {
        if let Some(relay) = &self.relay {
            log_msg!("Queueing {} on {:?} with multisig", call.method, call.to);
            let safe_tx = relay.propose(&call).await?;
            return Ok(Dispatched::Queued(safe_tx));
        }

        log_msg!("Executing {} on {:?}", call.method, call.to);
        let params = self.params.next().await?;
        let tx = params.apply(TransactionRequest::new().to(call.to).data(call.data));
        let receipt = self
            .client
            .send(tx)
            .await
            .with_context(|| format!("{} on {:?} failed", call.method, call.to))?;
        Ok(Dispatched::Executed(receipt))
    }

    /// Create a contract, always executed directly by the deployer account.
    pub async fn deploy(&self, name: &str, initcode: Bytes) -> eyre::Result<Address> {
        let params = self.params.next().await?;
        let tx = params.apply(TransactionRequest::new().data(initcode));
        let receipt = self
            .client
            .send(tx)
            .await
            .with_context(|| format!("Failed to deploy {}", name))?;
        let address = receipt
            .contract_address
            .ok_or_eyre("Deployment receipt has no contract address")?;
        log_msg!("Deployed {} at {:?}", name, address);
        Ok(address)
    }
}
