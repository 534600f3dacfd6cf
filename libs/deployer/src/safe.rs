use std::sync::Arc;

use common::{log_msg, network::NetworkDescriptor};
use common_ethers::{
    contracts::{GetTransactionHashCall, GetTransactionHashReturn, NonceCall, NonceReturn},
    nonce::NonceCounter,
    read, ChainClient,
};
use ethers::{
    signers::{LocalWallet, Signer},
    types::{Address, Bytes, H256, U256},
    utils::to_checksum,
};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Serialize, Serializer};

use crate::{dispatcher::ContractCall, error::Error, signature::sign_safe_hash};

/// Plain call, as opposed to delegate call.
pub const OPERATION_CALL: u8 = 0;

/// Signed Safe transaction, in the shape the collection service accepts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeTransaction {
    #[serde(serialize_with = "checksummed")]
    pub to: Address,
    #[serde(serialize_with = "decimal")]
    pub value: U256,
    pub data: Bytes,
    pub operation: u8,
    #[serde(serialize_with = "integer")]
    pub nonce: U256,
    #[serde(serialize_with = "decimal")]
    pub safe_tx_gas: U256,
    #[serde(serialize_with = "decimal")]
    pub base_gas: U256,
    #[serde(serialize_with = "decimal")]
    pub gas_price: U256,
    #[serde(serialize_with = "checksummed")]
    pub gas_token: Address,
    #[serde(serialize_with = "checksummed")]
    pub refund_receiver: Address,
    pub contract_transaction_hash: H256,
    pub transaction_hash: Option<H256>,
    #[serde(serialize_with = "checksummed")]
    pub sender: Address,
    pub origin: Option<String>,
    pub signature: Bytes,
}

fn checksummed<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&to_checksum(address, None))
}

fn decimal<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

fn integer<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    let value = u64::try_from(*value).map_err(serde::ser::Error::custom)?;
    serializer.serialize_u64(value)
}

impl SafeTransaction {
    /// Unsigned plain call with no refund and no value transfer.
    pub fn call(to: Address, data: Bytes, safe_tx_gas: U256, nonce: U256, sender: Address) -> Self {
        Self {
            to,
            value: U256::zero(),
            data,
            operation: OPERATION_CALL,
            nonce,
            safe_tx_gas,
            base_gas: U256::zero(),
            gas_price: U256::zero(),
            gas_token: Address::zero(),
            refund_receiver: Address::zero(),
            contract_transaction_hash: H256::zero(),
            transaction_hash: None,
            sender,
            origin: None,
            signature: Bytes::new(),
        }
    }

    pub fn hash_call(&self) -> GetTransactionHashCall {
        GetTransactionHashCall {
            to: self.to,
            value: self.value,
            data: self.data.clone(),
            operation: self.operation,
            safe_tx_gas: self.safe_tx_gas,
            base_gas: self.base_gas,
            gas_price: self.gas_price,
            gas_token: self.gas_token,
            refund_receiver: self.refund_receiver,
            tx_nonce: self.nonce,
        }
    }
}

/// Collection service base URL for `network`.
pub fn service_endpoint(network: &NetworkDescriptor) -> Result<&'static str, Error> {
    network
        .safe_service_url
        .ok_or(Error::UnsupportedNetwork(network.chain_id))
}

/// Builds, signs and proposes Safe transactions.
///
/// Owns the multisig nonce counter, seeded from the Safe on first use. A
/// proposal that cannot be submitted aborts the run, retrying would reuse a
/// nonce the counter has already moved past.
pub struct SafeRelay {
    client: Arc<dyn ChainClient>,
    http: reqwest::Client,
    endpoint: String,
    safe: Address,
    signer: LocalWallet,
    sender: Address,
    nonce: NonceCounter,
}

impl SafeRelay {
    /// `sender` defaults to the signer's own address.
    pub fn new(
        client: Arc<dyn ChainClient>,
        endpoint: impl Into<String>,
        safe: Address,
        signer: LocalWallet,
        sender: Option<Address>,
    ) -> Self {
        let sender = sender.unwrap_or_else(|| signer.address());
        Self {
            client,
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            safe,
            signer,
            sender,
            nonce: NonceCounter::new(),
        }
    }

    pub fn safe(&self) -> Address {
        self.safe
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn signer(&self) -> Address {
        self.signer.address()
    }

    pub fn transactions_url(&self) -> String {
        format!(
            "{}/api/v1/safes/{}/transactions/",
            self.endpoint.trim_end_matches('/'),
            to_checksum(&self.safe, None)
        )
    }

    async fn onchain_nonce(&self) -> eyre::Result<U256> {
        let ret: NonceReturn = read(self.client.as_ref(), self.safe, NonceCall).await?;
        log_msg!("Multisig {:?} is at nonce {}", self.safe, ret.0);
        Ok(ret.0)
    }

    /// Hash as computed by the Safe itself, the one co-signers will verify.
    async fn transaction_hash(&self, tx: &SafeTransaction) -> eyre::Result<H256> {
        let ret: GetTransactionHashReturn =
            read(self.client.as_ref(), self.safe, tx.hash_call()).await?;
        Ok(H256::from(ret.0))
    }

    pub async fn propose(&self, call: &ContractCall) -> eyre::Result<SafeTransaction> {
        let safe_tx_gas = self
            .client
            .estimate_gas(self.safe, call.to, call.data.clone())
            .await?;
        let nonce = self.nonce.next(|| self.onchain_nonce()).await?;

        let mut tx =
            SafeTransaction::call(call.to, call.data.clone(), safe_tx_gas, nonce, self.sender);
        tx.contract_transaction_hash = self.transaction_hash(&tx).await?;
        tx.signature = sign_safe_hash(&self.signer, tx.contract_transaction_hash)?;

        self.submit(&tx).await?;
        log_msg!(
            "Proposed {} on {:?} as multisig tx {:?} (nonce {})",
            call.method,
            call.to,
            tx.contract_transaction_hash,
            nonce
        );
        Ok(tx)
    }

    async fn submit(&self, tx: &SafeTransaction) -> eyre::Result<()> {
        let url = self.transactions_url();
        let payload = serde_json::to_string(tx)?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let result = self
            .http
            .post(&url)
            .headers(headers.clone())
            .body(payload.clone())
            .send()
            .await;

        let (status, message) = match result {
            Ok(response) if response.status().is_success() => return Ok(()),
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                (Some(status.as_u16()), format!("HTTP {}: {}", status, body))
            }
            Err(err) => (None, err.to_string()),
        };

        tracing::error!(
            endpoint = %url,
            headers = ?headers,
            payload = %payload,
            "Multisig transaction submission failed: {}",
            message
        );
        Err(Error::Relay {
            endpoint: url,
            status,
            payload,
            message,
        })?
    }
}
