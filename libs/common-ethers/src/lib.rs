use async_trait::async_trait;
use ethers::{
    abi::{AbiDecode, AbiEncode},
    contract::EthCall,
    types::{Address, Bytes, TransactionReceipt, TransactionRequest, U256},
};
use eyre::Context;

pub mod contracts;
pub mod gas;
pub mod nonce;
pub mod tx_sender;

/// Everything the deployer asks of a chain.
///
/// [`tx_sender::TxClient`] talks to a JSON-RPC node. Tests plug in an in-memory
/// chain instead.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Address of the account sending transactions.
    fn address(&self) -> Address;

    async fn chain_id(&self) -> eyre::Result<u64>;

    async fn transaction_count(&self, account: Address) -> eyre::Result<U256>;

    /// Read-only call (`eth_call`) against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> eyre::Result<Bytes>;

    async fn estimate_gas(&self, from: Address, to: Address, data: Bytes) -> eyre::Result<U256>;

    /// Sign and submit the transaction, then wait for it to be mined.
    ///
    /// A transaction that reverts yields [`RevertError`].
    async fn send(&self, tx: TransactionRequest) -> eyre::Result<TransactionReceipt>;
}

/// Call a view function and decode its return value.
pub async fn read<C, R>(client: &dyn ChainClient, to: Address, call: C) -> eyre::Result<R>
where
    C: EthCall,
    R: AbiDecode,
{
    let data = client.call(to, call.encode().into()).await?;
    R::decode(data.as_ref())
        .with_context(|| format!("Failed to decode result of {} at {:?}", C::function_name(), to))
}

const ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];
const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

/// Contract reverted, `reason` is what the contract said.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("execution reverted: {reason}")]
pub struct RevertError {
    pub reason: String,
}

impl RevertError {
    pub fn from_data(data: &[u8]) -> Self {
        Self {
            reason: decode_revert_reason(data),
        }
    }
}

/// Turn revert data into a readable reason.
///
/// `Error(string)` gives the string, `Panic(uint256)` gives the panic code, and
/// anything else (custom errors) is shown as hex.
pub fn decode_revert_reason(data: &[u8]) -> String {
    if data.is_empty() {
        return "no reason given".to_owned();
    }
    if data.len() < 4 {
        return format!("malformed revert data 0x{}", hex::encode(data));
    }
    let (selector, payload) = data.split_at(4);
    if selector == ERROR_SELECTOR {
        if let Ok(reason) = String::decode(payload) {
            return reason;
        }
    } else if selector == PANIC_SELECTOR {
        if let Ok(code) = U256::decode(payload) {
            return format!("panic code {:#x}", code);
        }
    }
    format!("custom error 0x{}", hex::encode(data))
}
