use std::{fmt, sync::Arc};

use common_ethers::{
    contracts::{
        GetRootAddressCall, GetRootAddressReturn, GetRootAddressesCall, GetRootAddressesReturn,
        SetAddressCall, SetAddressesCall,
    },
    read,
};
use ethers::{types::Address, utils::keccak256};

use crate::dispatcher::{ContractCall, Dispatched, Dispatcher};

/// Registry key, stored on chain as the keccak256 hash of its name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SettingKey(&'static str);

impl SettingKey {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }

    pub fn id(&self) -> [u8; 32] {
        keccak256(self.0.as_bytes())
    }
}

impl fmt::Debug for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SettingKey({})", self.0)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Typed access to the on-chain settings registry.
///
/// Reads go straight to the chain, writes go through the [`Dispatcher`] and may
/// therefore only be queued.
#[derive(Clone)]
pub struct RegistryClient {
    address: Address,
    dispatcher: Arc<Dispatcher>,
}

impl RegistryClient {
    pub fn new(address: Address, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            address,
            dispatcher,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Zero address means nothing is registered under `key`.
    pub async fn get_address(&self, key: SettingKey) -> eyre::Result<Address> {
        let ret: GetRootAddressReturn = read(
            self.dispatcher.client(),
            self.address,
            GetRootAddressCall { key: key.id() },
        )
        .await?;
        Ok(ret.0)
    }

    pub async fn get_addresses(&self, key: SettingKey) -> eyre::Result<Vec<Address>> {
        let ret: GetRootAddressesReturn = read(
            self.dispatcher.client(),
            self.address,
            GetRootAddressesCall { key: key.id() },
        )
        .await?;
        Ok(ret.0)
    }

    pub async fn set_address(
        &self,
        context: Address,
        key: SettingKey,
        value: Address,
    ) -> eyre::Result<Dispatched> {
        self.dispatcher
            .execute(ContractCall::new(
                self.address,
                SetAddressCall {
                    context,
                    key: key.id(),
                    value,
                },
            ))
            .await
    }

    pub async fn set_addresses(
        &self,
        context: Address,
        key: SettingKey,
        value: Vec<Address>,
    ) -> eyre::Result<Dispatched> {
        self.dispatcher
            .execute(ContractCall::new(
                self.address,
                SetAddressesCall {
                    context,
                    key: key.id(),
                    value,
                },
            ))
            .await
    }
}
