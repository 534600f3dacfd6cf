use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use common::network::HARDHAT;
use common_ethers::{
    contracts::{AccessControlCalls, DiamondProxyCalls, GnosisSafeCalls, RegistryCalls},
    tx_sender::TxParamsSupplier,
    ChainClient, RevertError,
};
use ethers::{
    abi::{encode, AbiDecode, AbiEncode, Token},
    types::{
        Address, Bytes, NameOrAddress, TransactionReceipt, TransactionRequest, H256, U256, U64,
    },
    utils::keccak256,
};
use eyre::{eyre, OptionExt};

use crate::{
    artifacts::Artifacts,
    dispatcher::Dispatcher,
    facets::ADMIN_FACET,
    proxy::ModuleId,
    safe::SafeTransaction,
};

pub const TEST_MNEMONIC: &str = "test test test test test test test test test test test junk";

type Key = [u8; 32];

enum Contract {
    Acl {
        role_groups: HashMap<Key, Vec<Key>>,
        assigners: HashMap<Key, Key>,
    },
    Registry {
        addresses: HashMap<Key, Address>,
        lists: HashMap<Key, Vec<Address>>,
    },
    Proxy {
        facets: Vec<Address>,
        delegate: Address,
        upgrades: usize,
    },
    Facet,
    Safe {
        nonce: U256,
    },
}

struct Deployed {
    name: String,
    constructor_registry: Option<Address>,
    contract: Contract,
}

struct State {
    chain_id: u64,
    next_address: u64,
    contracts: HashMap<Address, Deployed>,
    reverts: HashMap<String, String>,
    sent: usize,
    nonces: Vec<U256>,
    safe_nonce_reads: usize,
}

/// In-memory chain hosting the handful of contracts the deployer talks to.
///
/// Contracts are created from initcode of the form `b"{Name}:" ++ abi(args)`,
/// which is what [`mock_artifacts`] hands out. Calldata is decoded with the
/// generated call enums and applied to plain maps.
#[derive(Clone)]
pub struct MockChain {
    deployer: Address,
    state: Arc<Mutex<State>>,
}

impl MockChain {
    pub const GAS_ESTIMATE: u64 = 150_000;

    pub fn new() -> Self {
        Self::with_chain_id(HARDHAT.chain_id)
    }

    pub fn with_chain_id(chain_id: u64) -> Self {
        Self {
            deployer: Address::repeat_byte(0xde),
            state: Arc::new(Mutex::new(State {
                chain_id,
                next_address: 0x1000,
                contracts: HashMap::new(),
                reverts: HashMap::new(),
                sent: 0,
                nonces: Vec::new(),
                safe_nonce_reads: 0,
            })),
        }
    }

    pub fn client(&self) -> Arc<dyn ChainClient> {
        Arc::new(self.clone())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn install(
        &self,
        name: &str,
        constructor_registry: Option<Address>,
        contract: Contract,
    ) -> Address {
        self.state().create(name, constructor_registry, contract)
    }

    pub fn install_registry(&self) -> Address {
        self.install(
            "Settings",
            None,
            Contract::Registry {
                addresses: HashMap::new(),
                lists: HashMap::new(),
            },
        )
    }

    /// Proxy-looking contract without an upgrade delegate.
    pub fn install_bare_proxy(&self) -> Address {
        self.install(
            "BareProxy",
            None,
            Contract::Proxy {
                facets: vec![],
                delegate: Address::zero(),
                upgrades: 0,
            },
        )
    }

    pub fn install_safe(&self, nonce: U256) -> Address {
        self.install("GnosisSafe", None, Contract::Safe { nonce })
    }

    /// Make every transaction calling `method` revert with `reason`.
    pub fn revert_on(&self, method: &str, reason: &str) {
        self.state()
            .reverts
            .insert(method.to_owned(), reason.to_owned());
    }

    pub fn registry_address(&self, registry: Address, key: Key) -> Address {
        match self.state().contracts.get(&registry).map(|d| &d.contract) {
            Some(Contract::Registry { addresses, .. }) => {
                addresses.get(&key).copied().unwrap_or_default()
            }
            _ => panic!("no registry at {:?}", registry),
        }
    }

    pub fn registry_addresses(&self, registry: Address, key: Key) -> Vec<Address> {
        match self.state().contracts.get(&registry).map(|d| &d.contract) {
            Some(Contract::Registry { lists, .. }) => lists.get(&key).cloned().unwrap_or_default(),
            _ => panic!("no registry at {:?}", registry),
        }
    }

    pub fn name_of(&self, address: Address) -> String {
        self.state()
            .contracts
            .get(&address)
            .map(|d| d.name.clone())
            .unwrap_or_default()
    }

    pub fn constructor_registry(&self, address: Address) -> Option<Address> {
        self.state()
            .contracts
            .get(&address)
            .and_then(|d| d.constructor_registry)
    }

    pub fn proxy_facets(&self, proxy: Address) -> Vec<Address> {
        match self.state().contracts.get(&proxy).map(|d| &d.contract) {
            Some(Contract::Proxy { facets, .. }) => facets.clone(),
            _ => panic!("no proxy at {:?}", proxy),
        }
    }

    pub fn proxy_upgrades(&self, proxy: Address) -> usize {
        match self.state().contracts.get(&proxy).map(|d| &d.contract) {
            Some(Contract::Proxy { upgrades, .. }) => *upgrades,
            _ => panic!("no proxy at {:?}", proxy),
        }
    }

    pub fn role_group(&self, acl: Address, group: Key) -> Vec<Key> {
        match self.state().contracts.get(&acl).map(|d| &d.contract) {
            Some(Contract::Acl { role_groups, .. }) => {
                role_groups.get(&group).cloned().unwrap_or_default()
            }
            _ => panic!("no ACL at {:?}", acl),
        }
    }

    pub fn assigner_of(&self, acl: Address, role: Key) -> Option<Key> {
        match self.state().contracts.get(&acl).map(|d| &d.contract) {
            Some(Contract::Acl { assigners, .. }) => assigners.get(&role).copied(),
            _ => panic!("no ACL at {:?}", acl),
        }
    }

    pub fn deployed_count(&self, name: &str) -> usize {
        self.state()
            .contracts
            .values()
            .filter(|d| d.name == name)
            .count()
    }

    pub fn sent_count(&self) -> usize {
        self.state().sent
    }

    /// Nonces of accepted transactions, in arrival order.
    pub fn nonces(&self) -> Vec<U256> {
        self.state().nonces.clone()
    }

    pub fn safe_nonce_reads(&self) -> usize {
        self.state().safe_nonce_reads
    }

    /// Hash the mock Safe reports for `tx`.
    pub fn safe_hash_of(&self, tx: &SafeTransaction) -> H256 {
        H256(keccak256(tx.hash_call().encode()))
    }
}

impl State {
    fn create(
        &mut self,
        name: &str,
        constructor_registry: Option<Address>,
        contract: Contract,
    ) -> Address {
        let address = Address::from_low_u64_be(self.next_address);
        self.next_address += 1;
        self.contracts.insert(
            address,
            Deployed {
                name: name.to_owned(),
                constructor_registry,
                contract,
            },
        );
        address
    }

    fn registry_list(&self, registry: Option<Address>, key: Key) -> Vec<Address> {
        match registry
            .and_then(|r| self.contracts.get(&r))
            .map(|d| &d.contract)
        {
            Some(Contract::Registry { lists, .. }) => lists.get(&key).cloned().unwrap_or_default(),
            _ => vec![],
        }
    }

    fn deploy(&mut self, initcode: &[u8]) -> eyre::Result<Address> {
        let split = initcode
            .iter()
            .position(|b| *b == b':')
            .ok_or_eyre("initcode without contract name")?;
        let name = std::str::from_utf8(&initcode[..split])?.to_owned();
        let args = &initcode[split + 1..];
        let first_address = (args.len() >= 32).then(|| Address::from_slice(&args[12..32]));

        let proxy_module = ModuleId::ALL
            .into_iter()
            .map(ModuleId::spec)
            .find(|spec| spec.proxy_contract == name);

        let (constructor_registry, contract) = match (name.as_str(), proxy_module) {
            ("ACL", _) => (
                None,
                Contract::Acl {
                    role_groups: HashMap::new(),
                    assigners: HashMap::new(),
                },
            ),
            ("Settings", _) => (
                None,
                Contract::Registry {
                    addresses: HashMap::new(),
                    lists: HashMap::new(),
                },
            ),
            (_, Some(spec)) => (
                first_address,
                Contract::Proxy {
                    facets: self.registry_list(first_address, spec.facets_key.id()),
                    delegate: Address::repeat_byte(0xd1),
                    upgrades: 0,
                },
            ),
            _ => (first_address, Contract::Facet),
        };
        Ok(self.create(&name, constructor_registry, contract))
    }

    fn check_revert(&self, method: &str) -> eyre::Result<()> {
        match self.reverts.get(method) {
            Some(reason) => Err(RevertError {
                reason: reason.clone(),
            })?,
            None => Ok(()),
        }
    }

    fn execute(&mut self, to: Address, data: &[u8]) -> eyre::Result<()> {
        let target = self
            .contracts
            .get(&to)
            .ok_or_else(|| eyre!("no contract at {:?}", to))?;
        let method = match &target.contract {
            Contract::Registry { .. } => match RegistryCalls::decode(data)? {
                RegistryCalls::SetAddress(_) => "setAddress",
                RegistryCalls::SetAddresses(_) => "setAddresses",
                _ => "view",
            },
            Contract::Proxy { .. } => "upgrade",
            Contract::Acl { .. } => match AccessControlCalls::decode(data)? {
                AccessControlCalls::SetRoleGroup(_) => "setRoleGroup",
                AccessControlCalls::AddAssigner(_) => "addAssigner",
            },
            _ => "unknown",
        };
        self.check_revert(method)?;

        let target = self
            .contracts
            .get_mut(&to)
            .ok_or_else(|| eyre!("no contract at {:?}", to))?;
        match &mut target.contract {
            Contract::Registry { addresses, lists } => match RegistryCalls::decode(data)? {
                RegistryCalls::SetAddress(c) => {
                    addresses.insert(c.key, c.value);
                }
                RegistryCalls::SetAddresses(c) => {
                    lists.insert(c.key, c.value);
                }
                _ => return Err(eyre!("view function sent as transaction")),
            },
            Contract::Proxy {
                facets, upgrades, ..
            } => match DiamondProxyCalls::decode(data)? {
                DiamondProxyCalls::Upgrade(c) => {
                    *facets = c.facets;
                    *upgrades += 1;
                }
                _ => return Err(eyre!("view function sent as transaction")),
            },
            Contract::Acl {
                role_groups,
                assigners,
            } => match AccessControlCalls::decode(data)? {
                AccessControlCalls::SetRoleGroup(c) => {
                    role_groups.insert(c.role_group, c.roles);
                }
                AccessControlCalls::AddAssigner(c) => {
                    assigners.insert(c.role, c.role_group);
                }
            },
            _ => return Err(eyre!("{:?} accepts no transactions", to)),
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn address(&self) -> Address {
        self.deployer
    }

    async fn chain_id(&self) -> eyre::Result<u64> {
        Ok(self.state().chain_id)
    }

    async fn transaction_count(&self, _account: Address) -> eyre::Result<U256> {
        Ok(U256::from(self.state().sent))
    }

    async fn call(&self, to: Address, data: Bytes) -> eyre::Result<Bytes> {
        let mut state = self.state();
        let target = state
            .contracts
            .get(&to)
            .ok_or_else(|| eyre!("no contract at {:?}", to))?;

        let mut nonce_read = false;
        let token = match &target.contract {
            Contract::Registry { addresses, lists } => match RegistryCalls::decode(&data)? {
                RegistryCalls::GetRootAddress(c) => {
                    Token::Address(addresses.get(&c.key).copied().unwrap_or_default())
                }
                RegistryCalls::GetRootAddresses(c) => Token::Array(
                    lists
                        .get(&c.key)
                        .into_iter()
                        .flatten()
                        .map(|a| Token::Address(*a))
                        .collect(),
                ),
                _ => return Err(eyre!("not a view function")),
            },
            Contract::Proxy { delegate, .. } => match DiamondProxyCalls::decode(&data)? {
                DiamondProxyCalls::GetDelegateAddress(_) => Token::Address(*delegate),
                _ => return Err(eyre!("not a view function")),
            },
            Contract::Safe { nonce } => match GnosisSafeCalls::decode(&data)? {
                GnosisSafeCalls::Nonce(_) => {
                    nonce_read = true;
                    Token::Uint(*nonce)
                }
                GnosisSafeCalls::GetTransactionHash(c) => {
                    Token::FixedBytes(keccak256(c.encode()).to_vec())
                }
            },
            _ => return Err(eyre!("{:?} has no view functions", to)),
        };
        if nonce_read {
            state.safe_nonce_reads += 1;
        }
        Ok(encode(&[token]).into())
    }

    async fn estimate_gas(&self, _from: Address, _to: Address, _data: Bytes) -> eyre::Result<U256> {
        Ok(U256::from(Self::GAS_ESTIMATE))
    }

    async fn send(&self, tx: TransactionRequest) -> eyre::Result<TransactionReceipt> {
        let mut state = self.state();
        let expected = U256::from(state.sent);
        if tx.nonce != Some(expected) {
            return Err(eyre!("nonce {:?} rejected, account is at {}", tx.nonce, expected));
        }
        state.sent += 1;
        state.nonces.push(expected);
        let data = tx.data.unwrap_or_default();

        let contract_address = match tx.to {
            None => Some(state.deploy(&data)?),
            Some(NameOrAddress::Address(to)) => {
                state.execute(to, &data)?;
                None
            }
            Some(NameOrAddress::Name(name)) => return Err(eyre!("ENS name {} not supported", name)),
        };

        Ok(TransactionReceipt {
            transaction_hash: H256::from_low_u64_be(state.sent as u64),
            contract_address,
            status: Some(U64::one()),
            ..Default::default()
        })
    }
}

/// Dispatcher on a local network, executing everything directly.
pub fn direct_dispatcher(chain: &MockChain) -> Dispatcher {
    Dispatcher::new(
        chain.client(),
        TxParamsSupplier::new(chain.client(), HARDHAT, None),
        None,
    )
}

/// Artifacts for every contract the deployer knows, plus facets `A`, `B`, `C`.
pub fn mock_artifacts() -> Artifacts {
    let mut names = vec!["ACL", "Settings", ADMIN_FACET, "A", "B", "C"];
    for module in ModuleId::ALL {
        let spec = module.spec();
        names.push(spec.proxy_contract);
        names.extend(spec.facets.iter().copied());
    }
    Artifacts::from_map(
        names
            .into_iter()
            .map(|name| (name, Bytes::from(format!("{}:", name).into_bytes()))),
    )
}
