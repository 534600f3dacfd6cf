/// Everything the deployer needs to know about a chain before talking to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkDescriptor {
    pub chain_id: u64,
    pub name: &'static str,
    pub rpc_url: &'static str,
    /// Local or test node, fixed gas price and node-managed nonces.
    pub is_local: bool,
    /// Base URL of the Safe transaction collection service, if there is one.
    pub safe_service_url: Option<&'static str>,
    /// Gas price must be taken from the live gas oracle.
    pub live_gas_price: bool,
}

pub const MAINNET: NetworkDescriptor = NetworkDescriptor {
    chain_id: 1,
    name: "mainnet",
    rpc_url: "https://ethereum-rpc.publicnode.com",
    is_local: false,
    safe_service_url: Some("https://safe-transaction-mainnet.safe.global"),
    live_gas_price: true,
};

pub const SEPOLIA: NetworkDescriptor = NetworkDescriptor {
    chain_id: 11155111,
    name: "sepolia",
    rpc_url: "https://ethereum-sepolia-rpc.publicnode.com",
    is_local: false,
    safe_service_url: Some("https://safe-transaction-sepolia.safe.global"),
    live_gas_price: false,
};

pub const HOLESKY: NetworkDescriptor = NetworkDescriptor {
    chain_id: 17000,
    name: "holesky",
    rpc_url: "https://ethereum-holesky-rpc.publicnode.com",
    is_local: false,
    safe_service_url: None,
    live_gas_price: false,
};

pub const GANACHE: NetworkDescriptor = NetworkDescriptor {
    chain_id: 1337,
    name: "ganache",
    rpc_url: "http://localhost:8545",
    is_local: true,
    safe_service_url: None,
    live_gas_price: false,
};

pub const HARDHAT: NetworkDescriptor = NetworkDescriptor {
    chain_id: 31337,
    name: "hardhat",
    rpc_url: "http://localhost:8545",
    is_local: true,
    safe_service_url: None,
    live_gas_price: false,
};

pub const NETWORKS: [NetworkDescriptor; 5] = [MAINNET, SEPOLIA, HOLESKY, GANACHE, HARDHAT];

impl NetworkDescriptor {
    pub fn from_chain_id(chain_id: u64) -> Option<NetworkDescriptor> {
        NETWORKS.iter().find(|n| n.chain_id == chain_id).copied()
    }
}
