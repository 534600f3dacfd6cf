use ethers::contract::abigen;

abigen!(
    Registry,
    r"[
        function getRootAddress(bytes32 key) external view returns (address)

        function getRootAddresses(bytes32 key) external view returns (address[] memory)

        function setAddress(address context, bytes32 key, address value) external

        function setAddresses(address context, bytes32 key, address[] memory value) external
    ]"
);

abigen!(
    DiamondProxy,
    r"[
        function upgrade(address[] memory facets) external

        function getDelegateAddress() external view returns (address)
    ]"
);

abigen!(
    AccessControl,
    r"[
        function setRoleGroup(bytes32 roleGroup, bytes32[] memory roles) external

        function addAssigner(bytes32 role, bytes32 roleGroup) external
    ]"
);

abigen!(
    GnosisSafe,
    r"[
        function nonce() external view returns (uint256)

        function getTransactionHash(address to, uint256 value, bytes calldata data, uint8 operation, uint256 safeTxGas, uint256 baseGas, uint256 gasPrice, address gasToken, address refundReceiver, uint256 txNonce) external view returns (bytes32)
    ]"
);
