//! Contract bindings used to encode Safe and token calls.

use alloy::{primitives::keccak256, primitives::B256, sol};

sol! {
    /// Owner management surface of the Safe.
    interface IOwnerManager {
        function addOwnerWithThreshold(address owner, uint256 threshold) external;
        function removeOwner(address prevOwner, address owner, uint256 threshold) external;
        function swapOwner(address prevOwner, address oldOwner, address newOwner) external;
        function changeThreshold(uint256 threshold) external;
        function getOwners() external view returns (address[] memory owners);
        function getThreshold() external view returns (uint256 threshold);
        function isOwner(address owner) external view returns (bool isOwner);
    }

    /// Read-only Safe getters outside the owner manager.
    interface ISafe {
        function nonce() external view returns (uint256 nonce);
        function VERSION() external view returns (string memory version);
        function NAME() external view returns (string memory name);
        function domainSeparator() external view returns (bytes32 separator);
        function approveHash(bytes32 hashToApprove) external;
    }

    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string memory);
    }
}

pub const SAFE_TX_TYPE: &str = "SafeTx(address to,uint256 value,bytes data,uint8 operation,uint256 safeTxGas,uint256 baseGas,uint256 gasPrice,address gasToken,address refundReceiver,uint256 nonce)";
pub const DOMAIN_TYPE: &str = "EIP712Domain(uint256 chainId,address verifyingContract)";
/// Domain used by Safe releases before 1.3.0, which did not bind the chain id.
pub const LEGACY_DOMAIN_TYPE: &str = "EIP712Domain(address verifyingContract)";

pub fn safe_tx_typehash() -> B256 {
    keccak256(SAFE_TX_TYPE)
}

pub fn domain_typehash() -> B256 {
    keccak256(DOMAIN_TYPE)
}

pub fn legacy_domain_typehash() -> B256 {
    keccak256(LEGACY_DOMAIN_TYPE)
}
