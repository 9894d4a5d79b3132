// Copyright (c) 2023 Espresso Systems (espressosys.com)
// This file is part of the Facet L1-inbox tooling.
//
// This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Bindings for the parts of the OP-stack bridge the withdrawal flow uses.

use ethers::contract::abigen;
use ethers::types::{Address, H160};

/// `0x4200000000000000000000000000000000000016`
pub const L2_TO_L1_MESSAGE_PASSER: Address = H160([
    0x42, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x16,
]);

abigen!(
    L2ToL1MessagePasser,
    r#"[
        event MessagePassed(uint256 indexed nonce, address indexed sender, address indexed target, uint256 value, uint256 gasLimit, bytes data, bytes32 withdrawalHash)
    ]"#
);

// `getL2Output` returns a static struct, which encodes the same as its fields in sequence.
abigen!(
    L2OutputOracle,
    r#"[
        function getL2OutputIndexAfter(uint256 l2BlockNumber) external view returns (uint256)
        function getL2Output(uint256 l2OutputIndex) external view returns (bytes32 outputRoot, uint128 timestamp, uint128 l2BlockNumber)
    ]"#
);

abigen!(
    OptimismPortal,
    r#"[
        struct WithdrawalTransaction { uint256 nonce; address sender; address target; uint256 value; uint256 gasLimit; bytes data; }
        struct OutputRootProof { bytes32 version; bytes32 stateRoot; bytes32 messagePasserStorageRoot; bytes32 latestBlockhash; }
        function proveWithdrawalTransaction(WithdrawalTransaction tx, uint256 l2OutputIndex, OutputRootProof outputRootProof, bytes[] withdrawalProof) external
        function finalizeWithdrawalTransaction(WithdrawalTransaction tx) external
        function finalizedWithdrawals(bytes32 withdrawalHash) external view returns (bool)
    ]"#
);
